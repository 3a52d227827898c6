use clap::{Arg, Command, arg, command};

pub const DEFAULT_CONFIG_DIR: &str = "~/.config/sitescout/";

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

fn limit_arg() -> Arg {
    arg!(-l --"limit" <NUM_PAGES>)
        .required(false)
        .help("Maximum number of pages to return (1-100)")
        .value_parser(clap::value_parser!(usize))
        .default_value("10")
}

/// Flags controlling discovery: parallelism, timeouts and recursion depth
fn with_network_args(cmd: Command) -> Command {
    cmd.arg(
        arg!(-t --"threads" <NUM_WORKERS>)
            .required(false)
            .help("Maximum number of concurrent probes and sitemap fetches")
            .value_parser(clap::value_parser!(usize))
            .default_value("8"),
    )
    .arg(
        arg!(--"timeout" <SECONDS>)
            .required(false)
            .help("Timeout for robots.txt and existence probes, in seconds")
            .value_parser(clap::value_parser!(u64))
            .default_value("5"),
    )
    .arg(
        arg!(--"fetch-timeout" <SECONDS>)
            .required(false)
            .help("Timeout for downloading a sitemap document, in seconds")
            .value_parser(clap::value_parser!(u64))
            .default_value("15"),
    )
    .arg(
        arg!(--"max-depth" <DEPTH>)
            .required(false)
            .help("Maximum sitemap index nesting to follow")
            .value_parser(clap::value_parser!(usize))
            .default_value("3"),
    )
    .arg(
        arg!(--"http")
            .required(false)
            .help("Probe sites over plain http instead of https")
            .action(clap::ArgAction::SetTrue),
    )
}

fn with_cache_args(cmd: Command) -> Command {
    cmd.arg(
        arg!(--"cache-dir" <PATH>)
            .required(false)
            .help("Directory holding the cache database")
            .default_value(DEFAULT_CONFIG_DIR),
    )
    .arg(
        arg!(--"no-cache")
            .required(false)
            .help("Skip the on-disk cache entirely")
            .action(clap::ArgAction::SetTrue),
    )
    .arg(
        arg!(--"ttl-hours" <HOURS>)
            .required(false)
            .help("How long cached results stay valid")
            .value_parser(clap::value_parser!(u64))
            .default_value("24"),
    )
}

pub fn command_argument_builder() -> Command {
    Command::new("sitescout")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitescout")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Enable debug logging on stderr")
                .required(false)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the sitescout config directory and cache database")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location of the sitescout config directory")
                        .default_value(DEFAULT_CONFIG_DIR),
                )
                .arg(
                    arg!(-f - -"force")
                        .help("Overwrite any existing cache database without asking")
                        .required(false),
                ),
        )
        .subcommand(with_cache_args(with_network_args(
            command!("pages")
                .about("Find and rank the most relevant pages of a company website")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The company website (bare domain or full URL)"),
                )
                .arg(
                    arg!(-n --"name" <COMPANY_NAME>)
                        .required(false)
                        .help("Company name, used to boost pages that mention it")
                        .default_value(""),
                )
                .arg(limit_arg())
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, csv, markdown")
                        .value_parser(["text", "json", "csv", "markdown", "md"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )))
        .subcommand(with_cache_args(with_network_args(
            command!("company")
                .about("Resolve relevant pages for a company from a directory file (JSON output)")
                .arg(
                    arg!(--"id" <COMPANY_ID>)
                        .required(true)
                        .help("Identifier of the company in the directory"),
                )
                .arg(
                    arg!(-c --"companies" <PATH>)
                        .required(true)
                        .help("JSON file with an array of {id, name, website} records")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(limit_arg()),
        )))
        .subcommand(with_network_args(
            command!("discover")
                .about("List candidate sitemaps for a website without ranking pages")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The website to inspect"),
                ),
        ))
        .subcommand(
            command!("cache")
                .about("Manage the sitescout result cache")
                .subcommand_required(true)
                .subcommand(
                    command!("clear").about("Remove every cached result").arg(
                        arg!(--"cache-dir" <PATH>)
                            .required(false)
                            .help("Directory holding the cache database")
                            .default_value(DEFAULT_CONFIG_DIR),
                    ),
                ),
        )
}
