use colored::Colorize;
use sitescout::command_argument_builder;
use sitescout::handlers::{
    handle_cache_clear, handle_company, handle_discover, handle_init, handle_pages, init_tracing,
    print_banner,
};

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    init_tracing(chosen_command.get_flag("verbose"));

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        return;
    }

    let result = match chosen_command.subcommand() {
        Some(("init", primary_command)) => handle_init(primary_command),
        Some(("pages", primary_command)) => handle_pages(primary_command).await,
        Some(("company", primary_command)) => handle_company(primary_command).await,
        Some(("discover", primary_command)) => handle_discover(primary_command).await,
        Some(("cache", primary_command)) => match primary_command.subcommand() {
            Some(("clear", secondary_command)) => handle_cache_clear(secondary_command),
            _ => unreachable!("clap should ensure we don't get here"),
        },
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
