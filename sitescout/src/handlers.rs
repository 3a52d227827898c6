use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use sitescout_core::api::{self, clamp_limit};
use sitescout_core::cache::{PageCache, SqliteCache};
use sitescout_core::directory::JsonDirectory;
use sitescout_core::report::{ReportData, ReportFormat, generate_report, save_report};
use sitescout_core::service::{PageService, ProgressCallback, ServiceConfig};
use sitescout_scanner::normalize_domain;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, warn};

pub const CACHE_DB_NAME: &str = "cache.db";

pub fn print_banner() {
    println!(
        "{}",
        r#"
   ___ _ _        ___                _
  / __(_) |_ ___ / __| __ ___ _  _| |_
  \__ \ |  _/ -_)\__ \/ _/ _ \ || |  _|
  |___/_|\__\___||___/\__\___/\_,_|\__|
"#
        .bright_cyan()
        .bold()
    );
    println!(
        "  {} {}\n",
        "sitemap discovery & page ranking".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}

/// Install the stderr log subscriber: WARN by default, DEBUG when verbose
pub fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> String {
    print!("{} ", msg.bright_cyan().bold());
    let _ = io::stdout().flush();
    let mut response = String::new();
    if io::stdin().read_line(&mut response).is_err() {
        return String::new();
    }
    response.trim().to_lowercase()
}

/// Expand `~` in a config directory and append the cache database name
pub fn cache_db_path(config_dir: &str) -> PathBuf {
    let expanded = shellexpand::tilde(config_dir);
    Path::new(expanded.as_ref()).join(CACHE_DB_NAME)
}

/// Build the service configuration from discovery and cache flags.
///
/// Flags a subcommand does not define keep their defaults.
pub fn service_config_from_args(args: &ArgMatches) -> ServiceConfig {
    let mut config = ServiceConfig::default();

    let get_usize = |name: &str| args.try_get_one::<usize>(name).ok().flatten().copied();
    let get_u64 = |name: &str| args.try_get_one::<u64>(name).ok().flatten().copied();

    if let Some(threads) = get_usize("threads") {
        config.concurrency = threads.max(1);
    }
    if let Some(max_depth) = get_usize("max-depth") {
        config.max_depth = max_depth;
    }
    if let Some(secs) = get_u64("timeout") {
        config.probe_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = get_u64("fetch-timeout") {
        config.fetch_timeout = Duration::from_secs(secs);
    }
    if let Some(hours) = get_u64("ttl-hours") {
        config.cache_ttl = Duration::from_secs(hours * 60 * 60);
    }
    if args.try_get_one::<bool>("http").ok().flatten().copied().unwrap_or(false) {
        config.scheme = "http".to_string();
    }

    config
}

/// Open the on-disk cache unless disabled; failures fall back to no cache
pub fn open_cache(args: &ArgMatches) -> Option<Arc<dyn PageCache>> {
    if args.get_flag("no-cache") {
        return None;
    }
    let dir = args.get_one::<String>("cache-dir")?;
    let path = cache_db_path(dir);
    match SqliteCache::open(&path) {
        Ok(cache) => Some(Arc::new(cache)),
        Err(e) => {
            warn!("Cache unavailable at {}: {}", path.display(), e);
            None
        }
    }
}

pub fn load_directory(path: &Path) -> Result<JsonDirectory> {
    JsonDirectory::load(path)
        .with_context(|| format!("Failed to load companies file {}", path.display()))
}

fn spinner(enabled: bool) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

fn build_service(args: &ArgMatches, progress: Option<&ProgressBar>) -> Result<PageService> {
    let mut service = PageService::new(service_config_from_args(args))
        .context("Failed to build HTTP client")?;

    if let Some(cache) = open_cache(args) {
        service = service.with_cache(cache);
    }
    if let Some(pb) = progress {
        let pb = pb.clone();
        let callback: ProgressCallback = Arc::new(move |msg: String| pb.set_message(msg));
        service = service.with_progress(callback);
    }
    Ok(service)
}

pub fn handle_init(args: &ArgMatches) -> Result<()> {
    print_divider();
    println!("{}", "  SITESCOUT INITIALIZATION".bright_white().bold());
    print_divider();
    println!();

    let config_dir = args
        .get_one::<String>("PATH")
        .map(String::as_str)
        .unwrap_or(crate::commands::DEFAULT_CONFIG_DIR);
    let force = args.get_flag("force");
    let db_path = cache_db_path(config_dir);
    let sitescout_config_dir = db_path
        .parent()
        .context("Invalid config directory")?
        .to_path_buf();

    println!(
        "{} Target: {}",
        "→".blue(),
        sitescout_config_dir.display().to_string().bright_white()
    );
    println!();

    if db_path.exists() {
        let overwrite = if force {
            true
        } else {
            println!("{}", "⚠ WARNING".yellow().bold());
            println!("A cache database already exists at:");
            println!(
                "  {} {}",
                "•".yellow(),
                db_path.display().to_string().bright_white()
            );
            println!();
            let response = print_prompt("Would you like to overwrite it? [y/N]:");
            println!();
            response == "y" || response == "yes"
        };

        if overwrite {
            fs::remove_file(&db_path)
                .with_context(|| format!("Failed to remove {}", db_path.display()))?;
            println!("{} Existing cache database removed", "✓".green().bold());
        } else {
            println!("{} Keeping existing cache database", "→".blue());
        }
        println!();
    }

    println!("{} Creating directory structure...", "→".blue());
    fs::create_dir_all(&sitescout_config_dir).with_context(|| {
        format!("Failed to create config directory {}", sitescout_config_dir.display())
    })?;

    let cache = SqliteCache::open(&db_path)
        .with_context(|| format!("Failed to create cache database {}", db_path.display()))?;
    let live_entries = cache.len().unwrap_or(0);

    println!();
    print_divider();
    println!("{}", "  INITIALIZATION COMPLETE".green().bold());
    print_divider();
    println!();
    println!(
        "{} Config directory: {}",
        "✓".green().bold(),
        sitescout_config_dir.display().to_string().bright_white()
    );
    println!(
        "{} Cache database: {} ({} live entries)",
        "✓".green().bold(),
        db_path.display().to_string().bright_white(),
        live_entries.to_string().cyan()
    );
    println!();
    Ok(())
}

pub async fn handle_pages(args: &ArgMatches) -> Result<()> {
    let quiet = args.get_flag("quiet");
    let url = args
        .get_one::<String>("url")
        .context("--url is required")?;
    let name = args.get_one::<String>("name").map(String::as_str).unwrap_or("");
    let limit = clamp_limit(args.get_one::<usize>("limit").copied());
    let format_name = args.get_one::<String>("format").map(String::as_str).unwrap_or("text");
    let Some(format) = ReportFormat::from_str(format_name) else {
        bail!("Unknown report format '{}'", format_name);
    };
    let output = args.get_one::<PathBuf>("output");

    if !quiet {
        println!("\n🔎 Resolving relevant pages for {}", url.bright_white());
        if !name.is_empty() {
            println!("Company: {}", name);
        }
        println!("Limit: {}\n", limit);
    }

    let pb = spinner(!quiet);
    let service = build_service(args, pb.as_ref())?;
    let result = service.get_relevant_pages(Some(url), name, limit).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let data = ReportData::new(name, Some(url), result);
    let report = generate_report(&data, format).context("Failed to render report")?;

    match output {
        Some(path) => {
            save_report(&report, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                println!("{} Report saved to {}", "✓".green().bold(), path.display());
            }
        }
        None => print!("{}", report),
    }

    if let Some(ref error) = data.result.error
        && !quiet
    {
        eprintln!("{} {}", "⚠".yellow().bold(), error);
    }
    Ok(())
}

pub async fn handle_company(args: &ArgMatches) -> Result<()> {
    let quiet = args.get_flag("quiet");
    let id = args.get_one::<String>("id").context("--id is required")?;
    let companies = args
        .get_one::<PathBuf>("companies")
        .context("--companies is required")?;
    let limit = args.get_one::<usize>("limit").copied();

    let directory = load_directory(companies)?;

    let pb = spinner(!quiet);
    let service = build_service(args, pb.as_ref())?;
    let response = api::relevant_pages_for_company(&service, &directory, id, limit).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&response).context("Failed to serialize response")?
    );
    Ok(())
}

pub async fn handle_discover(args: &ArgMatches) -> Result<()> {
    let url = args
        .get_one::<String>("url")
        .context("--url is required")?;
    let Some(domain) = normalize_domain(url) else {
        bail!("Invalid website URL: {}", url);
    };

    let service =
        PageService::new(service_config_from_args(args)).context("Failed to build HTTP client")?;

    let pb = spinner(!args.get_flag("quiet"));
    if let Some(ref pb) = pb {
        pb.set_message(format!("Locating sitemaps for {}", domain));
    }
    let discovery = service.locate(&domain).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    println!(
        "\n{} {} candidate sitemap(s) for {} ({} subdomains checked)\n",
        "✓".green().bold(),
        discovery.candidates.len(),
        domain.bright_white(),
        discovery.subdomains_checked
    );
    for candidate in &discovery.candidates {
        println!(
            "  {} {}  {}",
            "•".cyan(),
            candidate.url,
            format!("[{}]", candidate.origin.label()).dimmed()
        );
    }
    if discovery.candidates.is_empty() {
        println!("  {} No sitemap found for {}", "✗".red().bold(), domain);
    }
    println!();
    Ok(())
}

pub fn handle_cache_clear(args: &ArgMatches) -> Result<()> {
    let dir = args
        .get_one::<String>("cache-dir")
        .map(String::as_str)
        .unwrap_or(crate::commands::DEFAULT_CONFIG_DIR);
    let path = cache_db_path(dir);
    if !path.exists() {
        println!("{} No cache database at {}", "→".blue(), path.display());
        return Ok(());
    }

    let cache = SqliteCache::open(&path)
        .with_context(|| format!("Failed to open cache database {}", path.display()))?;
    let service = PageService::new(ServiceConfig::default())
        .context("Failed to build HTTP client")?
        .with_cache(Arc::new(cache));

    let report = api::clear_cache(&service);
    if report.success {
        println!("{} {}", "✓".green().bold(), report.message);
    } else {
        println!("{} {}", "✗".red().bold(), report.message);
    }
    Ok(())
}
