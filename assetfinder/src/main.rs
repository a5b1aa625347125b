//! Assetfinder CLI Application
//!
//! A command-line interface for finding domains and subdomains related to a
//! given domain. This CLI application provides a user-friendly interface to
//! the assetfinder-lib library.

mod ui;

use assetfinder_lib::{load_env_config, parse_duration, parse_sources, ConfigManager, FileConfig};
use assetfinder_lib::{parse_domain_list, DiscoveryConfig, DiscoveryEngine, DEFAULT_LOG_PATH};
use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use console::Term;
use futures_util::StreamExt;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process;
use std::time::Instant;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for assetfinder
#[derive(Parser, Debug)]
#[command(name = "assetfinder")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find domains and subdomains related to a given domain")]
#[command(
    long_about = "Find domains and subdomains related to a given domain.\n\nQueries certificate transparency logs, passive DNS and other public services concurrently, one call per second per service.\nDomains are read from arguments, from --file, or from stdin when neither is given."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Domains to search (read from stdin when omitted)
    #[arg(value_name = "DOMAINS", help_heading = "Input")]
    pub domains: Vec<String>,

    /// Input file with domains (one per line, # comments allowed)
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        help_heading = "Input"
    )]
    pub file: Option<String>,

    /// Only include subdomains of the search domain
    #[arg(short = 's', long = "subs-only", help_heading = "Discovery")]
    pub subs_only: bool,

    /// Sources to query (comma-separated, use --list-sources to see all)
    #[arg(
        long = "sources",
        value_name = "SOURCE",
        value_delimiter = ',',
        help_heading = "Discovery"
    )]
    pub sources: Option<Vec<String>>,

    /// List all available sources and exit
    #[arg(long = "list-sources", help_heading = "Discovery")]
    pub list_sources: bool,

    /// Minimum interval between two calls to the same source (default: 1s)
    #[arg(long = "rate-limit", value_name = "DURATION", help_heading = "Performance")]
    pub rate_limit: Option<String>,

    /// Give up on a source call after this long (default: no limit)
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// Max concurrent source calls (default: unlimited, max: 100)
    #[arg(
        short = 'c',
        long = "concurrency",
        value_name = "N",
        help_heading = "Performance"
    )]
    pub concurrency: Option<usize>,

    /// Output results as a JSON array
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Print hostnames as they are discovered
    #[arg(long = "stream", help_heading = "Output Format")]
    pub stream: bool,

    /// Write source errors to a log file (default path: logs/assetfinder.log)
    #[arg(
        long = "log-file",
        value_name = "PATH",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = DEFAULT_LOG_PATH,
        help_heading = "Configuration"
    )]
    pub log_file: Option<String>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show debug information
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_tracing(&args);

    // Validate arguments
    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    // Handle --list-sources early
    if args.list_sources {
        ui::print_sources();
        return;
    }

    if let Err(e) = run_discovery(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Install the stderr diagnostics subscriber.
///
/// `-d` and `-v` win over `RUST_LOG`; without either, `RUST_LOG` applies and
/// falls back to warnings only.
fn init_tracing(args: &Args) {
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn validate_args(args: &Args) -> Result<(), String> {
    // --list-sources is self-contained, skip other validation
    if args.list_sources {
        return Ok(());
    }

    if args.stream && args.json {
        return Err("Cannot use --stream with --json".to_string());
    }

    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > 100 {
            return Err("Concurrency must be between 1 and 100".to_string());
        }
    }

    for (flag, value) in [("--rate-limit", &args.rate_limit), ("--timeout", &args.timeout)] {
        if let Some(value) = value {
            if parse_duration(value).is_none() {
                return Err(format!(
                    "Invalid {} value '{}'. Use format like '500ms', '5s', '2m'",
                    flag, value
                ));
            }
        }
    }

    if let Some(sources) = &args.sources {
        parse_sources(sources).map_err(|e| e.to_string())?;
    }

    Ok(())
}

/// Main discovery logic
async fn run_discovery(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&args)?;
    let domains = get_domains(&args)?;

    if args.verbose {
        let sources: Vec<&str> = config.sources.iter().map(|s| s.as_str()).collect();
        tracing::info!(
            domains = domains.len(),
            sources = %sources.join(","),
            subs_only = config.subs_only,
            "starting discovery"
        );
    }

    let engine = DiscoveryEngine::with_config(config)?;

    if args.stream {
        run_streaming(&engine, &domains).await
    } else {
        run_batch(&engine, &domains, args.json).await
    }
}

/// Print hostnames as they arrive.
async fn run_streaming(
    engine: &DiscoveryEngine,
    domains: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let started = Instant::now();
    let mut hosts = engine.discover_stream(domains)?;
    let mut stdout = io::stdout().lock();
    let mut found = 0usize;

    while let Some(host) = hosts.next().await {
        writeln!(stdout, "{}", host)?;
        stdout.flush()?;
        found += 1;
    }

    if Term::stderr().is_term() {
        ui::print_summary(found, domains.len(), started.elapsed());
    }

    Ok(())
}

/// Collect everything, then print.
async fn run_batch(
    engine: &DiscoveryEngine,
    domains: &[String],
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let interactive = Term::stderr().is_term() && !domains.is_empty();
    let started = Instant::now();

    let spinner = interactive.then(|| {
        ui::Spinner::start(format!(
            "Searching {} domain{} across {} sources...",
            domains.len(),
            if domains.len() == 1 { "" } else { "s" },
            engine.sources().len()
        ))
    });

    let result = engine.discover(domains).await;

    if let Some(spinner) = spinner {
        spinner.stop().await;
    }
    let hosts = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&hosts)?);
    } else {
        let mut stdout = io::stdout().lock();
        for host in &hosts {
            writeln!(stdout, "{}", host)?;
        }
    }

    if interactive {
        ui::print_summary(hosts.len(), domains.len(), started.elapsed());
    }

    Ok(())
}

/// Build the discovery config with precedence CLI > env > config file > defaults.
fn build_config(args: &Args) -> Result<DiscoveryConfig, Box<dyn std::error::Error>> {
    let config_manager = ConfigManager::new(args.verbose);
    let env_config = load_env_config(args.verbose);

    // Step 1: Config files
    let explicit_path = args
        .config
        .as_deref()
        .map(Path::new)
        .or(env_config.config.as_deref());

    let file_config = match explicit_path {
        Some(path) => config_manager.load_file(path).map_err(|e| {
            format!("Failed to load config file '{}': {}", path.display(), e)
        })?,
        None => config_manager.discover_and_load().unwrap_or_else(|e| {
            warn!("Ignoring config files: {}", e);
            FileConfig::default()
        }),
    };

    let config = file_config.apply_to(DiscoveryConfig::default())?;

    // Step 2: Environment variables (AF_*)
    let config = env_config.apply_to(config);

    // Step 3: CLI arguments (highest precedence)
    apply_cli_args_to_config(config, args)
}

/// Apply CLI arguments to config (highest precedence).
///
/// Only flags the user actually passed override earlier layers.
fn apply_cli_args_to_config(
    mut config: DiscoveryConfig,
    args: &Args,
) -> Result<DiscoveryConfig, Box<dyn std::error::Error>> {
    if args.subs_only {
        config = config.with_subs_only(true);
    }

    if let Some(sources) = &args.sources {
        config = config.with_sources(parse_sources(sources)?);
    }

    if let Some(rate_limit) = args.rate_limit.as_deref().and_then(parse_duration) {
        config = config.with_rate_limit(rate_limit);
    }

    if let Some(timeout) = args.timeout.as_deref().and_then(parse_duration) {
        config = config.with_source_timeout(timeout);
    }

    if let Some(concurrency) = args.concurrency {
        config = config.with_max_in_flight(concurrency);
    }

    if let Some(log_file) = &args.log_file {
        config = config.with_log_file(log_file);
    }

    Ok(config)
}

/// Collect domains from arguments and --file, or from stdin when neither is given.
fn get_domains(args: &Args) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut domains = args.domains.clone();

    if let Some(file) = &args.file {
        domains.extend(read_domains_from_file(file)?);
    }

    if args.domains.is_empty() && args.file.is_none() {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        domains = parse_domain_list(&input);
    }

    Ok(domains)
}

fn read_domains_from_file(file_path: &str) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {}", file_path).into());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", file_path, e))?;
    let domains = parse_domain_list(&content);

    if domains.is_empty() {
        return Err("No valid domains found in the file.".into());
    }

    Ok(domains)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("assetfinder").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_log_file_flag_defaults_path() {
        assert_eq!(parse(&["example.com"]).log_file, None);
        assert_eq!(
            parse(&["--log-file", "example.com"]).log_file.as_deref(),
            Some(DEFAULT_LOG_PATH)
        );
        assert_eq!(
            parse(&["--log-file=run.log", "example.com"]).log_file.as_deref(),
            Some("run.log")
        );
    }

    #[test]
    fn test_sources_are_comma_separated() {
        let args = parse(&["--sources", "crtsh,urlscan", "example.com"]);
        assert_eq!(
            args.sources,
            Some(vec!["crtsh".to_string(), "urlscan".to_string()])
        );
        assert_eq!(args.domains, vec!["example.com"]);
    }

    #[test]
    fn test_validate_args() {
        assert!(validate_args(&parse(&["example.com"])).is_ok());
        assert!(validate_args(&parse(&["-c", "0", "example.com"])).is_err());
        assert!(validate_args(&parse(&["--stream", "--json", "example.com"])).is_err());
        assert!(validate_args(&parse(&["--rate-limit", "fast", "example.com"])).is_err());
        assert!(validate_args(&parse(&["--sources", "shodan", "example.com"])).is_err());
        assert!(validate_args(&parse(&["--list-sources", "-c", "0"])).is_ok());
    }

    #[test]
    fn test_cli_args_override_config() {
        let args = parse(&[
            "-s",
            "--sources",
            "wayback",
            "--rate-limit",
            "250ms",
            "--timeout",
            "1m",
            "-c",
            "7",
            "--log-file=af.log",
            "example.com",
        ]);

        let config = apply_cli_args_to_config(DiscoveryConfig::default(), &args).unwrap();

        assert!(config.subs_only);
        assert_eq!(config.sources, vec![assetfinder_lib::Source::Wayback]);
        assert_eq!(config.rate_limit_interval, std::time::Duration::from_millis(250));
        assert_eq!(config.source_timeout, Some(std::time::Duration::from_secs(60)));
        assert_eq!(config.max_in_flight, Some(7));
        assert_eq!(config.log_file, Some(std::path::PathBuf::from("af.log")));
    }

    #[test]
    fn test_unset_flags_keep_config_values() {
        let base = DiscoveryConfig::default()
            .with_subs_only(true)
            .with_max_in_flight(3);

        let config = apply_cli_args_to_config(base, &parse(&["example.com"])).unwrap();

        assert!(config.subs_only);
        assert_eq!(config.max_in_flight, Some(3));
    }

    #[test]
    fn test_read_domains_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# targets\nexample.com\n\nexample.org # staging").unwrap();

        let domains = read_domains_from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(domains, vec!["example.com", "example.org"]);

        assert!(read_domains_from_file("/no/such/domains.txt").is_err());
    }
}
