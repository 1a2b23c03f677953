//! haven-wordpress-importer - Import a WordPress export into a Haven site
//!
//! Usage:
//!   haven-wordpress-importer export.xml --author-map alice:alice@example.com
//!   AUTHOR_MAP=alice:alice@example.com haven-wordpress-importer export.xml --dry-run
//!   haven-wordpress-importer export.xml --config import.toml --report report.json

use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};

use haven_wp::config::{CliOverrides, ImportConfig};
use haven_wp::importer::{AuthorMapping, HttpFetcher, ImportReport, Importer, MediaCache};
use haven_wp::platform::DirectoryPlatform;
use haven_wp::wxr::WxrDocument;

#[derive(ValueEnum, Clone, Debug)]
enum ReportFormat {
    /// JSON format
    Json,
    /// Human-readable text
    Text,
}

#[derive(ClapParser)]
#[command(
    version,
    about = "Import a WordPress export (WXR) into Haven",
    long_about = "Imports the posts of a WordPress export file into a Haven site.\n\n\
                  Media referenced by the posts is downloaded once per URL and\n\
                  stored as Haven media records. WordPress authors are mapped to\n\
                  existing Haven users by email; unmapped authors fall back to the\n\
                  first user that resolved."
)]
struct Cli {
    /// WordPress export file
    #[arg(value_name = "EXPORT")]
    export: PathBuf,

    /// Comma-separated login:email pairs
    #[arg(short, long, env = "AUTHOR_MAP", value_name = "MAP")]
    author_map: Option<String>,

    /// Report what would be imported without creating anything
    #[arg(long, env = "DRY_RUN", value_parser = clap::builder::BoolishValueParser::new())]
    dry_run: bool,

    /// Haven data directory [default: haven-data]
    #[arg(short, long, env = "HAVEN_TARGET_DIR", value_name = "DIR")]
    target_dir: Option<PathBuf>,

    /// Import configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Media download timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Write the import report to a file
    #[arg(long, value_name = "REPORT_FILE")]
    report: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value = "json")]
    report_format: ReportFormat,

    /// debug log file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            author_map: self.author_map.clone(),
            dry_run: self.dry_run,
            target_dir: self.target_dir.clone(),
            download_timeout_secs: self.timeout,
        }
    }
}

fn init_logger(filter_level: log::LevelFilter, logfile: Option<PathBuf>) -> Result<()> {
    let mut loggers: Vec<Box<dyn simplelog::SharedLogger>> = vec![simplelog::TermLogger::new(
        filter_level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )];
    if let Some(filename) = logfile {
        let file = File::create(&filename)
            .with_context(|| format!("failed to create log file {}", filename.display()))?;
        loggers.push(simplelog::WriteLogger::new(
            filter_level,
            simplelog::Config::default(),
            file,
        ));
    }
    simplelog::CombinedLogger::init(loggers)?;
    Ok(())
}

fn write_report(report: &ImportReport, path: &PathBuf, format: &ReportFormat) -> Result<()> {
    let content = match format {
        ReportFormat::Json => report.to_json()?,
        ReportFormat::Text => report.to_text(),
    };
    fs::write(path, content)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    log::info!("Report written to {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose.log_level_filter(), cli.log_file.clone())?;

    let document = WxrDocument::open(&cli.export)?;

    let config = match &cli.config {
        Some(path) => ImportConfig::load(path)?,
        None => ImportConfig::default(),
    };

    let settings = config.merge(&cli.overrides())?;

    let mut platform = DirectoryPlatform::open(&settings.target_dir)?;
    let authors = AuthorMapping::resolve(&settings.author_map, &platform)?;
    log::info!("Resolved {} author mapping(s)", authors.len());

    let fetcher = HttpFetcher::new(settings.download_timeout).context("failed to build HTTP client")?;
    let mut media = MediaCache::new(Box::new(fetcher));

    let importer = Importer::new(settings.options);
    let report = importer.run(&document, &authors, &mut media, &mut platform)?;

    eprintln!("\n{}", report.to_text());

    if let Some(path) = &cli.report {
        write_report(&report, path, &cli.report_format)?;
    }

    Ok(())
}
