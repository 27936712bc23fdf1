//! regwatch - privacy compliance analysis client
//!
//! Submits files to the remote compliance analyzer, tracks each submission
//! until it completes or fails, then prints the normalized and filtered
//! violations per file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use regwatch_common::config::{
    load_toml_config, resolve_config_path, write_toml_config, AnalyzerConfig, LoggingConfig,
    TomlConfig, DEFAULT_ANALYZER_URL,
};
use regwatch_common::events::{EventBus, NotificationCenter, NotificationVariant};
use regwatch_common::{format_file_size, uuid_utils};
use regwatch_tracker::config::RuntimeSettings;
use regwatch_tracker::models::ViolationQuery;
use regwatch_tracker::services::{analyze_paths, AnalyzeOutput, SessionOptions};

const EVENT_CAPACITY: usize = 256;
const NOTIFICATION_HISTORY: usize = 100;

/// Command-line arguments for regwatch
#[derive(Parser, Debug)]
#[command(name = "regwatch")]
#[command(about = "GDPR/HIPAA compliance analysis client")]
#[command(version)]
struct Args {
    /// Config file (defaults to $REGWATCH_CONFIG, then the platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze files and print their violations
    Analyze(AnalyzeArgs),

    /// Write a default config file
    InitConfig {
        /// Target path (defaults to the resolved config path)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args, Debug)]
struct AnalyzeArgs {
    /// Files to analyze (CSV, TXT, WAV, MP3)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Analysis service base URL
    #[arg(long)]
    analyzer_url: Option<String>,

    /// Only show violations whose text or rule contains this term
    #[arg(short, long)]
    search: Option<String>,

    /// all, low, medium, high or critical
    #[arg(long, default_value = "all")]
    severity: String,

    /// all, pii or phi
    #[arg(long, default_value = "all")]
    category: String,

    /// Download a report per completed file into this directory
    #[arg(long)]
    report_dir: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref())?;
    let toml_config = load_toml_config(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    init_tracing(&toml_config.logging);
    info!("Starting regwatch {}", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Analyze(analyze) => run_analyze(analyze, &toml_config).await,
        Command::InitConfig { path, force } => init_config(&path.unwrap_or(config_path), force),
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let default_filter = format!(
        "regwatch_tracker={level},regwatch_common={level},regwatch={level}",
        level = logging.level
    );
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let config = TomlConfig {
        analyzer: AnalyzerConfig {
            base_url: Some(DEFAULT_ANALYZER_URL.to_string()),
            ..AnalyzerConfig::default()
        },
        logging: LoggingConfig::default(),
    };
    write_toml_config(&config, path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Wrote {}", path.display());
    Ok(())
}

async fn run_analyze(args: AnalyzeArgs, toml_config: &TomlConfig) -> Result<()> {
    let query = ViolationQuery::from_labels(args.search.as_deref(), &args.severity, &args.category)
        .context("Invalid filter")?;
    let settings = RuntimeSettings::resolve(args.analyzer_url.as_deref(), toml_config);
    let options = SessionOptions {
        query,
        report_dir: args.report_dir,
    };

    let events = EventBus::new(EVENT_CAPACITY);
    let notifications = NotificationCenter::new(NOTIFICATION_HISTORY);
    let collector = notifications.listen(&events);

    let output = analyze_paths(&args.files, &settings, &options, &events)
        .await
        .context("Analysis run failed")?;

    drop(events);
    let _ = collector.await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_text(&output, &options.query);
        for n in notifications.recent() {
            let marker = match n.variant {
                NotificationVariant::Default => " ",
                NotificationVariant::Destructive => "!",
            };
            eprintln!("{} {}: {}", marker, n.title, n.description);
        }
    }

    if !output.is_clean() {
        bail!(
            "{} file(s) failed analysis, {} file(s) rejected",
            output.totals.failed,
            output.rejected.len()
        );
    }
    Ok(())
}

fn print_text(output: &AnalyzeOutput, query: &ViolationQuery) {
    for report in &output.files {
        let s = &report.submission;
        println!(
            "{} [{}] {} ({})",
            uuid_utils::short(&s.id),
            s.status,
            s.name,
            format_file_size(s.size)
        );

        if let Some(message) = &s.error_message {
            println!("    error: {}", message);
            continue;
        }

        let summary = &report.summary;
        println!(
            "    {} violations: {} critical, {} high, {} medium, {} low | {} PII, {} PHI",
            summary.total,
            summary.critical,
            summary.high,
            summary.medium,
            summary.low,
            summary.pii,
            summary.phi
        );
        if !query.is_unconstrained() {
            println!("    {} shown after filtering", report.violations.len());
        }

        if let Some(path) = &report.report {
            println!("    report: {}", path.display());
        }

        for v in &report.violations {
            let location = v
                .source_location
                .as_ref()
                .and_then(|loc| {
                    loc.row
                        .map(|row| format!(" row {}", row))
                        .or_else(|| loc.timestamp.as_ref().map(|t| format!(" at {}", t)))
                })
                .unwrap_or_default();
            println!(
                "    [{:<8}] {} {:<5} {}{}: {}",
                v.severity, v.category, v.rule, v.context, location, v.raw_text
            );
        }
    }

    for r in &output.rejected {
        println!("rejected {}: {}", r.path.display(), r.reason);
    }

    let totals = &output.totals;
    println!(
        "\n{} file(s): {} complete, {} failed, {} rejected, {} raw violations, {} uploaded",
        totals.total,
        totals.complete,
        totals.failed,
        output.rejected.len(),
        totals.violations,
        format_file_size(totals.bytes)
    );
}
