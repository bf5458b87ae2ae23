use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use royalty_report::config::Config;
use royalty_report::constants;
use royalty_report::csv_export::write_csv_report;
use royalty_report::html_report::write_html_report;
use royalty_report::report::{build_report, print_summary, write_json_report};
use royalty_report::source::{LineFilter, load_lines, select_lines};
use royalty_report::types::ReportFilters;

#[derive(Parser)]
#[command(name = "royalty-report")]
#[command(about = "Royalty reporting over exported sales transaction lines")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a royalty report from a CSV or JSON export
    #[command(after_help = "\
Examples:
  royalty-report report --input sales.csv --category 2
  royalty-report report --input sales.json --from 2025-01-01 --to 2025-03-31 --format csv")]
    Report {
        /// Transaction line export (.csv or .json)
        #[arg(long, short = 'i')]
        input: PathBuf,

        /// Config file (default: ./royalty.toml when present)
        #[arg(long, short = 'c', env = "ROYALTY_CONFIG")]
        config: Option<PathBuf>,

        /// Royalty category id (default: report.default_category)
        #[arg(long)]
        category: Option<String>,

        /// Only include lines from this subsidiary
        #[arg(long)]
        subsidiary: Option<String>,

        /// First transaction date, inclusive (YYYY-MM-DD or MM/DD/YYYY)
        #[arg(long)]
        from: Option<String>,

        /// Last transaction date, inclusive (YYYY-MM-DD or MM/DD/YYYY)
        #[arg(long)]
        to: Option<String>,

        /// Directory for generated reports (default: report.output_dir)
        #[arg(long, short = 'o')]
        output_dir: Option<PathBuf>,

        /// Which reports to write
        #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::All)]
        format: OutputFormat,
    },

    /// List configured royalty categories
    Categories {
        /// Config file (default: ./royalty.toml when present)
        #[arg(long, short = 'c', env = "ROYALTY_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Html,
    Csv,
    Json,
    All,
}

impl OutputFormat {
    fn includes(self, other: OutputFormat) -> bool {
        self == OutputFormat::All || self == other
    }
}

struct ReportArgs {
    input: PathBuf,
    config: Option<PathBuf>,
    category: Option<String>,
    subsidiary: Option<String>,
    from: Option<String>,
    to: Option<String>,
    output_dir: Option<PathBuf>,
    format: OutputFormat,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(constants::LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            input,
            config,
            category,
            subsidiary,
            from,
            to,
            output_dir,
            format,
        } => cmd_report(ReportArgs {
            input,
            config,
            category,
            subsidiary,
            from,
            to,
            output_dir,
            format,
        }),
        Commands::Categories { config } => cmd_categories(config.as_deref()),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn cmd_report(args: ReportArgs) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;

    let category_id = non_blank(args.category).or_else(|| config.default_category.clone());
    let subsidiary = non_blank(args.subsidiary).or_else(|| config.default_subsidiary.clone());
    let from = non_blank(args.from);
    let to = non_blank(args.to);

    let category = category_id.as_deref().and_then(|id| config.lookup(id));
    if let Some(ref id) = category_id
        && category.is_none()
    {
        warn!(category = %id, "category not configured, no royalty will be computed");
    }

    let filter = LineFilter::new(
        category_id.as_deref(),
        category.as_ref(),
        subsidiary.as_deref(),
        from.as_deref(),
        to.as_deref(),
    )?;

    let lines = select_lines(load_lines(&args.input)?, &filter);
    info!(selected = lines.len(), "building report");

    let report = build_report(lines, category).with_filters(ReportFilters {
        from_date: from,
        to_date: to,
        category_id,
        subsidiary,
    });

    let output_dir = args.output_dir.unwrap_or_else(|| config.output_dir.clone());
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

    println!("\nWriting reports to {}", output_dir.display());
    if args.format.includes(OutputFormat::Html) {
        write_html_report(&output_dir, &report)?;
    }
    if args.format.includes(OutputFormat::Csv) {
        write_csv_report(&output_dir, &report)?;
    }
    if args.format.includes(OutputFormat::Json) {
        write_json_report(&output_dir, &report)?;
    }

    print_summary(&report);
    Ok(())
}

fn format_percent(value: Option<f64>) -> String {
    value.map(|v| format!("{}%", v)).unwrap_or_else(|| "-".to_string())
}

fn cmd_categories(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;
    let categories = config.categories();

    if categories.is_empty() {
        println!("No royalty categories configured.");
        return Ok(());
    }

    println!("\n  {:<8} {:<28} {:>8} {:>10}  METHOD", "ID", "NAME", "SPLIT", "PREVIOUS");
    println!("  ─────────────────────────────────────────────────────────────────────");
    for c in &categories {
        let method = c
            .method
            .map(|m| format!("{} ({})", m.code(), m.display_name()))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<8} {:<28} {:>8} {:>10}  {}",
            c.id,
            c.name,
            format_percent(c.split_percent),
            format_percent(c.previous_percent),
            method
        );
    }
    println!("\n  {} active categories", categories.len());
    Ok(())
}
