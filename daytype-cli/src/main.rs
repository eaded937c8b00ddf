//! Day-type CLI: classify sessions, build distribution reports, explain one day.
//!
//! Commands:
//! - `classify`: classify every session in a bars CSV and save the records + manifest
//! - `report`: build year/month distribution pivots and a Markdown report from a records CSV
//! - `explain`: print the metrics and the rule that fired for a single session

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use daytype_core::data::{BarSource, CsvBarSource};
use daytype_core::{DayType, SessionReport};
use daytype_runner::config::parse_date;
use daytype_runner::{
    distributions, generate_report, load_records, save_manifest, save_records, save_reports,
    ClassificationRun, Pipeline, RunConfig, RunManifest,
};

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "daytype=info,daytype_core=info,daytype_runner=info";

#[derive(Parser)]
#[command(
    name = "daytype",
    about = "Market Profile day-type classifier for intraday index data"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every session in a bars CSV and save the records.
    Classify {
        /// Bars CSV (symbol,timestamp,open,high,low,close,volume).
        #[arg(long)]
        bars: PathBuf,

        /// Path to a TOML run config. Defaults to the NSE session.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for the records CSV and manifest.
        #[arg(long, default_value = "data")]
        output_dir: PathBuf,

        /// First date to classify (YYYY-MM-DD). Overrides the config.
        #[arg(long)]
        start: Option<String>,

        /// Last date to classify (YYYY-MM-DD). Overrides the config.
        #[arg(long)]
        end: Option<String>,

        /// Indices to classify (repeatable). Overrides the config.
        #[arg(long = "index")]
        indices: Vec<String>,

        /// Classify on a single thread.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Build distribution tables and the Markdown report from a records CSV.
    Report {
        /// Records CSV written by `classify`.
        #[arg(long)]
        csv: PathBuf,

        /// Output directory for pivots and the report.
        #[arg(long, default_value = "reports")]
        output_dir: PathBuf,

        /// Also print the Markdown report to stdout.
        #[arg(long, default_value_t = false)]
        print: bool,
    },
    /// Show the metrics and the rule that fired for one session.
    Explain {
        /// Bars CSV (symbol,timestamp,open,high,low,close,volume).
        #[arg(long)]
        bars: PathBuf,

        /// Index to look up.
        #[arg(long)]
        index: String,

        /// Session date (YYYY-MM-DD).
        #[arg(long)]
        date: String,

        /// Path to a TOML run config. Defaults to the NSE session.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the session report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Classify {
            bars,
            config,
            output_dir,
            start,
            end,
            indices,
            sequential,
        } => run_classify(
            &bars,
            config.as_deref(),
            &output_dir,
            start,
            end,
            indices,
            sequential,
        ),
        Commands::Report {
            csv,
            output_dir,
            print,
        } => run_report(&csv, &output_dir, print),
        Commands::Explain {
            bars,
            index,
            date,
            config,
            json,
        } => run_explain(&bars, &index, &date, config.as_deref(), json),
    }
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(RunConfig::default()),
    }
}

fn run_classify(
    bars: &Path,
    config_path: Option<&Path>,
    output_dir: &Path,
    start: Option<String>,
    end: Option<String>,
    indices: Vec<String>,
    sequential: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if start.is_some() {
        config.run.start_date = start;
    }
    if end.is_some() {
        config.run.end_date = end;
    }
    if !indices.is_empty() {
        config.run.indices = indices;
    }
    if sequential {
        config.run.parallel = false;
    }

    let plan = config.validate().context("invalid run configuration")?;
    let fingerprint = config.fingerprint()?;

    let source = CsvBarSource::open(bars, plan.exchange_offset)
        .with_context(|| format!("failed to read bars from {}", bars.display()))?;
    let ingest = source.summary();
    info!(
        source = source.name(),
        bars = ingest.accepted,
        dropped_void = ingest.dropped_void,
        inconsistent = ingest.inconsistent,
        dropped_duplicates = ingest.dropped_duplicates,
        "loaded bars"
    );

    let run = Pipeline::from_plan(&plan).run(&source)?;
    print_summary(&run);

    if run.is_empty() {
        bail!("no sessions classified");
    }

    let run_date = chrono::Local::now().date_naive();
    let records_path = save_records(&run.records, output_dir, run_date)?;
    let records_file = records_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let manifest = RunManifest::new(&run, fingerprint, source.name(), records_file);
    let manifest_path = save_manifest(&manifest, output_dir)?;

    println!("Records saved to:  {}", records_path.display());
    println!("Manifest saved to: {}", manifest_path.display());
    Ok(())
}

fn run_report(csv: &Path, output_dir: &Path, print: bool) -> Result<()> {
    let records = load_records(csv)
        .with_context(|| format!("failed to read records from {}", csv.display()))?;
    if records.is_empty() {
        bail!("{} contains no records", csv.display());
    }

    let dists = distributions(&records);
    let written = save_reports(&dists, output_dir)?;

    if print {
        println!("{}", generate_report(&dists));
    }
    for dist in &dists {
        let overall = dist.by_month.overall();
        println!(
            "{:<12} {:>5} sessions  {} to {}",
            dist.index,
            overall.total(),
            dist.first_date,
            dist.last_date
        );
    }
    println!("Wrote {} files to {}", written.len(), output_dir.display());
    Ok(())
}

fn run_explain(
    bars: &Path,
    index: &str,
    date: &str,
    config_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let plan = config.validate().context("invalid run configuration")?;
    let date: NaiveDate = parse_date(date)?;

    let source = CsvBarSource::open(bars, plan.exchange_offset)
        .with_context(|| format!("failed to read bars from {}", bars.display()))?;
    let Some(session) = source.store().session(index, date) else {
        bail!("no bars for {index} on {date}");
    };

    let Some(report) = plan.classifier.evaluate(session) else {
        println!(
            "{index} {date}: insufficient data ({} bars, none in the session or IB window), day skipped",
            session.len()
        );
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_explanation(index, date, &report);
    }
    Ok(())
}

fn print_summary(run: &ClassificationRun) {
    println!();
    println!("=== Classification Run ===");
    match run.date_span() {
        Some((first, last)) => println!("Period:         {} to {}", first, last),
        None => println!("Period:         (no sessions classified)"),
    }
    println!("Classified:     {}", run.records.len());
    println!("Skipped:        {}", run.skipped());
    println!();
    for (index, stats) in &run.stats {
        println!("--- {} ---", index);
        println!("Sessions:       {}", stats.sessions);
        println!("Classified:     {}", stats.classified);
        println!("Skipped:        {}", stats.skipped);
        for dt in DayType::ALL {
            let count = run
                .records
                .iter()
                .filter(|r| &r.index == index && r.day_type == dt)
                .count();
            println!("  {:<22}{}", dt.label(), count);
        }
    }
    println!();
}

fn print_explanation(index: &str, date: NaiveDate, report: &SessionReport) {
    let m = &report.metrics;
    println!();
    println!("=== {} {} ===", index, date);
    println!("IB:             {:.2} - {:.2} (range {:.2})", m.ib_low, m.ib_high, m.ib_range);
    println!("Day:            {:.2} - {:.2} (range {:.2})", m.day_low, m.day_high, m.day_range);
    println!("Open / Close:   {:.2} / {:.2}", m.open_price, m.close_price);
    println!("Extension:      up={} down={}", m.re_up, m.re_down);
    println!("IB % of open:   {:.3}% ({})", m.ib_pct, report.ib_size);
    println!("IB / day range: {:.3}", m.ib_ratio);
    println!("Close vs mid:   {:.3}", m.close_pos_mid);
    println!("Close vs edge:  {:.3}", m.close_dist_from_extreme);
    println!();
    println!("Day type:       {}", report.classification.day_type);
    println!("Matched:        {}", report.classification.rule);
}
