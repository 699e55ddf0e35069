use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::info;

use logsmodel::logs::{
    dedup_log_rows, filter_log_levels, sort_logs_rows, DedupStrategy, LogsSortOrder, RowContext,
    TimeRange,
};
use logsmodel::frame::parse_frames;
use logsmodel::runtime::boot;
use logsmodel::{build_logs_model_with, LogLevel, TimeZoneSpec};

/// Consolidate data frames into a logs model and print it as JSON.
#[derive(Parser, Debug)]
#[command(name = "logsmodel", version, about)]
struct Cli {
    /// JSON file holding a frame array or an object with a `frames` array
    input: PathBuf,

    /// Query interval in milliseconds; enables the volume histogram
    #[arg(long)]
    interval_ms: Option<f64>,

    /// Requested range start (epoch ms)
    #[arg(long, requires = "to")]
    from: Option<i64>,

    /// Requested range end (epoch ms)
    #[arg(long, requires = "from")]
    to: Option<i64>,

    /// Time zone: utc, browser or a fixed offset like +02:00
    #[arg(long)]
    time_zone: Option<TimeZoneSpec>,

    /// Deduplication strategy: none, exact, numbers or signature
    #[arg(long)]
    dedup: Option<DedupStrategy>,

    /// Hide rows of this level (repeatable)
    #[arg(long = "exclude-level")]
    exclude_level: Vec<LogLevel>,

    /// Row order: ascending or descending
    #[arg(long)]
    sort: Option<LogsSortOrder>,
}

fn main() -> Result<()> {
    boot::init_logging();
    let cli = Cli::parse();
    let config = boot::boot()?;

    let raw = fs::read_to_string(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let frames = parse_frames(&raw)
        .with_context(|| format!("parsing frames from {}", cli.input.display()))?;
    info!("Loaded {} frames from {}", frames.len(), cli.input.display());

    let requested_range = match (cli.from, cli.to) {
        (Some(from), Some(to)) if from > to => bail!("--from ({}) is after --to ({})", from, to),
        (Some(from), Some(to)) => Some(TimeRange::new(from, to)),
        _ => None,
    };

    let ctx = RowContext {
        time_zone: cli.time_zone.unwrap_or(config.time_zone),
        now_ms: Utc::now().timestamp_millis(),
    };
    let mut model = build_logs_model_with(
        &frames,
        cli.interval_ms,
        requested_range,
        &config.histogram,
        &ctx,
    )?;

    let mut hidden: HashSet<LogLevel> = config.excluded_levels.iter().copied().collect();
    hidden.extend(cli.exclude_level.iter().copied());
    let strategy = cli.dedup.unwrap_or(config.dedup_strategy);

    let mut rows = dedup_log_rows(&model.rows, strategy).into_owned();
    rows = filter_log_levels(&rows, &hidden).into_owned();
    sort_logs_rows(&mut rows, cli.sort.unwrap_or(config.sort_order));
    info!(
        "Model built: {} rows ({} after dedup/filter), {} series, {} meta items",
        model.rows.len(),
        rows.len(),
        model.series.len(),
        model.meta.len()
    );
    model.rows = rows;

    println!("{}", serde_json::to_string_pretty(&model)?);
    Ok(())
}
