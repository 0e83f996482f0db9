//! Hobart CLI binary.
//!
//! Fetches a target series and its factor series, runs the rolling
//! attribution pipeline and exports the coefficient trajectory.

mod integration;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use hobart::{AnalysisConfig, AttributionPipeline};
use hobart_data::{FetchConfig, SeriesSpec, TimeSeries};
use hobart_output::ExportFormat;
use integration::cache_manager;
use integration::series_loader::{build_fetcher, fetch_with_progress};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hobart")]
#[command(about = "Hobart: rolling multi-factor regression attribution", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Explain a target series by factor series over rolling windows
    Analyze {
        /// Target series as [alias=]source:code
        #[arg(long, default_value = "nq=yahoo:NQ=F", value_parser = parse_spec)]
        target: SeriesSpec,

        /// Factor series as [alias=]source:code (repeatable)
        #[arg(long = "factor", default_value = "fred:T10YIE", value_parser = parse_spec)]
        factors: Vec<SeriesSpec>,

        /// First date (YYYY-MM-DD)
        #[arg(long, default_value = "2020-01-01")]
        start: NaiveDate,

        /// Last date (YYYY-MM-DD, default: today)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Rolling window length in rows (default: 60)
        #[arg(long)]
        window: Option<usize>,

        /// JSON analysis config; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the coefficient table to this file
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Output format: csv, json or pretty-json (default: from the file extension)
        #[arg(long)]
        format: Option<ExportFormat>,

        /// Write chart data (JSON) to this file
        #[arg(long)]
        chart: Option<PathBuf>,

        /// Skip max-abs normalization of the coefficients
        #[arg(long)]
        raw_only: bool,

        /// Fit windows on a single thread
        #[arg(long)]
        serial: bool,

        /// Disable caching (always fetch fresh data)
        #[arg(long)]
        no_cache: bool,

        /// Force refresh cached data
        #[arg(long)]
        refresh: bool,
    },

    /// Fetch one series and print it
    Series {
        /// Series as [alias=]source:code
        #[arg(value_parser = parse_spec)]
        spec: SeriesSpec,

        /// First date (YYYY-MM-DD)
        #[arg(long, default_value = "2020-01-01")]
        start: NaiveDate,

        /// Last date (YYYY-MM-DD, default: today)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Number of rows shown at each end
        #[arg(long, default_value = "5")]
        rows: usize,

        /// Disable caching (always fetch fresh data)
        #[arg(long)]
        no_cache: bool,
    },

    /// Inspect or clear the series cache
    Cache {
        /// Show cache statistics
        #[arg(long)]
        stats: bool,

        /// Delete every cached series
        #[arg(long)]
        clear: bool,
    },
}

fn parse_spec(s: &str) -> Result<SeriesSpec, String> {
    s.parse().map_err(|e: hobart_data::DataError| e.to_string())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,hobart=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,hobart=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze {
            target,
            factors,
            start,
            end,
            window,
            config,
            output,
            format,
            chart,
            raw_only,
            serial,
            no_cache,
            refresh,
        } => {
            let mut analysis = match config {
                Some(path) => AnalysisConfig::from_json_file(path)?,
                None => AnalysisConfig::default(),
            };
            if let Some(window) = window {
                analysis.window = window;
            }
            if raw_only {
                analysis.include_normalized = false;
            }
            if serial {
                analysis.parallel = false;
            }

            let fetch = FetchConfig {
                use_cache: !no_cache,
                force_refresh: refresh,
            };
            let outputs = Outputs {
                coefficients: output,
                format,
                chart,
            };
            analyze(target, factors, start, end_or_today(end), analysis, fetch, outputs).await?;
        }
        Commands::Series {
            spec,
            start,
            end,
            rows,
            no_cache,
        } => {
            let fetch = FetchConfig {
                use_cache: !no_cache,
                force_refresh: false,
            };
            show_series(spec, start, end_or_today(end), rows, fetch).await?;
        }
        Commands::Cache { stats, clear } => {
            manage_cache(stats, clear)?;
        }
    }

    Ok(())
}

fn end_or_today(end: Option<NaiveDate>) -> NaiveDate {
    end.unwrap_or_else(|| Utc::now().date_naive())
}

struct Outputs {
    coefficients: Option<PathBuf>,
    format: Option<ExportFormat>,
    chart: Option<PathBuf>,
}

async fn analyze(
    target: SeriesSpec,
    factors: Vec<SeriesSpec>,
    start: NaiveDate,
    end: NaiveDate,
    config: AnalysisConfig,
    fetch: FetchConfig,
    outputs: Outputs,
) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = AttributionPipeline::new(config)?;

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!(
        "║{:^62}║",
        format!("ROLLING ATTRIBUTION: {}", target.alias)
    );
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("Target:  {}", target);
    for factor in &factors {
        println!("Factor:  {}", factor);
    }
    println!("Period:  {} to {}", start, end);
    println!(
        "Window:  {} rows{}",
        pipeline.config().window,
        if pipeline.config().parallel { "" } else { " (serial)" }
    );

    if fetch.use_cache {
        cache_manager::print_cache_info();
        if fetch.force_refresh {
            println!("  Mode: Force refresh (re-fetching all data)");
        }
    } else {
        println!("  Cache: Disabled");
    }
    println!();

    let fetcher = build_fetcher(fetch)?;
    let specs: Vec<SeriesSpec> = std::iter::once(target).chain(factors).collect();
    let mut series = fetch_with_progress(&fetcher, &specs, start, end).await?;

    for s in &series {
        println!(
            "  {:<16} {:>6} observations ({} missing)",
            s.name(),
            s.len(),
            s.missing_count()
        );
    }

    let dependent = series.remove(0);

    print!("Running rolling regression...");
    std::io::Write::flush(&mut std::io::stdout())?;
    let result = match pipeline.run(&dependent, &series) {
        Ok(result) => {
            println!(
                " ✓ ({} aligned rows, {} windows)",
                result.aligned().n_rows(),
                result.raw().len()
            );
            result
        }
        Err(e) => {
            println!(" ✗");
            return Err(e.into());
        }
    };

    print!("{}", result.summary().to_ascii_table());

    if let Some(path) = outputs.coefficients {
        let format = outputs
            .format
            .or_else(|| ExportFormat::from_path(&path))
            .unwrap_or_default();
        result.write_coefficients(&path, format)?;
        println!("Coefficients written to {}", path.display());
    }

    if let Some(path) = outputs.chart {
        result.write_chart(&path)?;
        println!("Chart data written to {}", path.display());
    }

    Ok(())
}

async fn show_series(
    spec: SeriesSpec,
    start: NaiveDate,
    end: NaiveDate,
    rows: usize,
    fetch: FetchConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = build_fetcher(fetch)?;
    let series = fetcher.fetch(&spec, start, end).await?;

    println!("{} ({})", series.name(), spec);
    println!("{}", "=".repeat(40));
    print_rows(&series, rows);
    println!("{}", "-".repeat(40));
    println!(
        "{} observations, {} missing",
        series.len(),
        series.missing_count()
    );
    if let (Some(first), Some(last)) = (series.first_date(), series.last_date()) {
        println!("Range: {} to {}", first, last);
    }

    Ok(())
}

fn print_rows(series: &TimeSeries, rows: usize) {
    let n = series.len();
    let print = |(date, value): (NaiveDate, f64)| {
        if value.is_finite() {
            println!("{}  {:>14.4}", date, value);
        } else {
            println!("{}  {:>14}", date, "NaN");
        }
    };

    if n <= 2 * rows {
        series.iter().for_each(print);
        return;
    }
    series.iter().take(rows).for_each(print);
    println!("{:^40}", "...");
    series.iter().skip(n - rows).for_each(print);
}

fn manage_cache(stats: bool, clear: bool) -> Result<(), Box<dyn std::error::Error>> {
    let cache = cache_manager::open_cache()?;
    println!("Cache location: {}", cache_manager::cache_path().display());

    if clear {
        let removed = cache.clear_all()?;
        println!("Removed {} cached observations", removed);
    }

    if stats || !clear {
        let stats = cache.stats()?;
        println!("Series:       {}", stats.series_count);
        println!("Observations: {}", stats.observation_count);
        if let (Some(earliest), Some(latest)) = (stats.earliest, stats.latest) {
            println!("Date range:   {} to {}", earliest, latest);
        }
    }

    Ok(())
}
