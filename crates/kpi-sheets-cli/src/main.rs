//! KPI Sheets CLI - computes report buckets and writes them into a workbook

use anyhow::{bail, Context, Result};
use chrono::{Duration, Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use kpi_sheets::prelude::*;
use kpi_sheets::{CachedSource, CatalogKind, CsvWriteOptions, CsvWriter, ExtractCache, RunSummary};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_TRACE_DIR: &str = "logs";

#[derive(Parser)]
#[command(name = "kpi")]
#[command(
    author,
    version,
    about = "Compute KPI report blocks and reconcile them into a workbook"
)]
struct Cli {
    /// Configuration file
    #[arg(short, long, env = "KPI_SHEETS_CONFIG", default_value = "kpi-sheets.json")]
    config: PathBuf,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct ReportArgs {
    /// Reporting period (day, week, month)
    #[arg(short, long, default_value = "day")]
    period: Period,

    /// Use the city report instead of the regular one
    #[arg(long)]
    city: bool,
}

impl ReportArgs {
    fn catalog(&self) -> ReportCatalog {
        ReportCatalog::standard(if self.city {
            CatalogKind::City
        } else {
            CatalogKind::Regular
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compute buckets and write them into the period's worksheet
    Run {
        #[command(flatten)]
        report: ReportArgs,

        /// Bucket end date (default: yesterday)
        #[arg(short, long, conflicts_with = "range")]
        date: Option<NaiveDate>,

        /// Backfill every bucket ending between two dates
        #[arg(short, long, num_args = 2, value_names = ["START", "END"])]
        range: Option<Vec<NaiveDate>>,

        /// Print the bucket dates and exit without writing
        #[arg(short, long)]
        test: bool,
    },

    /// Clear every block of a report
    Clear {
        #[command(flatten)]
        report: ReportArgs,
    },

    /// Export a period's worksheet to CSV
    Export {
        /// Reporting period (day, week, month)
        #[arg(short, long, default_value = "day")]
        period: Period,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut trace_dir = PathBuf::from(DEFAULT_TRACE_DIR);
    let result = Config::from_file(&cli.config)
        .with_context(|| format!("Failed to load config '{}'", cli.config.display()))
        .and_then(|config| {
            trace_dir = config.trace_dir.clone();
            execute(&cli.command, &config)
        });

    if let Err(err) = &result {
        error!("{:#}", err);
        match persist_failure(&trace_dir, err) {
            Ok(path) => eprintln!("Failure trace written to '{}'", path.display()),
            Err(e) => eprintln!("Could not write failure trace: {:#}", e),
        }
    }
    result
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn execute(command: &Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Run {
            report,
            date,
            range,
            test,
        } => {
            let dates = bucket_dates(report.period, *date, range.as_deref(), yesterday())?;
            if *test {
                for date in &dates {
                    println!("{}\t{}", date, report.period.window(*date));
                }
                return Ok(());
            }
            run(config, report, &dates)
        }
        Commands::Clear { report } => clear(config, report),
        Commands::Export { period, output } => export(config, *period, output.as_deref()),
    }
}

fn yesterday() -> NaiveDate {
    Local::now().date_naive() - Duration::days(1)
}

/// Bucket end dates for a run: the backfill range, the given date, or `default`
fn bucket_dates(
    period: Period,
    date: Option<NaiveDate>,
    range: Option<&[NaiveDate]>,
    default: NaiveDate,
) -> Result<Vec<NaiveDate>> {
    match range {
        Some(&[start, end]) => {
            if start > end {
                bail!("Range start {} is after its end {}", start, end);
            }
            let dates = period.dates_between(start, end);
            if dates.is_empty() {
                bail!("No {} buckets end between {} and {}", period, start, end);
            }
            Ok(dates)
        }
        Some(other) => bail!("Expected a START and END date, got {} values", other.len()),
        None => Ok(vec![date.unwrap_or(default)]),
    }
}

fn open_workbook(path: &Path) -> Result<Workbook> {
    if path.exists() {
        Workbook::open(path).with_context(|| format!("Failed to open '{}'", path.display()))
    } else {
        info!(path = %path.display(), "Workbook does not exist yet, starting a new one");
        Ok(Workbook::new())
    }
}

fn save_workbook(workbook: &Workbook, path: &Path) -> Result<()> {
    workbook
        .save(path)
        .with_context(|| format!("Failed to write '{}'", path.display()))
}

fn run(config: &Config, report: &ReportArgs, dates: &[NaiveDate]) -> Result<()> {
    let mut workbook = open_workbook(&config.workbook)?;
    let title = config.sheet_title(report.period).to_string();

    let source = CachedSource::new(
        CsvExportWarehouse::new(&config.exports_dir),
        ExtractCache::new(&config.cache_dir, config.cache_recency_days),
    );
    let mut pipeline = Pipeline::new(source);
    let result = pipeline.run(
        workbook.worksheet_or_insert(&title),
        &report.catalog(),
        report.period,
        dates,
    );

    // Buckets written before a failure are kept
    save_workbook(&workbook, &config.workbook)?;
    let summary = result.with_context(|| format!("Failed to update '{}'", title))?;
    print_summary(&title, &summary);
    Ok(())
}

fn print_summary(title: &str, summary: &RunSummary) {
    for bucket in &summary.buckets {
        println!(
            "{}\t{}\t{} blocks{}",
            title,
            bucket.bucket_label,
            bucket.blocks.len(),
            if bucket.formatted { "\tformatted" } else { "" }
        );
    }
}

fn clear(config: &Config, report: &ReportArgs) -> Result<()> {
    let mut workbook = open_workbook(&config.workbook)?;
    let title = config.sheet_title(report.period).to_string();
    let sheet = workbook
        .worksheet_mut(&title)
        .with_context(|| format!("Worksheet '{}' not found", title))?;

    let cleared = kpi_sheets::clear(sheet, &report.catalog())?;
    save_workbook(&workbook, &config.workbook)?;
    eprintln!("Cleared {} blocks on '{}'", cleared, title);
    Ok(())
}

fn export(config: &Config, period: Period, output: Option<&Path>) -> Result<()> {
    let workbook = Workbook::open(&config.workbook)
        .with_context(|| format!("Failed to open '{}'", config.workbook.display()))?;
    let title = config.sheet_title(period);
    let sheet = workbook
        .worksheet(title)
        .with_context(|| format!("Worksheet '{}' not found", title))?;

    if sheet.used_range().is_none() {
        eprintln!("Warning: Sheet appears to be empty");
        return Ok(());
    }

    let options = CsvWriteOptions::default();
    match output {
        Some(path) => {
            CsvWriter::write_worksheet_file(sheet, path, &options)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            eprintln!("Wrote '{}' to '{}'", title, path.display());
        }
        None => CsvWriter::write_worksheet(sheet, io::stdout().lock(), &options)
            .context("Failed to write to stdout")?,
    }
    Ok(())
}

/// Write the error chain to `<dir>/failure_<timestamp>.log`
fn persist_failure(dir: &Path, err: &anyhow::Error) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create '{}'", dir.display()))?;
    let now = Local::now();
    let path = dir.join(format!("failure_{}.log", now.format("%Y%m%d_%H%M%S")));

    let mut trace = format!("{}\n{:?}\n", now.to_rfc3339(), err);
    trace.push_str(&format!("args: {:?}\n", std::env::args().collect::<Vec<_>>()));
    fs::write(&path, trace).with_context(|| format!("Failed to write '{}'", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_backfill() {
        let cli = Cli::try_parse_from([
            "kpi", "--config", "kpi.json", "run", "--period", "month", "--range", "2024-01-15",
            "2024-03-31", "--city",
        ])
        .unwrap();
        let Commands::Run { report, range, .. } = cli.command else {
            panic!("expected run");
        };
        assert_eq!(report.period, Period::Month);
        assert!(report.city);
        assert_eq!(range, Some(vec![date("2024-01-15"), date("2024-03-31")]));
    }

    #[test]
    fn test_date_and_range_conflict() {
        let parsed = Cli::try_parse_from([
            "kpi", "run", "--date", "2024-03-05", "--range", "2024-03-01", "2024-03-05",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_bucket_dates() {
        let default = date("2024-03-04");
        assert_eq!(
            bucket_dates(Period::Day, None, None, default).unwrap(),
            vec![default]
        );
        let weeks = [date("2024-03-01"), date("2024-03-12")];
        assert_eq!(
            bucket_dates(Period::Week, None, Some(&weeks), default).unwrap(),
            vec![date("2024-03-03"), date("2024-03-10")]
        );
        let short_month = [date("2024-03-02"), date("2024-03-20")];
        assert!(bucket_dates(Period::Month, None, Some(&short_month), default).is_err());
        let reversed = [date("2024-03-05"), date("2024-03-01")];
        assert!(bucket_dates(Period::Day, None, Some(&reversed), default).is_err());
    }

    #[test]
    fn test_failure_trace_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let err = anyhow::anyhow!("warehouse down").context("Failed to update 'Week Summary'");
        let path = persist_failure(&dir.path().join("logs"), &err).unwrap();
        let trace = fs::read_to_string(&path).unwrap();
        assert!(trace.contains("warehouse down"));
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("failure_"));
    }
}
