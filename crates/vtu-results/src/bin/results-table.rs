use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vtu_results::{
    BatchReport, ColumnSelection, ExtractOptions, ExtractWarning, MemorySlot,
    PROJECTION_SHEET_NAME, RESULTS_SHEET_NAME, ResultsError, Strategy, UsnList,
    build_chart_frames, project_table, read_pages, read_table_csv, run_batch_into,
    write_table_csv, write_table_xlsx,
};

#[derive(Debug, Parser)]
#[command(
    name = "results-table",
    version,
    about = "Turn saved VTU result pages into marks tables"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Parse page_<USN>.html files and write the full results table.
    Extract(ExtractArgs),
    /// Keep only selected subject columns of a results CSV.
    Project(ProjectArgs),
    /// Emit chart frames (JSON) for selected subject columns of a results CSV.
    Chart(ChartArgs),
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Directory holding page_<USN>.html files.
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV path.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output XLSX path.
    #[arg(long)]
    xlsx: Option<PathBuf>,

    /// Only parse these USNs (comma separated), in this order.
    #[arg(long)]
    usns: Option<String>,

    /// Skip the table layout and only read divTableRow layouts.
    #[arg(long)]
    flow_only: bool,

    /// Accept ABSENT/FAIL/PASS marks on divTableRow layouts too.
    #[arg(long)]
    unify_mark_tokens: bool,

    /// Output delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Print every collected warning.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct ProjectArgs {
    /// Results CSV written by `extract`.
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV path.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output XLSX path.
    #[arg(long)]
    xlsx: Option<PathBuf>,

    /// Wanted columns, comma separated. Defaults to the 5th semester subjects.
    #[arg(long)]
    columns: Option<String>,

    /// Delimiter of the input and output CSV.
    #[arg(long, default_value = ",")]
    delimiter: char,
}

#[derive(Debug, Args)]
struct ChartArgs {
    /// Results CSV written by `extract` or `project`.
    #[arg(short, long)]
    input: PathBuf,

    /// Output JSON path; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Wanted columns, comma separated. Defaults to the 5th semester subjects.
    #[arg(long)]
    columns: Option<String>,

    #[arg(long, default_value = ",")]
    delimiter: char,
}

enum Outcome {
    Done,
    NothingUsable,
}

fn parse_delimiter(delimiter: char) -> Result<u8> {
    if !delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }
    Ok(delimiter as u8)
}

fn parse_selection(columns: Option<&str>) -> Result<ColumnSelection> {
    columns
        .map(ColumnSelection::from_str)
        .transpose()
        .map_err(|error| anyhow!("invalid column selection: {error}"))
        .context("failed to parse --columns")
        .map(Option::unwrap_or_default)
}

fn parse_options(args: &ExtractArgs) -> Result<ExtractOptions> {
    let strategies = if args.flow_only {
        vec![Strategy::Flow]
    } else {
        vec![Strategy::Grid, Strategy::Flow]
    };
    Ok(ExtractOptions {
        strategies,
        unify_mark_tokens: args.unify_mark_tokens,
        delimiter: parse_delimiter(args.delimiter)?,
    })
}

fn log_warnings(warnings: &[ExtractWarning], verbose: bool) {
    if warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", warnings.len());
    if verbose {
        for warning in warnings {
            eprintln!(
                "  - {:?} usn={}: {}",
                warning.code,
                warning.usn.as_deref().unwrap_or("-"),
                warning.message
            );
        }
    }
}

fn log_report(report: &BatchReport, verbose: bool) {
    eprintln!(
        "parsed {} of {} page(s); skipped: {}",
        report.accepted.len(),
        report.processed,
        if report.skipped.is_empty() {
            "none".to_string()
        } else {
            report.skipped.join(", ")
        }
    );
    log_warnings(&report.warnings, verbose);
}

fn default_output(input: &Path, file_name: &str) -> PathBuf {
    input.join(file_name)
}

fn run_extract(args: &ExtractArgs) -> Result<Outcome> {
    let options = parse_options(args)?;
    let mut pages = read_pages(&args.input)
        .with_context(|| format!("failed to read pages from '{}'", args.input.display()))?;

    if let Some(usns) = args.usns.as_deref() {
        let wanted = UsnList::from_str(usns).map_err(|error| anyhow!("invalid --usns: {error}"))?;
        pages = wanted
            .as_slice()
            .iter()
            .map(|usn| {
                pages
                    .iter()
                    .find(|page| &page.usn == usn)
                    .cloned()
                    .unwrap_or_else(|| vtu_results::FetchedPage {
                        usn: usn.clone(),
                        body: None,
                    })
            })
            .collect();
    }

    if pages.is_empty() {
        anyhow::bail!("no page_<USN>.html files found in '{}'", args.input.display());
    }

    let slot = MemorySlot::new();
    let (table, report) = match run_batch_into(&slot, &pages, &options) {
        Ok(result) => result,
        Err(ResultsError::EmptyBatch) => {
            eprintln!("error: could not parse result data from any page");
            return Ok(Outcome::NothingUsable);
        }
        Err(error) => return Err(error).context("failed to build results table"),
    };
    log_report(&report, args.verbose);

    let csv_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input, "results_table.csv"));
    write_table_csv(&csv_path, table.as_ref(), options.delimiter)
        .with_context(|| format!("failed to write '{}'", csv_path.display()))?;
    if let Some(xlsx_path) = &args.xlsx {
        write_table_xlsx(xlsx_path, table.as_ref(), RESULTS_SHEET_NAME)
            .with_context(|| format!("failed to write '{}'", xlsx_path.display()))?;
    }
    Ok(Outcome::Done)
}

fn run_project(args: &ProjectArgs) -> Result<Outcome> {
    let delimiter = parse_delimiter(args.delimiter)?;
    let selection = parse_selection(args.columns.as_deref())?;
    let table = read_table_csv(&args.input, delimiter)
        .with_context(|| format!("failed to read '{}'", args.input.display()))?;

    let (projection, warnings) = match project_table(&table, &selection) {
        Ok(result) => result,
        Err(error @ ResultsError::NoUsableColumns { .. }) => {
            eprintln!("error: {error}");
            return Ok(Outcome::NothingUsable);
        }
        Err(error) => return Err(error.into()),
    };
    log_warnings(&warnings, true);

    let csv_path = args.output.clone().unwrap_or_else(|| {
        args.input
            .parent()
            .map_or_else(|| PathBuf::from("selected.csv"), |dir| dir.join("selected.csv"))
    });
    write_table_csv(&csv_path, &projection.table, delimiter)
        .with_context(|| format!("failed to write '{}'", csv_path.display()))?;
    if let Some(xlsx_path) = &args.xlsx {
        write_table_xlsx(xlsx_path, &projection.table, PROJECTION_SHEET_NAME)
            .with_context(|| format!("failed to write '{}'", xlsx_path.display()))?;
    }
    Ok(Outcome::Done)
}

fn run_chart(args: &ChartArgs) -> Result<Outcome> {
    let delimiter = parse_delimiter(args.delimiter)?;
    let selection = parse_selection(args.columns.as_deref())?;
    let table = read_table_csv(&args.input, delimiter)
        .with_context(|| format!("failed to read '{}'", args.input.display()))?;

    let (projection, warnings) = match project_table(&table, &selection) {
        Ok(result) => result,
        Err(error @ ResultsError::NoUsableColumns { .. }) => {
            eprintln!("error: {error}");
            return Ok(Outcome::NothingUsable);
        }
        Err(error) => return Err(error.into()),
    };
    log_warnings(&warnings, true);

    let frames = build_chart_frames(&projection.table);
    let json = serde_json::to_string_pretty(&frames).context("failed to encode chart frames")?;
    match &args.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("failed to write '{}'", path.display()))?,
        None => println!("{json}"),
    }
    Ok(Outcome::Done)
}

fn main() -> ExitCode {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vtu_results=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    let outcome = match &cli.command {
        Commands::Extract(args) => run_extract(args),
        Commands::Project(args) => run_project(args),
        Commands::Chart(args) => run_chart(args),
    };
    match outcome {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::NothingUsable) => ExitCode::from(2),
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}
