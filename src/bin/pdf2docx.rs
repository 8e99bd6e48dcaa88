use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use pdf_table_geometry::{
    ExtractOptions, ExtractWarning, PageSelection, RangeMarkers, ShadingBounds, TableModel,
    detect_page_range, extract_tables, read_page_geometry, write_tables_csv,
};
use pdf_table_translate::models::{DEFAULT_TEMPLATE_TABLE_INDEX, RunReport};
use pdf_table_translate::{RunOptions, TranslationEngine, TranslatorConfig, run};
use tracing_subscriber::EnvFilter;

const PREVIEW_ROWS: usize = 5;
const PREVIEW_CELL_CHARS: usize = 30;

#[derive(Debug, Parser)]
#[command(
    name = "pdf2docx",
    version,
    about = "Extract ruled tables from a PDF report and write them, translated, into a Word document"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract, translate and write tables to a DOCX file.
    Translate(TranslateArgs),
    /// Extract tables and write them as CSV without translating.
    Extract(ExtractArgs),
    /// Print a preview of every detected table.
    Inspect(InspectArgs),
    /// Print the page range bounded by the section markers.
    Range(RangeArgs),
}

#[derive(Debug, Args)]
struct SourceArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Page selection like 1-3,5. Overrides marker range detection.
    #[arg(long)]
    pages: Option<String>,

    /// Text that opens the page range.
    #[arg(long)]
    start_marker: Option<String>,

    /// Text that closes the page range. Repeatable.
    #[arg(long = "end-marker")]
    end_markers: Vec<String>,

    /// Lower bound of the shaded fill intensity interval.
    #[arg(long)]
    shade_min: Option<f64>,

    /// Upper bound of the shaded fill intensity interval.
    #[arg(long)]
    shade_max: Option<f64>,
}

#[derive(Debug, Args)]
struct TranslateArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output DOCX path.
    #[arg(short, long)]
    output: PathBuf,

    /// DOCX template to insert the tables into.
    #[arg(long)]
    template: Option<PathBuf>,

    /// 0-based index of the template table the output follows.
    #[arg(long, default_value_t = DEFAULT_TEMPLATE_TABLE_INDEX)]
    insert_after: usize,

    /// Maximum translation calls in flight.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-call timeout in seconds; 0 disables it.
    #[arg(long)]
    timeout: Option<u64>,

    /// Skip the final review pass over translated cells.
    #[arg(long)]
    no_review: bool,

    /// Skip translation entirely and copy source text.
    #[arg(long)]
    no_translate: bool,

    /// Print the run report as JSON on stdout.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output CSV path.
    #[arg(short, long)]
    output: PathBuf,

    /// Output delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct InspectArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Print table models as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct RangeArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    #[arg(long)]
    start_marker: Option<String>,

    #[arg(long = "end-marker")]
    end_markers: Vec<String>,
}

fn markers(start: Option<&str>, end: &[String]) -> RangeMarkers {
    let mut markers = RangeMarkers::default();
    if let Some(start) = start {
        markers.start = start.to_string();
    }
    if !end.is_empty() {
        markers.end = end.to_vec();
    }
    markers
}

fn parse_options(args: &SourceArgs) -> Result<ExtractOptions> {
    let pages = args
        .pages
        .as_deref()
        .map(PageSelection::from_str)
        .transpose()
        .map_err(|error| anyhow!("invalid page selection: {error}"))
        .context("failed to parse --pages")?;

    let defaults = ShadingBounds::default();
    let options = ExtractOptions {
        pages,
        markers: markers(args.start_marker.as_deref(), &args.end_markers),
        shading: ShadingBounds {
            lower: args.shade_min.unwrap_or(defaults.lower),
            upper: args.shade_max.unwrap_or(defaults.upper),
        },
        ..ExtractOptions::default()
    };
    options
        .validate()
        .map_err(|error| anyhow!("invalid options: {error}"))?;
    Ok(options)
}

fn log_warnings(warnings: &[ExtractWarning], verbose: bool) {
    if warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", warnings.len());
    if verbose {
        for warning in warnings {
            eprintln!(
                "  - {:?} page={:?} table_id={:?}: {}",
                warning.code, warning.page, warning.table_id, warning.message
            );
        }
    }
}

fn exit_for_tables(table_count: usize) -> ExitCode {
    if table_count > 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

async fn run_translate(args: &TranslateArgs) -> Result<RunReport> {
    let extract = parse_options(&args.source)?;

    let engine = if args.no_translate {
        TranslationEngine::disabled()
    } else {
        let mut config = TranslatorConfig::from_env();
        if let Some(concurrency) = args.concurrency {
            config.max_concurrency = concurrency.max(1);
        }
        if let Some(timeout) = args.timeout {
            config.call_timeout = (timeout > 0).then(|| Duration::from_secs(timeout));
        }
        TranslationEngine::from_config(&config)
    };

    let options = RunOptions {
        template: args.template.clone(),
        insert_after: args.insert_after,
        extract,
        final_review: !args.no_review,
        ..RunOptions::new(&args.source.input, &args.output)
    };
    run(&options, &engine)
        .await
        .with_context(|| format!("failed to convert '{}'", args.source.input.display()))
}

fn run_extract(args: &ExtractArgs) -> Result<usize> {
    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }
    let options = parse_options(&args.source)?;
    let extraction = extract_tables(&args.source.input, &options)
        .with_context(|| format!("failed to extract tables from '{}'", args.source.input.display()))?;
    write_tables_csv(&args.output, &extraction.tables, args.delimiter as u8)
        .with_context(|| format!("failed to write '{}'", args.output.display()))?;
    log_warnings(&extraction.report.warnings, args.verbose);
    Ok(extraction.report.table_count)
}

fn preview_cell(text: &str) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() > PREVIEW_CELL_CHARS {
        let mut cut = flat.chars().take(PREVIEW_CELL_CHARS - 3).collect::<String>();
        cut.push_str("...");
        cut
    } else {
        flat
    }
}

fn print_table(index: usize, table: &TableModel) {
    println!(
        "table {index} (page {}): {} rows x {} cols",
        table.page_number(),
        table.row_count(),
        table.col_count()
    );
    for (row, cells) in table.rows().iter().take(PREVIEW_ROWS).enumerate() {
        let cells = cells.iter().map(|cell| preview_cell(cell)).collect::<Vec<_>>();
        println!("  [{row}] {}", cells.join(" | "));
    }
    if table.row_count() > PREVIEW_ROWS {
        println!("  ... {} more row(s)", table.row_count() - PREVIEW_ROWS);
    }
    for span in table.merges() {
        println!(
            "  merge at ({}, {}) spanning {} col(s) x {} row(s)",
            span.row, span.col, span.col_span, span.row_span
        );
    }
    let shaded = table
        .row_shaded()
        .iter()
        .enumerate()
        .filter(|(_, shaded)| **shaded)
        .map(|(row, _)| row.to_string())
        .collect::<Vec<_>>();
    if !shaded.is_empty() {
        println!("  shaded rows: {}", shaded.join(", "));
    }
}

fn run_inspect(args: &InspectArgs) -> Result<usize> {
    let options = parse_options(&args.source)?;
    let extraction = extract_tables(&args.source.input, &options)
        .with_context(|| format!("failed to extract tables from '{}'", args.source.input.display()))?;

    if args.json {
        let json = serde_json::to_string_pretty(&extraction.tables).context("failed to encode tables")?;
        println!("{json}");
    } else {
        for (index, table) in extraction.tables.iter().enumerate() {
            print_table(index + 1, table);
        }
        log_warnings(&extraction.report.warnings, true);
    }
    Ok(extraction.tables.len())
}

fn run_range(input: &Path, markers: &RangeMarkers) -> Result<()> {
    let scan = read_page_geometry(input)
        .with_context(|| format!("failed to read '{}'", input.display()))?;
    let range = detect_page_range(&scan.pages, markers);
    println!(
        "pages {}..{} of {} (start marker {}, end marker {})",
        range.start + 1,
        range.end,
        scan.pages.len(),
        if range.start_found { "found" } else { "missing" },
        if range.end_found { "found" } else { "missing" },
    );
    Ok(())
}

fn report_error(error: &anyhow::Error) -> ExitCode {
    eprintln!("error: {error:#}");
    ExitCode::from(1)
}

#[tokio::main]
async fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pdf_table_translate=info,pdf_table_geometry=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Translate(args) => match run_translate(&args).await {
            Ok(report) => {
                if args.json {
                    match serde_json::to_string_pretty(&report) {
                        Ok(json) => println!("{json}"),
                        Err(error) => return report_error(&error.into()),
                    }
                } else {
                    eprintln!(
                        "wrote {} table(s) to {} ({} cell(s) sent, {} changed)",
                        report.table_count, report.output, report.cells_sent, report.cells_changed
                    );
                }
                log_warnings(&report.warnings, !args.json);
                exit_for_tables(report.table_count)
            }
            Err(error) => report_error(&error),
        },
        Commands::Extract(args) => match run_extract(&args) {
            Ok(tables) => exit_for_tables(tables),
            Err(error) => report_error(&error),
        },
        Commands::Inspect(args) => match run_inspect(&args) {
            Ok(tables) => exit_for_tables(tables),
            Err(error) => report_error(&error),
        },
        Commands::Range(args) => {
            let markers = markers(args.start_marker.as_deref(), &args.end_markers);
            match run_range(&args.input, &markers) {
                Ok(()) => ExitCode::SUCCESS,
                Err(error) => report_error(&error),
            }
        }
    }
}
