//! Convert command - recover the order table of a single document.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use ordex_core::models::config::ExportConfig;
use ordex_core::{
    Consistency, Converter, DocumentSession, Grammar, ParseStrategy, Record, RecordStats,
    XlsxExporter,
};

use super::{convert_file, load_config, InputKind};

/// Arguments for the convert command.
#[derive(Args)]
pub struct ConvertArgs {
    /// Input file (PDF, or already extracted text as .txt)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (default: from the output extension, else text)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Use this layout grammar instead of detecting one
    #[arg(short, long)]
    grammar: Option<Grammar>,

    /// How the layout grammar is chosen
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Do not retry PDF text extraction with lopdf
    #[arg(long)]
    no_fallback: bool,

    /// Show cross-check statistics
    #[arg(long)]
    show_stats: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Excel workbook
    Xlsx,
    /// CSV rows
    Csv,
    /// JSON document with records and statistics
    Json,
    /// Plain text table
    Text,
}

impl OutputFormat {
    /// Pick a format from an output file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "xlsx" => Some(OutputFormat::Xlsx),
            "csv" => Some(OutputFormat::Csv),
            "json" => Some(OutputFormat::Json),
            "txt" => Some(OutputFormat::Text),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum StrategyArg {
    /// Use the first grammar whose layout is detected
    FirstMatch,
    /// Use the first grammar that yields any records
    FirstNonEmpty,
}

impl From<StrategyArg> for ParseStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::FirstMatch => ParseStrategy::FirstMatch,
            StrategyArg::FirstNonEmpty => ParseStrategy::FirstNonEmpty,
        }
    }
}

/// Machine-readable conversion result.
#[derive(Serialize)]
pub struct ConversionOutput<'a> {
    pub grammar: Grammar,
    pub detected: bool,
    pub consistency: Consistency,
    pub records: &'a [Record],
    pub stats: &'a RecordStats,
    pub warnings: &'a [String],
}

impl<'a> From<&'a DocumentSession> for ConversionOutput<'a> {
    fn from(session: &'a DocumentSession) -> Self {
        Self {
            grammar: session.grammar(),
            detected: session.classification.detected,
            consistency: session.consistency(),
            records: &session.records,
            stats: &session.stats,
            warnings: &session.warnings,
        }
    }
}

pub async fn run(args: ConvertArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    // Load configuration and apply command line overrides
    let mut config = load_config(config_path)?;
    if let Some(grammar) = args.grammar {
        config.parsing.forced_grammar = Some(grammar);
    }
    if let Some(strategy) = args.strategy {
        config.parsing.strategy = strategy.into();
    }
    if args.no_fallback {
        config.pdf.use_fallback_extractor = false;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    if InputKind::of(&args.input).is_none() {
        anyhow::bail!("Unsupported file format: {}", args.input.display());
    }

    let format = args
        .format
        .or_else(|| args.output.as_deref().and_then(OutputFormat::from_path))
        .unwrap_or(OutputFormat::Text);
    if format == OutputFormat::Xlsx && args.output.is_none() {
        anyhow::bail!("XLSX output needs an output file, use --output");
    }

    info!("Converting file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Reading order positions...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let converter = Converter::from_config(&config)?;
    let session = convert_file(&converter, &args.input);
    pb.finish_and_clear();
    let session = session?;

    if session.is_empty() {
        eprintln!(
            "{} No positions found (layout: {})",
            style("!").yellow(),
            session.grammar()
        );
    }
    for warning in &session.warnings {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }

    // Write output
    match format {
        OutputFormat::Xlsx => {
            let bytes = export_xlsx(&session.records, &config.export)?;
            if let Some(output_path) = &args.output {
                fs::write(output_path, bytes)?;
                println!(
                    "{} {} positions written to {}",
                    style("✓").green(),
                    session.records.len(),
                    output_path.display()
                );
            }
        }
        _ => {
            let output = render(&session, format)?;
            if let Some(output_path) = &args.output {
                fs::write(output_path, &output)?;
                println!(
                    "{} {} positions written to {}",
                    style("✓").green(),
                    session.records.len(),
                    output_path.display()
                );
            } else {
                print!("{}", output);
            }
        }
    }

    // Show summary
    if args.show_stats {
        eprintln!();
        eprint!("{}", format_stats(&session));
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Spreadsheet bytes for a record set.
pub fn export_xlsx(records: &[Record], config: &ExportConfig) -> anyhow::Result<Vec<u8>> {
    Ok(XlsxExporter::from_config(config).export(records)?)
}

/// Render a session in a text-based format.
pub fn render(session: &DocumentSession, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&ConversionOutput::from(session))?;
            json.push('\n');
            Ok(json)
        }
        OutputFormat::Csv => format_csv(&session.records),
        OutputFormat::Text => Ok(format_text(&session.records)),
        OutputFormat::Xlsx => anyhow::bail!("XLSX is a binary format"),
    }
}

fn format_csv(records: &[Record]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["position", "code", "quantity"])?;
    for record in records {
        wtr.write_record([
            record.position.to_string(),
            record.code.clone(),
            record.quantity.to_string(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(records: &[Record]) -> String {
    let mut output = String::new();

    output.push_str(&format!("{:>5}  {:<14}  {:>9}\n", "Lp", "Kod", "Ilość"));
    for record in records {
        output.push_str(&format!(
            "{:>5}  {:<14}  {:>9}\n",
            record.position, record.code, record.quantity
        ));
    }

    output
}

fn format_stats(session: &DocumentSession) -> String {
    let stats = &session.stats;
    let mut output = String::new();

    let layout = if session.classification.forced {
        format!("{} (forced)", session.grammar())
    } else if session.classification.detected {
        format!("{}", session.grammar())
    } else {
        format!("{} (fallback)", session.grammar())
    };

    output.push_str(&format!("Layout:           {}\n", layout));
    if let Some(extractor) = &session.extractor {
        output.push_str(&format!("Text extractor:   {}\n", extractor));
    }
    output.push_str(&format!("Lines:            {}\n", session.lines.len()));
    output.push_str(&format!("Positions:        {}\n", stats.total_records));
    output.push_str(&format!("Unique codes:     {}\n", stats.unique_codes));
    output.push_str(&format!("Missing codes:    {}\n", stats.missing_codes));
    output.push_str(&format!("Quantity total:   {}\n", stats.quantity_total));
    output.push_str(&format!("Duplicates:       {}\n", stats.duplicates_removed));
    output.push_str(&format!("No quantity:      {}\n", stats.dropped_without_quantity));
    output.push_str(&format!("Consistency:      {:?}\n", session.consistency()));
    output.push_str(&format!("Processing time:  {}ms\n", session.processing_time_ms));

    output
}
