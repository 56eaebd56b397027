//! Batch command - convert many order documents in parallel.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::stream::{self, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use ordex_core::models::config::ExportConfig;
use ordex_core::{Converter, DocumentSession};

use super::convert::{export_xlsx, render, OutputFormat};
use super::{convert_file, load_config, InputKind, OutputNames};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "xlsx")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of converting a single file.
struct FileResult {
    path: PathBuf,
    session: Option<DocumentSession>,
    error: Option<String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let converter = Arc::new(Converter::from_config(&config)?);

    // Expand glob pattern
    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| InputKind::of(p).is_some())
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let jobs = args.jobs.max(1);
    let mut pending = stream::iter(files.into_iter().map(|path| {
        let converter = Arc::clone(&converter);
        tokio::task::spawn_blocking(move || {
            let outcome = convert_file(&converter, &path);
            (path, outcome)
        })
    }))
    .buffer_unordered(jobs);

    let mut results = Vec::new();
    while let Some(joined) = pending.next().await {
        let (path, outcome) = joined?;
        pb.inc(1);

        match outcome {
            Ok(session) => {
                results.push(FileResult {
                    path,
                    session: Some(session),
                    error: None,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(FileResult {
                        path,
                        session: None,
                        error: Some(error_msg),
                    });
                } else {
                    pb.abandon();
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }
    }

    pb.finish_and_clear();
    results.sort_by(|a, b| a.path.cmp(&b.path));

    // Write outputs
    if let Some(ref output_dir) = args.output_dir {
        let mut names = OutputNames::new();
        for result in &results {
            if let Some(session) = &result.session {
                let path = names.claim(output_dir, &result.path, args.format.extension());
                write_output(&path, session, args.format, &config.export)?;
                debug!("Wrote output to {}", path.display());
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<&FileResult> = results.iter().filter(|r| r.error.is_some()).collect();
    let empty = results
        .iter()
        .filter(|r| r.session.as_ref().is_some_and(|s| s.is_empty()))
        .count();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} without positions, {} failed",
        style(results.len() - failed.len()).green(),
        style(empty).yellow(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn write_output(
    path: &Path,
    session: &DocumentSession,
    format: OutputFormat,
    export: &ExportConfig,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Xlsx => fs::write(path, export_xlsx(&session.records, export)?)?,
        _ => fs::write(path, render(session, format)?)?,
    }
    Ok(())
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "grammar",
        "detected",
        "records",
        "unique_codes",
        "missing_codes",
        "quantity_total",
        "consistency",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(session) = &result.session {
            let stats = &session.stats;
            let status = if session.is_empty() { "empty" } else { "success" };
            wtr.write_record([
                filename,
                status,
                session.grammar().name(),
                &session.classification.detected.to_string(),
                &stats.total_records.to_string(),
                &stats.unique_codes.to_string(),
                &stats.missing_codes.to_string(),
                &stats.quantity_total.to_string(),
                consistency_label(session),
                &session.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                "",
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

fn consistency_label(session: &DocumentSession) -> &'static str {
    use ordex_core::Consistency;

    match session.consistency() {
        Consistency::Consistent => "consistent",
        Consistency::Flagged => "flagged",
        Consistency::Empty => "empty",
    }
}
