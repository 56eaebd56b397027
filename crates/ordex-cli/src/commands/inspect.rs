//! Inspect command - show how a document is read before it is converted.

use std::path::PathBuf;

use clap::Args;
use console::style;

use ordex_core::order::rules::{
    extract_code, extract_quantity, parse_position, strip_position, CodeExtractor,
    FieldExtractor,
};
use ordex_core::{Converter, DocumentSession};

use super::{convert_file, load_config};

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Input file (PDF or .txt)
    #[arg(required = true)]
    input: PathBuf,

    /// Also show the lines after continuation merging
    #[arg(long)]
    merged: bool,

    /// Show the raw extracted lines before normalization
    #[arg(long)]
    raw: bool,
}

pub async fn run(args: InspectArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let converter = Converter::from_config(&config)?;
    let session = convert_file(&converter, &args.input)?;

    if args.raw {
        println!("{}", style("Raw lines").bold());
        for (i, line) in session.raw_lines.iter().enumerate() {
            println!("{:>4}  {}", i, line);
        }
        println!();
    }

    println!("{}", style("Normalized lines").bold());
    print_annotated(&session.lines);

    if args.merged {
        let merged = converter.normalizer().normalize_merged(&session.lines);
        println!();
        println!("{}", style("Merged lines").bold());
        print_annotated(&merged);
    }

    println!();
    print_classification(&converter, &session);

    Ok(())
}

fn print_annotated(lines: &[String]) {
    for (i, line) in lines.iter().enumerate() {
        let tags = annotate(line);
        if tags.is_empty() {
            println!("{:>4}  {}", i, line);
        } else {
            println!("{:>4}  {}  {}", i, line, style(tags.join(", ")).cyan());
        }
    }
}

/// Fields recognized on one line.
pub fn annotate(line: &str) -> Vec<String> {
    let mut tags = Vec::new();

    let body = match parse_position(line) {
        Some(position) => {
            tags.push(format!("record start {}", position));
            strip_position(line)
        }
        None => line,
    };

    if let Some(found) = CodeExtractor::labeled().extract(body) {
        tags.push(format!("labeled code {}", found.value));
    } else if let Some(code) = extract_code(body) {
        tags.push(format!("code {}", code));
    }

    if let Some(quantity) = extract_quantity(body) {
        tags.push(format!("quantity {}", quantity));
    }

    tags
}

fn print_classification(converter: &Converter, session: &DocumentSession) {
    println!("{}", style("Layout predicates").bold());
    for (grammar, matched) in converter.classifier().evaluate(&session.lines) {
        let mark = if matched {
            style("yes").green()
        } else {
            style("no").dim()
        };
        println!("  {:<20} {}", grammar.to_string(), mark);
    }

    let classification = session.classification;
    let how = if classification.forced {
        "forced"
    } else if classification.detected {
        "detected"
    } else {
        "fallback"
    };

    println!();
    println!(
        "Selected grammar: {} ({})",
        style(classification.grammar).bold(),
        how
    );
    println!(
        "Positions: {}, consistency: {:?}",
        session.records.len(),
        session.consistency()
    );
}
