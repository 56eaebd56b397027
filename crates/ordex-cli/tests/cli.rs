use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const HEADER_BELOW: &str = "Zamówienie nr 15/2024\n\
                            1  Widget  4 szt.\n\
                            Kod kres.: 5901234123457\n\
                            2  Gadget  12 szt.\n\
                            Kod kres.: 5901234123464\n\
                            Strona 1 z 1\n";

const SINGLE_LINE_CODED: &str = "5029040012366 Widget 96,00 szt.\n\
                                 5901234123464 Gadget 2 szt.\n";

fn ordex() -> Command {
    Command::cargo_bin("ordex").unwrap()
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// A config file with defaults, so the user's own config never leaks in.
fn default_config(dir: &Path) -> PathBuf {
    write(dir, "config.json", "{}")
}

#[test]
fn test_convert_json_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "order.txt", HEADER_BELOW);
    let config = default_config(dir.path());

    ordex()
        .args(["convert", "-f", "json", "-c"])
        .arg(&config)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"grammar\": \"header_code_below\""))
        .stdout(predicate::str::contains("\"code\": \"5901234123464\""))
        .stdout(predicate::str::contains("\"consistency\": \"consistent\""));
}

#[test]
fn test_convert_csv_file() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "order.txt", SINGLE_LINE_CODED);
    let config = default_config(dir.path());
    let output = dir.path().join("order.csv");

    ordex()
        .arg("convert")
        .arg(&input)
        .arg("-c")
        .arg(&config)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let csv = fs::read_to_string(&output).unwrap();
    assert_eq!(
        csv,
        "position,code,quantity\n1,5029040012366,96\n2,5901234123464,2\n"
    );
}

#[test]
fn test_convert_xlsx_file() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "order.txt", HEADER_BELOW);
    let config = default_config(dir.path());
    let output = dir.path().join("order.xlsx");

    ordex()
        .arg("convert")
        .arg(&input)
        .arg("-c")
        .arg(&config)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 positions written"));

    let bytes = fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[test]
fn test_xlsx_needs_output_file() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "order.txt", HEADER_BELOW);
    let config = default_config(dir.path());

    ordex()
        .args(["convert", "-f", "xlsx", "-c"])
        .arg(&config)
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output"));
}

#[test]
fn test_no_positions_found() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "notes.txt", "Uwagi do zamówienia\nDostawa we wtorek\n");
    let config = default_config(dir.path());

    ordex()
        .arg("convert")
        .arg(&input)
        .arg("-c")
        .arg(&config)
        .assert()
        .success()
        .stderr(predicate::str::contains("No positions found"));
}

#[test]
fn test_empty_document_fails() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "empty.txt", "\n\n");
    let config = default_config(dir.path());

    ordex()
        .arg("convert")
        .arg(&input)
        .arg("-c")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("OCR"));
}

#[test]
fn test_forced_grammar_from_config() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "order.txt", HEADER_BELOW);
    let config = write(
        dir.path(),
        "config.json",
        r#"{ "parsing": { "forced_grammar": "single_line_coded" } }"#,
    );

    ordex()
        .args(["convert", "-f", "json", "-c"])
        .arg(&config)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"grammar\": \"single_line_coded\""))
        .stdout(predicate::str::contains("\"consistency\": \"empty\""));
}

#[test]
fn test_unknown_grammar_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "order.txt", HEADER_BELOW);

    ordex()
        .args(["convert", "--grammar", "tabular"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown grammar"));
}

#[test]
fn test_batch_with_summary() {
    let dir = TempDir::new().unwrap();
    let inputs = dir.path().join("in");
    fs::create_dir_all(&inputs).unwrap();
    write(&inputs, "a.txt", HEADER_BELOW);
    write(&inputs, "b.txt", SINGLE_LINE_CODED);
    write(&inputs, "c.txt", "");
    let config = default_config(dir.path());
    let output = dir.path().join("out");

    let pattern = format!("{}/*.txt", inputs.display());
    ordex()
        .args(["batch", &pattern, "-f", "json", "--summary", "--continue-on-error", "-c"])
        .arg(&config)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed 3 files"));

    assert!(output.join("a.json").exists());
    assert!(output.join("b.json").exists());
    assert!(!output.join("c.json").exists());

    let summary = fs::read_to_string(output.join("summary.csv")).unwrap();
    let rows: Vec<&str> = summary.lines().collect();
    assert_eq!(rows.len(), 4);
    assert!(rows[0].starts_with("filename,status,grammar"));
    assert!(rows[1].starts_with("a.txt,success,header_code_below,true,2,2,0,16,consistent,"));
    assert!(rows[2].starts_with("b.txt,success,single_line_coded,true,2,2,0,98,consistent,"));
    assert!(rows[3].starts_with("c.txt,error,"));
}

#[test]
fn test_batch_keeps_outputs_with_same_stem_apart() {
    let dir = TempDir::new().unwrap();
    let inputs = dir.path().join("in");
    fs::create_dir_all(&inputs).unwrap();
    write(&inputs, "order.text", SINGLE_LINE_CODED);
    write(&inputs, "order.txt", HEADER_BELOW);
    let config = default_config(dir.path());
    let output = dir.path().join("out");

    let pattern = format!("{}/order.*", inputs.display());
    ordex()
        .args(["batch", &pattern, "-f", "json", "-c"])
        .arg(&config)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let first = fs::read_to_string(output.join("order.json")).unwrap();
    let second = fs::read_to_string(output.join("order.txt.json")).unwrap();
    assert!(first.contains("\"grammar\": \"single_line_coded\""));
    assert!(second.contains("\"grammar\": \"header_code_below\""));
}

#[test]
fn test_batch_stops_on_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "empty.txt", "");
    let config = default_config(dir.path());

    let pattern = format!("{}/*.txt", dir.path().display());
    ordex()
        .args(["batch", &pattern, "-c"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Processing failed"));
}

#[test]
fn test_inspect_annotates_lines() {
    let dir = TempDir::new().unwrap();
    let input = write(dir.path(), "order.txt", HEADER_BELOW);
    let config = default_config(dir.path());

    ordex()
        .arg("inspect")
        .arg(&input)
        .arg("-c")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("record start 2"))
        .stdout(predicate::str::contains("labeled code 5901234123457"))
        .stdout(predicate::str::contains("Selected grammar: header_code_below (detected)"));
}
