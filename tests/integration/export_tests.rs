use clap::Parser;
use duplyzer::cli::Cli;
use duplyzer::duplicates::DuplicateFinder;
use duplyzer::error::ExitCode;
use duplyzer::output::json::JsonGroup;
use duplyzer::output::{CsvOutput, JsonOutput, TextOutput};
use duplyzer::scanner::hash_bytes;
use std::fs;
use tempfile::{tempdir, TempDir};

fn sample_tree() -> TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hi").unwrap();
    fs::write(dir.path().join("b.txt"), "hi").unwrap();
    fs::write(dir.path().join("c.txt"), "bye").unwrap();
    dir
}

fn run(args: &[&str]) -> ExitCode {
    let mut argv = vec!["duplyzer", "-q"];
    argv.extend_from_slice(args);
    duplyzer::run_app(Cli::try_parse_from(argv).unwrap()).unwrap()
}

#[test]
fn test_json_export_covers_every_digest() {
    let dir = sample_tree();
    let (results, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    let json = JsonOutput::new(&results).to_json().unwrap();
    let groups: Vec<JsonGroup> = serde_json::from_str(&json).unwrap();

    assert_eq!(groups.len(), 2);
    assert!(groups.windows(2).all(|w| w[0].hash < w[1].hash));
    let hi = groups.iter().find(|g| g.hash == hash_bytes(b"hi")).unwrap();
    assert_eq!(hi.files.len(), 2);
    let bye = groups.iter().find(|g| g.hash == hash_bytes(b"bye")).unwrap();
    assert_eq!(
        bye.files,
        vec![dir.path().join("c.txt").to_string_lossy().into_owned()]
    );
}

#[test]
fn test_csv_export_one_row_per_digest() {
    let dir = sample_tree();
    let (results, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    let csv = CsvOutput::new(&results).to_csv_string().unwrap();
    let rows: Vec<Vec<&str>> = csv.lines().map(|l| l.split(',').collect()).collect();

    assert_eq!(rows.len(), 2);
    let hi = hash_bytes(b"hi");
    let row = rows.iter().find(|r| r[0] == hi).unwrap();
    assert_eq!(row.len(), 3);
    assert!(rows.iter().any(|r| r.len() == 2));
}

#[test]
fn test_text_output_lists_duplicates_only() {
    let dir = sample_tree();
    let (results, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    let text = TextOutput::new(&results).to_text();
    let lines: Vec<&str> = text.lines().collect();
    let hi = hash_bytes(b"hi");

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], format!("{} 2", &hi[hi.len() - 7..]));
    assert!(lines[1..].iter().all(|l| l.starts_with("   ")));
    assert!(!text.contains("c.txt"));
}

#[test]
fn test_run_app_writes_json_report() {
    let dir = sample_tree();
    let out = tempdir().unwrap();
    let report = out.path().join("report.json");

    let code = run(&[
        "scan",
        dir.path().to_str().unwrap(),
        "--output",
        "json",
        "--pretty",
        "--output-file",
        report.to_str().unwrap(),
        "--no-progress",
    ]);

    assert_eq!(code, ExitCode::Success);
    let groups: Vec<JsonGroup> =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(groups.len(), 2);
}

#[test]
fn test_run_app_reports_no_duplicates() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("only.txt"), "solo").unwrap();
    let out = tempdir().unwrap();
    let report = out.path().join("report.csv");

    let code = run(&[
        "scan",
        dir.path().to_str().unwrap(),
        "--strategy",
        "sequential",
        "--output",
        "csv",
        "--output-file",
        report.to_str().unwrap(),
    ]);

    assert_eq!(code, ExitCode::NoDuplicates);
    assert_eq!(fs::read_to_string(&report).unwrap().lines().count(), 1);
}
