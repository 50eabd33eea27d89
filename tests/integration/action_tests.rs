use clap::Parser;
use duplyzer::actions::{manage_duplicates, Action, ManageConfig};
use duplyzer::cli::Cli;
use duplyzer::duplicates::DuplicateFinder;
use duplyzer::error::ExitCode;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_scan_then_delete_leaves_one_copy() {
    let dir = tempdir().unwrap();
    for name in ["a", "b", "c"] {
        fs::write(dir.path().join(name), "same").unwrap();
    }
    fs::write(dir.path().join("d"), "different").unwrap();

    let finder = DuplicateFinder::with_defaults();
    let (results, _) = finder.find_duplicates(dir.path()).unwrap();
    let report = manage_duplicates(&results, &ManageConfig::new(Action::Delete)).unwrap();

    assert_eq!(report.successes.len(), 2);
    let (rescanned, summary) = finder.find_duplicates(dir.path()).unwrap();
    assert_eq!(rescanned.total_files(), 2);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
#[cfg(unix)]
fn test_hard_link_shares_inode() {
    use std::os::unix::fs::MetadataExt;

    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    let links = dir.path().join("links");
    fs::create_dir(&src).unwrap();
    fs::create_dir(&links).unwrap();
    fs::write(src.join("one"), "same").unwrap();
    fs::write(src.join("two"), "same").unwrap();

    let (results, _) = DuplicateFinder::with_defaults().find_duplicates(&src).unwrap();
    let config = ManageConfig::new(Action::HardLink).with_target_dir(&links);
    let report = manage_duplicates(&results, &config).unwrap();

    assert_eq!(report.successes.len(), 1);
    let outcome = &report.successes[0];
    let dest = outcome.destination.as_ref().unwrap();
    assert_eq!(
        fs::metadata(&outcome.source).unwrap().ino(),
        fs::metadata(dest).unwrap().ino()
    );
}

#[test]
fn test_run_app_dry_run_move() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    let target = dir.path().join("target");
    fs::create_dir(&src).unwrap();
    fs::create_dir(&target).unwrap();
    fs::write(src.join("x"), "dup").unwrap();
    fs::write(src.join("y"), "dup").unwrap();
    let report = dir.path().join("out.txt");

    let cli = Cli::try_parse_from([
        "duplyzer",
        "-q",
        "scan",
        src.to_str().unwrap(),
        "--action",
        "move",
        "--target-dir",
        target.to_str().unwrap(),
        "--dry-run",
        "--output-file",
        report.to_str().unwrap(),
    ])
    .unwrap();
    let code = duplyzer::run_app(cli).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(src.join("x").exists());
    assert!(src.join("y").exists());
    assert_eq!(fs::read_dir(&target).unwrap().count(), 0);
}

#[test]
fn test_run_app_move_collision_is_partial_success() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    let target = dir.path().join("target");
    fs::create_dir(&src).unwrap();
    fs::create_dir(&target).unwrap();
    fs::write(src.join("x"), "dup").unwrap();
    fs::write(src.join("y"), "dup").unwrap();
    // Whichever of x or y is moved, its name is already taken.
    fs::write(target.join("x"), "taken").unwrap();
    fs::write(target.join("y"), "taken").unwrap();
    let report = dir.path().join("out.txt");

    let cli = Cli::try_parse_from([
        "duplyzer",
        "-q",
        "scan",
        src.to_str().unwrap(),
        "--action",
        "move",
        "--target-dir",
        target.to_str().unwrap(),
        "--output-file",
        report.to_str().unwrap(),
    ])
    .unwrap();
    let code = duplyzer::run_app(cli).unwrap();

    assert_eq!(code, ExitCode::PartialSuccess);
    assert!(src.join("x").exists());
    assert!(src.join("y").exists());
    assert_eq!(fs::read_to_string(target.join("x")).unwrap(), "taken");
}
