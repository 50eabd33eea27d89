use duplyzer::duplicates::{DuplicateFinder, FinderConfig, FinderError, Results, Strategy};
use duplyzer::scanner::hash_bytes;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

fn membership(results: &Results) -> BTreeMap<String, BTreeSet<PathBuf>> {
    results
        .iter()
        .map(|(hash, files)| (hash.clone(), files.iter().cloned().collect()))
        .collect()
}

fn scan(root: &Path, config: FinderConfig) -> Results {
    DuplicateFinder::new(config).find_duplicates(root).unwrap().0
}

/// Three levels deep, 12 non-empty files in 4 content classes, plus empties.
fn deep_tree() -> TempDir {
    let dir = tempdir().unwrap();
    let mut n = 0;
    for a in 0..2 {
        for b in 0..2 {
            let sub = dir.path().join(format!("l1-{a}/l2-{b}"));
            fs::create_dir_all(&sub).unwrap();
            for f in 0..3 {
                fs::write(sub.join(format!("f{f}.dat")), format!("class-{}", n % 4)).unwrap();
                n += 1;
            }
            fs::write(sub.join("empty"), b"").unwrap();
        }
    }
    dir
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let (results, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(results.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_scan_reference_scenario() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "hi").unwrap();
    fs::write(dir.path().join("b.txt"), "hi").unwrap();
    fs::write(dir.path().join("c.txt"), "bye").unwrap();
    fs::write(dir.path().join("empty.txt"), "").unwrap();

    let results = scan(dir.path(), FinderConfig::default());
    let groups = membership(&results);

    let expected: BTreeMap<_, _> = [
        (
            hash_bytes(b"hi"),
            BTreeSet::from([dir.path().join("a.txt"), dir.path().join("b.txt")]),
        ),
        (hash_bytes(b"bye"), BTreeSet::from([dir.path().join("c.txt")])),
    ]
    .into_iter()
    .collect();
    assert_eq!(groups, expected);
}

#[test]
fn test_scan_nested_tree_is_complete() {
    let dir = deep_tree();
    let (results, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(results.total_files(), 12);
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|(_, files)| files.len() == 3));
    assert_eq!(summary.dirs_walked, 7);
    assert_eq!(summary.duplicate_groups, 4);
    assert_eq!(summary.duplicate_files, 8);

    let all: BTreeSet<_> = results.iter().flat_map(|(_, f)| f.iter().cloned()).collect();
    assert_eq!(all.len(), 12, "a path appeared twice");
    assert!(all.iter().all(|p| p.file_name().unwrap() != "empty"));
}

#[test]
fn test_gate_bound_respected() {
    let dir = deep_tree();
    for capacity in [1, 2, 8] {
        let config = FinderConfig::default()
            .with_workers(capacity)
            .with_threads(16);
        let (_, summary) = DuplicateFinder::new(config)
            .find_duplicates(dir.path())
            .unwrap();
        assert!(
            summary.peak_concurrency <= capacity,
            "capacity {capacity}: peak {}",
            summary.peak_concurrency
        );
        assert_eq!(summary.workers, capacity);
    }
}

#[test]
fn test_capacity_one_matches_capacity_eight() {
    let dir = tempdir().unwrap();
    for (i, content) in ["x", "x", "y", "z", "x"].iter().enumerate() {
        fs::write(dir.path().join(format!("file{i}")), content).unwrap();
    }

    let one = scan(dir.path(), FinderConfig::default().with_workers(1));
    let eight = scan(dir.path(), FinderConfig::default().with_workers(8));

    assert_eq!(one.total_files(), 5);
    assert_eq!(membership(&one), membership(&eight));
}

#[test]
fn test_repeated_scans_are_idempotent() {
    let dir = deep_tree();
    let first = scan(dir.path(), FinderConfig::default().with_workers(3));
    let second = scan(dir.path(), FinderConfig::default().with_workers(3));
    assert_eq!(membership(&first), membership(&second));
}

#[test]
fn test_all_strategies_agree() {
    let dir = deep_tree();
    let reference = membership(&scan(dir.path(), FinderConfig::default()));
    for strategy in [
        Strategy::ConcurrentWalks,
        Strategy::FixedPool,
        Strategy::Sequential,
    ] {
        let config = FinderConfig::default().with_strategy(strategy).with_workers(2);
        assert_eq!(membership(&scan(dir.path(), config)), reference, "{strategy}");
    }
}

#[test]
#[cfg(unix)]
fn test_symlinks_are_not_followed() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("real"), "data").unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();
    std::os::unix::fs::symlink(dir.path(), dir.path().join("sub/loop")).unwrap();

    let results = scan(dir.path(), FinderConfig::default());
    assert_eq!(results.total_files(), 1);
}

#[test]
fn test_missing_root_fails_before_work() {
    let dir = tempdir().unwrap();
    let err = DuplicateFinder::with_defaults()
        .find_duplicates(&dir.path().join("absent"))
        .unwrap_err();
    assert!(matches!(err, FinderError::PathNotFound(_)));
}

#[test]
fn test_interrupted_scan_returns_no_results() {
    let dir = deep_tree();
    let flag = Arc::new(AtomicBool::new(true));
    for strategy in [
        Strategy::Limited,
        Strategy::ConcurrentWalks,
        Strategy::FixedPool,
        Strategy::Sequential,
    ] {
        let config = FinderConfig::default()
            .with_strategy(strategy)
            .with_shutdown_flag(flag.clone());
        let err = DuplicateFinder::new(config)
            .find_duplicates(dir.path())
            .unwrap_err();
        assert!(matches!(err, FinderError::Interrupted), "{strategy}");
    }
}
