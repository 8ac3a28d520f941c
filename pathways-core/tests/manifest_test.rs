//! Manifest generation and verification integration tests
//!
//! Runs the generator against content trees on disk:
//! - Deterministic digests across runs
//! - Merge policy for fields the generator does not own
//! - Per-block version bumps across releases
//! - Verification of a tree against its manifest

use std::path::Path;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use pathways_core::{
    next_version, verify, BlockStatus, ChecksumMode, Checksums, Config, ContentError,
    GenerateOptions, Manifest, ManifestGenerator,
};
use serde_json::Value;
use tempfile::TempDir;

const E2E_BLOCK: &str = r#"id: e2e-testing
title: 'X'
initial_question: 'Q?'
paths:
  yes:
    resources: [a.md]
  no:
    summary: Done
metadata:
  author: x
"#;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn content_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "blocks/e2e-testing.yaml", E2E_BLOCK);
    write(dir.path(), "resources/a.md", "# A\n");
    write(dir.path(), "questionnaires/intake.json", r#"{"id": "intake"}"#);
    dir
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 12, day, hour, 0, 0).unwrap()
}

fn generate(config: &Config, now: DateTime<Utc>) -> Manifest {
    let generator = ManifestGenerator::new(config);
    let outcome = generator.generate(&GenerateOptions::at(now)).unwrap();
    generator.write(&outcome).unwrap();
    outcome.manifest
}

// =============================================================================
// Generation
// =============================================================================

#[test]
fn test_first_run_creates_manifest() {
    let dir = content_tree();
    let config = Config::with_root(dir.path());

    let manifest = generate(&config, at(15, 10));

    let Checksums::PerFile(files) = &manifest.checksums else {
        panic!("expected per-file checksums, got {:?}", manifest.checksums);
    };
    let paths: Vec<_> = files.keys().map(String::as_str).collect();
    assert_eq!(
        paths,
        vec!["blocks/e2e-testing.yaml", "questionnaires/intake.json", "resources/a.md"]
    );
    assert!(files.values().all(|d| d.starts_with("sha256:") && d.len() == 7 + 64));

    let stats = manifest.statistics.as_ref().unwrap();
    assert_eq!(stats.total_files, 3);
    assert_eq!(stats.knowledge_blocks, 1);
    assert_eq!(stats.questionnaires, 1);
    assert_eq!(stats.resources, 1);
    assert_eq!(stats.leaf_nodes, 2);

    let blocks = manifest.blocks.as_ref().unwrap();
    assert_eq!(blocks["e2e-testing"].version, "1.0.0");
    assert_eq!(blocks["e2e-testing"].updated, "2024-12-15T10:00:00Z");

    // No version was supplied, so none is invented
    assert_eq!(manifest.version, "");
    assert!(config.manifest_path().is_file());
}

#[test]
fn test_unchanged_content_is_idempotent() {
    let dir = content_tree();
    let config = Config::with_root(dir.path());

    generate(&config, at(15, 10));
    let first = std::fs::read_to_string(config.manifest_path()).unwrap();
    generate(&config, at(16, 10));
    let second = std::fs::read_to_string(config.manifest_path()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_unowned_fields_preserved() {
    let dir = content_tree();
    let config = Config::with_root(dir.path());
    write(
        dir.path(),
        "manifest.json",
        r#"{
  "version": "2024.12.14.3",
  "released": "2024-12-14T08:00:00Z",
  "size": "1 B",
  "checksums": "sha256:stale",
  "minAppVersion": "3.1.0",
  "channels": {"beta": true}
}"#,
    );

    let manifest = generate(&config, at(15, 10));

    assert_eq!(manifest.version, "2024.12.14.3");
    assert_eq!(manifest.released, "2024-12-14T08:00:00Z");
    assert_eq!(manifest.size, "152 B");
    assert!(matches!(manifest.checksums, Checksums::PerFile(_)));

    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(config.manifest_path()).unwrap()).unwrap();
    assert_eq!(written["minAppVersion"], "3.1.0");
    assert_eq!(written["channels"]["beta"], true);
}

#[test]
fn test_supplied_version_refreshes_release() {
    let dir = content_tree();
    let config = Config::with_root(dir.path());
    let generator = ManifestGenerator::new(&config);

    let options = GenerateOptions {
        version: Some("2024.12.15.0".to_string()),
        ..GenerateOptions::at(at(15, 10))
    };
    let outcome = generator.generate(&options).unwrap();

    assert_eq!(outcome.manifest.version, "2024.12.15.0");
    assert_eq!(outcome.manifest.released, "2024-12-15T10:00:00Z");
}

#[test]
fn test_block_versions_follow_content() {
    let dir = content_tree();
    let config = Config::with_root(dir.path());
    generate(&config, at(15, 10));

    write(
        dir.path(),
        "blocks/e2e-testing.yaml",
        &E2E_BLOCK.replace("Done", "All done"),
    );
    write(dir.path(), "blocks/hosting.yaml", &E2E_BLOCK.replace("e2e-testing", "hosting"));

    let generator = ManifestGenerator::new(&config);
    let outcome = generator.generate(&GenerateOptions::at(at(16, 9))).unwrap();
    generator.write(&outcome).unwrap();

    let statuses: Vec<_> = outcome
        .changed_blocks()
        .map(|c| (c.id.as_str(), c.status, c.version.as_str()))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("e2e-testing", BlockStatus::Changed, "1.0.1"),
            ("hosting", BlockStatus::Added, "1.0.0"),
        ]
    );

    let blocks = outcome.manifest.blocks.as_ref().unwrap();
    assert_eq!(blocks["e2e-testing"].updated, "2024-12-16T09:00:00Z");

    // Removing a block drops it from the manifest
    std::fs::remove_file(dir.path().join("blocks/hosting.yaml")).unwrap();
    let outcome = generator.generate(&GenerateOptions::at(at(17, 9))).unwrap();
    assert!(outcome
        .blocks
        .iter()
        .any(|c| c.id == "hosting" && c.status == BlockStatus::Removed));
    assert!(!outcome.manifest.blocks.unwrap().contains_key("hosting"));
}

#[test]
fn test_aggregate_mode() {
    let dir = content_tree();
    let mut config = Config::with_root(dir.path());
    config.manifest.mode = ChecksumMode::Aggregate;

    let manifest = generate(&config, at(15, 10));
    let Checksums::Aggregate(digest) = &manifest.checksums else {
        panic!("expected aggregate checksum");
    };
    assert!(digest.starts_with("sha256:"));

    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(config.manifest_path()).unwrap()).unwrap();
    assert_eq!(written["checksums"], Value::String(digest.clone()));
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = content_tree();
    let config = Config::with_root(dir.path());

    let outcome = ManifestGenerator::new(&config)
        .generate(&GenerateOptions::at(at(15, 10)))
        .unwrap();

    assert_eq!(outcome.checksums.files.len(), 3);
    assert!(!config.manifest_path().exists());
}

#[test]
fn test_leftover_staging_file_not_hashed() {
    let dir = content_tree();
    write(dir.path(), "manifest.json.tmp", "{ half writ");
    let config = Config::with_root(dir.path());

    let manifest = generate(&config, at(15, 10));

    let Checksums::PerFile(files) = &manifest.checksums else {
        panic!("expected per-file checksums");
    };
    assert!(!files.contains_key("manifest.json.tmp"));
    assert_eq!(manifest.statistics.unwrap().total_files, 3);
}

#[test]
fn test_corrupt_manifest_aborts() {
    let dir = content_tree();
    write(dir.path(), "manifest.json", "{ not json");
    let config = Config::with_root(dir.path());

    let result = ManifestGenerator::new(&config).generate(&GenerateOptions::at(at(15, 10)));
    assert!(matches!(result, Err(ContentError::InvalidManifest { .. })));
    assert_eq!(
        std::fs::read_to_string(config.manifest_path()).unwrap(),
        "{ not json"
    );
}

// =============================================================================
// Verification
// =============================================================================

#[test]
fn test_verify_after_generate() {
    let dir = content_tree();
    let config = Config::with_root(dir.path());
    generate(&config, at(15, 10));

    assert!(verify(&config).unwrap().passed());

    write(dir.path(), "resources/a.md", "# B\n");
    write(dir.path(), "resources/b.md", "# B\n");
    std::fs::remove_file(dir.path().join("questionnaires/intake.json")).unwrap();

    let report = verify(&config).unwrap();
    assert!(!report.passed());
    assert_eq!(report.modified, vec!["resources/a.md".to_string()]);
    assert_eq!(report.missing, vec!["questionnaires/intake.json".to_string()]);
    assert_eq!(report.untracked, vec!["resources/b.md".to_string()]);
}

#[test]
fn test_verify_without_manifest() {
    let dir = content_tree();
    let config = Config::with_root(dir.path());
    assert!(matches!(verify(&config), Err(ContentError::FileNotFound(_))));
}

// =============================================================================
// Release versions
// =============================================================================

#[test]
fn test_release_version_sequence() {
    let today = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();

    let first = next_version(today, Vec::<String>::new()).unwrap();
    assert_eq!(first.to_string(), "2024.12.15.0");

    let tags = vec![first.to_string(), "2024.12.14.7".to_string()];
    assert_eq!(next_version(today, &tags).unwrap().to_string(), "2024.12.15.1");
}
