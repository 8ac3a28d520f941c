//! Manifest verification
//!
//! Re-hashes the content tree and compares it against the checksums
//! recorded in the manifest, in whichever form the manifest uses.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::checksum::ChecksumSet;
use crate::config::{ChecksumMode, Config};
use crate::error::{ContentError, Result};
use crate::manifest::{Checksums, Manifest};

/// Differences between the tree on disk and the manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Manifest version that was checked
    pub version: String,
    pub mode: Option<ChecksumMode>,
    /// Files whose digest differs
    pub modified: Vec<String>,
    /// Files recorded in the manifest but absent on disk
    pub missing: Vec<String>,
    /// Files on disk the manifest does not know about
    pub untracked: Vec<String>,
    /// Aggregate mode only: whether the whole-tree digest matched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_matches: Option<bool>,
}

impl VerifyReport {
    pub fn passed(&self) -> bool {
        self.modified.is_empty()
            && self.missing.is_empty()
            && self.untracked.is_empty()
            && self.aggregate_matches != Some(false)
    }
}

/// Compare the content tree with its manifest.
pub fn verify(config: &Config) -> Result<VerifyReport> {
    let manifest_path = config.manifest_path();
    let manifest =
        Manifest::load(&manifest_path)?.ok_or(ContentError::FileNotFound(manifest_path))?;
    let current = ChecksumSet::compute(&config.content.root, &config.walk_options())?;

    let report = compare(&manifest, &current);
    info!(
        version = %report.version,
        passed = report.passed(),
        modified = report.modified.len(),
        missing = report.missing.len(),
        untracked = report.untracked.len(),
        "Verified content against manifest"
    );
    Ok(report)
}

/// Compare already-computed checksums with a manifest.
pub fn compare(manifest: &Manifest, current: &ChecksumSet) -> VerifyReport {
    let mut report = VerifyReport {
        version: manifest.version.clone(),
        ..VerifyReport::default()
    };

    match &manifest.checksums {
        Checksums::Aggregate(expected) => {
            report.mode = Some(ChecksumMode::Aggregate);
            report.aggregate_matches = Some(*expected == current.aggregate);
        }
        Checksums::PerFile(expected) => {
            report.mode = Some(ChecksumMode::PerFile);
            let actual = current.per_file();
            for (path, digest) in expected {
                match actual.get(path) {
                    None => report.missing.push(path.clone()),
                    Some(found) if found != digest => report.modified.push(path.clone()),
                    Some(_) => {}
                }
            }
            report.untracked = actual
                .keys()
                .filter(|path| !expected.contains_key(*path))
                .cloned()
                .collect();
        }
    }

    report
}
