//! Release manifest format
//!
//! The manifest is published next to each content bundle. Clients compare
//! its `version` with their cached copy and download the bundle on mismatch.
//! It is rewritten whole on every release; fields this tool does not own are
//! carried over untouched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{ContentError, Result};

/// Release manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Release version (`YYYY.MM.DD.PATCH`)
    #[serde(default)]
    pub version: String,

    /// Release timestamp (ISO-8601, UTC)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub released: String,

    /// Human-readable aggregate content size
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub size: String,

    #[serde(default)]
    pub checksums: Checksums,

    /// Per-block versions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks: Option<BTreeMap<String, BlockRecord>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,

    /// Fields owned by other tools
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Checksums in either per-file or aggregate form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Checksums {
    /// `sha256:<hex>` keyed by path relative to the content root
    PerFile(BTreeMap<String, String>),
    /// One `sha256:<hex>` over the whole tree
    Aggregate(String),
}

impl Default for Checksums {
    fn default() -> Self {
        Checksums::PerFile(BTreeMap::new())
    }
}

/// Version record for one knowledge block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Semantic version, patch bumped whenever the content changes
    pub version: String,
    /// When the content last changed
    pub updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Aggregate counts over the content tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Statistics {
    pub total_files: usize,
    pub total_bytes: u64,
    pub knowledge_blocks: usize,
    pub questionnaires: usize,
    pub category_indexes: usize,
    pub resources: usize,
    pub other_files: usize,
    /// Decision nodes across all knowledge blocks
    pub decision_nodes: usize,
    /// Terminal nodes across all knowledge blocks
    pub leaf_nodes: usize,
}

impl Manifest {
    /// Load a manifest; `None` when the file does not exist yet.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            debug!(path = %path.display(), "No existing manifest");
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|e| ContentError::io(path, e))?;
        let manifest = Self::from_json(&content).map_err(|source| ContentError::InvalidManifest {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(manifest))
    }

    pub fn load_or_default(path: &Path) -> Result<Self> {
        Ok(Self::load(path)?.unwrap_or_default())
    }

    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self).map_err(ContentError::ManifestEncode)?;
        json.push('\n');
        Ok(json)
    }

    /// Write atomically: a temporary sibling is renamed over the target, so a
    /// failure never leaves a half-written manifest.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ContentError::io(parent, e))?;
        }

        let tmp = temp_path(path);
        if let Err(e) = std::fs::write(&tmp, json) {
            std::fs::remove_file(&tmp).ok();
            return Err(ContentError::io(&tmp, e));
        }
        if let Err(e) = std::fs::rename(&tmp, path) {
            std::fs::remove_file(&tmp).ok();
            return Err(ContentError::io(path, e));
        }

        info!(path = %path.display(), version = %self.version, "Manifest written");
        Ok(())
    }

    /// Stamp a release version and timestamp.
    pub fn set_release(&mut self, version: impl Into<String>, released: DateTime<Utc>) {
        self.version = version.into();
        self.released = timestamp(released);
    }
}

/// ISO-8601 UTC timestamp with second precision.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Human-readable byte count (`512 B`, `12.4 KB`, `3.0 MB`).
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

/// Sibling the manifest is staged in before being renamed into place.
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
