//! Tooling configuration
//!
//! Loaded from `pathways.toml`. Every field has a default so an absent file
//! or an empty section is valid.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::ConfigError;
use crate::walk::WalkOptions;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub manifest: ManifestConfig,
    #[serde(default)]
    pub validate: ValidateConfig,
}

/// Layout of the content tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Content root directory
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Directory (relative to root) holding knowledge blocks
    #[serde(default = "default_blocks_dir")]
    pub blocks_dir: String,

    /// Directory (relative to root) holding questionnaires
    #[serde(default = "default_questionnaires_dir")]
    pub questionnaires_dir: String,

    /// Directory (relative to root) holding category indexes
    #[serde(default = "default_categories_dir")]
    pub categories_dir: String,

    /// Directory (relative to root) that resource references resolve against
    #[serde(default = "default_resources_dir")]
    pub resources_dir: String,

    /// File and directory names skipped during traversal
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Visit dot-files and dot-directories
    #[serde(default)]
    pub include_hidden: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Manifest location, relative to the content root
    #[serde(default = "default_manifest_path")]
    pub path: String,

    /// Checksum schema written into the manifest
    #[serde(default)]
    pub mode: ChecksumMode,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidateConfig {
    /// Require referenced resources to exist under `resources_dir`
    #[serde(default)]
    pub check_resources: bool,
}

/// How checksums are recorded in the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChecksumMode {
    /// One digest per file, keyed by relative path
    #[default]
    PerFile,
    /// A single digest over the whole tree
    Aggregate,
}

impl std::fmt::Display for ChecksumMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChecksumMode::PerFile => write!(f, "per-file"),
            ChecksumMode::Aggregate => write!(f, "aggregate"),
        }
    }
}

// Defaults
fn default_root() -> PathBuf {
    PathBuf::from("content")
}
fn default_blocks_dir() -> String {
    "blocks".to_string()
}
fn default_questionnaires_dir() -> String {
    "questionnaires".to_string()
}
fn default_categories_dir() -> String {
    "categories".to_string()
}
fn default_resources_dir() -> String {
    "resources".to_string()
}
fn default_exclude() -> Vec<String> {
    vec![".DS_Store".to_string(), "Thumbs.db".to_string()]
}
fn default_manifest_path() -> String {
    "manifest.json".to_string()
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            blocks_dir: default_blocks_dir(),
            questionnaires_dir: default_questionnaires_dir(),
            categories_dir: default_categories_dir(),
            resources_dir: default_resources_dir(),
            exclude: default_exclude(),
            include_hidden: false,
        }
    }
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            path: default_manifest_path(),
            mode: ChecksumMode::default(),
        }
    }
}

impl Config {
    /// Build a default config rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.content.root = root.into();
        config
    }

    /// Load config from a TOML file, falling back to defaults when it is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Absolute-or-relative path of the manifest file.
    pub fn manifest_path(&self) -> PathBuf {
        self.content.root.join(&self.manifest.path)
    }

    /// Traversal options shared by every command: configured exclusions plus
    /// the manifest itself and its staging file.
    pub fn walk_options(&self) -> WalkOptions {
        let manifest = normalize_relative(&self.manifest.path);
        WalkOptions {
            exclude: self.content.exclude.iter().cloned().collect::<BTreeSet<_>>(),
            include_hidden: self.content.include_hidden,
            skip: BTreeSet::from([format!("{}.tmp", manifest), manifest]),
        }
    }
}

/// Render a configured relative path with `/` separators and no leading `./`.
pub(crate) fn normalize_relative(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}
