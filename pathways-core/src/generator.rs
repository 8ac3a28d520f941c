//! Manifest generation
//!
//! One pass over the content tree produces per-file and aggregate digests,
//! tree statistics and per-block digests. The result is merged into the
//! previous manifest:
//!
//! - `checksums`, `size` and `statistics` are replaced wholesale
//! - `version`/`released` change only when a version is supplied
//! - a block whose digest changed gets its patch version bumped
//! - everything else is carried over

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::checksum::{ChecksumSet, TreeHasher};
use crate::config::{ChecksumMode, Config};
use crate::error::Result;
use crate::manifest::{format_size, timestamp, BlockRecord, Checksums, Manifest, Statistics};
use crate::model::{parse_document, Classified, ContentKind, TreeStats};
use crate::version::SemVer;
use crate::walk::{walk_files, ContentFile};

/// Inputs that vary per run
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Timestamp recorded for changed blocks and new releases
    pub now: DateTime<Utc>,
    /// Release version to stamp; `None` leaves the manifest's version alone
    pub version: Option<String>,
    /// Overrides the configured checksum mode
    pub mode: Option<ChecksumMode>,
}

impl GenerateOptions {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            version: None,
            mode: None,
        }
    }
}

/// What happened to a block between two manifests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockStatus {
    Added,
    Changed,
    Unchanged,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockChange {
    pub id: String,
    pub status: BlockStatus,
    /// Version after this run (the last recorded one for removed blocks)
    pub version: String,
}

/// Result of a generation run, not yet persisted
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub manifest: Manifest,
    pub checksums: ChecksumSet,
    pub mode: ChecksumMode,
    pub blocks: Vec<BlockChange>,
}

impl GenerateOutcome {
    pub fn changed_blocks(&self) -> impl Iterator<Item = &BlockChange> {
        self.blocks
            .iter()
            .filter(|b| b.status != BlockStatus::Unchanged)
    }
}

/// Builds manifests for a content tree
#[derive(Debug, Clone)]
pub struct ManifestGenerator {
    config: Config,
}

impl ManifestGenerator {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Digest the tree and merge the result into the existing manifest.
    /// Nothing is written; see [`ManifestGenerator::write`].
    pub fn generate(&self, options: &GenerateOptions) -> Result<GenerateOutcome> {
        let root = &self.config.content.root;
        let mode = options.mode.unwrap_or(self.config.manifest.mode);
        info!(root = %root.display(), mode = %mode, "Generating checksums");

        let mut hasher = TreeHasher::new();
        let mut tally = Tally::default();
        walk_files(root, &self.config.walk_options(), |file| {
            let bytes = file.read()?;
            let digest = hasher.add(&file.relative, &bytes).digest.clone();
            tally.record(file, &bytes, digest, &self.config);
            Ok(None::<()>)
        })?;
        let checksums = hasher.finish();

        let previous = Manifest::load(&self.config.manifest_path())?.unwrap_or_default();
        let (manifest, blocks) = merge(previous, &checksums, tally, mode, options);

        info!(
            files = checksums.files.len(),
            size = %manifest.size,
            changed_blocks = blocks.iter().filter(|b| b.status != BlockStatus::Unchanged).count(),
            "Checksums generated"
        );

        Ok(GenerateOutcome {
            manifest,
            checksums,
            mode,
            blocks,
        })
    }

    /// Persist a generated manifest.
    pub fn write(&self, outcome: &GenerateOutcome) -> Result<()> {
        outcome.manifest.save(&self.config.manifest_path())
    }
}

/// Per-run accumulation while walking
#[derive(Debug, Default)]
struct Tally {
    statistics: Statistics,
    tree: TreeStats,
    /// Block id to digest, in traversal order
    blocks: Vec<(String, String)>,
}

impl Tally {
    fn record(&mut self, file: &ContentFile, bytes: &[u8], digest: String, config: &Config) {
        let stats = &mut self.statistics;
        stats.total_files += 1;
        stats.total_bytes += bytes.len() as u64;

        match Classified::of(file, &config.content) {
            Some(Classified { kind: ContentKind::KnowledgeBlock, format }) => {
                stats.knowledge_blocks += 1;
                let id = file.stem().unwrap_or_default();
                if self.blocks.iter().any(|(seen, _)| *seen == id) {
                    warn!(block = %id, file = %file.relative, "Duplicate block id, later file wins");
                    self.blocks.retain(|(seen, _)| *seen != id);
                }
                self.blocks.push((id, digest));

                match std::str::from_utf8(bytes)
                    .map_err(|e| e.to_string())
                    .and_then(|source| parse_document(source, format))
                {
                    Ok(doc) => self.tree += TreeStats::of(&doc),
                    Err(e) => warn!(file = %file.relative, error = %e, "Skipping tree statistics"),
                }
            }
            Some(Classified { kind: ContentKind::Questionnaire, .. }) => stats.questionnaires += 1,
            Some(Classified { kind: ContentKind::CategoryIndex, .. }) => stats.category_indexes += 1,
            None if is_resource(file, config) => stats.resources += 1,
            None => stats.other_files += 1,
        }
    }
}

fn is_resource(file: &ContentFile, config: &Config) -> bool {
    file.top_dir() == Some(config.content.resources_dir.as_str())
        || file.extension().as_deref() == Some("md")
}

fn merge(
    mut manifest: Manifest,
    checksums: &ChecksumSet,
    tally: Tally,
    mode: ChecksumMode,
    options: &GenerateOptions,
) -> (Manifest, Vec<BlockChange>) {
    let now = timestamp(options.now);

    manifest.checksums = match mode {
        ChecksumMode::PerFile => Checksums::PerFile(checksums.per_file()),
        ChecksumMode::Aggregate => Checksums::Aggregate(checksums.aggregate.clone()),
    };
    manifest.size = format_size(checksums.total_bytes());
    manifest.statistics = Some(Statistics {
        decision_nodes: tally.tree.nodes,
        leaf_nodes: tally.tree.leaves,
        ..tally.statistics
    });

    let (blocks, changes) = merge_blocks(manifest.blocks.take().unwrap_or_default(), &tally.blocks, &now);
    manifest.blocks = (!blocks.is_empty()).then_some(blocks);

    if let Some(version) = &options.version {
        manifest.set_release(version.clone(), options.now);
    }

    (manifest, changes)
}

fn merge_blocks(
    mut previous: BTreeMap<String, BlockRecord>,
    current: &[(String, String)],
    now: &str,
) -> (BTreeMap<String, BlockRecord>, Vec<BlockChange>) {
    let mut merged = BTreeMap::new();
    let mut changes = Vec::new();

    for (id, digest) in current {
        let (record, status) = match previous.remove(id) {
            None => (
                BlockRecord {
                    version: SemVer::INITIAL.to_string(),
                    updated: now.to_string(),
                    checksum: Some(digest.clone()),
                    extra: Default::default(),
                },
                BlockStatus::Added,
            ),
            Some(record) if record.checksum.as_deref() == Some(digest.as_str()) => {
                (record, BlockStatus::Unchanged)
            }
            Some(record) => {
                let version = match record.version.parse::<SemVer>() {
                    Ok(version) => bump_block(id, version),
                    Err(e) => {
                        warn!(block = %id, error = %e, "Unreadable block version, reseeding");
                        SemVer::INITIAL
                    }
                };
                (
                    BlockRecord {
                        version: version.to_string(),
                        updated: now.to_string(),
                        checksum: Some(digest.clone()),
                        ..record
                    },
                    BlockStatus::Changed,
                )
            }
        };

        changes.push(BlockChange {
            id: id.clone(),
            status,
            version: record.version.clone(),
        });
        merged.insert(id.clone(), record);
    }

    for (id, record) in previous {
        changes.push(BlockChange {
            id,
            status: BlockStatus::Removed,
            version: record.version,
        });
    }

    (merged, changes)
}

/// Patch bump, rolling over into the minor number once the patch is saturated.
fn bump_block(id: &str, version: SemVer) -> SemVer {
    if let Some(next) = version.bump_patch() {
        return next;
    }
    match version.bump_minor() {
        Some(next) => {
            warn!(block = %id, from = %version, to = %next, "Patch number exhausted, bumping minor");
            next
        }
        None => {
            warn!(block = %id, version = %version, "Block version exhausted, keeping it");
            version
        }
    }
}
