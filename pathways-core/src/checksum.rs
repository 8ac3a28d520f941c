//! Content checksums
//!
//! Every file gets a SHA-256 digest of its raw bytes. The whole tree also
//! gets one aggregate digest: a single hash context fed, in traversal
//! order, each file's relative path followed by its bytes. Renaming a file
//! or changing one byte changes the aggregate.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{ContentError, Result};
use crate::walk::{walk_files, WalkOptions};

/// Prefix naming the digest algorithm in rendered checksums
pub const DIGEST_PREFIX: &str = "sha256:";

/// Render the SHA-256 of `bytes` as `sha256:<hex>`.
pub fn digest_bytes(bytes: &[u8]) -> String {
    render(Sha256::digest(bytes).as_slice())
}

/// Digest a single file on disk.
pub fn digest_file(path: &Path) -> Result<FileDigest> {
    if !path.is_file() {
        return Err(ContentError::FileNotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path).map_err(|e| ContentError::io(path, e))?;
    Ok(FileDigest {
        path: path.display().to_string(),
        digest: digest_bytes(&bytes),
        size: bytes.len() as u64,
    })
}

fn render(hash: &[u8]) -> String {
    format!("{}{}", DIGEST_PREFIX, hex::encode(hash))
}

/// Digest of one file in the tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDigest {
    /// Path relative to the content root
    pub path: String,
    pub digest: String,
    pub size: u64,
}

/// Incrementally digests files in traversal order
pub struct TreeHasher {
    aggregate: Sha256,
    files: Vec<FileDigest>,
}

impl TreeHasher {
    pub fn new() -> Self {
        Self {
            aggregate: Sha256::new(),
            files: Vec::new(),
        }
    }

    /// Feed one file; files must arrive in traversal order.
    pub fn add(&mut self, relative: &str, bytes: &[u8]) -> &FileDigest {
        self.aggregate.update(relative.as_bytes());
        self.aggregate.update(bytes);
        self.files.push(FileDigest {
            path: relative.to_string(),
            digest: digest_bytes(bytes),
            size: bytes.len() as u64,
        });
        &self.files[self.files.len() - 1]
    }

    pub fn finish(self) -> ChecksumSet {
        ChecksumSet {
            aggregate: render(self.aggregate.finalize().as_slice()),
            files: self.files,
        }
    }
}

impl Default for TreeHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Digests for a whole content tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumSet {
    /// Per-file digests in traversal order
    pub files: Vec<FileDigest>,
    /// Digest over every path and its content
    pub aggregate: String,
}

impl ChecksumSet {
    /// Walk `root` and digest every file the options admit.
    pub fn compute(root: &Path, options: &WalkOptions) -> Result<Self> {
        let mut hasher = TreeHasher::new();
        walk_files(root, options, |file| {
            let bytes = file.read()?;
            hasher.add(&file.relative, &bytes);
            Ok(None::<()>)
        })?;

        let set = hasher.finish();
        debug!(
            files = set.files.len(),
            aggregate = %set.aggregate,
            "Computed content checksums"
        );
        Ok(set)
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Digests keyed by relative path
    pub fn per_file(&self) -> BTreeMap<String, String> {
        self.files
            .iter()
            .map(|f| (f.path.clone(), f.digest.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    impl ChecksumSet {
        fn get(&self, relative: &str) -> Option<&FileDigest> {
            self.files.iter().find(|f| f.path == relative)
        }
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "blocks/e2e-testing.yaml", "id: e2e-testing\n");
        write(dir.path(), "resources/a.md", "# A\n");
        write(dir.path(), "manifest.json", "{}");
        dir
    }

    fn options() -> WalkOptions {
        WalkOptions {
            skip: ["manifest.json".to_string()].into(),
            ..WalkOptions::default()
        }
    }

    #[test]
    fn test_digest_known_value() {
        // SHA256 of "hello world"
        assert_eq!(
            digest_bytes(b"hello world"),
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_compute_is_deterministic_and_skips_manifest() {
        let dir = tree();
        let first = ChecksumSet::compute(dir.path(), &options()).unwrap();
        let second = ChecksumSet::compute(dir.path(), &options()).unwrap();
        assert_eq!(first, second);

        let paths: Vec<_> = first.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["blocks/e2e-testing.yaml", "resources/a.md"]);
        assert_eq!(first.total_bytes(), 16 + 4);
    }

    #[test]
    fn test_single_byte_change_alters_file_and_aggregate() {
        let dir = tree();
        let before = ChecksumSet::compute(dir.path(), &options()).unwrap();

        write(dir.path(), "resources/a.md", "# B\n");
        let after = ChecksumSet::compute(dir.path(), &options()).unwrap();

        assert_ne!(before.aggregate, after.aggregate);
        assert_ne!(
            before.get("resources/a.md").unwrap().digest,
            after.get("resources/a.md").unwrap().digest
        );
        assert_eq!(
            before.get("blocks/e2e-testing.yaml"),
            after.get("blocks/e2e-testing.yaml")
        );
    }

    #[test]
    fn test_rename_alters_aggregate_only() {
        let dir = tree();
        let before = ChecksumSet::compute(dir.path(), &options()).unwrap();

        std::fs::rename(dir.path().join("resources/a.md"), dir.path().join("resources/b.md")).unwrap();
        let after = ChecksumSet::compute(dir.path(), &options()).unwrap();

        assert_ne!(before.aggregate, after.aggregate);
        assert_eq!(
            before.get("resources/a.md").unwrap().digest,
            after.get("resources/b.md").unwrap().digest
        );
    }

    #[test]
    fn test_aggregate_feeds_path_then_content() {
        let mut hasher = TreeHasher::new();
        hasher.add("a.md", b"x");
        let set = hasher.finish();

        assert_eq!(set.aggregate, digest_bytes(b"a.mdx"));
        assert_eq!(set.per_file().get("a.md"), Some(&digest_bytes(b"x")));
    }

    #[test]
    fn test_digest_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = digest_file(&dir.path().join("nope.yaml"));
        assert!(matches!(result, Err(ContentError::FileNotFound(_))));
    }
}
