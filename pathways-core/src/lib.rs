//! Content tooling for the Pathways corpus
//!
//! The corpus is a tree of decision-tree knowledge blocks (YAML),
//! questionnaires (JSON), category indexes and markdown resources. This
//! crate guards it before release:
//!
//! - **Validation**: syntax and structure checks per content file
//! - **Checksums**: deterministic SHA-256 digests merged into the manifest
//! - **Versioning**: date-based `YYYY.MM.DD.PATCH` release numbers
//! - **Verification**: comparing the tree on disk with a manifest
//!
//! # Key Components
//!
//! - [`Validator`]: Classifies and checks content files
//! - [`ChecksumSet`]: Per-file and aggregate digests of a tree
//! - [`ManifestGenerator`]: Merges fresh digests into the existing manifest
//! - [`next_version`]: Pure release-number computation from existing tags
//! - [`verify()`]: Re-hashes the tree against the manifest
//!
//! # Example
//!
//! ```ignore
//! use pathways_core::{Config, GenerateOptions, ManifestGenerator, Validator};
//!
//! let config = Config::with_root("content");
//! let report = Validator::new(&config).validate_all()?;
//! if report.passed() {
//!     let generator = ManifestGenerator::new(&config);
//!     let outcome = generator.generate(&GenerateOptions::at(chrono::Utc::now()))?;
//!     generator.write(&outcome)?;
//! }
//! ```

pub mod checksum;
pub mod config;
pub mod error;
pub mod generator;
pub mod manifest;
pub mod model;
pub mod validate;
pub mod verify;
pub mod version;
pub mod walk;

pub use checksum::{digest_bytes, digest_file, ChecksumSet, FileDigest, TreeHasher};
pub use config::{ChecksumMode, Config};
pub use error::{ConfigError, ContentError, Result, VersionError};
pub use generator::{BlockChange, BlockStatus, GenerateOptions, GenerateOutcome, ManifestGenerator};
pub use manifest::{Checksums, Manifest};
pub use model::{ContentKind, TreeStats};
pub use validate::{FileReport, ValidationReport, Validator, Violation};
pub use verify::{verify, VerifyReport};
pub use version::{next_version, ReleaseVersion, SemVer};
