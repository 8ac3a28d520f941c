//! Content validation
//!
//! Every eligible file gets a [`FileReport`]. A file passes when its report
//! carries no violations; warnings are informational. Parsing problems stop
//! the checks for that file only; the batch always continues.

mod block;
mod category;
mod questionnaire;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::{debug, info};

use crate::config::{Config, ContentConfig};
use crate::error::{ContentError, Result};
use crate::model::{field, parse_document, Classified, ContentKind, TreeStats};
use crate::walk::{walk_files, ContentFile, WalkOptions};

/// A single problem found in a content file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// The file could not be parsed
    Parse { message: String },
    /// A required field is absent or null
    MissingField { field: String },
    /// A field is present with the wrong type or an unusable value
    InvalidField { field: String, reason: String },
    /// The declared `id` does not match the file name
    IdMismatch { declared: String, expected: String },
    /// A decision-tree node is malformed
    InvalidNode { node: String, reason: String },
    /// A questionnaire entry is malformed
    InvalidQuestion { index: usize, reason: String },
    /// Two categories share an id
    DuplicateCategory { id: String },
    /// A referenced resource file does not exist
    MissingResource { node: String, resource: String },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::Parse { message } => write!(f, "parse error: {}", message),
            Violation::MissingField { field } => write!(f, "missing required field `{}`", field),
            Violation::InvalidField { field, reason } => write!(f, "field `{}` {}", field, reason),
            Violation::IdMismatch { declared, expected } => write!(
                f,
                "id `{}` does not match file name `{}`",
                declared, expected
            ),
            Violation::InvalidNode { node, reason } => write!(f, "node `{}`: {}", node, reason),
            Violation::InvalidQuestion { index, reason } => {
                write!(f, "question #{}: {}", index, reason)
            }
            Violation::DuplicateCategory { id } => write!(f, "duplicate category id `{}`", id),
            Violation::MissingResource { node, resource } => {
                write!(f, "node `{}` references missing resource `{}`", node, resource)
            }
        }
    }
}

/// Validation outcome for one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    /// Path relative to the content root
    pub path: String,
    pub kind: ContentKind,
    pub violations: Vec<Violation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Decision tree shape, for knowledge blocks that parsed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<TreeStats>,
}

impl FileReport {
    pub fn new(path: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            path: path.into(),
            kind,
            violations: Vec::new(),
            warnings: Vec::new(),
            stats: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    pub(crate) fn violation(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Validation outcome for a batch of files
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub files: Vec<FileReport>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.files.iter().all(FileReport::passed)
    }

    pub fn violation_count(&self) -> usize {
        self.files.iter().map(|f| f.violations.len()).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.files.iter().map(|f| f.warnings.len()).sum()
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| !f.passed())
    }
}

/// Validates content files against their category's rules
#[derive(Debug, Clone)]
pub struct Validator {
    content: ContentConfig,
    walk: WalkOptions,
    check_resources: bool,
}

impl Validator {
    pub fn new(config: &Config) -> Self {
        Self {
            content: config.content.clone(),
            walk: config.walk_options(),
            check_resources: config.validate.check_resources,
        }
    }

    /// Require resource references to resolve to existing files.
    pub fn with_resource_check(mut self, enabled: bool) -> Self {
        self.check_resources = enabled;
        self
    }

    /// Validate every eligible file under the content root.
    pub fn validate_all(&self) -> Result<ValidationReport> {
        let root = &self.content.root;
        info!(root = %root.display(), "Validating content");

        let files = walk_files(root, &self.walk, |file| {
            match Classified::of(file, &self.content) {
                Some(classified) => self.validate_content_file(file, classified).map(Some),
                None => Ok(None),
            }
        })?;

        let report = ValidationReport { files };
        info!(
            files = report.files.len(),
            violations = report.violation_count(),
            "Validation finished"
        );
        Ok(report)
    }

    /// Validate one explicitly named file.
    pub fn validate_file(&self, path: &Path) -> Result<FileReport> {
        if !path.is_file() {
            return Err(ContentError::FileNotFound(path.to_path_buf()));
        }

        let file = ContentFile::from_path(&self.content.root, path);
        let classified = Classified::of(&file, &self.content)
            .ok_or_else(|| ContentError::Unsupported(path.to_path_buf()))?;
        self.validate_content_file(&file, classified)
    }

    fn validate_content_file(&self, file: &ContentFile, classified: Classified) -> Result<FileReport> {
        let bytes = file.read()?;
        let stem = file.stem().unwrap_or_default();

        let report = match String::from_utf8(bytes) {
            Ok(source) => self.validate_source(&file.relative, &stem, classified, &source),
            Err(e) => {
                let mut report = FileReport::new(&file.relative, classified.kind);
                report.violation(Violation::Parse {
                    message: format!("file is not valid UTF-8: {}", e.utf8_error()),
                });
                report
            }
        };

        debug!(
            file = %file.relative,
            kind = %classified.kind,
            violations = report.violations.len(),
            "Validated"
        );
        Ok(report)
    }

    /// Validate already-loaded source text. `stem` is the file name without
    /// extension, which declared ids must match.
    pub fn validate_source(
        &self,
        relative: &str,
        stem: &str,
        classified: Classified,
        source: &str,
    ) -> FileReport {
        let mut report = FileReport::new(relative, classified.kind);

        let doc = match parse_document(source, classified.format) {
            Ok(doc) => doc,
            Err(message) => {
                report.violation(Violation::Parse { message });
                return report;
            }
        };
        if !doc.is_mapping() {
            report.violation(Violation::Parse {
                message: format!("expected a mapping at the top level, found {}", type_name(&doc)),
            });
            return report;
        }

        match classified.kind {
            ContentKind::KnowledgeBlock => {
                check_id(&doc, stem, &mut report);
                block::check(&doc, self.resource_root().as_deref(), &mut report);
                report.stats = Some(TreeStats::of(&doc));
            }
            ContentKind::Questionnaire => {
                check_id(&doc, stem, &mut report);
                questionnaire::check(&doc, &mut report);
            }
            ContentKind::CategoryIndex => category::check(&doc, &mut report),
        }

        report
    }

    fn resource_root(&self) -> Option<PathBuf> {
        self.check_resources
            .then(|| self.content.root.join(&self.content.resources_dir))
    }
}

/// Expected type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    String,
    Mapping,
    Sequence,
}

impl Shape {
    fn matches(&self, value: &Value) -> bool {
        match self {
            Shape::String => value.is_string(),
            Shape::Mapping => value.is_mapping(),
            Shape::Sequence => value.is_sequence(),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Shape::String => "a string",
            Shape::Mapping => "a mapping",
            Shape::Sequence => "a sequence",
        }
    }
}

/// Check a required field, reporting it as `label`. Returns the value when
/// it is present and well-typed.
pub(crate) fn require<'a>(
    doc: &'a Value,
    name: &str,
    label: &str,
    shape: Shape,
    report: &mut FileReport,
) -> Option<&'a Value> {
    let Some(value) = field(doc, name) else {
        report.violation(Violation::MissingField {
            field: label.to_string(),
        });
        return None;
    };
    check_shape(value, label, shape, report).then_some(value)
}

/// Check an optional field; absent is fine, present must match `shape`.
pub(crate) fn optional<'a>(
    doc: &'a Value,
    name: &str,
    label: &str,
    shape: Shape,
    report: &mut FileReport,
) -> Option<&'a Value> {
    let value = field(doc, name)?;
    check_shape(value, label, shape, report).then_some(value)
}

fn check_shape(value: &Value, label: &str, shape: Shape, report: &mut FileReport) -> bool {
    if !shape.matches(value) {
        report.violation(Violation::InvalidField {
            field: label.to_string(),
            reason: format!("must be {}, found {}", shape.describe(), type_name(value)),
        });
        return false;
    }
    if value.as_str().is_some_and(|s| s.trim().is_empty()) {
        report.violation(Violation::InvalidField {
            field: label.to_string(),
            reason: "must not be empty".to_string(),
        });
        return false;
    }
    true
}

/// The declared `id` must equal the file name without its extension.
fn check_id(doc: &Value, stem: &str, report: &mut FileReport) {
    let Some(id) = field(doc, "id").and_then(Value::as_str) else {
        // reported by the required-field checks
        return;
    };
    if id != stem {
        report.violation(Violation::IdMismatch {
            declared: id.to_string(),
            expected: stem.to_string(),
        });
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Format;

    pub(super) fn validate(kind: ContentKind, format: Format, stem: &str, source: &str) -> FileReport {
        let validator = Validator::new(&Config::default());
        validator.validate_source(
            &format!("{}.{}", stem, if format == Format::Yaml { "yaml" } else { "json" }),
            stem,
            Classified { kind, format },
            source,
        )
    }

    #[test]
    fn test_non_mapping_document_is_parse_violation() {
        let report = validate(ContentKind::KnowledgeBlock, Format::Yaml, "x", "- a\n- b\n");
        assert_eq!(report.violations.len(), 1);
        assert!(matches!(report.violations[0], Violation::Parse { .. }));

        let report = validate(ContentKind::KnowledgeBlock, Format::Yaml, "x", "");
        assert!(matches!(report.violations[..], [Violation::Parse { .. }]));
    }

    #[test]
    fn test_violation_display() {
        let v = Violation::MissingField { field: "metadata".to_string() };
        assert_eq!(v.to_string(), "missing required field `metadata`");

        let v = Violation::IdMismatch {
            declared: "a".to_string(),
            expected: "b".to_string(),
        };
        assert_eq!(v.to_string(), "id `a` does not match file name `b`");
    }

    #[test]
    fn test_violation_json_shape() {
        let v = Violation::InvalidQuestion { index: 2, reason: "bad".to_string() };
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["kind"], "invalid_question");
        assert_eq!(json["index"], 2);
    }

    #[test]
    fn test_report_aggregates() {
        let mut ok = FileReport::new("a.yaml", ContentKind::KnowledgeBlock);
        ok.warn("looks odd");
        let mut bad = FileReport::new("b.yaml", ContentKind::KnowledgeBlock);
        bad.violation(Violation::MissingField { field: "id".to_string() });
        bad.violation(Violation::MissingField { field: "title".to_string() });

        let report = ValidationReport { files: vec![ok, bad] };
        assert!(!report.passed());
        assert_eq!(report.violation_count(), 2);
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.failed().count(), 1);
    }
}
