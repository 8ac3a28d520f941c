//! Content file classification

use serde::{Deserialize, Serialize};

use crate::config::ContentConfig;
use crate::walk::ContentFile;

/// Category of a structured content file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Recursive decision tree (YAML)
    KnowledgeBlock,
    /// Flat list of typed questions (JSON)
    Questionnaire,
    /// Catalog of categories grouping blocks
    CategoryIndex,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KnowledgeBlock => "knowledge block",
            Self::Questionnaire => "questionnaire",
            Self::CategoryIndex => "category index",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// On-disk syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Result of classifying a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified {
    pub kind: ContentKind,
    pub format: Format,
}

/// File stem that marks a category index outside the categories directory
const CATEGORY_INDEX_STEM: &str = "categories";

impl Classified {
    /// Classify a file by location first, then by extension.
    ///
    /// Returns `None` for files that are not structured content
    /// (markdown resources, images, ...).
    pub fn of(file: &ContentFile, layout: &ContentConfig) -> Option<Self> {
        let format = Format::from_extension(&file.extension()?)?;

        let kind = match file.top_dir() {
            Some(dir) if dir == layout.categories_dir => ContentKind::CategoryIndex,
            _ if file.stem().as_deref() == Some(CATEGORY_INDEX_STEM) => ContentKind::CategoryIndex,
            Some(dir) if dir == layout.questionnaires_dir => ContentKind::Questionnaire,
            Some(dir) if dir == layout.blocks_dir => ContentKind::KnowledgeBlock,
            _ => match format {
                Format::Yaml => ContentKind::KnowledgeBlock,
                Format::Json => ContentKind::Questionnaire,
            },
        };

        Some(Self { kind, format })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn classify(rel: &str) -> Option<Classified> {
        let root = Path::new("/content");
        let file = ContentFile::from_path(root, &root.join(rel));
        Classified::of(&file, &ContentConfig::default())
    }

    #[test]
    fn test_location_wins_over_extension() {
        let q = classify("questionnaires/intake.yaml").unwrap();
        assert_eq!(q.kind, ContentKind::Questionnaire);
        assert_eq!(q.format, Format::Yaml);

        let b = classify("blocks/e2e.json").unwrap();
        assert_eq!(b.kind, ContentKind::KnowledgeBlock);
        assert_eq!(b.format, Format::Json);

        let c = classify("categories/testing.yml").unwrap();
        assert_eq!(c.kind, ContentKind::CategoryIndex);
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(classify("misc/tree.yml").unwrap().kind, ContentKind::KnowledgeBlock);
        assert_eq!(classify("form.json").unwrap().kind, ContentKind::Questionnaire);
        assert_eq!(classify("categories.json").unwrap().kind, ContentKind::CategoryIndex);
    }

    #[test]
    fn test_non_structured_files_ignored() {
        assert!(classify("resources/a.md").is_none());
        assert!(classify("blocks/README").is_none());
    }
}
