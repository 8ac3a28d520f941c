//! Knowledge block checks

use std::path::Path;

use serde_yaml::Value;

use super::{require, type_name, FileReport, Shape, Violation};
use crate::model::block::{children, is_leaf, resources, REQUIRED_FIELDS, REQUIRED_METADATA_FIELDS};
use crate::model::{field, key_label};

pub(super) fn check(doc: &Value, resource_root: Option<&Path>, report: &mut FileReport) {
    for name in REQUIRED_FIELDS {
        let shape = match *name {
            "paths" | "metadata" => Shape::Mapping,
            _ => Shape::String,
        };
        let Some(value) = require(doc, name, name, shape, report) else {
            continue;
        };
        if *name == "metadata" {
            for inner in REQUIRED_METADATA_FIELDS {
                require(value, inner, &format!("metadata.{}", inner), Shape::String, report);
            }
        }
    }

    // The root's own `paths` presence is covered above; only walk it when usable.
    if field(doc, "paths").is_some_and(Value::is_mapping) {
        let mut walker = TreeWalker { resource_root, report };
        walker.node(doc, "", true);
    }
}

struct TreeWalker<'a> {
    resource_root: Option<&'a Path>,
    report: &'a mut FileReport,
}

impl TreeWalker<'_> {
    fn invalid(&mut self, node: &str, reason: impl Into<String>) {
        self.report.violation(Violation::InvalidNode {
            node: display_node(node),
            reason: reason.into(),
        });
    }

    fn node(&mut self, node: &Value, at: &str, is_root: bool) {
        if !node.is_mapping() {
            let reason = if node.is_null() {
                "node is empty".to_string()
            } else {
                format!("expected a mapping, found {}", type_name(node))
            };
            self.invalid(at, reason);
            return;
        }

        let question_key = if is_root { "initial_question" } else { "question" };
        if !is_root {
            for (key, shape) in [("question", Shape::String), ("summary", Shape::String)] {
                if let Some(value) = field(node, key) {
                    if !shape.matches(value) {
                        self.invalid(at, format!("`{}` must be a string, found {}", key, type_name(value)));
                    }
                }
            }
        }

        let options = self.options(node, at);
        self.resources(node, at);

        let paths = field(node, "paths");
        let has_question = field(node, question_key).is_some();
        match paths {
            Some(Value::Mapping(map)) if map.is_empty() => self.invalid(at, "`paths` must not be empty"),
            Some(Value::Mapping(_)) => {
                if !has_question && !is_root {
                    self.invalid(at, "has `paths` but no `question`");
                }
            }
            Some(other) => {
                self.invalid(at, format!("`paths` must be a mapping, found {}", type_name(other)));
                return;
            }
            None => {
                if has_question && !is_root {
                    self.invalid(at, "has a `question` but no `paths`");
                }
                return;
            }
        }

        let kids = children(node);
        if let Some(options) = options {
            for (key, _) in &kids {
                if !options.contains(key) {
                    self.invalid(at, format!("path `{}` is not one of the declared options", key));
                }
            }
        }

        self.duplicate_siblings(at, &kids);

        for (key, child) in &kids {
            let child_at = if at.is_empty() {
                format!("paths.{}", key)
            } else {
                format!("{}.paths.{}", at, key)
            };
            self.node(child, &child_at, false);
        }
    }

    /// Declared option labels, when `options` is a well-formed list.
    fn options(&mut self, node: &Value, at: &str) -> Option<Vec<String>> {
        let value = field(node, "options")?;
        let Some(items) = value.as_sequence() else {
            self.invalid(at, format!("`options` must be a sequence, found {}", type_name(value)));
            return None;
        };

        let mut labels = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::String(s) => labels.push(s.clone()),
                other => {
                    self.invalid(at, format!("option `{}` must be a string", key_label(other)));
                }
            }
        }
        Some(labels)
    }

    fn resources(&mut self, node: &Value, at: &str) {
        let Some(value) = field(node, "resources") else {
            return;
        };
        let Some(items) = value.as_sequence() else {
            self.invalid(at, format!("`resources` must be a sequence, found {}", type_name(value)));
            return;
        };
        if items.iter().any(|item| !item.is_string()) {
            self.invalid(at, "`resources` entries must be strings");
        }

        let Some(root) = self.resource_root else {
            return;
        };
        for resource in resources(node) {
            if is_remote(resource) || root.join(resource).is_file() {
                continue;
            }
            self.report.violation(Violation::MissingResource {
                node: display_node(at),
                resource: resource.to_string(),
            });
        }
    }

    /// Identical non-terminal siblings usually mean a copy-pasted branch.
    fn duplicate_siblings(&mut self, at: &str, kids: &[(String, &Value)]) {
        for (i, (first_key, first)) in kids.iter().enumerate() {
            if is_leaf(first) {
                continue;
            }
            for (second_key, second) in &kids[i + 1..] {
                if first == second {
                    self.report.warn(format!(
                        "node `{}`: paths `{}` and `{}` are identical sub-trees",
                        display_node(at),
                        first_key,
                        second_key
                    ));
                }
            }
        }
    }
}

fn display_node(at: &str) -> String {
    if at.is_empty() {
        "<root>".to_string()
    } else {
        at.to_string()
    }
}

fn is_remote(resource: &str) -> bool {
    resource.starts_with("http://") || resource.starts_with("https://")
}
