//! Category index checks

use std::collections::BTreeSet;

use serde_yaml::Value;

use super::{optional, require, type_name, FileReport, Shape, Violation};

pub(super) fn check(doc: &Value, report: &mut FileReport) {
    let Some(categories) = require(doc, "categories", "categories", Shape::Sequence, report)
        .and_then(Value::as_sequence)
    else {
        return;
    };

    let mut seen = BTreeSet::new();
    for (i, category) in categories.iter().enumerate() {
        let prefix = format!("categories[{}]", i);
        if !category.is_mapping() {
            report.violation(Violation::InvalidField {
                field: prefix,
                reason: format!("must be a mapping, found {}", type_name(category)),
            });
            continue;
        }

        let id = require(category, "id", &format!("{}.id", prefix), Shape::String, report)
            .and_then(Value::as_str);
        require(category, "title", &format!("{}.title", prefix), Shape::String, report);

        let blocks_label = format!("{}.blocks", prefix);
        if let Some(blocks) = optional(category, "blocks", &blocks_label, Shape::Sequence, report)
            .and_then(Value::as_sequence)
        {
            if blocks.iter().any(|b| !b.is_string()) {
                report.violation(Violation::InvalidField {
                    field: blocks_label,
                    reason: "entries must be block ids".to_string(),
                });
            }
        }

        if let Some(id) = id {
            if !seen.insert(id) {
                report.violation(Violation::DuplicateCategory { id: id.to_string() });
            }
        }
    }
}
