//! Questionnaire checks

use std::collections::BTreeSet;

use serde_yaml::Value;

use super::{optional, require, type_name, FileReport, Shape, Violation};
use crate::model::field;
use crate::model::questionnaire::{QuestionType, REQUIRED_FIELDS};

pub(super) fn check(doc: &Value, report: &mut FileReport) {
    let mut questions = None;
    for name in REQUIRED_FIELDS {
        let shape = match *name {
            "questions" => Shape::Sequence,
            "llmConfig" => Shape::Mapping,
            _ => Shape::String,
        };
        let value = require(doc, name, name, shape, report);
        if *name == "questions" {
            questions = value.and_then(Value::as_sequence);
        }
    }

    if let Some(metadata) = optional(doc, "metadata", "metadata", Shape::Mapping, report) {
        optional(metadata, "author", "metadata.author", Shape::String, report);
    }

    let Some(questions) = questions else {
        return;
    };
    if questions.is_empty() {
        report.violation(Violation::InvalidField {
            field: "questions".to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    for (index, question) in questions.iter().enumerate() {
        for reason in question_problems(question) {
            report.violation(Violation::InvalidQuestion { index, reason });
        }
    }
}

fn question_problems(question: &Value) -> Vec<String> {
    if !question.is_mapping() {
        return vec![format!("expected a mapping, found {}", type_name(question))];
    }

    let mut problems = Vec::new();

    if !field(question, "label").is_some_and(Value::is_string) {
        problems.push("missing `label`".to_string());
    }

    let question_type = match field(question, "type") {
        None => {
            problems.push("missing `type`".to_string());
            None
        }
        Some(value) => {
            let parsed = value.as_str().and_then(QuestionType::parse);
            if parsed.is_none() {
                problems.push(format!(
                    "unknown type `{}` (expected text, textarea, radio or checkbox)",
                    value.as_str().unwrap_or(type_name(value))
                ));
            }
            parsed
        }
    };

    if let Some(question_type) = question_type.filter(QuestionType::has_options) {
        problems.extend(option_problems(question_type, field(question, "options")));
    }

    problems
}

fn option_problems(question_type: QuestionType, options: Option<&Value>) -> Vec<String> {
    let Some(options) = options.and_then(Value::as_sequence).filter(|o| !o.is_empty()) else {
        return vec![format!(
            "{} question needs a non-empty `options` list",
            question_type.as_str()
        )];
    };

    let mut problems = Vec::new();
    let mut seen = BTreeSet::new();
    for (i, option) in options.iter().enumerate() {
        if !option.is_mapping() {
            problems.push(format!("option {} must be a mapping with `value` and `label`", i));
            continue;
        }
        match field(option, "value").and_then(Value::as_str) {
            Some(value) => {
                if !seen.insert(value) {
                    problems.push(format!("option {} repeats value `{}`", i, value));
                }
            }
            None => problems.push(format!("option {} is missing `value`", i)),
        }
        if !field(option, "label").is_some_and(Value::is_string) {
            problems.push(format!("option {} is missing `label`", i));
        }
        if field(option, "hasTextInput").is_some_and(|v| !v.is_bool()) {
            problems.push(format!("option {}: `hasTextInput` must be a boolean", i));
        }
    }
    problems
}
