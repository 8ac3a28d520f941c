use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use pathways_core::{Config, FileReport, ValidationReport, Validator};

use super::{mark, print_json};

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Validate a single file instead of the whole content root
    pub file: Option<PathBuf>,

    /// Require referenced resources to exist
    #[arg(long)]
    pub check_resources: bool,
}

pub fn run(config: &Config, args: &ValidateArgs, json: bool) -> anyhow::Result<bool> {
    let validator = Validator::new(config)
        .with_resource_check(args.check_resources || config.validate.check_resources);

    let report = match &args.file {
        Some(path) => ValidationReport {
            files: vec![validator
                .validate_file(path)
                .with_context(|| format!("validating {}", path.display()))?],
        },
        None => validator.validate_all().context("validating content")?,
    };

    if json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }
    Ok(report.passed())
}

fn print_report(report: &ValidationReport) {
    for file in &report.files {
        print_file(file);
    }

    let failed = report.failed().count();
    println!();
    println!(
        "{} Validated {} file(s): {} failed, {} violation(s), {} warning(s)",
        mark(failed == 0),
        report.files.len(),
        failed,
        report.violation_count(),
        report.warning_count()
    );
}

fn print_file(file: &FileReport) {
    match &file.stats {
        Some(stats) => println!(
            "{} {} ({}, {} nodes, {} leaves)",
            mark(file.passed()),
            file.path,
            file.kind,
            stats.nodes,
            stats.leaves
        ),
        None => println!("{} {} ({})", mark(file.passed()), file.path, file.kind),
    }
    for violation in &file.violations {
        println!("    - {}", violation);
    }
    for warning in &file.warnings {
        println!("    ! {}", warning);
    }
}
