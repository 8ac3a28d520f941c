use anyhow::Context;
use pathways_core::{verify, Config, VerifyReport};

use super::{mark, print_json};

pub fn run(config: &Config, json: bool) -> anyhow::Result<bool> {
    let report = verify(config).with_context(|| {
        format!("verifying against {}", config.manifest_path().display())
    })?;

    if json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }
    Ok(report.passed())
}

fn print_report(report: &VerifyReport) {
    for path in &report.modified {
        println!("  modified  {}", path);
    }
    for path in &report.missing {
        println!("  missing   {}", path);
    }
    for path in &report.untracked {
        println!("  untracked {}", path);
    }
    if report.aggregate_matches == Some(false) {
        println!("  aggregate checksum does not match");
    }

    let version = if report.version.is_empty() {
        "unversioned"
    } else {
        report.version.as_str()
    };
    println!(
        "{} Content {} manifest {}",
        mark(report.passed()),
        if report.passed() { "matches" } else { "differs from" },
        version
    );
}
