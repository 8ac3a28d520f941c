use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Args, ValueEnum};
use pathways_core::manifest::format_size;
use pathways_core::{
    digest_file, BlockStatus, ChecksumMode, Config, GenerateOptions, GenerateOutcome,
    ManifestGenerator, ReleaseVersion,
};
use serde_json::json;
use tracing::info;

use super::print_json;

#[derive(Debug, Args)]
pub struct ChecksumArgs {
    /// Print the digest of a single file and leave the manifest alone
    pub file: Option<PathBuf>,

    /// Compute and report without writing the manifest
    #[arg(long)]
    pub dry_run: bool,

    /// Checksum schema (overrides config)
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Stamp this release version (YYYY.MM.DD.PATCH) into the manifest
    #[arg(long)]
    pub set_version: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    PerFile,
    Aggregate,
}

impl From<ModeArg> for ChecksumMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::PerFile => ChecksumMode::PerFile,
            ModeArg::Aggregate => ChecksumMode::Aggregate,
        }
    }
}

pub fn run(config: &Config, args: &ChecksumArgs, json: bool) -> anyhow::Result<bool> {
    if let Some(path) = &args.file {
        let digest = digest_file(path).with_context(|| format!("digesting {}", path.display()))?;
        if json {
            print_json(&digest)?;
        } else {
            println!("{}  {}", digest.digest, digest.path);
        }
        return Ok(true);
    }

    let version = args
        .set_version
        .as_deref()
        .map(|v| {
            v.parse::<ReleaseVersion>()
                .map(|parsed| parsed.to_string())
                .with_context(|| format!("invalid --set-version `{}`", v))
        })
        .transpose()?;

    let options = GenerateOptions {
        version,
        mode: args.mode.map(ChecksumMode::from),
        ..GenerateOptions::at(Utc::now())
    };

    let generator = ManifestGenerator::new(config);
    let outcome = generator.generate(&options).context("generating checksums")?;

    if args.dry_run {
        info!("Dry run, manifest not written");
    } else {
        generator.write(&outcome).context("writing manifest")?;
    }

    if json {
        print_json(&json!({
            "manifest": config.manifest_path(),
            "written": !args.dry_run,
            "mode": outcome.mode,
            "version": outcome.manifest.version,
            "files": outcome.checksums.files,
            "aggregate": outcome.checksums.aggregate,
            "totalBytes": outcome.checksums.total_bytes(),
            "blocks": outcome.blocks,
        }))?;
    } else {
        print_summary(config, &outcome, args.dry_run);
    }
    Ok(true)
}

fn print_summary(config: &Config, outcome: &GenerateOutcome, dry_run: bool) {
    for change in outcome.changed_blocks() {
        let label = match change.status {
            BlockStatus::Added => "added",
            BlockStatus::Changed => "changed",
            BlockStatus::Removed => "removed",
            BlockStatus::Unchanged => continue,
        };
        println!("  {:<8} {} {}", label, change.id, change.version);
    }

    println!(
        "✓ Checksummed {} file(s), {} ({} mode)",
        outcome.checksums.files.len(),
        format_size(outcome.checksums.total_bytes()),
        outcome.mode
    );
    println!("  aggregate {}", outcome.checksums.aggregate);
    if !outcome.manifest.version.is_empty() {
        println!("  version   {}", outcome.manifest.version);
    }

    if dry_run {
        println!("  dry run, {} not written", config.manifest_path().display());
    } else {
        println!("  wrote {}", config.manifest_path().display());
    }
}
