//! Subcommands
//!
//! Each command returns `Ok(true)` on success, `Ok(false)` when it ran but
//! found problems (violations, digest mismatches), and an error when it
//! could not run at all.

pub mod bump;
pub mod checksum;
pub mod validate;
pub mod verify;

use clap::Subcommand;
use pathways_core::Config;
use serde::Serialize;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check syntax and structure of content files
    Validate(validate::ValidateArgs),

    /// Digest the content tree and update the manifest
    Checksum(checksum::ChecksumArgs),

    /// Compute the next release version
    Bump(bump::BumpArgs),

    /// Compare the content tree against the manifest
    Verify,
}

pub fn execute(config: &Config, command: Command, json: bool) -> anyhow::Result<bool> {
    match command {
        Command::Validate(args) => validate::run(config, &args, json),
        Command::Checksum(args) => checksum::run(config, &args, json),
        Command::Bump(args) => bump::run(config, &args, json),
        Command::Verify => verify::run(config, json),
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn mark(ok: bool) -> &'static str {
    if ok {
        "✓"
    } else {
        "✗"
    }
}
