use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::Args;
use pathways_core::{next_version, Config, Manifest};
use serde_json::json;
use tracing::info;

use super::print_json;

#[derive(Debug, Args)]
pub struct BumpArgs {
    /// Existing release tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// File with one release tag per line, `-` for stdin
    #[arg(long)]
    pub tags_file: Option<PathBuf>,

    /// Release day (YYYY-MM-DD), defaults to today in UTC. A day other than
    /// today is stamped as `released` at midnight UTC.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Print the version without writing the manifest
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(config: &Config, args: &BumpArgs, json: bool) -> anyhow::Result<bool> {
    let mut tags = args.tags.clone();
    if let Some(path) = &args.tags_file {
        tags.extend(read_tags(path)?);
    }

    let now = Utc::now();
    let released = release_time(args.date, now);
    let version = next_version(released.date_naive(), &tags).context("computing release version")?;
    info!(version = %version, tags = tags.len(), "Computed release version");

    if !args.dry_run {
        let path = config.manifest_path();
        let mut manifest = Manifest::load_or_default(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        manifest.set_release(version.to_string(), released);
        manifest
            .save(&path)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    if json {
        print_json(&json!({
            "version": version.to_string(),
            "written": !args.dry_run,
        }))?;
    } else {
        println!("{}", version);
    }
    Ok(true)
}

fn release_time(date: Option<NaiveDate>, now: DateTime<Utc>) -> DateTime<Utc> {
    match date {
        Some(day) if day != now.date_naive() => Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN)),
        _ => now,
    }
}

fn read_tags(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading tags from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    Ok(parse_tags(&content))
}

fn parse_tags(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(tags: &[&str], date: &str, dry_run: bool) -> BumpArgs {
        BumpArgs {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            tags_file: None,
            date: Some(date.parse().unwrap()),
            dry_run,
        }
    }

    #[test]
    fn test_parse_tags_skips_blank_lines() {
        let tags = parse_tags("2024.12.15.0\n\n  2024.12.15.1  \r\n");
        assert_eq!(tags, vec!["2024.12.15.0", "2024.12.15.1"]);
    }

    #[test]
    fn test_bump_writes_manifest_and_keeps_fields() {
        let dir = TempDir::new().unwrap();
        let config = Config::with_root(dir.path());
        std::fs::write(
            config.manifest_path(),
            r#"{"version": "2024.12.14.0", "checksums": "sha256:aa", "minAppVersion": "3.1.0"}"#,
        )
        .unwrap();

        let ok = run(&config, &args(&["2024.12.15.0", "2024.12.15.1"], "2024-12-15", false), true).unwrap();
        assert!(ok);

        let manifest = Manifest::load(&config.manifest_path()).unwrap().unwrap();
        assert_eq!(manifest.version, "2024.12.15.2");
        assert_eq!(manifest.extra.get("minAppVersion").unwrap(), "3.1.0");
    }

    #[test]
    fn test_dry_run_leaves_manifest_alone() {
        let dir = TempDir::new().unwrap();
        let config = Config::with_root(dir.path());

        run(&config, &args(&[], "2024-12-15", true), true).unwrap();
        assert!(!config.manifest_path().exists());
    }

    #[test]
    fn test_tags_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tags.txt");
        std::fs::write(&path, "2024.12.15.4\nv2024.12.15.7\n").unwrap();

        let tags = read_tags(&path).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        assert_eq!(next_version(today, &tags).unwrap().to_string(), "2024.12.15.8");
    }

    #[test]
    fn test_date_override_stamps_released() {
        let dir = TempDir::new().unwrap();
        let config = Config::with_root(dir.path());

        run(&config, &args(&["2024.12.15.0"], "2024-12-15", false), true).unwrap();

        let manifest = Manifest::load(&config.manifest_path()).unwrap().unwrap();
        assert_eq!(manifest.version, "2024.12.15.1");
        assert_eq!(manifest.released, "2024-12-15T00:00:00Z");
    }

    #[test]
    fn test_release_time_today_keeps_clock() {
        let now = Utc.with_ymd_and_hms(2024, 12, 15, 9, 30, 0).unwrap();
        assert_eq!(release_time(None, now), now);
        assert_eq!(release_time(Some(now.date_naive()), now), now);
    }

    #[test]
    fn test_exhausted_patch_is_error() {
        let dir = TempDir::new().unwrap();
        let config = Config::with_root(dir.path());

        let result = run(&config, &args(&["2024.12.15.4294967295"], "2024-12-15", false), true);
        assert!(result.is_err());
        assert!(!config.manifest_path().exists());
    }
}
