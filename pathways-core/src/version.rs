//! Release versions
//!
//! Releases are tagged `YYYY.MM.DD.PATCH`. The date is the UTC release day
//! and `PATCH` counts releases made on that day, starting at zero.
//! Individual knowledge blocks carry their own `MAJOR.MINOR.PATCH` version.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::error::VersionError;

/// A date-based release version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReleaseVersion {
    pub date: NaiveDate,
    pub patch: u32,
}

impl ReleaseVersion {
    pub fn new(date: NaiveDate, patch: u32) -> Self {
        Self { date, patch }
    }
}

impl std::fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{:02}.{:02}.{}",
            self.date.year(),
            self.date.month(),
            self.date.day(),
            self.patch
        )
    }
}

impl FromStr for ReleaseVersion {
    type Err = VersionError;

    /// Accepts an optional `v` prefix and unpadded month/day.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let body = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let parts: Vec<&str> = body.split('.').collect();
        let [year, month, day, patch] = parts[..] else {
            return Err(VersionError::Format(s.to_string()));
        };

        let number = |part: &str| -> Result<u32, VersionError> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VersionError::Format(s.to_string()));
            }
            part.parse().map_err(|_| VersionError::Format(s.to_string()))
        };

        let year = i32::try_from(number(year)?).map_err(|_| VersionError::Date(s.to_string()))?;
        let date = NaiveDate::from_ymd_opt(year, number(month)?, number(day)?)
            .ok_or_else(|| VersionError::Date(s.to_string()))?;

        Ok(Self {
            date,
            patch: number(patch)?,
        })
    }
}

/// Next release version for `today` given the existing release tags.
///
/// Tags for other days and tags that do not parse are ignored. The result
/// is one past the highest patch already released today, or patch `0`.
/// Fails when today's highest patch is already `u32::MAX`.
pub fn next_version<I, S>(today: NaiveDate, tags: I) -> Result<ReleaseVersion, VersionError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let highest = tags
        .into_iter()
        .filter_map(|tag| match tag.as_ref().parse::<ReleaseVersion>() {
            Ok(version) => Some(version),
            Err(e) => {
                debug!(tag = tag.as_ref(), error = %e, "Ignoring tag");
                None
            }
        })
        .filter(|version| version.date == today)
        .map(|version| version.patch)
        .max();

    let patch = match highest {
        None => 0,
        Some(patch) => patch
            .checked_add(1)
            .ok_or_else(|| VersionError::PatchExhausted(ReleaseVersion::new(today, patch).to_string()))?,
    };
    Ok(ReleaseVersion::new(today, patch))
}

/// Per-block semantic version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemVer {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SemVer {
    /// Version given to blocks the first time they are seen
    pub const INITIAL: SemVer = SemVer {
        major: 1,
        minor: 0,
        patch: 0,
    };

    /// `None` when the patch number cannot grow any further.
    pub fn bump_patch(self) -> Option<Self> {
        Some(Self {
            patch: self.patch.checked_add(1)?,
            ..self
        })
    }

    pub fn bump_minor(self) -> Option<Self> {
        Some(Self {
            minor: self.minor.checked_add(1)?,
            patch: 0,
            ..self
        })
    }
}

impl std::fmt::Display for SemVer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SemVer {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.trim().trim_start_matches('v');
        // Pre-release and build suffixes are dropped
        let core = body.split(['-', '+']).next().unwrap_or(body);
        let parts: Vec<u32> = core
            .split('.')
            .map(|p| p.parse().map_err(|_| VersionError::SemVer(s.to_string())))
            .collect::<Result<_, _>>()?;
        match parts[..] {
            [major, minor, patch] => Ok(Self { major, minor, patch }),
            _ => Err(VersionError::SemVer(s.to_string())),
        }
    }
}
