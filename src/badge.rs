// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Static CI badges.
//!
//! Query the code-hosting API for a repository's latest release, latest
//! commit, and general metadata, then render one flat SVG badge per fact into
//! a docs directory. The badges are plain files, so they can be committed and
//! served without any badge service in between.
//!
//! # Colors
//!
//! Most badges are informational and always blue. Two badges judge the
//! repository instead:
//!
//! - __coverage__: at least 80 passes, anything lower fails, and an unknown
//!   value stays neutral.
//! - __issues__: exactly zero open issues passes, anything else fails.

pub mod github;
pub mod svg;

use crate::badge::github::{GitHubClient, RepoSnapshot};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::write,
    path::{Path, PathBuf},
};
use tracing::{info, instrument};

/// Lowest coverage percentage that still passes.
pub const COVERAGE_THRESHOLD: f64 = 80.0;

/// Coverage value used when no measurement is available.
pub const UNKNOWN: &str = "unknown";

/// Badge value color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeColor {
    Pass,
    Fail,
    Neutral,
    Info,
}

impl BadgeColor {
    /// Hex color used for the value segment.
    pub fn hex(&self) -> &'static str {
        match self {
            Self::Pass => "#4c1",
            Self::Fail => "#e05d44",
            Self::Neutral => "#9f9f9f",
            Self::Info => "#007ec6",
        }
    }
}

impl Display for BadgeColor {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(match self {
            Self::Pass => "brightgreen",
            Self::Fail => "red",
            Self::Neutral => "lightgrey",
            Self::Info => "blue",
        })
    }
}

/// Color for a coverage percentage such as `"85"` or `"79.5%"`.
pub fn coverage_color(value: &str) -> BadgeColor {
    let value = value.trim();
    if value.eq_ignore_ascii_case(UNKNOWN) {
        return BadgeColor::Neutral;
    }

    match value.trim_end_matches('%').parse::<f64>() {
        Ok(percent) if !percent.is_finite() => BadgeColor::Neutral,
        Ok(percent) if percent >= COVERAGE_THRESHOLD => BadgeColor::Pass,
        Ok(_) => BadgeColor::Fail,
        Err(_) => BadgeColor::Neutral,
    }
}

/// Color for an open issue count.
pub fn issues_color(value: &str) -> BadgeColor {
    if value.trim() == "0" {
        BadgeColor::Pass
    } else {
        BadgeColor::Fail
    }
}

/// Single rendered badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    /// File stem of the generated SVG.
    pub name: String,
    pub label: String,
    pub value: String,
    pub color: BadgeColor,
}

impl Badge {
    /// Construct new badge.
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<String>,
        color: BadgeColor,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            value: value.into(),
            color,
        }
    }

    /// Render badge as SVG document.
    pub fn to_svg(&self) -> String {
        svg::render(&self.label, &self.value, self.color)
    }
}

/// Derive full badge set from repository snapshot and coverage value.
pub fn badges(snapshot: &RepoSnapshot, coverage: &str) -> Vec<Badge> {
    let version = snapshot
        .release
        .as_ref()
        .map(|release| release.tag_name.clone())
        .unwrap_or_else(|| "none".into());
    let last_commit = snapshot
        .last_commit_date
        .as_deref()
        .map(|date| date.get(..10).unwrap_or(date).to_string())
        .unwrap_or_else(|| UNKNOWN.into());
    let issues = snapshot.info.open_issues_count.to_string();
    let license = snapshot
        .info
        .license
        .as_ref()
        .and_then(|license| license.spdx_id.clone())
        .unwrap_or_else(|| "none".into());
    let coverage_value = match coverage_color(coverage) {
        BadgeColor::Neutral => UNKNOWN.to_string(),
        _ => format!("{}%", coverage.trim().trim_end_matches('%')),
    };

    vec![
        Badge::new("version", "version", version, BadgeColor::Info),
        Badge::new("last-commit", "last commit", last_commit, BadgeColor::Info),
        Badge::new("issues", "issues", issues.clone(), issues_color(&issues)),
        Badge::new(
            "stars",
            "stars",
            snapshot.info.stargazers_count.to_string(),
            BadgeColor::Info,
        ),
        Badge::new("license", "license", license, BadgeColor::Info),
        Badge::new("coverage", "coverage", coverage_value, coverage_color(coverage)),
    ]
}

/// Write each badge as `<name>.svg` into `out_dir`.
///
/// Creates `out_dir` if it does not exist yet.
///
/// # Errors
///
/// - Return [`BadgeError::Write`] if directory or files cannot be written.
pub fn write_badges(out_dir: impl AsRef<Path>, badges: &[Badge]) -> Result<Vec<PathBuf>> {
    let out_dir = out_dir.as_ref();
    mkdirp::mkdirp(out_dir).map_err(|err| BadgeError::Write {
        source: err,
        path: out_dir.into(),
    })?;

    let mut written = Vec::new();
    for badge in badges {
        let path = out_dir.join(format!("{}.svg", badge.name));
        write(&path, badge.to_svg()).map_err(|err| BadgeError::Write {
            source: err,
            path: path.clone(),
        })?;
        info!("wrote {} badge ({}) to {:?}", badge.name, badge.value, path.display());
        written.push(path);
    }

    Ok(written)
}

/// Fetch repository state and write full badge set.
///
/// # Errors
///
/// - Return [`BadgeError`] if any API request fails, or if badges cannot be
///   written.
#[instrument(skip(client, out_dir), level = "debug")]
pub fn generate(
    client: &GitHubClient,
    owner: &str,
    repo: &str,
    coverage: &str,
    out_dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>> {
    let snapshot = client.snapshot(owner, repo)?;
    write_badges(out_dir, &badges(&snapshot, coverage))
}

/// Badge generation error types.
#[derive(Debug, thiserror::Error)]
pub enum BadgeError {
    /// Request could not be sent, or response could not be decoded.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// API answered with an unexpected status.
    #[error("request to {url} failed with HTTP {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    /// Badge file could not be written.
    #[error("failed to write badge at {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = BadgeError> = std::result::Result<T, E>;
