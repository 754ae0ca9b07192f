// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Code-hosting REST API client.
//!
//! Just enough of the GitHub v3 API to fill the badge set. Requests are
//! blocking; the badge generator issues three of them and exits.

use crate::badge::{BadgeError, Result};

use reqwest::{
    blocking::{Client, Response},
    header::{ACCEPT, AUTHORIZATION},
    StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, info, instrument};

/// Default API root.
pub const API_URL: &str = "https://api.github.com";

/// Latest published release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub tag_name: String,
}

/// Repository metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepoInfo {
    pub open_issues_count: u64,
    pub stargazers_count: u64,
    pub license: Option<License>,
}

/// Repository license.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct License {
    pub spdx_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitEntry {
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    committer: Option<Signature>,
    author: Option<Signature>,
}

#[derive(Debug, Deserialize)]
struct Signature {
    date: String,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

/// Everything the badge set is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSnapshot {
    pub release: Option<Release>,
    pub last_commit_date: Option<String>,
    pub info: RepoInfo,
}

/// Blocking API client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Construct new client against `base_url`, authenticated with bearer
    /// `token` if given.
    ///
    /// # Errors
    ///
    /// - Return [`BadgeError::Http`] if HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|token| !token.is_empty()),
        })
    }

    /// Fetch latest release, or `None` if the repository has no releases.
    ///
    /// # Errors
    ///
    /// - Return [`BadgeError`] on any failure other than HTTP 404.
    #[instrument(skip(self), level = "debug")]
    pub fn latest_release(&self, owner: &str, repo: &str) -> Result<Option<Release>> {
        let url = format!("{}/repos/{owner}/{repo}/releases/latest", self.base_url);
        let response = self.get(&url)?;
        if response.status() == StatusCode::NOT_FOUND {
            info!("{owner}/{repo} has no releases");
            return Ok(None);
        }

        decode(&url, response).map(Some)
    }

    /// Fetch date of latest commit on the default branch.
    ///
    /// # Errors
    ///
    /// - Return [`BadgeError`] if request fails or answers non-2xx.
    #[instrument(skip(self), level = "debug")]
    pub fn latest_commit_date(&self, owner: &str, repo: &str) -> Result<Option<String>> {
        let url = format!("{}/repos/{owner}/{repo}/commits?per_page=1", self.base_url);
        let commits: Vec<CommitEntry> = decode(&url, self.get(&url)?)?;

        Ok(commits.into_iter().next().and_then(|entry| {
            entry
                .commit
                .committer
                .or(entry.commit.author)
                .map(|signature| signature.date)
        }))
    }

    /// Fetch repository metadata.
    ///
    /// # Errors
    ///
    /// - Return [`BadgeError`] if request fails or answers non-2xx.
    #[instrument(skip(self), level = "debug")]
    pub fn repository(&self, owner: &str, repo: &str) -> Result<RepoInfo> {
        let url = format!("{}/repos/{owner}/{repo}", self.base_url);
        decode(&url, self.get(&url)?)
    }

    /// Fetch everything the badge set needs.
    ///
    /// # Errors
    ///
    /// - Return [`BadgeError`] if any request fails.
    pub fn snapshot(&self, owner: &str, repo: &str) -> Result<RepoSnapshot> {
        Ok(RepoSnapshot {
            release: self.latest_release(owner, repo)?,
            last_commit_date: self.latest_commit_date(owner, repo)?,
            info: self.repository(owner, repo)?,
        })
    }

    fn get(&self, url: &str) -> Result<Response> {
        debug!("GET {url}");
        let mut request = self
            .client
            .get(url)
            .header(ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        Ok(request.send()?)
    }
}

fn decode<T: DeserializeOwned>(url: &str, response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        let message = serde_json::from_str::<ApiMessage>(&body)
            .map(|api| api.message)
            .unwrap_or(body);
        return Err(BadgeError::Status {
            url: url.into(),
            status: status.as_u16(),
            message,
        });
    }

    Ok(response.json()?)
}
