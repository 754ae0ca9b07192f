// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Dotfiles repository synchronization.
//!
//! Converge a local path onto an up-to-date checkout of the dotfiles
//! repository, no matter what a previous run left behind.
//!
//! # Reconciliation
//!
//! The local path is inspected read-only through libgit2, then handled by
//! whichever state it is in:
//!
//! 1. __Absent__: clone the repository at the target branch.
//! 2. __Checkout, remote matches__: enable rebase on pull, then pull.
//! 3. __Checkout, remote differs__: point `origin` at the configured URL,
//!    then continue as (2). We never re-clone just to fix a remote.
//! 4. __Not a checkout__: remove whatever is there, then continue as (1).
//! 5. __Unreadable checkout__: a `.git` entry libgit2 cannot open for any
//!    reason other than "not found". Abort and leave the path untouched.
//!
//! Cloning, fixing the remote, and removing stale content are fatal on
//! failure. A failed pull is not: a stale checkout is still a checkout, so
//! the rest of the run carries on with whatever is on disk.

use crate::{
    config::RepositorySettings,
    exec::{run_checked, CommandRunner, ExecError, Invocation},
};

use git2::{ErrorCode, Repository};
use std::{
    fs::{remove_dir_all, remove_file, symlink_metadata},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Repository to synchronize, and where to put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoTarget {
    pub url: String,
    pub branch: String,
    pub local_path: PathBuf,
}

impl RepoTarget {
    /// Construct new repository target.
    pub fn new(
        url: impl Into<String>,
        branch: impl Into<String>,
        local_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            url: url.into(),
            branch: branch.into(),
            local_path: local_path.into(),
        }
    }
}

impl From<&RepositorySettings> for RepoTarget {
    fn from(settings: &RepositorySettings) -> Self {
        Self::new(&settings.url, &settings.branch, &settings.path)
    }
}

/// What currently occupies the local path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    /// Nothing exists at the local path.
    Absent,

    /// Something exists, but it is not a usable checkout.
    Invalid,

    /// Valid non-bare checkout, with the URL of its `origin` remote if any.
    Checkout { origin: Option<String> },
}

impl CheckoutState {
    /// Inspect local path without modifying it.
    ///
    /// # Errors
    ///
    /// - Return [`SyncError::Inspect`] if the path has a `.git` entry that
    ///   libgit2 cannot make sense of, e.g., a newer repository format.
    pub fn inspect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // INVARIANT: Dangling symlinks count as present so they get removed.
        if symlink_metadata(path).is_err() {
            return Ok(Self::Absent);
        }

        // INVARIANT: Only content without a `.git` entry may be called invalid.
        //   - Anything else might hold work that git can read but we cannot.
        if symlink_metadata(path.join(".git")).is_err() {
            debug!("{:?} has no .git entry", path.display());
            return Ok(Self::Invalid);
        }

        match Repository::open(path) {
            Ok(repository) if !repository.is_bare() => {
                let origin = repository
                    .find_remote("origin")
                    .ok()
                    .and_then(|remote| remote.url().map(ToString::to_string));
                Ok(Self::Checkout { origin })
            }
            Ok(_) => {
                debug!("{:?} is a bare repository", path.display());
                Ok(Self::Invalid)
            }
            Err(err) if err.code() == ErrorCode::NotFound => {
                debug!("{:?} is not a git checkout: {err}", path.display());
                Ok(Self::Invalid)
            }
            Err(err) => Err(SyncError::Inspect {
                source: err,
                path: path.into(),
            }),
        }
    }
}

/// How a synchronization ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Fresh clone was made.
    Cloned,

    /// Existing checkout was pulled.
    Pulled,

    /// Existing checkout could not be pulled, and was left as is.
    Stale,
}

/// Keeps a local checkout in line with its remote.
#[derive(Debug)]
pub struct Synchronizer<'a, R>
where
    R: CommandRunner,
{
    runner: &'a R,
    target: &'a RepoTarget,
}

impl<'a, R> Synchronizer<'a, R>
where
    R: CommandRunner,
{
    /// Construct new synchronizer for target.
    pub fn new(runner: &'a R, target: &'a RepoTarget) -> Self {
        Self { runner, target }
    }

    /// Reconcile local path with target repository.
    ///
    /// # Errors
    ///
    /// - Return [`SyncError::Inspect`] if local path cannot be classified.
    /// - Return [`SyncError::Remove`] if stale content cannot be removed.
    /// - Return [`SyncError::CreateParent`] if parent directory cannot be
    ///   created.
    /// - Return [`SyncError::Clone`] if cloning fails.
    /// - Return [`SyncError::Remote`] if `origin` cannot be corrected.
    #[instrument(skip(self), fields(path = %self.target.local_path.display()), level = "debug")]
    pub fn synchronize(&self) -> Result<SyncOutcome> {
        match CheckoutState::inspect(&self.target.local_path)? {
            CheckoutState::Absent => self.clone_fresh(),
            CheckoutState::Invalid => {
                warn!(
                    "{:?} is not a git checkout, replacing it",
                    self.target.local_path.display()
                );
                self.remove_local_path()?;
                self.clone_fresh()
            }
            CheckoutState::Checkout { origin } => {
                let matches = origin
                    .as_deref()
                    .is_some_and(|url| same_remote(url, &self.target.url));
                if !matches {
                    self.reset_origin(origin.is_some())?;
                }
                Ok(self.pull())
            }
        }
    }

    fn clone_fresh(&self) -> Result<SyncOutcome> {
        let path = &self.target.local_path;
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            mkdirp::mkdirp(parent).map_err(|err| SyncError::CreateParent {
                source: err,
                path: parent.into(),
            })?;
        }

        info!(
            "clone {} ({}) into {:?}",
            self.target.url,
            self.target.branch,
            path.display()
        );
        let clone = Invocation::new("git")
            .args(["clone", "--branch", self.target.branch.as_str(), self.target.url.as_str()])
            .arg(path.to_string_lossy());
        run_checked(self.runner, &clone).map_err(|err| SyncError::Clone {
            source: err,
            url: self.target.url.clone(),
        })?;

        Ok(SyncOutcome::Cloned)
    }

    fn reset_origin(&self, exists: bool) -> Result<()> {
        info!("point origin of {:?} at {}", self.target.local_path.display(), self.target.url);
        let action = if exists { "set-url" } else { "add" };
        let remote = self
            .git()
            .args(["remote", action, "origin", self.target.url.as_str()]);
        run_checked(self.runner, &remote).map_err(|err| SyncError::Remote {
            source: err,
            path: self.target.local_path.clone(),
        })?;

        Ok(())
    }

    fn pull(&self) -> SyncOutcome {
        let rebase = self.git().args(["config", "pull.rebase", "true"]);
        if let Err(err) = run_checked(self.runner, &rebase) {
            warn!("failed to enable rebase on pull: {err}");
        }

        let pull = self
            .git()
            .args(["pull", "origin", self.target.branch.as_str()]);
        match run_checked(self.runner, &pull) {
            Ok(_) => {
                info!("{:?} is up to date", self.target.local_path.display());
                SyncOutcome::Pulled
            }
            Err(err) => {
                warn!("failed to pull, continuing with local copy: {err}");
                SyncOutcome::Stale
            }
        }
    }

    fn remove_local_path(&self) -> Result<()> {
        let path = &self.target.local_path;
        let result = match symlink_metadata(path) {
            Ok(metadata) if metadata.is_dir() => remove_dir_all(path),
            Ok(_) => remove_file(path),
            Err(err) => Err(err),
        };

        result.map_err(|err| SyncError::Remove {
            source: err,
            path: path.clone(),
        })
    }

    fn git(&self) -> Invocation {
        Invocation::new("git").current_dir(&self.target.local_path)
    }
}

/// Compare remote URLs, ignoring trailing `/` and `.git`.
pub fn same_remote(lhs: &str, rhs: &str) -> bool {
    fn normalize(url: &str) -> &str {
        let url = url.trim().trim_end_matches('/');
        url.strip_suffix(".git").unwrap_or(url)
    }

    normalize(lhs) == normalize(rhs)
}

/// Repository synchronization error types.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Local path looks like a checkout, but could not be opened.
    #[error("failed to inspect {:?}", path.display())]
    Inspect {
        #[source]
        source: git2::Error,
        path: PathBuf,
    },

    /// Stale content at local path could not be removed.
    #[error("failed to remove {:?}", path.display())]
    Remove {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Parent directory of local path could not be created.
    #[error("failed to create directory {:?}", path.display())]
    CreateParent {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Repository could not be cloned.
    #[error("failed to clone {url}")]
    Clone {
        #[source]
        source: ExecError,
        url: String,
    },

    /// Remote of existing checkout could not be corrected.
    #[error("failed to reset origin of {:?}", path.display())]
    Remote {
        #[source]
        source: ExecError,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = SyncError> = std::result::Result<T, E>;
