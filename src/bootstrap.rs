// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bootstrap orchestration.
//!
//! Wire the prober, installer, synchronizer, and playbook runner together in
//! that exact order. Each step runs to completion before the next one starts.

use crate::{
    config::{BootstrapConfig, DEFAULT_REPO_URL},
    exec::{BinaryLookup, CommandRunner},
    install::{InstallError, Installer},
    path::default_config_path,
    playbook::{write_local_inventory, PlaybookError, PlaybookRunner},
    probe::HostProfile,
    sync::{RepoTarget, SyncError, SyncOutcome, Synchronizer},
};

use tracing::{info, instrument};

/// Full bootstrap procedure for one host.
#[derive(Debug)]
pub struct Bootstrap<'a, H>
where
    H: CommandRunner + BinaryLookup,
{
    config: &'a BootstrapConfig,
    host: &'a H,
}

impl<'a, H> Bootstrap<'a, H>
where
    H: CommandRunner + BinaryLookup,
{
    /// Construct new bootstrap procedure.
    pub fn new(config: &'a BootstrapConfig, host: &'a H) -> Self {
        Self { config, host }
    }

    /// Run every step against the current host.
    ///
    /// # Errors
    ///
    /// - Return [`BootstrapError`] at the first fatal step.
    #[instrument(skip(self), level = "debug")]
    pub fn run(&self) -> Result<()> {
        let profile = HostProfile::detect(self.host);
        self.run_with_profile(&profile)
    }

    /// Run every step against an already probed host.
    ///
    /// # Errors
    ///
    /// - Return [`BootstrapError::Unconfigured`] if the repository URL was
    ///   never set.
    /// - Return [`BootstrapError`] at the first fatal step.
    pub fn run_with_profile(&self, profile: &HostProfile) -> Result<()> {
        if self.config.repository.url == DEFAULT_REPO_URL {
            return Err(BootstrapError::Unconfigured);
        }

        let installer = Installer::new(self.host, profile);
        installer.ensure_all_installed(&self.config.requirements)?;
        if let Some(helper) = &self.config.aur_helper {
            installer.install_aur_helper(helper, &self.config.cache_dir);
        }

        let target = RepoTarget::from(&self.config.repository);
        match Synchronizer::new(self.host, &target).synchronize()? {
            SyncOutcome::Cloned => info!("dotfiles cloned"),
            SyncOutcome::Pulled => info!("dotfiles updated"),
            SyncOutcome::Stale => info!("dotfiles left as they were"),
        }

        write_local_inventory(&self.config.playbook.inventory)?;
        PlaybookRunner::new(self.host, &self.config.playbook.tool, &target.local_path)
            .run(self.config.playbook_path(), &self.config.playbook.inventory)?;

        info!("bootstrap complete");
        Ok(())
    }
}

/// Bootstrap error types.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Dotfiles repository URL still holds the placeholder.
    #[error("no dotfiles repository configured")]
    Unconfigured,

    /// Required tools could not be installed.
    #[error(transparent)]
    Install(#[from] InstallError),

    /// Dotfiles repository could not be synchronized.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Playbook could not be applied.
    #[error(transparent)]
    Playbook(#[from] PlaybookError),
}

impl BootstrapError {
    /// Manual remediation the user can follow before re-running.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Unconfigured => Some(format!(
                "set `url` under `[repository]` in {:?}",
                default_config_path()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|_| "$XDG_CONFIG_HOME/dotboot/config.toml".into())
            )),
            Self::Install(err) => Some(err.hint()),
            Self::Sync(SyncError::Inspect { path, .. }) => Some(format!(
                "update {:?} with git yourself, or move it aside to get a fresh clone",
                path.display()
            )),
            Self::Sync(SyncError::Remove { path, .. }) => Some(format!(
                "remove {:?} yourself, then re-run",
                path.display()
            )),
            Self::Sync(SyncError::Clone { url, .. }) => Some(format!(
                "check that {url} is reachable, e.g., `git ls-remote {url}`"
            )),
            Self::Playbook(PlaybookError::MissingPlaybook(path)) => Some(format!(
                "make sure the dotfiles repository provides {:?}",
                path.display()
            )),
            _ => None,
        }
    }
}

/// Friendly result alias :3
pub type Result<T, E = BootstrapError> = std::result::Result<T, E>;
