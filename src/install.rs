// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Dependency installation.
//!
//! Make sure every required tool resolves on `PATH` before the dotfiles
//! repository is touched. Tools that already resolve are left alone, so a
//! fully provisioned host sees zero mutating commands.
//!
//! # Installation Policy
//!
//! Only Linux hosts get automatic installation. The first package manager
//! present in priority order is selected, refreshed once, and asked to install
//! every missing package in one go. If anything in that sequence fails, the
//! run stops right there. No second manager is tried, because mixing package
//! trees from different managers leaves the host in a state nobody can reason
//! about.
//!
//! Darwin and Windows hosts are told how to install the missing tools by hand.
//!
//! # AUR Helper
//!
//! Arch hosts may optionally get an AUR helper built from source through
//! `makepkg`. That step is a nice-to-have: failures are logged as warnings,
//! and never stop the run.

use crate::{
    config::{AurHelper, Requirement},
    exec::{run_checked, BinaryLookup, CommandRunner, ExecError, Invocation},
    probe::{HostProfile, OsFamily, PackageManagerId},
};

use std::{
    fs::remove_dir_all,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Installs missing tools through the host's native package manager.
#[derive(Debug)]
pub struct Installer<'a, H>
where
    H: CommandRunner + BinaryLookup,
{
    host: &'a H,
    profile: &'a HostProfile,
}

impl<'a, H> Installer<'a, H>
where
    H: CommandRunner + BinaryLookup,
{
    /// Construct new installer for probed host.
    pub fn new(host: &'a H, profile: &'a HostProfile) -> Self {
        Self { host, profile }
    }

    /// Ensure single tool resolves on `PATH`.
    ///
    /// # Errors
    ///
    /// - Return [`InstallError`] for the same reasons as
    ///   [`Installer::ensure_all_installed`].
    pub fn ensure_installed(&self, requirement: &Requirement) -> Result<()> {
        self.ensure_all_installed(std::slice::from_ref(requirement))
    }

    /// Ensure every tool resolves on `PATH`.
    ///
    /// Missing tools are installed with one update command followed by one
    /// install command listing all of their packages.
    ///
    /// # Errors
    ///
    /// - Return [`InstallError::UnsupportedPlatform`] if host is not Linux.
    /// - Return [`InstallError::NoPackageManager`] if no supported package
    ///   manager is present.
    /// - Return [`InstallError::Command`] if update or install command fails.
    /// - Return [`InstallError::Verification`] if a tool still does not
    ///   resolve after installation.
    #[instrument(skip(self, requirements), level = "debug")]
    pub fn ensure_all_installed(&self, requirements: &[Requirement]) -> Result<()> {
        let missing = requirements
            .iter()
            .filter(|requirement| {
                let present = self.host.resolves(&requirement.binary);
                if present {
                    info!("{} is already installed", requirement.binary);
                }
                !present
            })
            .collect::<Vec<_>>();

        if missing.is_empty() {
            return Ok(());
        }

        let packages = missing
            .iter()
            .map(|requirement| requirement.package.clone())
            .collect::<Vec<_>>();
        info!("missing tools: {}", packages.join(", "));

        if self.profile.os_family != OsFamily::Linux {
            return Err(InstallError::UnsupportedPlatform {
                os_family: self.profile.os_family,
                packages,
            });
        }

        let Some(manager) = self.profile.preferred_package_manager() else {
            return Err(InstallError::NoPackageManager { packages });
        };

        info!("package manager {manager:?} detected, installing {}", packages.join(" "));
        let update = manager.update_invocation();
        run_checked(self.host, &update).map_err(|err| InstallError::Command {
            manager,
            packages: packages.clone(),
            source: err,
        })?;

        let install = manager.install_invocation(packages.iter().cloned());
        run_checked(self.host, &install).map_err(|err| InstallError::Command {
            manager,
            packages: packages.clone(),
            source: err,
        })?;

        // INVARIANT: Installed tools must resolve before anything relies on them.
        for requirement in missing {
            if !self.host.resolves(&requirement.binary) {
                return Err(InstallError::Verification {
                    manager,
                    binary: requirement.binary.clone(),
                    packages,
                });
            }
            info!("{} installed through {manager}", requirement.binary);
        }

        Ok(())
    }

    /// Build and install AUR helper from source.
    ///
    /// Does nothing unless the host's selected package manager is pacman, or
    /// if the helper already resolves. The helper source is cloned into
    /// `cache_dir` (reusing an existing clone), built with `makepkg`, then the
    /// clone is removed.
    ///
    /// Returns `true` if the helper is available afterwards. Failures are
    /// logged, never propagated.
    #[instrument(skip(self, helper, cache_dir), level = "debug")]
    pub fn install_aur_helper(&self, helper: &AurHelper, cache_dir: &Path) -> bool {
        if self.profile.preferred_package_manager() != Some(PackageManagerId::Pacman) {
            debug!("not a pacman host, skip AUR helper {}", helper.name);
            return false;
        }

        if self.host.resolves(&helper.name) {
            info!("AUR helper {} is already installed", helper.name);
            return true;
        }

        match self.build_aur_helper(helper, cache_dir) {
            Ok(()) => {
                info!("AUR helper {} installed", helper.name);
                true
            }
            Err(err) => {
                warn!("failed to install AUR helper {}: {err}", helper.name);
                false
            }
        }
    }

    fn build_aur_helper(&self, helper: &AurHelper, cache_dir: &Path) -> Result<(), AurHelperError> {
        let build_dir = cache_dir.join(&helper.name);

        if build_dir.exists() {
            info!("reuse existing source at {:?}", build_dir.display());
        } else {
            mkdirp::mkdirp(cache_dir).map_err(|err| AurHelperError::Filesystem {
                source: err,
                path: cache_dir.into(),
            })?;
            let clone = Invocation::new("git")
                .args(["clone", helper.url.as_str()])
                .arg(build_dir.to_string_lossy());
            run_checked(self.host, &clone)?;
        }

        let build = Invocation::new("makepkg")
            .args(["-si", "--noconfirm"])
            .current_dir(&build_dir)
            .interactive();
        run_checked(self.host, &build)?;

        // INVARIANT: Helper must resolve before its sources are thrown away.
        if !self.host.resolves(&helper.name) {
            return Err(AurHelperError::Missing(helper.name.clone()));
        }

        remove_dir_all(&build_dir).map_err(|err| AurHelperError::Filesystem {
            source: err,
            path: build_dir.clone(),
        })?;

        Ok(())
    }
}

/// Dependency installation error types.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    /// Host is not eligible for automatic installation.
    #[error("automatic installation is not supported on {os_family} hosts")]
    UnsupportedPlatform {
        os_family: OsFamily,
        packages: Vec<String>,
    },

    /// No supported package manager is present.
    #[error("no recognized package manager for automatic installation")]
    NoPackageManager { packages: Vec<String> },

    /// Update or install command failed.
    #[error("package manager {manager} failed to install {}", packages.join(" "))]
    Command {
        manager: PackageManagerId,
        packages: Vec<String>,
        #[source]
        source: ExecError,
    },

    /// Tool still missing after a successful install.
    #[error("{binary} not found on PATH after installing through {manager}")]
    Verification {
        manager: PackageManagerId,
        binary: String,
        packages: Vec<String>,
    },
}

impl InstallError {
    /// Manual remediation the user can follow before re-running.
    pub fn hint(&self) -> String {
        match self {
            Self::UnsupportedPlatform {
                os_family: OsFamily::Darwin,
                packages,
            } => format!(
                "install {} manually, e.g., `xcode-select --install` then \
                 `brew install {}`, then re-run",
                packages.join(", "),
                packages.join(" ")
            ),
            Self::UnsupportedPlatform {
                os_family: OsFamily::Windows,
                packages,
            } => format!(
                "install {} manually, e.g., Git from https://git-scm.com/download/win, then re-run",
                packages.join(", ")
            ),
            Self::UnsupportedPlatform { packages, .. } | Self::NoPackageManager { packages } => {
                format!("install {} manually, then re-run", packages.join(", "))
            }
            Self::Command {
                manager, packages, ..
            }
            | Self::Verification {
                manager, packages, ..
            } => format!(
                "try installing manually with `{}`, then re-run",
                manager.manual_install_hint(packages.iter().map(String::as_str))
            ),
        }
    }
}

/// AUR helper build failures, only ever logged.
#[derive(Debug, thiserror::Error)]
enum AurHelperError {
    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("filesystem operation failed at {:?}", path.display())]
    Filesystem {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("{0} not found on PATH after makepkg")]
    Missing(String),
}

/// Friendly result alias :3
pub type Result<T, E = InstallError> = std::result::Result<T, E>;
