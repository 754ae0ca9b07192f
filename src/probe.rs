// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Host environment probing.
//!
//! Determine which operating system family we are running on, and which
//! package managers are available on `PATH`. Probing is read-only, and cannot
//! fail: a host with no recognized package manager is a perfectly valid
//! outcome that the installer reports as unsupported later on.

use crate::exec::{BinaryLookup, Invocation};

use std::{
    collections::BTreeSet,
    fmt::{Display, Formatter, Result as FmtResult},
};
use tracing::{debug, info, instrument};

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    Linux,
    Darwin,
    Windows,
    Unknown,
}

impl OsFamily {
    /// Map value of [`std::env::consts::OS`] to family.
    pub fn from_os_name(name: &str) -> Self {
        match name {
            "linux" => Self::Linux,
            "macos" => Self::Darwin,
            "windows" => Self::Windows,
            _ => Self::Unknown,
        }
    }
}

impl Display for OsFamily {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(match self {
            Self::Linux => "Linux",
            Self::Darwin => "Darwin",
            Self::Windows => "Windows",
            Self::Unknown => "Unknown",
        })
    }
}

/// Supported native package managers.
///
/// Variants are declared in selection priority order, so the derived [`Ord`]
/// doubles as the priority: the first manager present wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PackageManagerId {
    Apt,
    Dnf,
    Pacman,
    Yum,
    Zypper,
}

impl PackageManagerId {
    /// Every manager in priority order.
    pub const ALL: [Self; 5] = [Self::Apt, Self::Dnf, Self::Pacman, Self::Yum, Self::Zypper];

    /// Binary probed on `PATH` to detect this manager.
    pub fn probe_binary(&self) -> &'static str {
        match self {
            Self::Apt => "apt-get",
            Self::Dnf => "dnf",
            Self::Pacman => "pacman",
            Self::Yum => "yum",
            Self::Zypper => "zypper",
        }
    }

    /// Program and arguments that refresh package metadata.
    pub fn update_command(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Apt => ("sudo", &["apt-get", "update"]),
            Self::Dnf => ("sudo", &["dnf", "update", "-y"]),
            Self::Pacman => ("sudo", &["pacman", "-Syy", "--noconfirm"]),
            Self::Yum => ("sudo", &["yum", "update", "-y"]),
            Self::Zypper => ("sudo", &["zypper", "--non-interactive", "refresh"]),
        }
    }

    /// Program and argument prefix that install packages appended to it.
    pub fn install_command(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Apt => ("sudo", &["apt-get", "install", "-y"]),
            Self::Dnf => ("sudo", &["dnf", "install", "-y"]),
            Self::Pacman => ("sudo", &["pacman", "-S", "--noconfirm"]),
            Self::Yum => ("sudo", &["yum", "install", "-y"]),
            Self::Zypper => ("sudo", &["zypper", "--non-interactive", "install"]),
        }
    }

    /// Invocation that refreshes package metadata.
    pub fn update_invocation(&self) -> Invocation {
        let (program, args) = self.update_command();
        Invocation::new(program).args(args.iter().copied())
    }

    /// Invocation that installs `packages`.
    pub fn install_invocation(
        &self,
        packages: impl IntoIterator<Item = impl Into<String>>,
    ) -> Invocation {
        let (program, args) = self.install_command();
        Invocation::new(program)
            .args(args.iter().copied())
            .args(packages)
    }

    /// Human readable install command for given packages.
    pub fn manual_install_hint<'a>(&self, packages: impl IntoIterator<Item = &'a str>) -> String {
        let (program, args) = self.install_command();
        let mut words = vec![program];
        words.extend(args);
        words.extend(packages);
        words.join(" ")
    }
}

impl Display for PackageManagerId {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(match self {
            Self::Apt => "apt",
            Self::Dnf => "dnf",
            Self::Pacman => "pacman",
            Self::Yum => "yum",
            Self::Zypper => "zypper",
        })
    }
}

/// Snapshot of host environment.
///
/// Computed once at the start of a run, then never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostProfile {
    pub os_family: OsFamily,
    pub package_managers: BTreeSet<PackageManagerId>,
}

impl HostProfile {
    /// Construct new profile.
    pub fn new(
        os_family: OsFamily,
        package_managers: impl IntoIterator<Item = PackageManagerId>,
    ) -> Self {
        Self {
            os_family,
            package_managers: package_managers.into_iter().collect(),
        }
    }

    /// Probe current host.
    #[instrument(skip(lookup), level = "debug")]
    pub fn detect(lookup: &impl BinaryLookup) -> Self {
        let profile = Self {
            os_family: detect_os(),
            package_managers: detect_package_managers(lookup),
        };
        info!(
            "detected {} host with package managers: [{}]",
            profile.os_family,
            profile
                .package_managers
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );

        profile
    }

    /// Highest priority package manager present.
    pub fn preferred_package_manager(&self) -> Option<PackageManagerId> {
        self.package_managers.first().copied()
    }
}

/// Detect operating system family of current host.
pub fn detect_os() -> OsFamily {
    OsFamily::from_os_name(std::env::consts::OS)
}

/// Detect package managers available on `PATH`.
pub fn detect_package_managers(lookup: &impl BinaryLookup) -> BTreeSet<PackageManagerId> {
    PackageManagerId::ALL
        .into_iter()
        .filter(|manager| {
            let present = lookup.resolves(manager.probe_binary());
            debug!("package manager {manager} present: {present}");
            present
        })
        .collect()
}
