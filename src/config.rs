// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the immutable configuration that drives a bootstrap run. The
//! compiled-in defaults describe the dotfiles repository, the playbook to
//! apply, and the tools the host needs before anything else can happen. A
//! TOML file with the same layout can replace those defaults wholesale.
//!
//! # General Layout
//!
//! ```toml
//! cache_dir = "$HOME/.cache/dotboot"
//!
//! [repository]
//! url = "https://github.com/someone/dotfiles.git"
//! branch = "main"
//! path = "$HOME/dotfiles"
//!
//! [playbook]
//! path = "playbook.yml"
//! inventory = "$HOME/.local/share/dotboot/inventory.ini"
//!
//! [[requirement]]
//! binary = "git"
//! package = "git"
//!
//! [aur_helper]
//! name = "yay"
//! url = "https://aur.archlinux.org/yay-bin.git"
//! ```

use crate::path::{
    default_cache_dir, default_config_path, default_dotfiles_dir, default_inventory_path,
    NoWayHome,
};

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, info, instrument};

/// Placeholder for the dotfiles repository, which every user must configure.
pub const DEFAULT_REPO_URL: &str = "https://git.example.invalid/YOUR-USER/dotfiles.git";

/// Branch checked out when none is configured.
pub const DEFAULT_BRANCH: &str = "main";

/// Playbook path, relative to the root of the dotfiles checkout.
pub const DEFAULT_PLAYBOOK: &str = "playbook.yml";

/// Binary of the configuration-automation tool.
pub const DEFAULT_PLAYBOOK_TOOL: &str = "ansible-playbook";

/// Source of the prebuilt AUR helper package.
pub const DEFAULT_AUR_HELPER_URL: &str = "https://aur.archlinux.org/yay-bin.git";

/// Bootstrap configuration.
///
/// Constructed once per run, then handed by reference to every component.
/// Nothing mutates it afterwards.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct BootstrapConfig {
    /// Directory where helper sources are cloned and built.
    pub cache_dir: PathBuf,

    /// Dotfiles repository to synchronize.
    pub repository: RepositorySettings,

    /// Playbook to apply after synchronization.
    pub playbook: PlaybookSettings,

    /// Tools that must resolve on `PATH` before the playbook can run.
    #[serde(rename = "requirement", default = "default_requirements")]
    pub requirements: Vec<Requirement>,

    /// AUR helper to build on pacman hosts.
    pub aur_helper: Option<AurHelper>,
}

impl BootstrapConfig {
    /// Construct configuration from compiled-in defaults.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::NoWayHome`] if user directories cannot be
    ///   determined.
    pub fn try_default() -> Result<Self> {
        Ok(Self {
            cache_dir: default_cache_dir()?,
            repository: RepositorySettings {
                url: DEFAULT_REPO_URL.into(),
                branch: DEFAULT_BRANCH.into(),
                path: default_dotfiles_dir()?,
            },
            playbook: PlaybookSettings {
                path: DEFAULT_PLAYBOOK.into(),
                inventory: default_inventory_path()?,
                tool: DEFAULT_PLAYBOOK_TOOL.into(),
            },
            requirements: default_requirements(),
            aur_helper: Some(AurHelper {
                name: "yay".into(),
                url: DEFAULT_AUR_HELPER_URL.into(),
            }),
        })
    }

    /// Load configuration file if it exists, or fall back to defaults.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if existing file cannot be read.
    /// - Return [`ConfigError::Deserialize`] if file content is invalid.
    /// - Return [`ConfigError::NoWayHome`] if defaults cannot be determined.
    #[instrument(skip(path), level = "debug")]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("no configuration at {:?}, using defaults", path.display());
            return Self::try_default();
        }

        info!("load configuration from {:?}", path.display());
        read_to_string(path)
            .map_err(|err| ConfigError::Read {
                source: err,
                path: path.into(),
            })?
            .parse()
    }

    /// Load configuration from its default location.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError`] for the same reasons as
    ///   [`BootstrapConfig::load_or_default`].
    pub fn load() -> Result<Self> {
        Self::load_or_default(default_config_path()?)
    }

    /// Absolute path to the playbook inside the checkout.
    pub fn playbook_path(&self) -> PathBuf {
        self.repository.path.join(&self.playbook.path)
    }
}

impl FromStr for BootstrapConfig {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: BootstrapConfig =
            toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every host path.
        config.cache_dir = expand_path(&config.cache_dir)?;
        config.repository.path = expand_path(&config.repository.path)?;
        config.playbook.inventory = expand_path(&config.playbook.inventory)?;

        Ok(config)
    }
}

impl Display for BootstrapConfig {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Repository to keep synchronized.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct RepositorySettings {
    /// Remote URL to clone from.
    pub url: String,

    /// Branch to check out and pull.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Local checkout path.
    pub path: PathBuf,
}

/// Playbook invocation settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct PlaybookSettings {
    /// Playbook path relative to checkout root.
    #[serde(default = "default_playbook")]
    pub path: PathBuf,

    /// Inventory file path.
    pub inventory: PathBuf,

    /// Automation tool binary.
    #[serde(default = "default_playbook_tool")]
    pub tool: String,
}

/// Tool that must resolve on `PATH`.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Requirement {
    /// Executable name probed on `PATH`.
    pub binary: String,

    /// Distribution package that provides the executable.
    pub package: String,
}

impl Requirement {
    /// Construct new requirement.
    pub fn new(binary: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            package: package.into(),
        }
    }
}

/// AUR helper built from source on pacman hosts.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct AurHelper {
    /// Helper binary name, also used as cache directory name.
    pub name: String,

    /// Git URL of the helper's PKGBUILD source.
    pub url: String,
}

fn default_requirements() -> Vec<Requirement> {
    vec![
        Requirement::new("git", "git"),
        Requirement::new(DEFAULT_PLAYBOOK_TOOL, "ansible"),
    ]
}

fn default_branch() -> String {
    DEFAULT_BRANCH.into()
}

fn default_playbook() -> PathBuf {
    DEFAULT_PLAYBOOK.into()
}

fn default_playbook_tool() -> String {
    DEFAULT_PLAYBOOK_TOOL.into()
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    Ok(shellexpand::full(path.to_string_lossy().as_ref())
        .map_err(ConfigError::ShellExpansion)?
        .into_owned()
        .into())
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read configuration at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Failed to determine default paths.
    #[error(transparent)]
    NoWayHome(#[from] NoWayHome),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
