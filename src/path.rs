// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine default locations for everything the bootstrap procedure touches
//! on the host: the dotfiles checkout, the build cache for helper packages,
//! the generated inventory, and the optional configuration file.

use std::path::PathBuf;

/// Determine absolute path to user's home directory.
///
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(NoWayHome)
}

/// Determine default absolute path to the dotfiles checkout.
///
/// Uses `$HOME/dotfiles`.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn default_dotfiles_dir() -> Result<PathBuf> {
    home_dir().map(|path| path.join("dotfiles"))
}

/// Determine default absolute path to the helper build cache.
///
/// Uses XDG Base Directory path `$XDG_CACHE_HOME/dotboot`. Helper sources
/// such as AUR helpers are cloned and built in here.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_cache_dir() -> Result<PathBuf> {
    dirs::cache_dir()
        .map(|path| path.join("dotboot"))
        .ok_or(NoWayHome)
}

/// Determine default absolute path to the generated inventory file.
///
/// Uses `$XDG_DATA_HOME/dotboot/inventory.ini`.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn default_inventory_path() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|path| path.join("dotboot").join("inventory.ini"))
        .ok_or(NoWayHome)
}

/// Determine absolute path to the optional configuration file.
///
/// Uses `$XDG_CONFIG_HOME/dotboot/config.toml`. Does not check if the path
/// returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("dotboot").join("config.toml"))
        .ok_or(NoWayHome)
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
