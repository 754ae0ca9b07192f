// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Playbook execution.
//!
//! Hand the synchronized dotfiles over to the configuration-automation tool.
//! The tool runs interactively, because it asks for the privilege escalation
//! password up front.

use crate::exec::{run_logged, BinaryLookup, CommandRunner, ExecError, Invocation};

use std::{
    fs::write,
    path::{Path, PathBuf},
};
use tracing::{info, instrument, warn};

/// Inventory content targeting only the local machine.
pub const LOCAL_INVENTORY: &str = "[local]\nlocalhost ansible_connection=local\n";

/// Runs a playbook against the local host.
#[derive(Debug)]
pub struct PlaybookRunner<'a, H>
where
    H: CommandRunner + BinaryLookup,
{
    host: &'a H,
    tool: &'a str,
    checkout: &'a Path,
}

impl<'a, H> PlaybookRunner<'a, H>
where
    H: CommandRunner + BinaryLookup,
{
    /// Construct new runner that invokes `tool` from the `checkout` root.
    pub fn new(host: &'a H, tool: &'a str, checkout: &'a Path) -> Self {
        Self {
            host,
            tool,
            checkout,
        }
    }

    /// Run playbook with given inventory.
    ///
    /// A missing inventory is not fatal: the tool falls back to its own
    /// default inventory.
    ///
    /// # Errors
    ///
    /// - Return [`PlaybookError::ToolMissing`] if tool does not resolve.
    /// - Return [`PlaybookError::MissingPlaybook`] if playbook does not exist.
    /// - Return [`PlaybookError::Exec`] if tool cannot be launched.
    /// - Return [`PlaybookError::Failed`] if tool exits with non-zero status.
    #[instrument(skip(self, playbook, inventory), level = "debug")]
    pub fn run(&self, playbook: impl AsRef<Path>, inventory: impl AsRef<Path>) -> Result<()> {
        let playbook = playbook.as_ref();
        let inventory = inventory.as_ref();

        if !self.host.resolves(self.tool) {
            return Err(PlaybookError::ToolMissing(self.tool.into()));
        }

        if !playbook.is_file() {
            return Err(PlaybookError::MissingPlaybook(playbook.into()));
        }

        let mut invocation = Invocation::new(self.tool)
            .arg("--ask-become-pass")
            .current_dir(self.checkout)
            .interactive();
        if inventory.is_file() {
            invocation = invocation.args(["-i".into(), inventory.to_string_lossy().into_owned()]);
        } else {
            warn!(
                "inventory {:?} not found, using {} default",
                inventory.display(),
                self.tool
            );
        }
        let invocation = invocation.arg(playbook.to_string_lossy());

        info!("apply playbook {:?}", playbook.display());
        let result = run_logged(self.host, &invocation)?;
        if !result.success() {
            return Err(PlaybookError::Failed {
                playbook: playbook.into(),
                status: result.status,
            });
        }

        info!("playbook {:?} applied", playbook.display());
        Ok(())
    }
}

/// Write inventory with a single local-connection host.
///
/// Existing inventories are left untouched. Returns `true` if a new file was
/// written.
///
/// # Errors
///
/// - Return [`PlaybookError::WriteInventory`] if file or its parent directory
///   cannot be created.
pub fn write_local_inventory(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(false);
    }

    let into_error = |err| PlaybookError::WriteInventory {
        source: err,
        path: path.into(),
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        mkdirp::mkdirp(parent).map_err(into_error)?;
    }
    write(path, LOCAL_INVENTORY).map_err(into_error)?;
    info!("wrote local inventory to {:?}", path.display());

    Ok(true)
}

/// Playbook error types.
#[derive(Debug, thiserror::Error)]
pub enum PlaybookError {
    /// Automation tool is not on `PATH`.
    #[error("{0} not found on PATH")]
    ToolMissing(String),

    /// Playbook file does not exist.
    #[error("playbook not found at {:?}", .0.display())]
    MissingPlaybook(PathBuf),

    /// Inventory could not be written.
    #[error("failed to write inventory at {:?}", path.display())]
    WriteInventory {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Automation tool could not be launched.
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// Automation tool reported failure.
    #[error("playbook {:?} failed with status {status}", playbook.display())]
    Failed { playbook: PathBuf, status: i32 },
}

/// Friendly result alias :3
pub type Result<T, E = PlaybookError> = std::result::Result<T, E>;
