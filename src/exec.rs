// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External command execution.
//!
//! Every package manager, git, and playbook call made during a bootstrap run
//! goes through the [`CommandRunner`] capability, and every `PATH` probe goes
//! through [`BinaryLookup`]. The system implementations spawn real processes.
//! Test doubles can record invocations and script their results instead.
//!
//! # Interactive Versus Captured
//!
//! Some commands need the terminal, e.g., sudo password prompts, or the
//! become-password prompt of the automation tool. Those are run
//! __interactive__: they inherit stdio, and their captured output is empty.
//! Everything else is __captured__ so its output can be logged or attached to
//! an error.

use indicatif::{ProgressBar, ProgressStyle};
use std::{
    ffi::OsStr,
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    process::Command,
    time::Duration,
};
use tracing::{debug, error, info, instrument};

/// Single external command to execute.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub interactive: bool,
}

impl Invocation {
    /// Construct new captured invocation of `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    /// Append single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set working directory.
    pub fn current_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Check if command may prompt for a password on the terminal, even
    /// when its output is captured.
    pub fn escalates(&self) -> bool {
        self.program == "sudo"
    }

    /// Let the command inherit the terminal.
    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    /// Full command line as a list of words.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl Display for Invocation {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.argv().join(" ").as_str())
    }
}

/// Outcome of an external command.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Exit status code, `-1` if terminated by a signal.
    pub status: i32,

    /// Captured stdout, empty for interactive commands.
    pub stdout: String,

    /// Captured stderr, empty for interactive commands.
    pub stderr: String,
}

impl CommandResult {
    /// Construct successful result with no output.
    pub fn ok() -> Self {
        Self::default()
    }

    /// Construct failed result with given status and stderr.
    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Check if command exited with status zero.
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Capability to run external commands.
pub trait CommandRunner {
    /// Run invocation to completion.
    ///
    /// A non-zero exit is __not__ an error here; only failing to launch the
    /// process at all is.
    fn run(&self, invocation: &Invocation) -> Result<CommandResult>;
}

/// Capability to check whether a binary resolves on `PATH`.
pub trait BinaryLookup {
    /// Check if `name` resolves to an executable.
    fn resolves(&self, name: &str) -> bool;
}

/// Real process execution on the current host.
#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

impl SystemRunner {
    /// Construct new system runner.
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    #[instrument(skip(self, invocation), fields(command = %invocation), level = "debug")]
    fn run(&self, invocation: &Invocation) -> Result<CommandResult> {
        if invocation.interactive {
            syscall_interactive(&invocation.program, &invocation.args, invocation.cwd.as_deref())
        } else {
            syscall_non_interactive(
                &invocation.program,
                &invocation.args,
                invocation.cwd.as_deref(),
                !invocation.escalates(),
            )
        }
    }
}

impl BinaryLookup for SystemRunner {
    fn resolves(&self, name: &str) -> bool {
        let found = which::which(name).is_ok();
        debug!("probe {name:?} on PATH: {found}");
        found
    }
}

/// Run invocation and escalate non-zero exit to an error.
///
/// The full command line and captured output are logged either way.
///
/// # Errors
///
/// - Return [`ExecError::Spawn`] if process cannot be launched.
/// - Return [`ExecError::Failed`] if process exits with non-zero status.
pub fn run_checked(runner: &impl CommandRunner, invocation: &Invocation) -> Result<CommandResult> {
    let result = run_logged(runner, invocation)?;
    if !result.success() {
        return Err(ExecError::Failed {
            command: invocation.to_string(),
            status: result.status,
            stdout: result.stdout,
            stderr: result.stderr,
        });
    }

    Ok(result)
}

/// Run invocation and log the outcome without judging it.
///
/// # Errors
///
/// - Return [`ExecError::Spawn`] if process cannot be launched.
pub fn run_logged(runner: &impl CommandRunner, invocation: &Invocation) -> Result<CommandResult> {
    info!("run: {invocation}");
    let result = runner.run(invocation)?;

    if result.success() {
        if !result.stdout.trim().is_empty() {
            debug!("stdout: {}", result.stdout.trim_end());
        }
    } else {
        error!("command {:?} exited with status {}", invocation.to_string(), result.status);
        if !result.stdout.trim().is_empty() {
            error!("stdout: {}", result.stdout.trim_end());
        }
        if !result.stderr.trim().is_empty() {
            error!("stderr: {}", result.stderr.trim_end());
        }
    }

    Ok(result)
}

fn syscall_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    cwd: Option<&Path>,
) -> Result<CommandResult> {
    let mut command = Command::new(cmd.as_ref());
    command.args(args);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    let status = command
        .spawn()
        .and_then(|mut child| child.wait())
        .map_err(|err| ExecError::Spawn {
            source: err,
            program: cmd.as_ref().to_string_lossy().into_owned(),
        })?;

    Ok(CommandResult {
        status: status.code().unwrap_or(-1),
        ..Default::default()
    })
}

fn syscall_non_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
    cwd: Option<&Path>,
    spin: bool,
) -> Result<CommandResult> {
    let mut command = Command::new(cmd.as_ref());
    command.args(args);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    // INVARIANT: Never redraw over a password prompt.
    let bar = if spin {
        let bar = ProgressBar::new_spinner();
        let template = "{spinner:.yellow} {elapsed_precise:.green}  {msg}";
        if let Ok(style) = ProgressStyle::with_template(template) {
            bar.set_style(style.tick_chars("-Cco. "));
        }
        bar.set_message(cmd.as_ref().to_string_lossy().into_owned());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    } else {
        ProgressBar::hidden()
    };

    let output = command.output();
    bar.finish_and_clear();
    let output = output.map_err(|err| ExecError::Spawn {
        source: err,
        program: cmd.as_ref().to_string_lossy().into_owned(),
    })?;

    // INVARIANT: Chomp trailing newlines.
    let chomp = |bytes: &[u8]| {
        let text = String::from_utf8_lossy(bytes).into_owned();
        text.strip_suffix("\r\n")
            .or(text.strip_suffix('\n'))
            .map(ToString::to_string)
            .unwrap_or(text)
    };

    Ok(CommandResult {
        status: output.status.code().unwrap_or(-1),
        stdout: chomp(output.stdout.as_slice()),
        stderr: chomp(output.stderr.as_slice()),
    })
}

/// Command execution error types.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// Process could not be launched.
    #[error("failed to launch {program:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        program: String,
    },

    /// Process exited with non-zero status.
    #[error("command {command:?} failed with status {status}: {}", stderr.trim())]
    Failed {
        command: String,
        status: i32,
        stdout: String,
        stderr: String,
    },
}

/// Friendly result alias :3
pub type Result<T, E = ExecError> = std::result::Result<T, E>;
