// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Idempotent dotfiles bootstrap.
//!
//! Take a host from "nothing installed" to "dotfiles applied" in four steps:
//!
//! 1. [`probe`] the operating system and available package managers.
//! 2. [`install`] missing tools through the preferred package manager.
//! 3. [`sync`] the dotfiles repository into its local checkout.
//! 4. Apply the repository's [`playbook`].
//!
//! Every step tolerates whatever a previous run left behind, so running the
//! bootstrap again on a provisioned host only pulls and re-applies. External
//! programs are reached exclusively through [`exec::CommandRunner`] and
//! [`exec::BinaryLookup`].
//!
//! The [`badge`] module is a separate utility that renders static CI badges.

pub mod badge;
pub mod bootstrap;
pub mod config;
pub mod exec;
pub mod install;
pub mod path;
pub mod playbook;
pub mod probe;
pub mod sync;

pub use bootstrap::{Bootstrap, BootstrapError};
pub use config::BootstrapConfig;
pub use exec::{BinaryLookup, CommandResult, CommandRunner, Invocation, SystemRunner};
