// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use dotboot::{Bootstrap, BootstrapConfig, BootstrapError, SystemRunner};

use anyhow::Result;
use clap::Parser;
use std::process::exit;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install git and ansible, synchronize dotfiles, and apply their playbook.
///
/// Takes no options. Defaults are compiled in, and can be overridden through
/// `$XDG_CONFIG_HOME/dotboot/config.toml`.
#[derive(Debug, Clone, Parser)]
#[command(about, long_about, version)]
struct Cli {}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    Cli::parse();

    if let Err(error) = run() {
        error!("{error:?}");
        if let Some(hint) = error
            .downcast_ref::<BootstrapError>()
            .and_then(BootstrapError::hint)
        {
            info!("{hint}");
        }
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    let config = BootstrapConfig::load()?;
    info!(
        "bootstrap dotfiles from {} ({}) into {:?}",
        config.repository.url,
        config.repository.branch,
        config.repository.path.display()
    );

    let host = SystemRunner::new();
    Bootstrap::new(&config, &host).run()?;

    Ok(())
}
