// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use dotboot::badge::{
    self,
    github::{GitHubClient, API_URL},
    UNKNOWN,
};

use anyhow::Result;
use clap::Parser;
use std::{path::PathBuf, process::exit};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Render static CI badges for a hosted repository.
#[derive(Debug, Clone, Parser)]
#[command(about, long_about, version)]
struct Cli {
    /// Owner of the repository.
    #[arg(long, value_name = "owner")]
    pub owner: String,

    /// Name of the repository.
    #[arg(long, value_name = "repo")]
    pub repo: String,

    /// Directory to write SVG badges into.
    #[arg(short, long, value_name = "path", default_value = "docs/badges")]
    pub out: PathBuf,

    /// Coverage percentage, or "unknown".
    #[arg(short, long, value_name = "percent", default_value = UNKNOWN)]
    pub coverage: String,

    /// API token sent as bearer authentication.
    #[arg(long, value_name = "token", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// API root to query.
    #[arg(long, value_name = "url", default_value = API_URL)]
    pub api_url: String,
}

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

    if let Err(error) = run(Cli::parse()) {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run(opts: Cli) -> Result<()> {
    let client = GitHubClient::new(opts.api_url, opts.token)?;
    let written = badge::generate(&client, &opts.owner, &opts.repo, &opts.coverage, &opts.out)?;
    info!("generated {} badges in {:?}", written.len(), opts.out.display());

    Ok(())
}
