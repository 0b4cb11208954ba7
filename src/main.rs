//! `ebs-snapshot`: EBS snapshot rotation driven by volume tags.
//!
//! # Overview
//!
//! Volumes tagged `AutoSnapshot=True` get at most one automatic snapshot per
//! freshness window; every automatic snapshot is tagged `AutoPrune=True` and
//! deleted once it is older than the retention window.  All EC2 access goes
//! through the `aws` command-line client, so credentials, profiles and
//! instance roles work exactly as they do for `aws` itself.
//!
//! # Usage
//!
//! ```text
//! ebs-snapshot snapshot listVolumes
//! ebs-snapshot snapshot listSnapshots vol-0abc
//! ebs-snapshot snapshot takeSnapshot vol-0abc
//! ebs-snapshot snapshot backupAllVolumes
//! ebs-snapshot snapshot pruneSnapshots --dry-run
//! ebs-snapshot init                 # scaffold snapshot.toml
//! ebs-snapshot --print-config       # show merged config without calling AWS
//! ```
//!
//! # Module layout
//!
//! | Module                   | Responsibility                                 |
//! |--------------------------|------------------------------------------------|
//! | [`cli`]                  | Argument types parsed by clap                  |
//! | [`config`]               | `Config` struct, TOML loader, global merge     |
//! | [`model`]                | Volumes, snapshots, tags, filters              |
//! | [`provider`]             | `ComputeApi` trait and provider errors         |
//! | [`runner`]               | `aws ec2 …` argument construction              |
//! | [`aws_cli`]              | `ComputeApi` over the `aws` client             |
//! | [`policy`]               | Freshness / retention decisions                |
//! | [`ui`]                   | Spinner, captured execution, summary output    |
//! | [`logging`]              | `tracing` subscriber setup                     |
//! | [`commands::init`]       | `ebs-snapshot init`                            |
//! | [`commands::snapshot`]   | `ebs-snapshot snapshot <ACTION>`               |

mod aws_cli;
mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod model;
mod policy;
mod provider;
mod runner;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::{Cli, Subcommand};

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_logging(cli.verbose)?;

    // Wins over any subcommand: nothing below may reach AWS.
    if cli.print_config {
        println!("{:#?}", load_config(&cli)?);
        return Ok(());
    }

    match &cli.command {
        // ── ebs-snapshot init ────────────────────────────────────────────────
        Some(Subcommand::Init) => {
            commands::init::run(&cli.config)?;
        },

        // ── ebs-snapshot snapshot <ACTION> [VOLUME] ──────────────────────────
        Some(Subcommand::Snapshot { action, volume }) => {
            let cfg = load_config(&cli)?;
            commands::snapshot::run(&cfg, *action, volume.as_deref(), cli.dry_run)?;
        },

        None => {
            Cli::command().print_help()?;
        },
    }

    Ok(())
}

/// Global + local config files, then `--region` / `--profile` on top.
fn load_config(cli: &Cli) -> Result<config::Config> {
    let global = config::global_config_path();
    let mut cfg = config::load_merged(global.as_deref(), &cli.config)?;

    if let Some(region) = &cli.region {
        cfg.provider.region.clone_from(region);
    }
    if let Some(profile) = &cli.profile {
        cfg.provider.profile = Some(profile.clone());
    }
    Ok(cfg)
}
