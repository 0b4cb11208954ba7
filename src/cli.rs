//! Command-line interface definition.
//!
//! All argument parsing lives here so the rest of the codebase can stay
//! agnostic to `clap`.  The `Cli` struct is parsed once in `main` and then
//! passed (by reference) into the command handlers.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Top-level CLI arguments, shared across every subcommand.
#[derive(Parser, Debug)]
#[command(
    name    = "ebs-snapshot",
    about   = "Rotate EBS snapshots of volumes tagged AutoSnapshot=True",
    version,
    help_template = "\
{before-help}{name} {version}
{about}

{usage-heading} {usage}

{all-args}{after-help}"
)]
pub struct Cli {
    /// Path to the configuration file.
    ///
    /// Defaults to `snapshot.toml` in the current working directory.  Values
    /// found here override the global `~/.config/ebs-snapshot/config.toml`.
    #[arg(short, long, default_value = "snapshot.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Subcommand>,

    /// Print the merged configuration and exit without calling AWS.
    ///
    /// Takes precedence over any subcommand.
    #[arg(long, global = true)]
    pub print_config: bool,

    /// Region override, e.g. `eu-west-1`.
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Named AWS profile override.
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Report what would be created or deleted, but change nothing.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// More diagnostics on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(clap::Subcommand, Debug, PartialEq, Eq)]
pub enum Subcommand {
    /// Manage EBS snapshots.
    Snapshot {
        /// What to do.
        action: Action,

        /// Volume id (required for listSnapshots and takeSnapshot).
        volume: Option<String>,
    },

    /// Scaffold a `snapshot.toml` in the current directory.
    ///
    /// Exits with an error if the file already exists.
    Init,
}

/// The `snapshot` actions.  Names keep the camelCase spelling used in
/// existing cron entries.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// List every volume with its tags and attachments.
    #[value(name = "listVolumes")]
    ListVolumes,

    /// List all snapshots of VOLUME.
    #[value(name = "listSnapshots")]
    ListSnapshots,

    /// Snapshot VOLUME unless it has a fresh AutoPrune snapshot.
    #[value(name = "takeSnapshot")]
    TakeSnapshot,

    /// Delete AutoPrune snapshots older than the retention window.
    #[value(name = "pruneSnapshots", alias = "deleteOldAutocreatedSnapshots")]
    PruneSnapshots,

    /// Snapshot every volume tagged AutoSnapshot=True.
    #[value(name = "backupAllVolumes")]
    BackupAllVolumes,
}
