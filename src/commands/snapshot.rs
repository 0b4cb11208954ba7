//! `ebs-snapshot snapshot <ACTION> [VOLUME]`: the action boundary.
//!
//! Maps each [`Action`] onto one policy-engine method.  This is also where
//! faults stop: a missing argument fails the process, every provider fault is
//! written to the same report stream as the engine's own fault lines and the
//! process still exits zero, matching how the tool is run from cron.

use std::io::{self, Write};

use anyhow::Result;

use crate::{
    aws_cli::AwsCli,
    cli::Action,
    config::Config,
    policy::{BackupReport, SnapshotDecision, SnapshotPolicyEngine, format_age},
    provider::ComputeApi,
    ui::{self, VolumeOutcome},
};

/// Run `action` against the real `aws` client.
pub fn run(cfg: &Config, action: Action, volume: Option<&str>, dry_run: bool) -> Result<()> {
    let api = AwsCli::new(cfg.provider.clone());
    let stdout = io::stdout();
    dispatch(&api, cfg, action, volume, dry_run, stdout.lock())
}

/// Provider-agnostic half of [`run`].
pub fn dispatch<P: ComputeApi, W: Write>(
    api: &P,
    cfg: &Config,
    action: Action,
    volume: Option<&str>,
    dry_run: bool,
    mut out: W,
) -> Result<()> {
    let mut engine =
        SnapshotPolicyEngine::new(api, cfg.policy.retention(), &mut out).dry_run(dry_run);

    let result = match action {
        Action::ListVolumes => engine.list_volumes().map(drop),
        Action::ListSnapshots => engine.list_snapshots(volume).map(drop),
        Action::TakeSnapshot => engine.take_snapshot(volume).map(drop),
        Action::PruneSnapshots => engine.prune_snapshots().map(|report| {
            tracing::info!(
                deleted = report.deleted.len(),
                kept = report.kept.len(),
                failed = report.failed.len(),
                "prune finished"
            );
        }),
        Action::BackupAllVolumes => engine.backup_all_volumes().map(|report| {
            tracing::info!(
                volumes = report.results.len(),
                failed = report.failures(),
                "backup finished"
            );
            ui::print_summary(&outcomes(&report));
        }),
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_usage_error() => Err(e.into()),
        Err(e) => {
            tracing::warn!(action = ?action, error = %e, "action failed");
            writeln!(out, "{e}")?;
            Ok(())
        },
    }
}

/// Turn a [`BackupReport`] into summary rows.
pub fn outcomes(report: &BackupReport) -> Vec<VolumeOutcome> {
    report
        .results
        .iter()
        .map(|(volume_id, result)| match result {
            Ok(decision) => VolumeOutcome {
                label: volume_id.clone(),
                success: true,
                detail: describe(decision),
                error: None,
            },
            Err(e) => VolumeOutcome {
                label: volume_id.clone(),
                success: false,
                detail: String::new(),
                error: Some(e.to_string()),
            },
        })
        .collect()
}

fn describe(decision: &SnapshotDecision) -> String {
    match decision {
        SnapshotDecision::Created { snapshot_id } => format!("created {snapshot_id}"),
        SnapshotDecision::Fresh { snapshot_id, age } => {
            format!("fresh: {snapshot_id} ({} old)", format_age(*age))
        },
        SnapshotDecision::Planned => "would create".into(),
    }
}
