//! Snapshot policy engine: what to snapshot, what to keep, what to prune.
//!
//! # Rules
//!
//! | Rule       | Applies to                         | Threshold (default) |
//! |------------|------------------------------------|---------------------|
//! | Freshness  | `AutoPrune=True` snapshots of `v`  | age < 23 hours      |
//! | Retention  | all `AutoPrune=True` snapshots     | age > 7 days        |
//! | Selection  | volumes tagged `AutoSnapshot=True` | n/a                 |
//!
//! A fresh snapshot suppresses a new one for the same volume; an overdue
//! snapshot is deleted.  Everything this engine creates is tagged
//! `AutoPrune=True`, and it never deletes anything without that tag.
//!
//! The engine writes a plain-text report to any [`Write`] and returns typed
//! results, so the CLI can print summaries and tests can assert on both.

use std::io::Write;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{info, warn};

use crate::{
    config::RetentionPolicy,
    error::SnapshotError,
    model::{AUTO_PRUNE, AUTO_SNAPSHOT, Filter, Snapshot, Volume, has_tag},
    provider::ComputeApi,
};

/// `dd/mm-YYYY HH:MM UTC`, the timestamp format used throughout the report
/// and in snapshot descriptions.  Times are always rendered in UTC, never in
/// the host's local zone.
const TIME_FORMAT: &str = "%d/%m-%Y %H:%M UTC";

pub type Clock = fn() -> DateTime<Utc>;

// ─── Results ──────────────────────────────────────────────────────────────────

/// What `take_snapshot_of_volume` decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotDecision {
    /// An `AutoPrune` snapshot younger than the freshness window exists.
    Fresh { snapshot_id: String, age: TimeDelta },
    /// A new snapshot was created and tagged.
    Created { snapshot_id: String },
    /// Dry run: a snapshot would have been created.
    Planned,
}

/// Per-volume results of `backup_all_volumes`, in the order the provider
/// listed the volumes.
#[derive(Debug, Default)]
pub struct BackupReport {
    pub results: Vec<(String, Result<SnapshotDecision, SnapshotError>)>,
}

impl BackupReport {
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_err()).count()
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Deleted (or, in a dry run, due for deletion).
    pub deleted: Vec<String>,
    pub kept: Vec<String>,
    /// Overdue snapshots whose delete request failed.
    pub failed: Vec<String>,
}

// ─── Engine ───────────────────────────────────────────────────────────────────

pub struct SnapshotPolicyEngine<'a, P: ComputeApi, W: Write> {
    provider: &'a P,
    policy: RetentionPolicy,
    out: W,
    clock: Clock,
    dry_run: bool,
}

impl<'a, P: ComputeApi, W: Write> SnapshotPolicyEngine<'a, P, W> {
    pub fn new(provider: &'a P, policy: RetentionPolicy, out: W) -> Self {
        Self {
            provider,
            policy,
            out,
            clock: Utc::now,
            dry_run: false,
        }
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Report what would be created or deleted without issuing any mutating
    /// request.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    // ── listVolumes ──────────────────────────────────────────────────────────

    /// Print every volume with its tags and attachments.
    pub fn list_volumes(&mut self) -> Result<Vec<Volume>, SnapshotError> {
        let volumes = self.provider.describe_volumes(&[], &[])?;

        writeln!(self.out, "Volumes available")?;
        for volume in &volumes {
            writeln!(self.out, " - VolumeID: {}", volume.volume_id)?;
            for tag in &volume.tags {
                writeln!(self.out, " -- Tag: {} => {}", tag.key, tag.value)?;
            }
            if volume.attachments.is_empty() {
                writeln!(self.out, " -- Not attached.")?;
            }
            for a in &volume.attachments {
                writeln!(self.out, " -- Attached to {} ({})", a.instance_id, a.device)?;
            }
        }
        Ok(volumes)
    }

    // ── listSnapshots ────────────────────────────────────────────────────────

    /// Print every snapshot of `volume_id`, tagged or not.
    pub fn list_snapshots(&mut self, volume_id: Option<&str>) -> Result<Vec<Snapshot>, SnapshotError> {
        let volume_id = volume_id.ok_or(SnapshotError::MissingArgument(
            "Please specify the volume to list existing snapshots for",
        ))?;

        writeln!(self.out, "Listing snapshots of {volume_id}")?;
        let snapshots = self
            .provider
            .describe_snapshots(&[Filter::volume_id(volume_id)])?;

        writeln!(
            self.out,
            "The volume {volume_id} has {} snapshots",
            snapshots.len()
        )?;
        for s in &snapshots {
            self.write_snapshot_line(s)?;
        }
        Ok(snapshots)
    }

    // ── takeSnapshot ─────────────────────────────────────────────────────────

    /// Snapshot one volume unless it already has a fresh snapshot.
    ///
    /// Only a missing argument is returned as an error.  Provider faults,
    /// including an unknown volume, are reported to the output and yield
    /// `Ok(None)`.
    pub fn take_snapshot(
        &mut self,
        volume_id: Option<&str>,
    ) -> Result<Option<SnapshotDecision>, SnapshotError> {
        let volume_id = volume_id.ok_or(SnapshotError::MissingArgument(
            "Please specify the volume to snapshot",
        ))?;

        match self.take_snapshot_of_volume(volume_id) {
            Ok(decision) => Ok(Some(decision)),
            Err(SnapshotError::Io(e)) => Err(SnapshotError::Io(e)),
            Err(e) => {
                warn!(volume_id, error = %e, "snapshot failed");
                writeln!(self.out, "{e}")?;
                Ok(None)
            },
        }
    }

    /// Shared by `take_snapshot` and `backup_all_volumes`.
    pub fn take_snapshot_of_volume(
        &mut self,
        volume_id: &str,
    ) -> Result<SnapshotDecision, SnapshotError> {
        writeln!(self.out, "Taking snapshot of {volume_id}")?;

        let volumes = self
            .provider
            .describe_volumes(&[volume_id.to_string()], &[])
            .map_err(|e| {
                if e.is_not_found() {
                    SnapshotError::VolumeNotFound(volume_id.to_string())
                } else {
                    SnapshotError::Provider(e)
                }
            })?;
        if volumes.is_empty() {
            return Err(SnapshotError::VolumeNotFound(volume_id.to_string()));
        }

        let now = (self.clock)();
        let existing = self
            .provider
            .describe_snapshots(&[Filter::volume_id(volume_id), Filter::tag(&AUTO_PRUNE)])?;

        if let Some(fresh) = existing
            .iter()
            .find(|s| now - s.start_time < self.policy.min_interval)
        {
            let age = now - fresh.start_time;
            writeln!(
                self.out,
                " -- Found snapshot {} taken {} ago, not taking new snapshot",
                fresh.snapshot_id,
                format_age(age)
            )?;
            return Ok(SnapshotDecision::Fresh {
                snapshot_id: fresh.snapshot_id.clone(),
                age,
            });
        }

        let description = format!(
            "Automatic snapshot of {volume_id} taken on {}",
            now.format(TIME_FORMAT)
        );

        if self.dry_run {
            writeln!(self.out, " -- Would create snapshot \"{description}\"")?;
            return Ok(SnapshotDecision::Planned);
        }

        let snapshot_id = self.provider.create_snapshot(volume_id, &description)?;
        info!(volume_id, snapshot_id = %snapshot_id, "created snapshot");

        self.provider
            .create_tags(&[snapshot_id.clone()], &[AUTO_PRUNE])
            .map_err(|source| SnapshotError::TagApplication {
                snapshot_id: snapshot_id.clone(),
                source,
            })?;
        info!(snapshot_id = %snapshot_id, tag = %AUTO_PRUNE, "tagged snapshot");

        writeln!(
            self.out,
            " -- Created snapshot {snapshot_id} (tagged {AUTO_PRUNE})"
        )?;
        Ok(SnapshotDecision::Created { snapshot_id })
    }

    // ── backupAllVolumes ─────────────────────────────────────────────────────

    /// Run `take_snapshot_of_volume` for every `AutoSnapshot=True` volume.
    ///
    /// A fault on one volume is reported and recorded; the remaining volumes
    /// are still processed.  Only a failure to list the volumes (or to write
    /// the report) aborts the batch.
    pub fn backup_all_volumes(&mut self) -> Result<BackupReport, SnapshotError> {
        let volumes: Vec<Volume> = self
            .provider
            .describe_volumes(&[], &[Filter::tag(&AUTO_SNAPSHOT)])?
            .into_iter()
            .filter(|v| has_tag(&v.tags, &AUTO_SNAPSHOT))
            .collect();
        writeln!(
            self.out,
            "Backing up {} volumes tagged {AUTO_SNAPSHOT}",
            volumes.len()
        )?;

        let mut report = BackupReport::default();
        for volume in volumes {
            let result = match self.take_snapshot_of_volume(&volume.volume_id) {
                Err(SnapshotError::Io(e)) => return Err(SnapshotError::Io(e)),
                Err(e) => {
                    warn!(volume_id = %volume.volume_id, error = %e, "snapshot failed");
                    writeln!(self.out, " -- {e}")?;
                    Err(e)
                },
                ok => ok,
            };
            report.results.push((volume.volume_id, result));
        }
        Ok(report)
    }

    // ── pruneSnapshots ───────────────────────────────────────────────────────

    /// Delete every `AutoPrune=True` snapshot older than the retention window.
    pub fn prune_snapshots(&mut self) -> Result<PruneReport, SnapshotError> {
        writeln!(self.out, "Finding all snapshots tagged {AUTO_PRUNE}")?;
        let snapshots: Vec<Snapshot> = self
            .provider
            .describe_snapshots(&[Filter::tag(&AUTO_PRUNE)])?
            .into_iter()
            .filter(|s| has_tag(&s.tags, &AUTO_PRUNE))
            .collect();
        let now = (self.clock)();

        let mut report = PruneReport::default();
        for s in &snapshots {
            self.write_snapshot_line(s)?;

            if now - s.start_time <= self.policy.max_age {
                writeln!(self.out, " -- Snapshot is still valid. Keeping.")?;
                report.kept.push(s.snapshot_id.clone());
                continue;
            }

            if self.dry_run {
                writeln!(self.out, " -- Snapshot overdue. Would delete.")?;
                report.deleted.push(s.snapshot_id.clone());
                continue;
            }

            writeln!(self.out, " -- Snapshot overdue. Deleting")?;
            match self.provider.delete_snapshot(&s.snapshot_id) {
                Ok(()) => {
                    info!(snapshot_id = %s.snapshot_id, volume_id = %s.volume_id, "deleted snapshot");
                    report.deleted.push(s.snapshot_id.clone());
                },
                Err(e) => {
                    warn!(snapshot_id = %s.snapshot_id, error = %e, "delete failed");
                    writeln!(self.out, " -- {}", SnapshotError::Provider(e))?;
                    report.failed.push(s.snapshot_id.clone());
                },
            }
        }
        Ok(report)
    }

    // ── helpers ──────────────────────────────────────────────────────────────

    fn write_snapshot_line(&mut self, s: &Snapshot) -> Result<(), SnapshotError> {
        writeln!(
            self.out,
            " - {} ({}) on {} Description \"{}\"",
            s.snapshot_id,
            s.state,
            s.start_time.format(TIME_FORMAT),
            s.description
        )?;
        Ok(())
    }
}

/// `2d 4h`, `5h 30m`, `12m`.
pub fn format_age(age: TimeDelta) -> String {
    let minutes = age.num_minutes().max(0);
    let (days, hours, mins) = (minutes / 1440, (minutes / 60) % 24, minutes % 60);
    match (days, hours) {
        (0, 0) => format!("{mins}m"),
        (0, _) => format!("{hours}h {mins}m"),
        _ => format!("{days}d {hours}h"),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
