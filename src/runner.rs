//! `aws` argument construction helpers.
//!
//! This module is responsible for *building* the argument lists passed to the
//! `aws` client.  It does not execute anything: process execution lives in
//! [`crate::ui`] and response decoding in [`crate::aws_cli`].  Every function
//! here is pure and unit-testable without spawning a child process.

use crate::{
    config::ProviderConfig,
    model::{Filter, Tag},
};

// ─── aws base command ─────────────────────────────────────────────────────────

/// Builds the prefix shared by every `ec2` invocation:
///
/// ```text
/// aws  --region <region>  [--profile <p>]  [--endpoint-url <url>]  --output json  ec2  <operation>
/// ```
pub fn ec2_base(cfg: &ProviderConfig, operation: &str) -> Vec<String> {
    let mut cmd: Vec<String> = vec![cfg.aws_bin.clone(), "--region".into(), cfg.region.clone()];
    if let Some(profile) = &cfg.profile {
        cmd.extend(["--profile".into(), profile.clone()]);
    }
    if let Some(url) = &cfg.endpoint_url {
        cmd.extend(["--endpoint-url".into(), url.clone()]);
    }
    cmd.extend([
        "--output".into(),
        "json".into(),
        "ec2".into(),
        operation.into(),
    ]);
    cmd
}

/// Appends `--filters F1 F2 …` when `filters` is non-empty.
fn push_filters(cmd: &mut Vec<String>, filters: &[Filter]) {
    if !filters.is_empty() {
        cmd.push("--filters".into());
        cmd.extend(filters.iter().map(Filter::shorthand));
    }
}

// ─── Operations ───────────────────────────────────────────────────────────────

/// `aws ec2 describe-volumes [--volume-ids …] [--filters …]`
pub fn describe_volumes_args(
    cfg: &ProviderConfig,
    volume_ids: &[String],
    filters: &[Filter],
) -> Vec<String> {
    let mut cmd = ec2_base(cfg, "describe-volumes");
    if !volume_ids.is_empty() {
        cmd.push("--volume-ids".into());
        cmd.extend(volume_ids.iter().cloned());
    }
    push_filters(&mut cmd, filters);
    cmd
}

/// `aws ec2 describe-snapshots --owner-ids self [--filters …]`
///
/// Without `--owner-ids` EC2 also returns every public snapshot in the
/// region.
pub fn describe_snapshots_args(cfg: &ProviderConfig, filters: &[Filter]) -> Vec<String> {
    let mut cmd = ec2_base(cfg, "describe-snapshots");
    cmd.extend(["--owner-ids".into(), "self".into()]);
    push_filters(&mut cmd, filters);
    cmd
}

/// `aws ec2 create-snapshot --volume-id <id> --description <text>`
pub fn create_snapshot_args(cfg: &ProviderConfig, volume_id: &str, description: &str) -> Vec<String> {
    let mut cmd = ec2_base(cfg, "create-snapshot");
    cmd.extend([
        "--volume-id".into(),
        volume_id.into(),
        "--description".into(),
        description.into(),
    ]);
    cmd
}

/// `aws ec2 delete-snapshot --snapshot-id <id>`
pub fn delete_snapshot_args(cfg: &ProviderConfig, snapshot_id: &str) -> Vec<String> {
    let mut cmd = ec2_base(cfg, "delete-snapshot");
    cmd.extend(["--snapshot-id".into(), snapshot_id.into()]);
    cmd
}

/// `aws ec2 create-tags --resources <ids…> --tags Key=…,Value=… …`
pub fn create_tags_args(cfg: &ProviderConfig, resource_ids: &[String], tags: &[Tag]) -> Vec<String> {
    let mut cmd = ec2_base(cfg, "create-tags");
    cmd.push("--resources".into());
    cmd.extend(resource_ids.iter().cloned());
    cmd.push("--tags".into());
    cmd.extend(tags.iter().map(Tag::shorthand));
    cmd
}

// ─── Tests ────────────────────────────────────────────────────────────────────
