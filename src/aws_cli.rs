//! [`ComputeApi`] backed by the `aws` command-line client.
//!
//! Each operation builds its argument vector with [`crate::runner`], runs it
//! through [`crate::ui::run_with_spinner`], and decodes the JSON the client
//! prints.  On failure the client prints a line of the form
//!
//! ```text
//! An error occurred (InvalidVolume.NotFound) when calling the DescribeVolumes operation: The volume 'vol-1' does not exist.
//! ```
//!
//! which [`parse_api_error`] turns into a [`ProviderError::Api`].

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    config::ProviderConfig,
    model::{Filter, Snapshot, Tag, Volume},
    provider::{ComputeApi, ProviderError},
    runner, ui,
};

pub struct AwsCli {
    cfg: ProviderConfig,
}

impl AwsCli {
    pub const fn new(cfg: ProviderConfig) -> Self {
        Self { cfg }
    }

    /// Run `args` and return stdout, mapping every failure mode onto
    /// [`ProviderError`].
    fn call(&self, operation: &str, args: &[String]) -> Result<String, ProviderError> {
        debug!(operation, args = ?args, "calling aws");

        let (ok, stdout, stderr) =
            ui::run_with_spinner(operation, args).map_err(|e| ProviderError::Transport {
                operation: operation.into(),
                message: format!("{e:#}"),
            })?;

        if ok {
            return Ok(stdout);
        }

        Err(parse_api_error(operation, &stderr).unwrap_or_else(|| {
            ProviderError::Transport {
                operation: operation.into(),
                message: format!("aws exited non-zero: {}", stderr.trim()),
            }
        }))
    }

    fn call_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        args: &[String],
    ) -> Result<T, ProviderError> {
        let stdout = self.call(operation, args)?;
        decode(operation, &stdout)
    }
}

// ─── Response shapes ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeVolumesResponse {
    #[serde(default)]
    volumes: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeSnapshotsResponse {
    #[serde(default)]
    snapshots: Vec<Snapshot>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateSnapshotResponse {
    snapshot_id: String,
}

fn decode<T: DeserializeOwned>(operation: &str, stdout: &str) -> Result<T, ProviderError> {
    serde_json::from_str(stdout).map_err(|e| ProviderError::Transport {
        operation: operation.into(),
        message: format!("unexpected response: {e}"),
    })
}

/// Extract `(Code)` and the trailing message from the client's error line.
pub fn parse_api_error(operation: &str, stderr: &str) -> Option<ProviderError> {
    let line = stderr
        .lines()
        .find(|l| l.contains("An error occurred ("))?;
    let start = line.find('(')? + 1;
    let end = start + line[start..].find(')')?;
    let code = line[start..end].to_string();
    let message = line[end..]
        .split_once(": ")
        .map_or_else(String::new, |(_, m)| m.trim().to_string());

    Some(ProviderError::Api {
        operation: operation.into(),
        code,
        message,
    })
}

// ─── ComputeApi ───────────────────────────────────────────────────────────────

impl ComputeApi for AwsCli {
    fn describe_volumes(
        &self,
        volume_ids: &[String],
        filters: &[Filter],
    ) -> Result<Vec<Volume>, ProviderError> {
        let args = runner::describe_volumes_args(&self.cfg, volume_ids, filters);
        let resp: DescribeVolumesResponse = self.call_json("DescribeVolumes", &args)?;
        Ok(resp.volumes)
    }

    fn describe_snapshots(&self, filters: &[Filter]) -> Result<Vec<Snapshot>, ProviderError> {
        let args = runner::describe_snapshots_args(&self.cfg, filters);
        let resp: DescribeSnapshotsResponse = self.call_json("DescribeSnapshots", &args)?;
        Ok(resp.snapshots)
    }

    fn create_snapshot(
        &self,
        volume_id: &str,
        description: &str,
    ) -> Result<String, ProviderError> {
        let args = runner::create_snapshot_args(&self.cfg, volume_id, description);
        let resp: CreateSnapshotResponse = self.call_json("CreateSnapshot", &args)?;
        Ok(resp.snapshot_id)
    }

    fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), ProviderError> {
        let args = runner::delete_snapshot_args(&self.cfg, snapshot_id);
        self.call("DeleteSnapshot", &args).map(drop)
    }

    fn create_tags(&self, resource_ids: &[String], tags: &[Tag]) -> Result<(), ProviderError> {
        let args = runner::create_tags_args(&self.cfg, resource_ids, tags);
        self.call("CreateTags", &args).map(drop)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
