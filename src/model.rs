//! Domain types as reported by the EC2 API.
//!
//! The field names follow the JSON emitted by `aws ec2 describe-*`
//! (`PascalCase`), so these types deserialize straight from the client's
//! output.  Nothing here is owned by this tool: volumes are read-only, and
//! snapshots are only ever created, tagged, or deleted through the provider.

use std::{borrow::Cow, fmt};

use chrono::{DateTime, Utc};
use serde::Deserialize;

// ─── Tags ─────────────────────────────────────────────────────────────────────

/// Marker tag applied to every snapshot this tool creates.  Only snapshots
/// carrying it are ever pruned.
pub const AUTO_PRUNE: Tag = Tag::fixed("AutoPrune", "True");

/// Marker tag on volumes that `backupAllVolumes` should snapshot.
pub const AUTO_SNAPSHOT: Tag = Tag::fixed("AutoSnapshot", "True");

/// A key/value tag.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: Cow<'static, str>,
    pub value: Cow<'static, str>,
}

impl Tag {
    #[cfg(test)]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Cow::Owned(key.into()),
            value: Cow::Owned(value.into()),
        }
    }

    const fn fixed(key: &'static str, value: &'static str) -> Self {
        Self {
            key: Cow::Borrowed(key),
            value: Cow::Borrowed(value),
        }
    }

    /// The `Key=…,Value=…` shorthand understood by `aws ec2 create-tags`.
    pub fn shorthand(&self) -> String {
        format!("Key={},Value={}", self.key, self.value)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Returns `true` if `tags` contains exactly `wanted` (key and value).
pub fn has_tag(tags: &[Tag], wanted: &Tag) -> bool {
    tags.iter().any(|t| t == wanted)
}

// ─── Volumes ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Volume {
    pub volume_id: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Attachment {
    pub instance_id: String,
    pub device: String,
}

// ─── Snapshots ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Snapshot {
    pub snapshot_id: String,
    pub volume_id: String,
    pub start_time: DateTime<Utc>,
    pub state: SnapshotState,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Provider-driven lifecycle state.  This tool observes it but never drives
/// anything except deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotState {
    Pending,
    Completed,
    Error,
    Recoverable,
    Recovering,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for SnapshotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Recoverable => "recoverable",
            Self::Recovering => "recovering",
            Self::Unknown => "unknown",
        })
    }
}

// ─── Filters ──────────────────────────────────────────────────────────────────

/// A `describe-*` filter.  Multiple filters combine with AND semantics; the
/// values inside one filter combine with OR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub name: String,
    pub values: Vec<String>,
}

impl Filter {
    /// `tag:<key>` equals `<value>`.
    pub fn tag(tag: &Tag) -> Self {
        Self {
            name: format!("tag:{}", tag.key),
            values: vec![tag.value.to_string()],
        }
    }

    pub fn volume_id(id: &str) -> Self {
        Self {
            name: "volume-id".into(),
            values: vec![id.to_string()],
        }
    }

    /// The `Name=…,Values=…` shorthand understood by `aws ec2 --filters`.
    pub fn shorthand(&self) -> String {
        format!("Name={},Values={}", self.name, self.values.join(","))
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
