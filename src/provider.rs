//! The narrow slice of the EC2 API the policy engine needs.
//!
//! [`ComputeApi`] is the only seam between the policy logic and the outside
//! world.  Production code uses [`crate::aws_cli::AwsCli`]; tests use
//! [`fake::FakeCompute`], which records every call so assertions can be made
//! on exactly which requests were issued.

use thiserror::Error;

use crate::model::{Filter, Snapshot, Tag, Volume};

/// A failure reported by (or while talking to) the compute provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered with an error code, e.g.
    /// `InvalidVolume.NotFound` or `UnauthorizedOperation`.
    #[error("{operation} failed with {code}: {message}")]
    Api {
        operation: String,
        code: String,
        message: String,
    },

    /// The request never produced a usable answer: the client could not be
    /// spawned, exited without an error code, or printed something that was
    /// not the expected JSON.
    #[error("{operation}: {message}")]
    Transport { operation: String, message: String },
}

impl ProviderError {
    /// Returns `true` for any `*.NotFound` error code.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { code, .. } if code.ends_with(".NotFound"))
    }
}

/// The five EC2 operations this tool consumes.
///
/// Filters passed in one call combine with AND semantics.
pub trait ComputeApi {
    /// Describe volumes, optionally restricted to `volume_ids`.  Asking for an
    /// id that does not exist is a not-found error, not an empty result.
    fn describe_volumes(
        &self,
        volume_ids: &[String],
        filters: &[Filter],
    ) -> Result<Vec<Volume>, ProviderError>;

    fn describe_snapshots(&self, filters: &[Filter]) -> Result<Vec<Snapshot>, ProviderError>;

    /// Start a snapshot of `volume_id` and return the new snapshot id.
    fn create_snapshot(&self, volume_id: &str, description: &str)
    -> Result<String, ProviderError>;

    fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), ProviderError>;

    fn create_tags(&self, resource_ids: &[String], tags: &[Tag]) -> Result<(), ProviderError>;
}

// ─── Test double ──────────────────────────────────────────────────────────────

#[cfg(test)]
pub mod fake {
    use std::cell::RefCell;

    use super::*;
    use crate::model::{SnapshotState, has_tag};

    /// One recorded request.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        DescribeVolumes {
            volume_ids: Vec<String>,
            filters: Vec<Filter>,
        },
        DescribeSnapshots {
            filters: Vec<Filter>,
        },
        CreateSnapshot {
            volume_id: String,
            description: String,
        },
        DeleteSnapshot {
            snapshot_id: String,
        },
        CreateTags {
            resource_ids: Vec<String>,
            tags: Vec<Tag>,
        },
    }

    /// In-memory provider.  Applies filters the way EC2 does (AND across
    /// filters, OR across values) and records every call.
    #[derive(Debug, Default)]
    pub struct FakeCompute {
        pub volumes: Vec<Volume>,
        pub snapshots: Vec<Snapshot>,
        /// Volume ids whose `create_snapshot` fails with a generic fault.
        pub fail_create_for: Vec<String>,
        /// Snapshot ids whose `delete_snapshot` fails.
        pub fail_delete_for: Vec<String>,
        /// Volume ids `describe_volumes` answers with an empty list instead
        /// of a not-found error.
        pub empty_listing_for: Vec<String>,
        pub fail_tagging: bool,
        pub fail_describe: bool,
        pub(crate) calls: RefCell<Vec<Call>>,
        pub(crate) next_id: RefCell<u32>,
    }

    impl FakeCompute {
        pub fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        pub fn creates(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::CreateSnapshot { volume_id, .. } => Some(volume_id),
                    _ => None,
                })
                .collect()
        }

        pub fn deletes(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::DeleteSnapshot { snapshot_id } => Some(snapshot_id),
                    _ => None,
                })
                .collect()
        }

        pub fn tag_calls(&self) -> Vec<(Vec<String>, Vec<Tag>)> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::CreateTags { resource_ids, tags } => Some((resource_ids, tags)),
                    _ => None,
                })
                .collect()
        }

        fn record(&self, call: Call) {
            self.calls.borrow_mut().push(call);
        }

        fn fault(operation: &str, code: &str) -> ProviderError {
            ProviderError::Api {
                operation: operation.into(),
                code: code.into(),
                message: "injected by test".into(),
            }
        }
    }

    fn matches(filter: &Filter, volume_id: &str, tags: &[Tag]) -> bool {
        if filter.name == "volume-id" {
            return filter.values.iter().any(|v| v == volume_id);
        }
        if let Some(key) = filter.name.strip_prefix("tag:") {
            return filter
                .values
                .iter()
                .any(|v| has_tag(tags, &Tag::new(key, v.as_str())));
        }
        false
    }

    impl ComputeApi for FakeCompute {
        fn describe_volumes(
            &self,
            volume_ids: &[String],
            filters: &[Filter],
        ) -> Result<Vec<Volume>, ProviderError> {
            self.record(Call::DescribeVolumes {
                volume_ids: volume_ids.to_vec(),
                filters: filters.to_vec(),
            });
            if self.fail_describe {
                return Err(Self::fault("DescribeVolumes", "RequestLimitExceeded"));
            }
            if volume_ids.iter().any(|id| self.empty_listing_for.contains(id)) {
                return Ok(Vec::new());
            }
            for id in volume_ids {
                if !self.volumes.iter().any(|v| &v.volume_id == id) {
                    return Err(ProviderError::Api {
                        operation: "DescribeVolumes".into(),
                        code: "InvalidVolume.NotFound".into(),
                        message: format!("The volume '{id}' does not exist."),
                    });
                }
            }
            Ok(self
                .volumes
                .iter()
                .filter(|v| volume_ids.is_empty() || volume_ids.contains(&v.volume_id))
                .filter(|v| filters.iter().all(|f| matches(f, &v.volume_id, &v.tags)))
                .cloned()
                .collect())
        }

        fn describe_snapshots(&self, filters: &[Filter]) -> Result<Vec<Snapshot>, ProviderError> {
            self.record(Call::DescribeSnapshots {
                filters: filters.to_vec(),
            });
            if self.fail_describe {
                return Err(Self::fault("DescribeSnapshots", "RequestLimitExceeded"));
            }
            Ok(self
                .snapshots
                .iter()
                .filter(|s| filters.iter().all(|f| matches(f, &s.volume_id, &s.tags)))
                .cloned()
                .collect())
        }

        fn create_snapshot(
            &self,
            volume_id: &str,
            description: &str,
        ) -> Result<String, ProviderError> {
            self.record(Call::CreateSnapshot {
                volume_id: volume_id.into(),
                description: description.into(),
            });
            if self.fail_create_for.iter().any(|v| v == volume_id) {
                return Err(Self::fault("CreateSnapshot", "SnapshotCreationPerVolumeRateExceeded"));
            }
            let mut next = self.next_id.borrow_mut();
            *next += 1;
            Ok(format!("snap-new-{next}"))
        }

        fn delete_snapshot(&self, snapshot_id: &str) -> Result<(), ProviderError> {
            self.record(Call::DeleteSnapshot {
                snapshot_id: snapshot_id.into(),
            });
            if self.fail_delete_for.iter().any(|s| s == snapshot_id) {
                return Err(Self::fault("DeleteSnapshot", "InvalidSnapshot.InUse"));
            }
            Ok(())
        }

        fn create_tags(&self, resource_ids: &[String], tags: &[Tag]) -> Result<(), ProviderError> {
            self.record(Call::CreateTags {
                resource_ids: resource_ids.to_vec(),
                tags: tags.to_vec(),
            });
            if self.fail_tagging {
                return Err(Self::fault("CreateTags", "RequestLimitExceeded"));
            }
            Ok(())
        }
    }

    /// Convenience constructor for fixture snapshots.
    pub fn snapshot(
        id: &str,
        volume_id: &str,
        start_time: chrono::DateTime<chrono::Utc>,
        tags: Vec<Tag>,
    ) -> Snapshot {
        Snapshot {
            snapshot_id: id.into(),
            volume_id: volume_id.into(),
            start_time,
            state: SnapshotState::Completed,
            description: format!("fixture {id}"),
            tags,
        }
    }

    pub fn volume(id: &str, tags: Vec<Tag>) -> Volume {
        Volume {
            volume_id: id.into(),
            tags,
            attachments: vec![],
        }
    }
}
