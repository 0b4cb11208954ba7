use std::io;

use thiserror::Error;

use crate::{model::AUTO_PRUNE, provider::ProviderError};

/// Errors raised by the snapshot policy engine.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// A required argument was not given.  Raised before any API call.
    #[error("{0}")]
    MissingArgument(&'static str),

    #[error("Unable to find volume {0}")]
    VolumeNotFound(String),

    #[error("General AWS error: {0}")]
    Provider(#[from] ProviderError),

    /// The snapshot exists but carries no `AutoPrune` tag, so pruning will
    /// never see it.
    #[error(
        "snapshot {snapshot_id} was created but could not be tagged {tag}; \
         tag or delete it by hand ({source})",
        tag = AUTO_PRUNE
    )]
    TagApplication {
        snapshot_id: String,
        source: ProviderError,
    },

    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
}

impl SnapshotError {
    /// Whether this error should fail the whole process.  Everything else is
    /// reported at the action boundary and the process exits normally.
    pub const fn is_usage_error(&self) -> bool {
        matches!(self, Self::MissingArgument(_))
    }
}
