//! Configuration types and loading logic.
//!
//! `Config` is a direct 1-to-1 mapping of `snapshot.toml`.  Every field has a
//! default, so the file is entirely optional: without one the tool talks to
//! `eu-west-1` through whatever credentials the `aws` client picks up, and
//! applies the standard 23-hour / 7-day policy.
//!
//! # File format
//!
//! ```toml
//! [provider]
//! region       = "eu-west-1"
//! profile      = "backups"                 # optional; aws client default otherwise
//! endpoint_url = "http://localhost:4566"   # optional
//! aws_bin      = "aws"
//!
//! [policy]
//! min_interval_hours = 23   # never snapshot a volume twice within this window
//! max_age_days       = 7    # prune AutoPrune snapshots older than this
//! ```
//!
//! # Merging
//!
//! Two files are read: the global `<config dir>/ebs-snapshot/config.toml` and
//! the local `--config` path.  Each is parsed into a [`PartialConfig`] where
//! every field is optional, the two are merged with local values winning, and
//! the result is resolved against the defaults.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

// ─── Top-level ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Default, PartialEq, Eq, Clone)]
pub struct Config {
    /// How to reach the EC2 API.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Freshness and retention thresholds.
    #[serde(default)]
    pub policy: PolicyConfig,
}

// ─── [provider] ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct ProviderConfig {
    /// Region every request is sent to.
    #[serde(default = "default_region")]
    pub region: String,

    /// Named profile from `~/.aws/config`.  `None` lets the client fall back
    /// to its own credential chain (environment, instance role, …).
    #[serde(default)]
    pub profile: Option<String>,

    /// Alternative endpoint, e.g. a LocalStack instance.
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// The `aws` executable.  A bare name is looked up on `PATH`.
    #[serde(default = "default_aws_bin")]
    pub aws_bin: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            profile: None,
            endpoint_url: None,
            aws_bin: default_aws_bin(),
        }
    }
}

// ─── [policy] ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
pub struct PolicyConfig {
    /// A volume with an `AutoPrune` snapshot younger than this is skipped.
    #[serde(default = "default_min_interval_hours")]
    pub min_interval_hours: u32,

    /// `AutoPrune` snapshots older than this are deleted.
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_interval_hours: default_min_interval_hours(),
            max_age_days: default_max_age_days(),
        }
    }
}

/// The two thresholds the policy engine compares snapshot ages against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub min_interval: TimeDelta,
    pub max_age: TimeDelta,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        PolicyConfig::default().retention()
    }
}

impl PolicyConfig {
    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy {
            min_interval: TimeDelta::hours(i64::from(self.min_interval_hours)),
            max_age: TimeDelta::days(i64::from(self.max_age_days)),
        }
    }
}

// ─── Defaults ─────────────────────────────────────────────────────────────────

pub fn default_region() -> String {
    "eu-west-1".into()
}

pub fn default_aws_bin() -> String {
    "aws".into()
}

pub const fn default_min_interval_hours() -> u32 {
    23
}

pub const fn default_max_age_days() -> u32 {
    7
}

// ─── Partial config (for merging) ─────────────────────────────────────────────

/// Every field optional, so an absent key can be told apart from a default.
#[derive(Debug, Deserialize, Default)]
pub struct PartialConfig {
    #[serde(default)]
    pub provider: PartialProvider,
    #[serde(default)]
    pub policy: PartialPolicy,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialProvider {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub endpoint_url: Option<String>,
    pub aws_bin: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialPolicy {
    pub min_interval_hours: Option<u32>,
    pub max_age_days: Option<u32>,
}

impl PartialConfig {
    /// Field-wise merge; values present in `over` win.
    #[must_use]
    pub fn merge(self, over: Self) -> Self {
        Self {
            provider: PartialProvider {
                region: over.provider.region.or(self.provider.region),
                profile: over.provider.profile.or(self.provider.profile),
                endpoint_url: over.provider.endpoint_url.or(self.provider.endpoint_url),
                aws_bin: over.provider.aws_bin.or(self.provider.aws_bin),
            },
            policy: PartialPolicy {
                min_interval_hours: over
                    .policy
                    .min_interval_hours
                    .or(self.policy.min_interval_hours),
                max_age_days: over.policy.max_age_days.or(self.policy.max_age_days),
            },
        }
    }

    /// Fill every missing field from the defaults.
    pub fn resolve(self) -> Config {
        Config {
            provider: ProviderConfig {
                region: self.provider.region.unwrap_or_else(default_region),
                profile: self.provider.profile,
                endpoint_url: self.provider.endpoint_url,
                aws_bin: self.provider.aws_bin.unwrap_or_else(default_aws_bin),
            },
            policy: PolicyConfig {
                min_interval_hours: self
                    .policy
                    .min_interval_hours
                    .unwrap_or_else(default_min_interval_hours),
                max_age_days: self
                    .policy
                    .max_age_days
                    .unwrap_or_else(default_max_age_days),
            },
        }
    }
}

// ─── Loader ───────────────────────────────────────────────────────────────────

/// Parse `path` as a [`PartialConfig`].
///
/// Returns `Ok(None)` if the file does not exist, and an error if it exists
/// but cannot be read or is not valid TOML.
pub fn parse_partial(path: &Path) -> Result<Option<PartialConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    let partial = toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(partial))
}

/// Load configuration from the global file (if any) and `local_path`.
///
/// A broken global file is reported and ignored; a broken local file is an
/// error, since it is the one the operator pointed at.
pub fn load_merged(global_path: Option<&Path>, local_path: &Path) -> Result<Config> {
    let global = match global_path.map(parse_partial) {
        Some(Ok(Some(p))) => p,
        Some(Err(e)) => {
            tracing::warn!(error = %format!("{e:#}"), "ignoring unreadable global config");
            PartialConfig::default()
        },
        _ => PartialConfig::default(),
    };

    let local = if let Some(p) = parse_partial(local_path)? {
        p
    } else {
        tracing::info!(
            path = %local_path.display(),
            "config file not found, using defaults (run `ebs-snapshot init` to create one)"
        );
        PartialConfig::default()
    };

    Ok(global.merge(local).resolve())
}

/// `<config dir>/ebs-snapshot/config.toml`, if the platform has a config dir.
pub fn global_config_path() -> Option<std::path::PathBuf> {
    dirs_next::config_dir().map(|d| d.join("ebs-snapshot").join("config.toml"))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
