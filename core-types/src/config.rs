// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use config::Config;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_PREFIX: &str = "CUTOFF";
/// Upper bound on the discovery look-back, roughly a century.
pub const MAX_RANGE_DAYS: u32 = 36_500;

/// What happens when a market that already has a stored cutoff is discovered again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverwritePolicy {
    /// The first stored cutoff is kept; later writes are acknowledged no-ops.
    #[default]
    FirstWins,
    /// Later discoveries replace the stored record.
    Replace,
}

/// Recognized options for discovery, persistence and caching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutoffConfig {
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    #[serde(default = "default_document_file")]
    pub document_file: String,
    #[serde(default = "default_range_days")]
    pub default_range_days: u32,
    #[serde(default = "default_max_discovery_attempts")]
    pub max_discovery_attempts: u32,
    #[serde(default = "default_target_precision_hours")]
    pub target_precision_hours: u32,
    #[serde(default = "default_inter_probe_delay_ms")]
    pub inter_probe_delay_ms: u64,
    #[serde(default = "default_backup_retention_count")]
    pub backup_retention_count: usize,
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
    #[serde(default)]
    pub overwrite_policy: OverwritePolicy,
    #[serde(default = "default_sync_minutes_per_month")]
    pub sync_minutes_per_month: u32,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("cutoff.state")
}

fn default_document_file() -> String {
    "cutoff_history.json".to_string()
}

fn default_range_days() -> u32 {
    1000
}

fn default_max_discovery_attempts() -> u32 {
    15
}

fn default_target_precision_hours() -> u32 {
    24
}

fn default_inter_probe_delay_ms() -> u64 {
    1_000
}

fn default_backup_retention_count() -> usize {
    10
}

fn default_cache_ttl_seconds() -> u64 {
    3_600
}

fn default_sync_minutes_per_month() -> u32 {
    2
}

impl Default for CutoffConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            document_file: default_document_file(),
            default_range_days: default_range_days(),
            max_discovery_attempts: default_max_discovery_attempts(),
            target_precision_hours: default_target_precision_hours(),
            inter_probe_delay_ms: default_inter_probe_delay_ms(),
            backup_retention_count: default_backup_retention_count(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
            overwrite_policy: OverwritePolicy::default(),
            sync_minutes_per_month: default_sync_minutes_per_month(),
        }
    }
}

impl CutoffConfig {
    /// Layers an optional config file under `CUTOFF_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.document_file.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "document_file",
                reason: "must not be empty".to_string(),
            });
        }
        if self.document_file.contains(['/', '\\']) {
            return Err(ConfigError::Invalid {
                field: "document_file",
                reason: format!(
                    "'{}' must be a bare file name inside state_dir",
                    self.document_file
                ),
            });
        }
        if self.default_range_days > MAX_RANGE_DAYS {
            return Err(ConfigError::Invalid {
                field: "default_range_days",
                reason: format!(
                    "{} exceeds the maximum of {MAX_RANGE_DAYS}",
                    self.default_range_days
                ),
            });
        }
        if self.max_discovery_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "max_discovery_attempts",
                reason: "at least one probe is required".to_string(),
            });
        }
        Ok(())
    }

    pub fn document_path(&self) -> PathBuf {
        self.state_dir.join(&self.document_file)
    }

    pub fn inter_probe_delay(&self) -> Duration {
        Duration::from_millis(self.inter_probe_delay_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config source error: {0}")]
    Source(#[from] config::ConfigError),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
