// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::time::Duration;

use core_types::{CutoffConfig, OverwritePolicy};

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub label: String,
    pub cache_ttl: Duration,
    pub overwrite_policy: OverwritePolicy,
    pub sync_minutes_per_month: u32,
}

impl ServiceConfig {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            cache_ttl: Duration::from_secs(3600),
            overwrite_policy: OverwritePolicy::FirstWins,
            sync_minutes_per_month: 2,
        }
    }

    pub fn from_cutoff_config(label: impl Into<String>, config: &CutoffConfig) -> Self {
        Self::new(label)
            .with_cache_ttl(config.cache_ttl())
            .with_overwrite_policy(config.overwrite_policy)
            .with_sync_minutes_per_month(config.sync_minutes_per_month)
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Policy applied when a forced rediscovery finds a market that is already stored.
    pub fn with_overwrite_policy(mut self, policy: OverwritePolicy) -> Self {
        self.overwrite_policy = policy;
        self
    }

    pub fn with_sync_minutes_per_month(mut self, minutes: u32) -> Self {
        self.sync_minutes_per_month = minutes;
        self
    }
}
