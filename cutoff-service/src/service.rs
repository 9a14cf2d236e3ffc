// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use core_types::{CutoffConfig, OverwritePolicy};
use discovery_engine::{
    AvailabilityProbe, CutoffResult, DiscoveryConfig, DiscoveryEngine, ResultSource,
};
use history_store::{CutoffRecord, HistoryStore, PutOutcome, StoreConfig};
use log::{debug, error, info};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::{
    cache::ResultCache,
    config::ServiceConfig,
    error::Result,
    summary::CutoffSummary,
    validator::{PeriodValidator, ValidationResult},
};

const DAYS_PER_MONTH: i64 = 30;

/// Validation verdict plus the time a backfill would need to cover the gap.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryCheck {
    pub validation: ValidationResult,
    pub estimated_sync_wait: Option<Duration>,
}

/// Serves cutoffs from the cache, then the store, then a fresh discovery.
pub struct CutoffService {
    config: ServiceConfig,
    store: Arc<HistoryStore>,
    engine: DiscoveryEngine,
    cache: ResultCache,
    validator: PeriodValidator,
}

impl CutoffService {
    pub fn new(config: ServiceConfig, store: Arc<HistoryStore>, engine: DiscoveryEngine) -> Self {
        let cache = ResultCache::new(config.cache_ttl);
        Self {
            config,
            store,
            engine,
            cache,
            validator: PeriodValidator::new(),
        }
    }

    /// Builds the store, engine and facade from one configuration.
    pub fn open(config: &CutoffConfig) -> Result<Self> {
        let store = HistoryStore::open(StoreConfig::from_cutoff_config(config))?;
        let engine = DiscoveryEngine::new(DiscoveryConfig::from_cutoff_config("discovery", config));
        Ok(Self::new(
            ServiceConfig::from_cutoff_config("cutoff", config),
            Arc::new(store),
            engine,
        ))
    }

    pub fn store(&self) -> &Arc<HistoryStore> {
        &self.store
    }

    pub fn engine(&self) -> &DiscoveryEngine {
        &self.engine
    }

    pub async fn get_or_discover<P>(&self, market_tag: &str, probe: &P, force: bool) -> CutoffResult
    where
        P: AvailabilityProbe + ?Sized,
    {
        self.get_or_discover_with_cancel(market_tag, probe, force, &CancellationToken::new())
            .await
    }

    /// Without `force`, a fresh cache entry or a stored record short-circuits discovery.
    /// Successful discoveries are persisted and cached; a persistence failure is reported in
    /// `error` on an otherwise successful result and leaves the cache untouched.
    pub async fn get_or_discover_with_cancel<P>(
        &self,
        market_tag: &str,
        probe: &P,
        force: bool,
        cancel: &CancellationToken,
    ) -> CutoffResult
    where
        P: AvailabilityProbe + ?Sized,
    {
        let label = &self.config.label;
        if !force {
            if let Some(cached) = self.cache.get(market_tag) {
                debug!("[{}] cache hit for {}", label, market_tag);
                return cached.with_source(ResultSource::Cache);
            }
            if let Some(record) = self.store.get(market_tag) {
                debug!("[{}] store hit for {}", label, market_tag);
                let result = from_record(&record);
                self.cache.insert(result.clone());
                return result;
            }
        }

        let discovered = self
            .engine
            .discover_at(market_tag, probe, Utc::now(), cancel)
            .await;
        let Some(cutoff_date) = discovered.cutoff_date.filter(|_| discovered.success) else {
            return discovered;
        };
        let precision_hours = discovered.precision_hours.unwrap_or_default();

        let policy = if force {
            self.config.overwrite_policy
        } else {
            OverwritePolicy::FirstWins
        };
        let record = CutoffRecord::new(
            market_tag,
            cutoff_date,
            Utc::now(),
            precision_hours,
            discovered.metadata.clone(),
        );
        match self.store.put(record, policy) {
            Ok(PutOutcome::Unchanged) => {
                // The stored record stays authoritative.
                info!(
                    "[{}] {} already stored; rediscovered cutoff {} not applied",
                    label,
                    market_tag,
                    cutoff_date.to_rfc3339()
                );
                match self.store.get(market_tag) {
                    Some(stored) => {
                        let mut result = from_record(&stored);
                        result.tests_performed = discovered.tests_performed;
                        result.elapsed = discovered.elapsed;
                        self.cache.insert(result.clone());
                        result
                    }
                    None => discovered,
                }
            }
            Ok(_) => {
                self.cache.insert(discovered.clone());
                discovered
            }
            Err(err) => {
                error!(
                    "[{}] discovered cutoff for {} but failed to persist it: {}",
                    label, market_tag, err
                );
                self.cache.remove(market_tag);
                let mut result = discovered;
                result.error = Some(format!("failed to persist cutoff: {err}"));
                result
            }
        }
    }

    pub fn validate_period(
        &self,
        market_tag: &str,
        requested_start: DateTime<Utc>,
        requested_end: DateTime<Utc>,
    ) -> ValidationResult {
        let stored = self.store.get(market_tag);
        self.validator
            .validate(stored.as_ref(), requested_start, requested_end)
    }

    /// Validates the period and, when history is missing, estimates how long a backfill of
    /// the gap would take.
    pub fn ensure_sufficient_history(
        &self,
        market_tag: &str,
        required_start: DateTime<Utc>,
        required_end: DateTime<Utc>,
    ) -> HistoryCheck {
        let validation = self.validate_period(market_tag, required_start, required_end);
        let estimated_sync_wait = if validation.requires_sync {
            let missing_until = validation
                .cutoff_date
                .map_or(required_end, |cutoff| cutoff.min(required_end));
            let months = months_missing(required_start, missing_until);
            let minutes = months * u64::from(self.config.sync_minutes_per_month);
            info!(
                "[{}] {} missing ~{} month(s) of history; estimated sync {} minute(s)",
                self.config.label, market_tag, months, minutes
            );
            Some(Duration::from_secs(minutes * 60))
        } else {
            None
        };
        HistoryCheck {
            validation,
            estimated_sync_wait,
        }
    }

    pub fn summary(&self) -> CutoffSummary {
        let records = self.store.get_all();
        CutoffSummary::from_records(records.values())
    }

    /// Drops the cached entry so the next lookup consults the store.
    pub fn invalidate(&self, market_tag: &str) -> bool {
        self.cache.remove(market_tag)
    }

    pub fn clear_cache(&self) -> usize {
        self.cache.clear()
    }

    pub fn cached_markets(&self) -> Vec<String> {
        self.cache.markets()
    }
}

fn from_record(record: &CutoffRecord) -> CutoffResult {
    let mut result = CutoffResult::found(
        record.market_tag.clone(),
        record.cutoff_date,
        record.precision_hours,
        ResultSource::Store,
    );
    result.metadata = record.discovery_metadata.clone();
    result
}

/// Whole 30-day months between the two instants, rounded up, at least one.
fn months_missing(from: DateTime<Utc>, until: DateTime<Utc>) -> u64 {
    let days = (until - from).num_days().max(0);
    let months = (days + DAYS_PER_MONTH - 1) / DAYS_PER_MONTH;
    months.max(1) as u64
}
