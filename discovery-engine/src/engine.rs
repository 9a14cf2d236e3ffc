// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::time::{Duration, Instant};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use core_types::{CutoffConfig, MetaValue, Metadata};
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::{
    metrics::DiscoveryMetrics,
    probe::{AvailabilityProbe, ProbeError},
    result::{CutoffResult, ResultSource},
};

const SEARCH_METHOD: &str = "binary_search";
const NO_TESTS_ERROR: &str = "invalid date range: no tests performed";
const OUT_OF_RANGE_ERROR: &str = "invalid date range: search start is not representable";

#[derive(Clone, Debug)]
pub struct DiscoveryConfig {
    pub label: String,
    pub default_range_days: u32,
    pub max_iterations: u32,
    pub target_precision_hours: u32,
    pub inter_probe_delay: Duration,
    pub probe_timeout: Option<Duration>,
}

impl DiscoveryConfig {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            default_range_days: 1000,
            max_iterations: 15,
            target_precision_hours: 24,
            inter_probe_delay: Duration::from_secs(1),
            probe_timeout: None,
        }
    }

    pub fn from_cutoff_config(label: impl Into<String>, config: &CutoffConfig) -> Self {
        Self::new(label)
            .with_range_days(config.default_range_days)
            .with_max_iterations(config.max_discovery_attempts)
            .with_target_precision_hours(config.target_precision_hours)
            .with_inter_probe_delay(config.inter_probe_delay())
    }

    pub fn with_range_days(mut self, days: u32) -> Self {
        self.default_range_days = days;
        self
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_target_precision_hours(mut self, hours: u32) -> Self {
        self.target_precision_hours = hours;
        self
    }

    pub fn with_inter_probe_delay(mut self, delay: Duration) -> Self {
        self.inter_probe_delay = delay;
        self
    }

    /// Bounds each probe call; a timed out probe counts as "no data".
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }
}

/// Stateless apart from its metrics; one engine may serve concurrent discoveries.
pub struct DiscoveryEngine {
    config: DiscoveryConfig,
    metrics: DiscoveryMetrics,
}

struct SearchWindow {
    earliest: DateTime<Utc>,
    latest: DateTime<Utc>,
}

impl SearchWindow {
    fn span(&self) -> ChronoDuration {
        self.latest - self.earliest
    }

    fn midpoint(&self) -> DateTime<Utc> {
        self.earliest + self.span() / 2
    }

    fn precision_hours(&self) -> u32 {
        let seconds = self.span().num_seconds().max(0) as f64;
        (seconds / 3600.0).round() as u32
    }
}

impl DiscoveryEngine {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self::with_metrics(config, DiscoveryMetrics::new())
    }

    pub fn with_metrics(config: DiscoveryConfig, metrics: DiscoveryMetrics) -> Self {
        Self { config, metrics }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn metrics(&self) -> &DiscoveryMetrics {
        &self.metrics
    }

    pub async fn discover<P>(&self, market_tag: &str, probe: &P) -> CutoffResult
    where
        P: AvailabilityProbe + ?Sized,
    {
        self.discover_at(market_tag, probe, Utc::now(), &CancellationToken::new())
            .await
    }

    pub async fn discover_with_cancel<P>(
        &self,
        market_tag: &str,
        probe: &P,
        cancel: &CancellationToken,
    ) -> CutoffResult
    where
        P: AvailabilityProbe + ?Sized,
    {
        self.discover_at(market_tag, probe, Utc::now(), cancel)
            .await
    }

    /// Searches `[now - range_days, now - 1 day]` for the transition from "no data" to "data".
    /// The reported cutoff is the upper bound of the final window, so it always lies on the
    /// side where the probe answered yes.
    pub async fn discover_at<P>(
        &self,
        market_tag: &str,
        probe: &P,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> CutoffResult
    where
        P: AvailabilityProbe + ?Sized,
    {
        let label = &self.config.label;
        let started = Instant::now();
        self.metrics.record_run_started();

        let bounds = now
            .checked_sub_signed(ChronoDuration::days(i64::from(self.config.default_range_days)))
            .zip(now.checked_sub_signed(ChronoDuration::days(1)));
        let Some((earliest, latest)) = bounds else {
            warn!(
                "[{}] {}: {} days before {} is out of range",
                label, market_tag, self.config.default_range_days, now
            );
            self.metrics.record_run_failed();
            let mut result = CutoffResult::failed(market_tag, OUT_OF_RANGE_ERROR);
            result.elapsed = started.elapsed();
            return result;
        };
        let mut window = SearchWindow { earliest, latest };
        let target = ChronoDuration::hours(i64::from(self.config.target_precision_hours));
        let max_iterations = self.config.max_iterations;
        let mut tests = 0u32;

        info!(
            "[{}] discovering cutoff for {} between {} and {}",
            label, market_tag, window.earliest, window.latest
        );

        while window.span() > target && tests < max_iterations {
            if cancel.is_cancelled() {
                return self.cancelled(market_tag, &window, tests, started);
            }

            let mid = window.midpoint();
            let has_data = self.probe_once(probe, market_tag, mid).await;
            if has_data {
                window.latest = mid;
            } else {
                window.earliest = mid;
            }
            tests += 1;
            debug!(
                "[{}] {} probe {} at {} -> {} (window {}h)",
                label,
                market_tag,
                tests,
                mid,
                has_data,
                window.precision_hours()
            );

            let more_probes = tests < max_iterations && window.span() > target;
            if more_probes && !self.config.inter_probe_delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        return self.cancelled(market_tag, &window, tests, started);
                    }
                    _ = tokio::time::sleep(self.config.inter_probe_delay) => {}
                }
            }
        }

        let elapsed = started.elapsed();
        if tests == 0 {
            warn!(
                "[{}] {}: {} (range {} days)",
                label, market_tag, NO_TESTS_ERROR, self.config.default_range_days
            );
            self.metrics.record_run_failed();
            let mut result = CutoffResult::failed(market_tag, NO_TESTS_ERROR);
            result.elapsed = elapsed;
            return result;
        }

        let precision_hours = window.precision_hours();
        if precision_hours > self.config.target_precision_hours {
            warn!(
                "[{}] {} stopped after {} probes at {}h precision (target {}h)",
                label, market_tag, tests, precision_hours, self.config.target_precision_hours
            );
        }
        info!(
            "[{}] {} cutoff {} (+/-{}h, {} probes, {:?})",
            label, market_tag, window.latest, precision_hours, tests, elapsed
        );
        self.metrics.record_run_succeeded();

        let mut result = CutoffResult::found(
            market_tag,
            window.latest,
            precision_hours,
            ResultSource::Discovery,
        );
        result.tests_performed = tests;
        result.elapsed = elapsed;
        result.metadata = self.run_metadata(tests, elapsed, precision_hours);
        result
    }

    async fn probe_once<P>(&self, probe: &P, market_tag: &str, at: DateTime<Utc>) -> bool
    where
        P: AvailabilityProbe + ?Sized,
    {
        let started = Instant::now();
        let outcome = match self.config.probe_timeout {
            Some(limit) => match tokio::time::timeout(limit, probe.has_data(market_tag, at)).await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(ProbeError::Timeout(limit)),
            },
            None => probe.has_data(market_tag, at).await,
        };
        let elapsed = started.elapsed();
        match outcome {
            Ok(has_data) => {
                self.metrics.record_probe(has_data, elapsed);
                has_data
            }
            Err(err) => {
                warn!(
                    "[{}] probe for {} at {} failed, treating as no data: {}",
                    self.config.label, market_tag, at, err
                );
                self.metrics.record_probe_error(elapsed);
                false
            }
        }
    }

    fn cancelled(
        &self,
        market_tag: &str,
        window: &SearchWindow,
        tests: u32,
        started: Instant,
    ) -> CutoffResult {
        self.metrics.record_run_cancelled();
        let error = if tests == 0 {
            "cancelled".to_string()
        } else {
            format!(
                "cancelled after {} probes; window was {} to {}",
                tests, window.earliest, window.latest
            )
        };
        info!("[{}] {} discovery {}", self.config.label, market_tag, error);
        let mut result = CutoffResult::failed(market_tag, error);
        result.cancelled = true;
        result.tests_performed = tests;
        result.elapsed = started.elapsed();
        result
    }

    fn run_metadata(&self, tests: u32, elapsed: Duration, precision_hours: u32) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("method".into(), MetaValue::from(SEARCH_METHOD));
        metadata.insert("iterations".into(), MetaValue::from(tests));
        metadata.insert(
            "elapsed_seconds".into(),
            MetaValue::from(elapsed.as_secs_f64()),
        );
        metadata.insert(
            "range_days".into(),
            MetaValue::from(self.config.default_range_days),
        );
        metadata.insert(
            "target_precision_hours".into(),
            MetaValue::from(self.config.target_precision_hours),
        );
        metadata.insert(
            "converged".into(),
            MetaValue::from(precision_hours <= self.config.target_precision_hours),
        );
        metadata
    }
}
