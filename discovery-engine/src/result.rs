// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::time::Duration;

use chrono::{DateTime, Utc};
use core_types::Metadata;
use serde::Serialize;

/// Where a served cutoff came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Cache,
    Store,
    Discovery,
}

/// Outcome of resolving a market's cutoff. Callers must check `precision_hours`: a successful
/// search that ran out of iterations reports a wider window than requested.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CutoffResult {
    pub market_tag: String,
    pub success: bool,
    pub cutoff_date: Option<DateTime<Utc>>,
    pub precision_hours: Option<u32>,
    pub tests_performed: u32,
    pub elapsed: Duration,
    pub source: ResultSource,
    pub cancelled: bool,
    pub error: Option<String>,
    pub metadata: Metadata,
}

impl CutoffResult {
    pub fn found(
        market_tag: impl Into<String>,
        cutoff_date: DateTime<Utc>,
        precision_hours: u32,
        source: ResultSource,
    ) -> Self {
        Self {
            market_tag: market_tag.into(),
            success: true,
            cutoff_date: Some(cutoff_date),
            precision_hours: Some(precision_hours),
            tests_performed: 0,
            elapsed: Duration::ZERO,
            source,
            cancelled: false,
            error: None,
            metadata: Metadata::new(),
        }
    }

    pub fn failed(market_tag: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            market_tag: market_tag.into(),
            success: false,
            cutoff_date: None,
            precision_hours: None,
            tests_performed: 0,
            elapsed: Duration::ZERO,
            source: ResultSource::Discovery,
            cancelled: false,
            error: Some(error.into()),
            metadata: Metadata::new(),
        }
    }

    pub fn with_source(mut self, source: ResultSource) -> Self {
        self.source = source;
        self
    }

    /// True when the search narrowed to `target_hours` or better.
    pub fn met_precision(&self, target_hours: u32) -> bool {
        self.success
            && self
                .precision_hours
                .is_some_and(|precision| precision <= target_hours)
    }
}
