// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// External yes/no test: does `market_tag` have data at `at`? Assumed monotonic in time
/// (false ... false, true ... true) and safe to call repeatedly.
#[async_trait]
pub trait AvailabilityProbe: Send + Sync {
    async fn has_data(&self, market_tag: &str, at: DateTime<Utc>) -> Result<bool, ProbeError>;
}

#[async_trait]
impl<P> AvailabilityProbe for Arc<P>
where
    P: AvailabilityProbe + ?Sized,
{
    async fn has_data(&self, market_tag: &str, at: DateTime<Utc>) -> Result<bool, ProbeError> {
        (**self).has_data(market_tag, at).await
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe transport failure: {0}")]
    Transport(String),
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("probe failed: {source}")]
    Other {
        #[source]
        source: BoxError,
    },
}

/// Adapts an async closure into a probe.
pub struct FnProbe<F> {
    func: F,
}

impl<F> FnProbe<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut> AvailabilityProbe for FnProbe<F>
where
    F: Fn(String, DateTime<Utc>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool, ProbeError>> + Send,
{
    async fn has_data(&self, market_tag: &str, at: DateTime<Utc>) -> Result<bool, ProbeError> {
        (self.func)(market_tag.to_string(), at).await
    }
}
