// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Bounded binary search for the earliest instant a market has historical data.
//!
//! The engine never touches persistence: it asks an [`AvailabilityProbe`] whether data exists
//! at a series of instants and reports the narrowest window it reached as a [`CutoffResult`].

mod engine;
mod metrics;
pub mod probe;
pub mod result;

pub use engine::{DiscoveryConfig, DiscoveryEngine};
pub use metrics::{DiscoveryMetrics, DiscoveryMetricsSnapshot};
pub use probe::{AvailabilityProbe, FnProbe, ProbeError};
pub use result::{CutoffResult, ResultSource};
