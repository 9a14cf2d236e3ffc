// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Cache-then-store-then-discover facade over the cutoff store and discovery engine, plus
//! validation of requested analysis periods against known cutoffs.

mod cache;
pub mod config;
mod error;
mod service;
mod summary;
pub mod validator;

pub use cache::ResultCache;
pub use config::ServiceConfig;
pub use error::{Result, ServiceError};
pub use service::{CutoffService, HistoryCheck};
pub use summary::CutoffSummary;
pub use validator::{PeriodValidator, ValidationResult};
