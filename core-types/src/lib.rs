// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Shared market identifiers, metadata values, and configuration for cutoff discovery.

pub mod config;
pub mod market;
pub mod metadata;

pub use config::{ConfigError, CutoffConfig, OverwritePolicy, MAX_RANGE_DAYS};
pub use market::{MarketComponents, TAG_DELIMITER, UNKNOWN_COMPONENT};
pub use metadata::{MetaValue, Metadata};
