// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use core_types::{MarketComponents, Metadata};
use serde::{Deserialize, Serialize};

pub const DOCUMENT_VERSION: &str = "1.0";

/// Earliest known history for one market. Written once, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutoffRecord {
    pub market_tag: String,
    pub cutoff_date: DateTime<Utc>,
    pub discovery_date: DateTime<Utc>,
    pub precision_hours: u32,
    pub exchange: String,
    pub primary_asset: String,
    pub secondary_asset: String,
    #[serde(default)]
    pub discovery_metadata: Metadata,
}

impl CutoffRecord {
    pub fn new(
        market_tag: impl Into<String>,
        cutoff_date: DateTime<Utc>,
        discovery_date: DateTime<Utc>,
        precision_hours: u32,
        discovery_metadata: Metadata,
    ) -> Self {
        let market_tag = market_tag.into();
        let components = MarketComponents::parse(&market_tag);
        Self {
            market_tag,
            cutoff_date,
            discovery_date,
            precision_hours,
            exchange: components.exchange,
            primary_asset: components.primary_asset,
            secondary_asset: components.secondary_asset,
            discovery_metadata,
        }
    }

    pub fn components(&self) -> MarketComponents {
        MarketComponents {
            exchange: self.exchange.clone(),
            primary_asset: self.primary_asset.clone(),
            secondary_asset: self.secondary_asset.clone(),
        }
    }
}

/// The unit persisted to disk. `version` and `created_at` never change after init.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutoffDocument {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub cutoffs: BTreeMap<String, CutoffRecord>,
}

impl CutoffDocument {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            version: DOCUMENT_VERSION.to_string(),
            created_at: now,
            last_updated_at: now,
            cutoffs: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.cutoffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cutoffs.is_empty()
    }
}
