// Copyright (c) James Kassemi, SC, US. All rights reserved.

use serde::{Deserialize, Serialize};

/// Separator between the exchange, asset and contract parts of a market tag.
pub const TAG_DELIMITER: char = '_';
/// Placeholder used for every component when a tag cannot be split.
pub const UNKNOWN_COMPONENT: &str = "UNKNOWN";

/// Exchange and asset pair derived from a market tag such as
/// `BINANCEFUTURES_BTC_USDT_PERPETUAL`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketComponents {
    pub exchange: String,
    pub primary_asset: String,
    pub secondary_asset: String,
}

impl MarketComponents {
    /// Splits `tag` on [`TAG_DELIMITER`]. Tags with fewer than three parts map
    /// every component to [`UNKNOWN_COMPONENT`].
    pub fn parse(tag: &str) -> Self {
        let parts: Vec<&str> = tag.split(TAG_DELIMITER).collect();
        if parts.len() < 3 {
            return Self::unknown();
        }
        Self {
            exchange: parts[0].to_string(),
            primary_asset: parts[1].to_string(),
            secondary_asset: parts[2].to_string(),
        }
    }

    pub fn unknown() -> Self {
        Self {
            exchange: UNKNOWN_COMPONENT.to_string(),
            primary_asset: UNKNOWN_COMPONENT.to_string(),
            secondary_asset: UNKNOWN_COMPONENT.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.exchange == UNKNOWN_COMPONENT
            && self.primary_asset == UNKNOWN_COMPONENT
            && self.secondary_asset == UNKNOWN_COMPONENT
    }
}
