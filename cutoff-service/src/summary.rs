// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use history_store::CutoffRecord;
use serde::Serialize;

/// Aggregate view over every stored cutoff.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CutoffSummary {
    pub total_markets: usize,
    pub by_exchange: BTreeMap<String, usize>,
    /// Market with the oldest cutoff and that cutoff.
    pub earliest_cutoff: Option<(String, DateTime<Utc>)>,
    pub latest_cutoff: Option<(String, DateTime<Utc>)>,
    pub average_precision_hours: Option<f64>,
}

impl CutoffSummary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a CutoffRecord>) -> Self {
        let mut summary = CutoffSummary::default();
        let mut precision_total = 0u64;
        for record in records {
            summary.total_markets += 1;
            *summary
                .by_exchange
                .entry(record.exchange.clone())
                .or_default() += 1;
            precision_total += u64::from(record.precision_hours);

            let candidate = (record.market_tag.clone(), record.cutoff_date);
            match &summary.earliest_cutoff {
                Some((_, earliest)) if *earliest <= record.cutoff_date => {}
                _ => summary.earliest_cutoff = Some(candidate.clone()),
            }
            match &summary.latest_cutoff {
                Some((_, latest)) if *latest >= record.cutoff_date => {}
                _ => summary.latest_cutoff = Some(candidate),
            }
        }
        if summary.total_markets > 0 {
            summary.average_precision_hours =
                Some(precision_total as f64 / summary.total_markets as f64);
        }
        summary
    }
}

impl fmt::Display for CutoffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "markets: {}", self.total_markets)?;
        for (exchange, count) in &self.by_exchange {
            writeln!(f, "  {exchange}: {count}")?;
        }
        if let Some((tag, cutoff)) = &self.earliest_cutoff {
            writeln!(f, "earliest cutoff: {tag} at {}", cutoff.to_rfc3339())?;
        }
        if let Some((tag, cutoff)) = &self.latest_cutoff {
            writeln!(f, "latest cutoff: {tag} at {}", cutoff.to_rfc3339())?;
        }
        match self.average_precision_hours {
            Some(average) => write!(f, "average precision: {average:.1}h"),
            None => write!(f, "average precision: n/a"),
        }
    }
}
