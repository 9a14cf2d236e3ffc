// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::{collections::HashMap, time::Duration};

use discovery_engine::CutoffResult;
use parking_lot::Mutex;
use tokio::time::Instant;

struct CacheEntry {
    inserted_at: Instant,
    result: CutoffResult,
}

/// In-memory map of recently served results, expired after a fixed age.
pub struct ResultCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a fresh entry; stale entries are dropped on lookup.
    pub fn get(&self, market_tag: &str) -> Option<CutoffResult> {
        let mut entries = self.entries.lock();
        let fresh = entries
            .get(market_tag)
            .map(|entry| entry.inserted_at.elapsed() < self.ttl)?;
        if fresh {
            entries.get(market_tag).map(|entry| entry.result.clone())
        } else {
            entries.remove(market_tag);
            None
        }
    }

    pub fn insert(&self, result: CutoffResult) {
        let entry = CacheEntry {
            inserted_at: Instant::now(),
            result,
        };
        self.entries
            .lock()
            .insert(entry.result.market_tag.clone(), entry);
    }

    pub fn remove(&self, market_tag: &str) -> bool {
        self.entries.lock().remove(market_tag).is_some()
    }

    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        count
    }

    /// Markets with an unexpired entry, sorted.
    pub fn markets(&self) -> Vec<String> {
        let entries = self.entries.lock();
        let mut markets: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.inserted_at.elapsed() < self.ttl)
            .map(|(tag, _)| tag.clone())
            .collect();
        markets.sort();
        markets
    }
}
