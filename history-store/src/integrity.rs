// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::record::{CutoffDocument, CutoffRecord};

const REQUIRED_FIELDS: [&str; 4] = ["version", "created_at", "last_updated_at", "cutoffs"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStats {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub total_records: usize,
    pub file_size_bytes: u64,
    pub backup_count: usize,
    pub records_per_exchange: BTreeMap<String, usize>,
}

impl StoreStats {
    pub(crate) fn from_document(
        document: &CutoffDocument,
        file_size_bytes: u64,
        backup_count: usize,
    ) -> Self {
        let mut records_per_exchange = BTreeMap::new();
        for record in document.cutoffs.values() {
            *records_per_exchange
                .entry(record.exchange.clone())
                .or_insert(0usize) += 1;
        }
        Self {
            version: document.version.clone(),
            created_at: document.created_at,
            last_updated_at: document.last_updated_at,
            total_records: document.len(),
            file_size_bytes,
            backup_count,
            records_per_exchange,
        }
    }
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "version: {}", self.version)?;
        writeln!(f, "created_at: {}", self.created_at.to_rfc3339())?;
        writeln!(f, "last_updated_at: {}", self.last_updated_at.to_rfc3339())?;
        writeln!(f, "total_records: {}", self.total_records)?;
        writeln!(f, "file_size_bytes: {}", self.file_size_bytes)?;
        write!(f, "backup_count: {}", self.backup_count)?;
        for (exchange, count) in &self.records_per_exchange {
            write!(f, "\n  {exchange}: {count}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntegrityReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl IntegrityReport {
    fn error(&mut self, message: String) {
        self.errors.push(message);
        self.is_valid = false;
    }
}

/// Checks the on-disk text of a document: top-level fields present and every record
/// reconstructible from its serialized form.
pub(crate) fn inspect_document(text: &str) -> IntegrityReport {
    let mut report = IntegrityReport {
        is_valid: true,
        ..IntegrityReport::default()
    };
    let root: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(err) => {
            report.error(format!("document is not valid json: {err}"));
            return report;
        }
    };
    let Some(object) = root.as_object() else {
        report.error("document root is not an object".to_string());
        return report;
    };
    for field in REQUIRED_FIELDS {
        if !object.contains_key(field) {
            report.error(format!("missing required field '{field}'"));
        }
    }
    for field in ["created_at", "last_updated_at"] {
        if let Some(value) = object.get(field) {
            if serde_json::from_value::<DateTime<Utc>>(value.clone()).is_err() {
                report.error(format!("field '{field}' is not a timestamp"));
            }
        }
    }
    let Some(cutoffs) = object.get("cutoffs") else {
        return report;
    };
    let Some(cutoffs) = cutoffs.as_object() else {
        report.error("'cutoffs' is not an object".to_string());
        return report;
    };
    for (key, value) in cutoffs {
        match serde_json::from_value::<CutoffRecord>(value.clone()) {
            Ok(record) => {
                if record.market_tag != *key {
                    report.warnings.push(format!(
                        "entry '{key}' stores market_tag '{}'",
                        record.market_tag
                    ));
                }
                if record.cutoff_date > record.discovery_date {
                    report.warnings.push(format!(
                        "entry '{key}' has cutoff_date after discovery_date"
                    ));
                }
            }
            Err(err) => report.error(format!("entry '{key}' cannot be reconstructed: {err}")),
        }
    }
    report
}
