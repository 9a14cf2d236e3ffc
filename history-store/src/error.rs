// Copyright (c) James Kassemi, SC, US. All rights reserved.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("unsupported format '{format}' (expected 'json' or 'csv')")]
    UnsupportedFormat { format: String },
    #[error("malformed import: {reason}")]
    MalformedImport { reason: String },
}

impl StoreError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        StoreError::MalformedImport {
            reason: reason.into(),
        }
    }
}
