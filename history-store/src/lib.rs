// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Durable, crash-recoverable persistence for market history cutoffs.
//!
//! The crate exposes:
//! - [`HistoryStore`]: lock-guarded key/value store of [`CutoffRecord`]s backed by a single
//!   json document that is replaced atomically on every write.
//! - [`StoreConfig`]: file layout (document path, `backups/` directory, retention).
//! - [`ExportFormat`]: structured (json) and tabular (csv) export/import.
//!
//! Multiple processes may share a document file without corrupting it (writes land via
//! rename), but concurrent writers across processes are not coordinated: the last rename wins.

pub mod config;
pub mod error;
pub mod exchange;
pub mod integrity;
pub mod record;
mod storage;
pub mod store;

pub use config::{StoreConfig, DEFAULT_BACKUP_RETENTION, DEFAULT_DOCUMENT_FILE};
pub use error::{Result, StoreError};
pub use exchange::{ExportFormat, TABULAR_HEADER};
pub use integrity::{IntegrityReport, StoreStats};
pub use record::{CutoffDocument, CutoffRecord, DOCUMENT_VERSION};
pub use store::{HistoryStore, PutOutcome};
