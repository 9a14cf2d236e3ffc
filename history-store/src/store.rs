// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::{
    collections::{btree_map::Entry, BTreeMap},
    fmt, fs, io,
};

use chrono::{DateTime, Utc};
use core_types::{Metadata, OverwritePolicy};
use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::{
    config::StoreConfig,
    error::Result,
    exchange::{self, ExportFormat},
    integrity::{self, IntegrityReport, StoreStats},
    record::{CutoffDocument, CutoffRecord},
    storage,
};

/// Result of a single write request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PutOutcome {
    Inserted,
    /// A record already existed and the policy kept it.
    Unchanged,
    Replaced,
}

/// Durable cutoff store. Every public operation holds the store lock for its whole
/// load-modify-persist cycle.
pub struct HistoryStore {
    config: StoreConfig,
    document: Mutex<CutoffDocument>,
}

impl fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryStore")
            .field("document_path", &self.config.document_path())
            .field("records", &self.document.lock().len())
            .finish()
    }
}

impl HistoryStore {
    /// Opens (or initializes) the document. Corrupt documents are healed from the newest
    /// usable backup or reinitialized empty; only directory creation failures surface.
    pub fn open(config: StoreConfig) -> Result<Self> {
        config.ensure_dirs()?;
        let document = load_or_recover(&config);
        info!(
            "cutoff store opened at {} with {} record(s)",
            config.document_path().display(),
            document.len()
        );
        Ok(Self {
            config,
            document: Mutex::new(document),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn get(&self, market_tag: &str) -> Option<CutoffRecord> {
        self.document.lock().cutoffs.get(market_tag).cloned()
    }

    pub fn get_all(&self) -> BTreeMap<String, CutoffRecord> {
        self.document.lock().cutoffs.clone()
    }

    pub fn contains(&self, market_tag: &str) -> bool {
        self.document.lock().cutoffs.contains_key(market_tag)
    }

    pub fn len(&self) -> usize {
        self.document.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores a cutoff unless the market already has one. Returns `true` when the record was
    /// created and when an existing record was kept; `false` only on an I/O failure.
    pub fn put_if_absent(
        &self,
        market_tag: &str,
        cutoff_date: DateTime<Utc>,
        precision_hours: u32,
        metadata: Metadata,
    ) -> bool {
        self.put_with_policy(
            market_tag,
            cutoff_date,
            precision_hours,
            metadata,
            OverwritePolicy::FirstWins,
        )
    }

    pub fn put_with_policy(
        &self,
        market_tag: &str,
        cutoff_date: DateTime<Utc>,
        precision_hours: u32,
        metadata: Metadata,
        policy: OverwritePolicy,
    ) -> bool {
        let record = CutoffRecord::new(
            market_tag,
            cutoff_date,
            Utc::now(),
            precision_hours,
            metadata,
        );
        match self.put(record, policy) {
            Ok(_) => true,
            Err(err) => {
                error!("failed to persist cutoff for {market_tag}: {err}");
                false
            }
        }
    }

    pub fn put(&self, record: CutoffRecord, policy: OverwritePolicy) -> Result<PutOutcome> {
        let mut current = self.document.lock();
        let exists = current.cutoffs.contains_key(&record.market_tag);
        if exists && policy == OverwritePolicy::FirstWins {
            debug!(
                "cutoff for {} already stored; keeping existing record",
                record.market_tag
            );
            return Ok(PutOutcome::Unchanged);
        }
        let market_tag = record.market_tag.clone();
        let cutoff_date = record.cutoff_date;
        let mut next = current.clone();
        next.cutoffs.insert(market_tag.clone(), record);
        self.persist(&mut current, next)?;
        let outcome = if exists {
            PutOutcome::Replaced
        } else {
            PutOutcome::Inserted
        };
        info!(
            "stored cutoff for {market_tag} at {} ({outcome:?})",
            cutoff_date.to_rfc3339()
        );
        Ok(outcome)
    }

    pub fn export(&self, format: ExportFormat) -> Result<String> {
        let current = self.document.lock();
        exchange::export_document(&current, format)
    }

    /// Merges records that are not already present. The payload is parsed in full first, so
    /// malformed input leaves the store untouched. Returns the number of records added.
    pub fn import(&self, data: &str, format: ExportFormat) -> Result<usize> {
        let records = exchange::parse_import(data, format)?;
        let mut current = self.document.lock();
        let mut next = current.clone();
        let mut added = 0usize;
        for record in records {
            if let Entry::Vacant(slot) = next.cutoffs.entry(record.market_tag.clone()) {
                slot.insert(record);
                added += 1;
            }
        }
        if added == 0 {
            debug!("import contained no new cutoffs");
            return Ok(0);
        }
        self.persist(&mut current, next)?;
        info!("imported {added} cutoff record(s) from {format}");
        Ok(added)
    }

    pub fn stats(&self) -> StoreStats {
        let current = self.document.lock();
        let file_size = fs::metadata(self.config.document_path())
            .map(|meta| meta.len())
            .unwrap_or(0);
        let backup_count = match self.list_backups() {
            Ok(backups) => backups.len(),
            Err(err) => {
                warn!("failed to list cutoff backups: {err}");
                0
            }
        };
        StoreStats::from_document(&current, file_size, backup_count)
    }

    pub fn validate_integrity(&self) -> IntegrityReport {
        let _guard = self.document.lock();
        let path = self.config.document_path();
        match fs::read_to_string(&path) {
            Ok(text) => integrity::inspect_document(&text),
            Err(err) => IntegrityReport {
                is_valid: false,
                errors: vec![format!("cannot read {}: {err}", path.display())],
                warnings: Vec::new(),
            },
        }
    }

    /// Re-reads the document from disk, applying the same recovery as [`HistoryStore::open`].
    pub fn reload(&self) -> usize {
        let mut current = self.document.lock();
        *current = load_or_recover(&self.config);
        current.len()
    }

    pub fn backup_count(&self) -> usize {
        let _guard = self.document.lock();
        self.list_backups().map(|backups| backups.len()).unwrap_or(0)
    }

    fn list_backups(&self) -> io::Result<Vec<storage::BackupEntry>> {
        storage::list_backups(&self.config.backups_dir(), &self.config.backup_prefix())
    }

    /// Snapshot, rotate, stamp, write-then-rename, and only then swap the in-memory document.
    fn persist(&self, current: &mut CutoffDocument, mut next: CutoffDocument) -> Result<()> {
        let path = self.config.document_path();
        let backups_dir = self.config.backups_dir();
        let prefix = self.config.backup_prefix();
        let now = Utc::now();
        if let Some(backup) = storage::snapshot(&path, &backups_dir, &prefix, now)? {
            debug!("cutoff backup written to {}", backup.display());
        }
        match storage::rotate(&backups_dir, &prefix, self.config.backup_retention_count) {
            Ok(0) => {}
            Ok(removed) => debug!("rotated {removed} cutoff backup(s)"),
            Err(err) => warn!("cutoff backup rotation failed: {err}"),
        }
        next.last_updated_at = now;
        let bytes = storage::encode_document(&next)?;
        storage::write_atomic(&path, &bytes)?;
        *current = next;
        Ok(())
    }
}

fn load_or_recover(config: &StoreConfig) -> CutoffDocument {
    let path = config.document_path();
    match storage::read_document(&path) {
        Ok(document) => return document,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            if let Some(document) = restore_from_backup(config) {
                warn!(
                    "cutoff document {} was missing; restored from backup",
                    path.display()
                );
                return document;
            }
            info!(
                "no cutoff document at {}; initializing a new one",
                path.display()
            );
        }
        Err(err) => {
            warn!(
                "cutoff document {} is unreadable ({err}); restoring from backup",
                path.display()
            );
            if let Some(document) = restore_from_backup(config) {
                return document;
            }
            warn!("no usable cutoff backup found; reinitializing an empty document");
            preserve_corrupt(config);
        }
    }
    let document = CutoffDocument::empty(Utc::now());
    match storage::encode_document(&document) {
        Ok(bytes) => {
            if let Err(err) = storage::write_atomic(&path, &bytes) {
                error!(
                    "failed to write empty cutoff document {}: {err}",
                    path.display()
                );
            }
        }
        Err(err) => error!("failed to encode empty cutoff document: {err}"),
    }
    document
}

fn restore_from_backup(config: &StoreConfig) -> Option<CutoffDocument> {
    let backups = match storage::list_backups(&config.backups_dir(), &config.backup_prefix()) {
        Ok(backups) => backups,
        Err(err) => {
            warn!("failed to list cutoff backups: {err}");
            return None;
        }
    };
    for entry in backups.iter().rev() {
        let bytes = match fs::read(&entry.path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("cutoff backup {} unreadable: {err}", entry.path.display());
                continue;
            }
        };
        match storage::decode_document(&bytes) {
            Ok(document) => {
                if let Err(err) = storage::write_atomic(&config.document_path(), &bytes) {
                    error!(
                        "restored cutoff backup {} but could not rewrite document: {err}",
                        entry.path.display()
                    );
                }
                warn!(
                    "restored cutoff document from backup {} ({} record(s))",
                    entry.path.display(),
                    document.len()
                );
                return Some(document);
            }
            Err(err) => warn!("cutoff backup {} is corrupt: {err}", entry.path.display()),
        }
    }
    None
}

/// Keeps the unreadable document beside the new one for later inspection.
fn preserve_corrupt(config: &StoreConfig) {
    let path = config.document_path();
    let target = config.state_dir().join(format!(
        "{}.corrupt-{}",
        config.document_file,
        Utc::now().format("%Y%m%d_%H%M%S_%6f")
    ));
    if let Err(err) = fs::rename(&path, &target) {
        warn!(
            "could not preserve corrupt cutoff document {}: {err}",
            path.display()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use core_types::MetaValue;
    use std::{path::Path, sync::Arc, thread};
    use tempfile::tempdir;

    fn open_store(dir: &Path) -> HistoryStore {
        HistoryStore::open(StoreConfig::new(dir)).unwrap()
    }

    fn ts(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
    }

    fn meta(method: &str) -> Metadata {
        let mut meta = Metadata::new();
        meta.insert("method".into(), MetaValue::from(method));
        meta
    }

    #[test]
    fn open_initializes_empty_document_on_disk() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        assert!(store.is_empty());
        assert!(store.config().document_path().exists());
        assert!(store.validate_integrity().is_valid);
    }

    #[test]
    fn stored_record_exposes_tag_components() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        let tag = "BINANCEFUTURES_BTC_USDT_PERPETUAL";
        assert!(store.put_if_absent(tag, ts(2020, 1, 15, 8), 24, meta("binary_search")));

        let record = store.get(tag).unwrap();
        assert_eq!(record.cutoff_date, ts(2020, 1, 15, 8));
        assert_eq!(record.exchange, "BINANCEFUTURES");
        assert_eq!(record.primary_asset, "BTC");
        assert_eq!(record.secondary_asset, "USDT");
        assert!(store.get("MISSING_X_Y").is_none());
    }

    #[test]
    fn second_put_keeps_first_record() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        let tag = "KRAKEN_ETH_USD";
        assert!(store.put_if_absent(tag, ts(2019, 9, 13, 0), 24, meta("first")));
        let first = store.get(tag).unwrap();

        assert!(store.put_if_absent(tag, ts(2021, 1, 1, 0), 2, meta("second")));

        let kept = store.get(tag).unwrap();
        assert_eq!(kept, first);
        let reopened = open_store(dir.path());
        assert_eq!(reopened.get(tag).unwrap(), first);
    }

    #[test]
    fn replace_policy_overwrites_existing_record() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        let tag = "KRAKEN_ETH_USD";
        assert!(store.put_if_absent(tag, ts(2019, 9, 13, 0), 24, Metadata::new()));

        let replacement = CutoffRecord::new(tag, ts(2019, 9, 10, 0), Utc::now(), 6, meta("rerun"));
        let outcome = store.put(replacement, OverwritePolicy::Replace).unwrap();

        assert_eq!(outcome, PutOutcome::Replaced);
        let stored = store.get(tag).unwrap();
        assert_eq!(stored.cutoff_date, ts(2019, 9, 10, 0));
        assert_eq!(stored.precision_hours, 6);
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = open_store(dir.path());
            store.put_if_absent("BINANCE_BTC_USDT", ts(2017, 8, 17, 0), 24, meta("a"));
            store.put_if_absent("BINANCE_ETH_USDT", ts(2017, 8, 17, 4), 24, meta("b"));
        }
        let store = open_store(dir.path());
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.get("BINANCE_ETH_USDT").unwrap().discovery_metadata,
            meta("b")
        );
    }

    #[test]
    fn last_updated_advances_while_created_at_stays() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        let before = store.stats();
        store.put_if_absent("BINANCE_BTC_USDT", ts(2017, 8, 17, 0), 24, Metadata::new());
        let after = store.stats();
        assert_eq!(after.created_at, before.created_at);
        assert!(after.last_updated_at >= before.last_updated_at);
        assert_eq!(after.version, before.version);
    }

    #[test]
    fn backups_rotate_to_retention_count() {
        let dir = tempdir().unwrap();
        let store =
            HistoryStore::open(StoreConfig::new(dir.path()).with_backup_retention(3)).unwrap();
        for idx in 0..7 {
            let tag = format!("EXCH_COIN{idx}_USDT");
            assert!(store.put_if_absent(&tag, ts(2020, 1, 1, 0), 24, Metadata::new()));
        }

        let backups = store.list_backups().unwrap();
        assert_eq!(backups.len(), 3);
        // The newest backup holds the state before the last write: six records.
        let newest = storage::read_document(&backups[2].path).unwrap();
        assert_eq!(newest.len(), 6);
        let oldest = storage::read_document(&backups[0].path).unwrap();
        assert_eq!(oldest.len(), 4);
        assert_eq!(store.stats().backup_count, 3);
    }

    #[test]
    fn corrupt_document_restores_from_latest_backup() {
        let dir = tempdir().unwrap();
        {
            let store = open_store(dir.path());
            store.put_if_absent("BINANCE_BTC_USDT", ts(2017, 8, 17, 0), 24, Metadata::new());
            store.put_if_absent("BINANCE_ETH_USDT", ts(2017, 8, 17, 4), 24, Metadata::new());
        }
        let path = StoreConfig::new(dir.path()).document_path();
        fs::write(&path, b"\xff\xfe not json at all").unwrap();

        let store = open_store(dir.path());

        let all = store.get_all();
        assert_eq!(all.len(), 1);
        assert!(all.contains_key("BINANCE_BTC_USDT"));
        assert!(store.validate_integrity().is_valid);
    }

    #[test]
    fn missing_document_restores_from_latest_backup() {
        let dir = tempdir().unwrap();
        {
            let store = open_store(dir.path());
            store.put_if_absent("BINANCE_BTC_USDT", ts(2017, 8, 17, 0), 24, Metadata::new());
            store.put_if_absent("BINANCE_ETH_USDT", ts(2017, 8, 17, 4), 24, Metadata::new());
        }
        let config = StoreConfig::new(dir.path());
        fs::remove_file(config.document_path()).unwrap();

        let store = open_store(dir.path());

        // The newest backup predates the second write.
        let all = store.get_all();
        assert_eq!(all.len(), 1);
        assert!(all.contains_key("BINANCE_BTC_USDT"));
        assert!(config.document_path().exists());
        assert!(store.validate_integrity().is_valid);
        assert_eq!(store.backup_count(), 2);
    }

    #[test]
    fn corrupt_document_without_backups_reinitializes() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new(dir.path());
        config.ensure_dirs().unwrap();
        fs::write(config.document_path(), b"{{{{ garbage").unwrap();

        let store = HistoryStore::open(config).unwrap();

        assert!(store.get_all().is_empty());
        assert!(store.validate_integrity().is_valid);
        let preserved = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .any(|entry| entry.file_name().to_string_lossy().contains(".corrupt-"));
        assert!(preserved);
    }

    #[test]
    fn corrupt_newest_backup_falls_back_to_older_one() {
        let dir = tempdir().unwrap();
        {
            let store = open_store(dir.path());
            store.put_if_absent("A_B_C", ts(2018, 1, 1, 0), 24, Metadata::new());
            store.put_if_absent("D_E_F", ts(2018, 1, 1, 0), 24, Metadata::new());
            store.put_if_absent("G_H_I", ts(2018, 1, 1, 0), 24, Metadata::new());
        }
        let config = StoreConfig::new(dir.path());
        let backups =
            storage::list_backups(&config.backups_dir(), &config.backup_prefix()).unwrap();
        fs::write(&backups.last().unwrap().path, b"broken").unwrap();
        fs::write(config.document_path(), b"broken").unwrap();

        let store = HistoryStore::open(config).unwrap();

        let all = store.get_all();
        assert_eq!(all.len(), 1);
        assert!(all.contains_key("A_B_C"));
        assert!(store.validate_integrity().is_valid);
    }

    #[test]
    fn interrupted_write_leaves_document_unchanged() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new(dir.path());
        {
            let store = HistoryStore::open(config.clone()).unwrap();
            store.put_if_absent("BINANCE_BTC_USDT", ts(2017, 8, 17, 0), 24, Metadata::new());
        }
        let path = config.document_path();
        let before = fs::read(&path).unwrap();

        // A writer that dies after the temp file is flushed but before the rename.
        let mut pending = CutoffDocument::empty(Utc::now());
        pending.cutoffs.insert(
            "KRAKEN_ETH_USD".into(),
            CutoffRecord::new("KRAKEN_ETH_USD", ts(2016, 1, 1, 0), Utc::now(), 24, Metadata::new()),
        );
        let bytes = storage::encode_document(&pending).unwrap();
        storage::write_temp(&storage::temp_path_for(&path), &bytes).unwrap();

        let store = HistoryStore::open(config).unwrap();
        assert_eq!(fs::read(&path).unwrap(), before);
        assert!(store.get("KRAKEN_ETH_USD").is_none());
        assert!(store.get("BINANCE_BTC_USDT").is_some());
    }

    #[test]
    fn failed_write_reports_false_and_keeps_state() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        assert!(store.put_if_absent("A_B_C", ts(2018, 1, 1, 0), 24, Metadata::new()));
        let path = store.config().document_path();
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        fs::write(path.join("blocker"), b"x").unwrap();

        assert!(!store.put_if_absent("D_E_F", ts(2018, 1, 1, 0), 24, Metadata::new()));
        assert!(store.get("D_E_F").is_none());
        assert_eq!(store.len(), 1);
        assert!(path.join("blocker").exists());
    }

    #[test]
    fn export_import_round_trip_preserves_records() {
        let dir = tempdir().unwrap();
        let source = open_store(&dir.path().join("source"));
        source.put_if_absent("BINANCE_BTC_USDT", ts(2017, 8, 17, 0), 24, meta("search"));
        source.put_if_absent("KRAKEN_ETH_USD", ts(2016, 5, 1, 12), 12, Metadata::new());

        let json = source.export(ExportFormat::Structured).unwrap();
        let target = open_store(&dir.path().join("target"));
        assert_eq!(target.import(&json, ExportFormat::Structured).unwrap(), 2);

        assert_eq!(target.get_all(), source.get_all());
    }

    #[test]
    fn tabular_round_trip_preserves_records_without_metadata() {
        let dir = tempdir().unwrap();
        let source = open_store(&dir.path().join("source"));
        source.put_if_absent("BINANCE_BTC_USDT", ts(2017, 8, 17, 0), 24, Metadata::new());
        source.put_if_absent("SHORTTAG", ts(2016, 5, 1, 12), 12, Metadata::new());

        let csv = source.export(ExportFormat::Tabular).unwrap();
        let target = open_store(&dir.path().join("target"));
        assert_eq!(target.import(&csv, ExportFormat::Tabular).unwrap(), 2);

        assert_eq!(target.get_all(), source.get_all());
    }

    #[test]
    fn empty_store_round_trips() {
        let dir = tempdir().unwrap();
        let source = open_store(&dir.path().join("source"));
        let target = open_store(&dir.path().join("target"));
        for format in [ExportFormat::Structured, ExportFormat::Tabular] {
            let data = source.export(format).unwrap();
            assert_eq!(target.import(&data, format).unwrap(), 0);
        }
        assert!(target.get_all().is_empty());
        assert_eq!(target.backup_count(), 0);
    }

    #[test]
    fn tabular_export_of_three_records_has_four_lines() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        for tag in ["A_B_C", "D_E_F", "G_H_I"] {
            store.put_if_absent(tag, ts(2018, 1, 1, 0), 24, Metadata::new());
        }
        let csv = store.export(ExportFormat::Tabular).unwrap();
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn import_never_overwrites_existing_records() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.put_if_absent("A_B_C", ts(2018, 1, 1, 0), 24, Metadata::new());
        let original = store.get("A_B_C").unwrap();

        let csv = format!(
            "{}\nA_B_C,2010-01-01T00:00:00Z,2024-01-01T00:00:00Z,1,A,B,C\nD_E_F,2011-01-01T00:00:00Z,2024-01-01T00:00:00Z,1,D,E,F\n",
            crate::TABULAR_HEADER.join(",")
        );
        assert_eq!(store.import(&csv, ExportFormat::Tabular).unwrap(), 1);
        assert_eq!(store.get("A_B_C").unwrap(), original);
        assert!(store.contains("D_E_F"));
    }

    #[test]
    fn malformed_import_mutates_nothing() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        let csv = format!(
            "{}\nD_E_F,2011-01-01T00:00:00Z,2024-01-01T00:00:00Z,1,D,E,F\nBROKEN,row\n",
            crate::TABULAR_HEADER.join(",")
        );
        assert!(store.import(&csv, ExportFormat::Tabular).is_err());
        assert!(store.is_empty());
        assert_eq!(store.backup_count(), 0);
    }

    #[test]
    fn integrity_flags_externally_damaged_document() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.put_if_absent("A_B_C", ts(2018, 1, 1, 0), 24, Metadata::new());
        fs::write(store.config().document_path(), b"{\"version\": \"1.0\"}").unwrap();

        let report = store.validate_integrity();
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 3);
    }

    #[test]
    fn reload_picks_up_external_restore() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.put_if_absent("A_B_C", ts(2018, 1, 1, 0), 24, Metadata::new());
        store.put_if_absent("D_E_F", ts(2018, 1, 1, 0), 24, Metadata::new());
        fs::write(store.config().document_path(), b"garbage").unwrap();

        assert_eq!(store.reload(), 1);
        assert!(store.contains("A_B_C"));
    }

    #[test]
    fn concurrent_writers_all_land() {
        let dir = tempdir().unwrap();
        let store = Arc::new(
            HistoryStore::open(StoreConfig::new(dir.path()).with_backup_retention(2)).unwrap(),
        );
        let handles: Vec<_> = (0..8)
            .map(|idx| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let tag = format!("EXCH_T{idx}_USD");
                    let cutoff = ts(2018, 1, 1, 0) + Duration::days(idx);
                    store.put_if_absent(&tag, cutoff, 24, Metadata::new())
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(store.len(), 8);
        assert_eq!(open_store(dir.path()).len(), 8);
        assert_eq!(store.backup_count(), 2);
    }

    #[test]
    fn stats_report_file_and_exchange_counts() {
        let dir = tempdir().unwrap();
        let store = open_store(dir.path());
        store.put_if_absent("BINANCE_BTC_USDT", ts(2017, 8, 17, 0), 24, Metadata::new());
        store.put_if_absent("BINANCE_ETH_USDT", ts(2017, 8, 17, 0), 24, Metadata::new());
        store.put_if_absent("KRAKEN_ETH_USD", ts(2016, 1, 1, 0), 24, Metadata::new());

        let stats = store.stats();
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.records_per_exchange.get("BINANCE"), Some(&2));
        assert_eq!(stats.records_per_exchange.get("KRAKEN"), Some(&1));
        assert!(stats.file_size_bytes > 0);
        assert_eq!(stats.backup_count, 3);
    }
}
