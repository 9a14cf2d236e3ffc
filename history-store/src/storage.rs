// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! File-level primitives: atomic document replacement and timestamped backups.

use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
    time::SystemTime,
};

use chrono::{DateTime, Duration, Utc};

use crate::record::CutoffDocument;

const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%6f";
const BACKUP_EXTENSION: &str = "json";

pub(crate) fn decode_document(bytes: &[u8]) -> io::Result<CutoffDocument> {
    serde_json::from_slice(bytes).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

pub(crate) fn read_document(path: &Path) -> io::Result<CutoffDocument> {
    let bytes = fs::read(path)?;
    decode_document(&bytes)
}

pub(crate) fn encode_document(document: &CutoffDocument) -> serde_json::Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(document)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Temporary sibling of `path`; same directory so the final rename stays on one filesystem.
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

pub(crate) fn write_temp(temp: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(temp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

/// Writes `bytes` beside `path` and renames them into place. On failure the temporary file is
/// removed and `path` is left exactly as it was.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let temp = temp_path_for(path);
    let result = write_temp(&temp, bytes).and_then(|_| fs::rename(&temp, path));
    if let Err(err) = result {
        if temp.exists() {
            let _ = fs::remove_file(&temp);
        }
        return Err(err);
    }
    sync_parent(path);
    Ok(())
}

fn sync_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct BackupEntry {
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Backups in `dir` carrying `prefix`, oldest first (modification time, then name).
pub(crate) fn list_backups(dir: &Path, prefix: &str) -> io::Result<Vec<BackupEntry>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with(prefix) || !name.ends_with(BACKUP_EXTENSION) {
            continue;
        }
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        entries.push(BackupEntry {
            path: entry.path(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        });
    }
    entries.sort_by(|a, b| {
        a.modified
            .cmp(&b.modified)
            .then_with(|| a.path.file_name().cmp(&b.path.file_name()))
    });
    Ok(entries)
}

/// Copies `source` into a new timestamped backup. Returns `None` when there is nothing to copy.
pub(crate) fn snapshot(
    source: &Path,
    dir: &Path,
    prefix: &str,
    now: DateTime<Utc>,
) -> io::Result<Option<PathBuf>> {
    if !source.exists() {
        return Ok(None);
    }
    fs::create_dir_all(dir)?;
    let mut stamp = now;
    let mut target = backup_path(dir, prefix, stamp);
    while target.exists() {
        stamp += Duration::microseconds(1);
        target = backup_path(dir, prefix, stamp);
    }
    fs::copy(source, &target)?;
    Ok(Some(target))
}

fn backup_path(dir: &Path, prefix: &str, stamp: DateTime<Utc>) -> PathBuf {
    dir.join(format!(
        "{prefix}{}.{BACKUP_EXTENSION}",
        stamp.format(BACKUP_TIMESTAMP_FORMAT)
    ))
}

/// Deletes the oldest backups so that at most `keep` remain. Returns the number removed.
pub(crate) fn rotate(dir: &Path, prefix: &str, keep: usize) -> io::Result<usize> {
    let backups = list_backups(dir, prefix)?;
    if backups.len() <= keep {
        return Ok(0);
    }
    let excess = backups.len() - keep;
    for entry in &backups[..excess] {
        fs::remove_file(&entry.path)?;
    }
    Ok(excess)
}
