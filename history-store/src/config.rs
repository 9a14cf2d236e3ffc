// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::{
    fs,
    path::{Path, PathBuf},
};

use core_types::CutoffConfig;

use crate::error::Result;

pub const DEFAULT_DOCUMENT_FILE: &str = "cutoff_history.json";
pub const DEFAULT_BACKUP_RETENTION: usize = 10;
pub const BACKUP_DIR: &str = "backups";

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub state_dir: PathBuf,
    pub document_file: String,
    pub backup_retention_count: usize,
}

impl StoreConfig {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
            document_file: DEFAULT_DOCUMENT_FILE.to_string(),
            backup_retention_count: DEFAULT_BACKUP_RETENTION,
        }
    }

    pub fn from_cutoff_config(config: &CutoffConfig) -> Self {
        Self {
            state_dir: config.state_dir.clone(),
            document_file: config.document_file.clone(),
            backup_retention_count: config.backup_retention_count,
        }
    }

    pub fn with_document_file(mut self, file_name: impl Into<String>) -> Self {
        self.document_file = file_name.into();
        self
    }

    pub fn with_backup_retention(mut self, count: usize) -> Self {
        self.backup_retention_count = count;
        self
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn document_path(&self) -> PathBuf {
        self.state_dir.join(&self.document_file)
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.state_dir.join(BACKUP_DIR)
    }

    /// File name prefix shared by every backup of this document.
    pub fn backup_prefix(&self) -> String {
        let stem = Path::new(&self.document_file)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("document");
        format!("{stem}_backup_")
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        if !self.state_dir.exists() {
            fs::create_dir_all(&self.state_dir)?;
        }
        let backups = self.backups_dir();
        if !backups.exists() {
            fs::create_dir_all(backups)?;
        }
        Ok(())
    }
}
