//! History of generated characters
//!
//! Append-only for the lifetime of a session, clearable as a whole, and
//! stored on disk as a flat pretty-printed JSON array of records.

use crate::core::error::Result;
use crate::core::types::CharacterRecord;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryLog {
    records: Vec<CharacterRecord>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, record: CharacterRecord) {
        self.records.push(record);
    }

    /// Drop every record
    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records oldest first
    pub fn records(&self) -> &[CharacterRecord] {
        &self.records
    }

    /// Records newest first, the order history views list them in
    pub fn newest_first(&self) -> impl Iterator<Item = &CharacterRecord> {
        self.records.iter().rev()
    }

    /// Write the whole log to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Read a log previously written by `save`
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let records = serde_json::from_str(&content)?;
        Ok(Self { records })
    }

    /// Read a log, yielding an empty one when the file is missing or unreadable
    pub fn load_or_empty(path: &Path) -> Self {
        if !path.exists() {
            return Self::new();
        }
        match Self::load(path) {
            Ok(log) => {
                tracing::info!("Loaded {} history records from {}", log.len(), path.display());
                log
            }
            Err(e) => {
                tracing::warn!("Could not read history from {}: {}", path.display(), e);
                Self::new()
            }
        }
    }
}

impl FromIterator<CharacterRecord> for HistoryLog {
    fn from_iter<I: IntoIterator<Item = CharacterRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
