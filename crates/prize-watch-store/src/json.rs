use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use crate::PrizeStore;
use crate::error::StoreError;
use crate::record::PrizeRecord;

/// File-backed store: one JSON document mapping machine id to its record.
///
/// Every upsert rewrites the document through a sibling temp file and an
/// atomic rename, so readers only ever see a complete document.
pub struct JsonPrizeStore {
    path: PathBuf,
}

impl JsonPrizeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the current record set. A store that has never been written is
    /// an empty set, not an error.
    pub fn records(&self) -> Result<BTreeMap<String, PrizeRecord>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_records(&self, records: &BTreeMap<String, PrizeRecord>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let payload = serde_json::to_string_pretty(records)?;
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, payload)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

impl PrizeStore for JsonPrizeStore {
    fn update_prize(
        &self,
        machine_id: &str,
        prize_amount: f64,
        confidence: f32,
        timestamp: f64,
    ) -> Result<(), StoreError> {
        let mut records = self.records()?;
        records.insert(
            machine_id.to_string(),
            PrizeRecord {
                machine_id: machine_id.to_string(),
                prize_amount,
                confidence,
                detected_at: timestamp,
                updated_at: Utc::now().to_rfc3339(),
            },
        );
        self.write_records(&records)?;
        debug!(machine_id, prize_amount, "prize record upserted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn upsert_inserts_then_overwrites() {
        let dir = tempdir().unwrap();
        let store = JsonPrizeStore::new(dir.path().join("prizes.json"));

        store.update_prize("machine-1", 100.0, 0.80, 1000.0).unwrap();
        store.update_prize("machine-1", 250.0, 0.95, 1010.0).unwrap();

        let records = store.records().unwrap();
        assert_eq!(records.len(), 1);
        let record = &records["machine-1"];
        assert_eq!(record.prize_amount, 250.0);
        assert_eq!(record.confidence, 0.95);
        assert_eq!(record.detected_at, 1010.0);
        assert!(!record.updated_at.is_empty());
    }

    #[test]
    fn machines_keep_separate_records() {
        let dir = tempdir().unwrap();
        let store = JsonPrizeStore::new(dir.path().join("prizes.json"));

        store.update_prize("machine-1", 100.0, 0.80, 1000.0).unwrap();
        store.update_prize("machine-2", 500.0, 0.90, 1001.0).unwrap();

        let records = store.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records["machine-1"].prize_amount, 100.0);
        assert_eq!(records["machine-2"].prize_amount, 500.0);
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let store = JsonPrizeStore::new(dir.path().join("nested/deeper/prizes.json"));
        store.update_prize("machine-1", 42.0, 0.70, 1.0).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = JsonPrizeStore::new(dir.path().join("prizes.json"));
        assert!(store.records().unwrap().is_empty());
    }

    #[test]
    fn corrupt_documents_surface_as_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prizes.json");
        fs::write(&path, "not json at all").unwrap();
        let store = JsonPrizeStore::new(&path);
        assert!(matches!(
            store.records().unwrap_err(),
            StoreError::Serialize(_)
        ));
    }

    #[test]
    fn no_staging_file_survives_an_upsert() {
        let dir = tempdir().unwrap();
        let store = JsonPrizeStore::new(dir.path().join("prizes.json"));
        store.update_prize("machine-1", 10.0, 0.60, 5.0).unwrap();
        assert!(!dir.path().join("prizes.tmp").exists());
    }
}
