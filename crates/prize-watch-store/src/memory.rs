use std::sync::{Mutex, PoisonError};

use chrono::Utc;

use crate::PrizeStore;
use crate::error::StoreError;
use crate::record::PrizeRecord;

/// In-memory store that remembers every upsert, for tests that assert on
/// persistence behavior without touching the filesystem.
#[derive(Default)]
pub struct MemoryPrizeStore {
    upserts: Mutex<Vec<PrizeRecord>>,
}

impl MemoryPrizeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every upsert seen so far, in call order.
    pub fn upserts(&self) -> Vec<PrizeRecord> {
        self.upserts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl PrizeStore for MemoryPrizeStore {
    fn update_prize(
        &self,
        machine_id: &str,
        prize_amount: f64,
        confidence: f32,
        timestamp: f64,
    ) -> Result<(), StoreError> {
        self.upserts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(PrizeRecord {
                machine_id: machine_id.to_string(),
                prize_amount,
                confidence,
                detected_at: timestamp,
                updated_at: Utc::now().to_rfc3339(),
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_upserts_in_call_order() {
        let store = MemoryPrizeStore::new();
        store.update_prize("machine-1", 10.0, 0.5, 1.0).unwrap();
        store.update_prize("machine-1", 20.0, 0.9, 2.0).unwrap();

        let upserts = store.upserts();
        assert_eq!(store.upsert_count(), 2);
        assert_eq!(upserts[0].prize_amount, 10.0);
        assert_eq!(upserts[1].prize_amount, 20.0);
    }
}
