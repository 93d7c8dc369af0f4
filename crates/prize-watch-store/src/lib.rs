//! Prize persistence.
//!
//! The store keeps one record per machine: the latest validated reading
//! wins. `JsonPrizeStore` backs the record set with a single JSON document
//! replaced atomically on every write, so a crash mid-upsert never leaves a
//! torn file behind. `MemoryPrizeStore` exists for tests that want to watch
//! upserts happen.

mod error;
mod json;
mod memory;
mod record;

pub use error::StoreError;
pub use json::JsonPrizeStore;
pub use memory::MemoryPrizeStore;
pub use record::PrizeRecord;

/// Keyed upsert boundary: insert the machine's record when absent,
/// overwrite it when present.
pub trait PrizeStore: Send + Sync {
    fn update_prize(
        &self,
        machine_id: &str,
        prize_amount: f64,
        confidence: f32,
        timestamp: f64,
    ) -> Result<(), StoreError>;
}
