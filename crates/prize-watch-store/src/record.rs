use serde::{Deserialize, Serialize};

/// Latest accepted reading for one machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrizeRecord {
    pub machine_id: String,
    pub prize_amount: f64,
    pub confidence: f32,
    /// Seconds since the Unix epoch when the winning frame was processed.
    pub detected_at: f64,
    /// RFC 3339 wall-clock marker, refreshed on every upsert.
    pub updated_at: String,
}
