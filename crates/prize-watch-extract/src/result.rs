use std::fmt;

use prize_watch_ocr::Detection;
use serde::{Serialize, Serializer};

/// Outcome of one processed frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionStatus {
    /// A validated amount was read off the display.
    Success,
    /// The frame was processed but no detection survived parsing.
    NoPrizeFound,
    /// A pipeline stage failed on this frame.
    Error(String),
}

impl ExtractionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::NoPrizeFound => f.write_str("no_prize_found"),
            Self::Error(message) => write!(f, "error: {message}"),
        }
    }
}

impl Serialize for ExtractionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One frame's reading: the winning amount (if any), the raw detections the
/// recognizer produced, and the frame's disposition.
///
/// `status` is `Success` exactly when `prize_amount` is present; the
/// constructors below are the only way results are built, which keeps the
/// two fields in agreement.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    pub machine_id: String,
    /// Seconds since the Unix epoch, stamped when processing began.
    pub timestamp: f64,
    pub prize_amount: Option<f64>,
    pub confidence: f32,
    /// Every recognizer candidate for the frame, in recognizer order,
    /// including the ones that failed parsing or the confidence gate.
    pub detections: Vec<Detection>,
    pub status: ExtractionStatus,
}

impl ExtractionResult {
    pub fn success(
        machine_id: &str,
        timestamp: f64,
        prize_amount: f64,
        confidence: f32,
        detections: Vec<Detection>,
    ) -> Self {
        Self {
            machine_id: machine_id.to_string(),
            timestamp,
            prize_amount: Some(prize_amount),
            confidence,
            detections,
            status: ExtractionStatus::Success,
        }
    }

    pub fn no_prize(machine_id: &str, timestamp: f64, detections: Vec<Detection>) -> Self {
        Self {
            machine_id: machine_id.to_string(),
            timestamp,
            prize_amount: None,
            confidence: 0.0,
            detections,
            status: ExtractionStatus::NoPrizeFound,
        }
    }

    pub fn failed(machine_id: &str, timestamp: f64, message: impl Into<String>) -> Self {
        Self {
            machine_id: machine_id.to_string(),
            timestamp,
            prize_amount: None,
            confidence: 0.0,
            detections: Vec::new(),
            status: ExtractionStatus::Error(message.into()),
        }
    }

    /// Short operator-facing line for status displays and logs.
    pub fn summary(&self) -> String {
        match (&self.status, self.prize_amount) {
            (ExtractionStatus::Success, Some(amount)) => {
                format!("prize {amount:.2} (confidence {:.2})", self.confidence)
            }
            (ExtractionStatus::Error(message), _) => format!("error: {message}"),
            _ => "no prize".to_string(),
        }
    }
}
