use serde::Serialize;

/// One text candidate reported by a recognizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub text: String,
    /// Recognizer confidence in `[0, 1]`.
    pub confidence: f32,
}

impl Detection {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Every candidate a recognizer saw, in recognizer order.
#[derive(Debug, Clone, Default)]
pub struct OcrResponse {
    pub detections: Vec<Detection>,
}

impl OcrResponse {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    pub fn empty() -> Self {
        Self {
            detections: Vec::new(),
        }
    }
}
