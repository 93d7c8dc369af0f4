use prize_watch_ocr::OcrResponse;
use tracing::debug;

use crate::amount::AmountParser;
use crate::result::ExtractionResult;

/// Folds a recognizer response into the frame's final reading.
///
/// Detections below the confidence gate are skipped outright; the rest run
/// through the amount parser and the highest-confidence parsed amount wins.
/// On equal confidence the earlier detection keeps the win, so recognizer
/// order breaks ties. All raw detections are carried into the result
/// regardless of how the selection went.
pub struct ResultClassifier {
    confidence_threshold: f32,
}

impl ResultClassifier {
    pub fn new(confidence_threshold: f32) -> Self {
        Self {
            confidence_threshold,
        }
    }

    pub fn classify(
        &self,
        machine_id: &str,
        timestamp: f64,
        response: &OcrResponse,
        parser: &AmountParser,
    ) -> ExtractionResult {
        let mut best: Option<(f64, f32)> = None;
        for detection in &response.detections {
            if detection.confidence < self.confidence_threshold {
                continue;
            }
            let Some(amount) = parser.parse(&detection.text) else {
                continue;
            };
            let replace = match best {
                None => true,
                Some((_, confidence)) => detection.confidence > confidence,
            };
            if replace {
                best = Some((amount, detection.confidence));
            }
        }

        let detections = response.detections.clone();
        match best {
            Some((amount, confidence)) => {
                debug!(machine_id, amount, confidence, "prize reading accepted");
                ExtractionResult::success(machine_id, timestamp, amount, confidence, detections)
            }
            None => ExtractionResult::no_prize(machine_id, timestamp, detections),
        }
    }
}
