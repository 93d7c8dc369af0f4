use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use prize_watch_ocr::{LumaPlane, OcrEngine, OcrRequest, OcrResponse};
use prize_watch_types::{RgbFrame, RoiRect};
use tracing::warn;

use crate::amount::{AmountParser, AmountRules};
use crate::classify::ResultClassifier;
use crate::error::PipelineError;
use crate::normalize::normalize_crop;
use crate::result::ExtractionResult;
use crate::roi::crop_roi;

/// Everything the per-frame pipeline needs, handed in at construction.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub roi: RoiRect,
    pub confidence_threshold: f32,
    pub rules: AmountRules,
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.roi.validate()?;
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(PipelineError::configuration(format!(
                "confidence threshold {} is outside 0..1",
                self.confidence_threshold
            )));
        }
        Ok(())
    }
}

/// Runs one frame at a time through crop, normalize, recognize, classify.
pub struct FrameProcessor {
    config: ExtractionConfig,
    parser: AmountParser,
    classifier: ResultClassifier,
    engine: Arc<dyn OcrEngine>,
}

impl FrameProcessor {
    pub fn new(
        config: ExtractionConfig,
        engine: Arc<dyn OcrEngine>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let parser = AmountParser::new(&config.rules)?;
        let classifier = ResultClassifier::new(config.confidence_threshold);
        Ok(Self {
            config,
            parser,
            classifier,
            engine,
        })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Processes a single frame to completion and always hands back a
    /// result: stage failures are folded into an error-status result so the
    /// capture loop keeps running.
    pub fn process(&self, frame: &RgbFrame, machine_id: &str) -> ExtractionResult {
        let timestamp = unix_timestamp();
        match self.run_stages(frame) {
            Ok(response) => {
                self.classifier
                    .classify(machine_id, timestamp, &response, &self.parser)
            }
            Err(err) => {
                warn!(machine_id, error = %err, "frame processing failed");
                ExtractionResult::failed(machine_id, timestamp, err.to_string())
            }
        }
    }

    fn run_stages(&self, frame: &RgbFrame) -> Result<OcrResponse, PipelineError> {
        let crop = crop_roi(frame, &self.config.roi)?;
        let normalized = normalize_crop(&crop)?;
        let plane = LumaPlane::from_image(&normalized);
        let request = OcrRequest::new(plane);
        Ok(self.engine.recognize(&request)?)
    }
}

fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default()
}
