use prize_watch_ocr::OcrError;
use prize_watch_types::{FrameError, RoiRect};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("roi {roi} does not fit inside a {width}x{height} frame")]
    RoiOutOfBounds {
        roi: RoiRect,
        width: u32,
        height: u32,
    },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("recognizer failed: {0}")]
    Recognizer(#[from] OcrError),

    #[error(transparent)]
    Frame(#[from] FrameError),
}

impl PipelineError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
