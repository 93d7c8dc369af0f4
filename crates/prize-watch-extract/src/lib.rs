//! Per-frame prize extraction: crop, normalize, recognize, parse, classify.
//!
//! The pipeline is synchronous and owns no I/O besides the injected
//! recognizer. Every stage reports errors as values; `FrameProcessor`
//! converts them into error-status results so one bad frame never takes the
//! capture loop down.

mod amount;
mod classify;
mod error;
mod normalize;
mod pipeline;
mod result;
mod roi;

pub use amount::{
    AmountParser, AmountRules, DEFAULT_CURRENCY_SYMBOLS, DEFAULT_MAX_AMOUNT, DEFAULT_MIN_AMOUNT,
};
pub use classify::ResultClassifier;
pub use error::PipelineError;
pub use normalize::{clahe, luminance, nl_means_denoise, normalize_crop};
pub use pipeline::{ExtractionConfig, FrameProcessor};
pub use result::{ExtractionResult, ExtractionStatus};
pub use roi::{RgbCrop, crop_roi};
