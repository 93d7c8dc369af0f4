//! Shared domain models for the prize-watch workspace.
//!
//! Frame buffers, region geometry, and the capture error enum live here so
//! the capture, extraction, and CLI crates can share vocabulary without
//! depending on each other or pulling camera SDKs into every build.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bytes per pixel for interleaved RGB24 frames.
pub const RGB_CHANNELS: usize = 3;

pub type FrameResult<T> = Result<T, FrameError>;

/// Decoded camera frame: interleaved RGB24 rows with a fixed stride.
///
/// The pixel buffer is shared so frames can be cloned cheaply between the
/// capture stream and the processing loop.
#[derive(Clone)]
pub struct RgbFrame {
    width: u32,
    height: u32,
    stride: usize,
    frame_index: Option<u64>,
    data: Arc<[u8]>,
}

impl fmt::Debug for RgbFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RgbFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("bytes", &self.data.len())
            .field("frame_index", &self.frame_index)
            .finish()
    }
}

impl RgbFrame {
    pub fn from_owned(width: u32, height: u32, stride: usize, data: Vec<u8>) -> FrameResult<Self> {
        let min_stride = (width as usize)
            .checked_mul(RGB_CHANNELS)
            .ok_or_else(|| FrameError::InvalidFrame {
                reason: "frame width overflowed the row length".into(),
            })?;
        if stride < min_stride {
            return Err(FrameError::InvalidFrame {
                reason: format!("stride {stride} is below the packed row length {min_stride}"),
            });
        }
        let required =
            stride
                .checked_mul(height as usize)
                .ok_or_else(|| FrameError::InvalidFrame {
                    reason: "calculated frame length overflowed".into(),
                })?;
        if data.len() < required {
            return Err(FrameError::InvalidFrame {
                reason: format!(
                    "insufficient frame bytes: got {} expected at least {}",
                    data.len(),
                    required
                ),
            });
        }
        Ok(Self {
            width,
            height,
            stride,
            frame_index: None,
            data: Arc::from(data.into_boxed_slice()),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn frame_index(&self) -> Option<u64> {
        self.frame_index
    }

    pub fn with_frame_index(mut self, index: Option<u64>) -> Self {
        self.frame_index = index;
        self
    }

    /// One row of pixel data, trimmed to the packed width.
    pub fn row(&self, y: u32) -> &[u8] {
        debug_assert!(y < self.height);
        let start = self.stride * y as usize;
        let packed = self.width as usize * RGB_CHANNELS;
        &self.data[start..start + packed]
    }
}

/// Owned single-channel image produced by the crop and normalize stages.
#[derive(Debug, Clone)]
pub struct LumaImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl LumaImage {
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> FrameResult<Self> {
        let required = width as usize * height as usize;
        if data.len() != required {
            return Err(FrameError::InvalidFrame {
                reason: format!(
                    "luma buffer mismatch: got {} bytes for {width}x{height}",
                    data.len()
                ),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("backend {backend} is not supported in this build")]
    Unsupported { backend: &'static str },

    #[error("{backend} backend failed: {message}")]
    BackendFailure {
        backend: &'static str,
        message: String,
    },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("invalid frame: {reason}")]
    InvalidFrame { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    pub fn unsupported(backend: &'static str) -> Self {
        Self::Unsupported { backend }
    }

    pub fn backend_failure(backend: &'static str, message: impl Into<String>) -> Self {
        Self::BackendFailure {
            backend,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn invalid_frame(reason: impl Into<String>) -> Self {
        Self::InvalidFrame {
            reason: reason.into(),
        }
    }
}

/// Prize-display region in absolute pixel coordinates, upper-left origin.
///
/// `x2`/`y2` are exclusive, so a rectangle covers columns `x1..x2` and rows
/// `y1..y2` of the source frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoiRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl RoiRect {
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    /// Rejects empty or inverted rectangles.
    pub fn validate(&self) -> FrameResult<()> {
        if self.x1 >= self.x2 || self.y1 >= self.y2 {
            return Err(FrameError::configuration(format!(
                "roi rectangle ({}, {}, {}, {}) has no area",
                self.x1, self.y1, self.x2, self.y2
            )));
        }
        Ok(())
    }

    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x2 <= width && self.y2 <= height
    }
}

impl fmt::Display for RoiRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}
