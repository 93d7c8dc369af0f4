//! Camera frame acquisition.
//!
//! Providers deliver decoded RGB24 frames in arrival order over an async
//! stream. Live backends keep producing until the device fails or the
//! consumer hangs up; the mock backend synthesizes a bounded run of frames
//! for tests and dry runs.

pub mod backends;
pub mod config;
pub mod core;

pub use config::{Backend, Configuration};
pub use core::{DynFrameProvider, FrameSourceProvider, FrameStream, spawn_stream_from_channel};
pub use prize_watch_types::{FrameError, FrameResult, RgbFrame};
