use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

use prize_watch_extract::ExtractionResult;
use serde::Serialize;

/// Running counters for one watch session.
#[derive(Debug)]
pub struct RunMetrics {
    frames: u64,
    successes: u64,
    started: Instant,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self {
            frames: 0,
            successes: 0,
            started: Instant::now(),
        }
    }

    pub fn record(&mut self, result: &ExtractionResult) {
        self.frames = self.frames.saturating_add(1);
        if result.status.is_success() {
            self.successes = self.successes.saturating_add(1);
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    /// Fraction of processed frames that yielded a validated amount, 0.0
    /// before the first frame.
    pub fn accuracy(&self) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            self.successes as f64 / self.frames as f64
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Final summary emitted on every exit path.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub machine_id: String,
    pub frames_processed: u64,
    pub successes: u64,
    pub accuracy: f64,
    pub elapsed_seconds: f64,
    pub avg_frame_seconds: f64,
}

impl RunReport {
    pub fn from_metrics(machine_id: &str, metrics: &RunMetrics) -> Self {
        let elapsed_seconds = metrics.elapsed().as_secs_f64();
        let avg_frame_seconds = if metrics.frames() == 0 {
            0.0
        } else {
            elapsed_seconds / metrics.frames() as f64
        };
        Self {
            machine_id: machine_id.to_string(),
            frames_processed: metrics.frames(),
            successes: metrics.successes(),
            accuracy: metrics.accuracy(),
            elapsed_seconds,
            avg_frame_seconds,
        }
    }

    pub fn write_json(&self, path: &Path) -> io::Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)
    }
}
