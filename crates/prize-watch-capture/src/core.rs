use std::pin::Pin;

use futures_core::Stream;
use futures_util::stream::unfold;
use tokio::sync::mpsc::{self, Sender};

pub use prize_watch_types::{FrameError, FrameResult, RgbFrame};

pub type FrameStream = Pin<Box<dyn Stream<Item = FrameResult<RgbFrame>> + Send>>;

pub type DynFrameProvider = Box<dyn FrameSourceProvider>;

pub trait FrameSourceProvider: Send + 'static {
    /// Known frame count, when the source is bounded. Live cameras return
    /// `None`.
    fn total_frames(&self) -> Option<u64> {
        None
    }

    fn into_stream(self: Box<Self>) -> FrameStream;
}

/// Bridges a blocking capture loop into an async frame stream through a
/// bounded channel. The producer runs on the blocking pool and observes
/// backpressure from the consumer via the channel capacity.
pub fn spawn_stream_from_channel(
    capacity: usize,
    task: impl FnOnce(Sender<FrameResult<RgbFrame>>) + Send + 'static,
) -> FrameStream {
    let (tx, rx) = mpsc::channel(capacity);
    tokio::task::spawn_blocking(move || task(tx));
    let stream = unfold(rx, |mut receiver| async {
        receiver.recv().await.map(|item| (item, receiver))
    });
    Box::pin(stream)
}
