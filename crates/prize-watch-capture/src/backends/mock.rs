use std::thread;
use std::time::Duration;

use tokio::sync::mpsc::Sender;

use crate::config::Configuration;
use crate::core::{
    DynFrameProvider, FrameResult, FrameSourceProvider, FrameStream, RgbFrame,
    spawn_stream_from_channel,
};
use prize_watch_types::RGB_CHANNELS;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;
const MOCK_FRAME_COUNT: usize = 120;

/// Synthesizes a bounded run of gray gradient frames at the configured
/// cadence. Stands in for a camera in tests and `--camera mock` dry runs.
pub struct MockProvider {
    width: u32,
    height: u32,
    stride: usize,
    frame_count: usize,
    frame_interval: Duration,
    channel_capacity: usize,
}

impl MockProvider {
    pub fn new(config: &Configuration) -> FrameResult<Self> {
        let capacity = config
            .channel_capacity
            .map(|n| n.get())
            .unwrap_or(DEFAULT_CHANNEL_CAPACITY);
        Ok(Self {
            width: config.width,
            height: config.height,
            stride: config.width as usize * RGB_CHANNELS,
            frame_count: MOCK_FRAME_COUNT,
            frame_interval: config.frame_interval,
            channel_capacity: capacity.max(1),
        })
    }

    fn emit_frames(&self, tx: Sender<FrameResult<RgbFrame>>) {
        for index in 0..self.frame_count {
            if tx.is_closed() {
                break;
            }
            let mut buffer = vec![0u8; self.stride * self.height as usize];
            for (row, chunk) in buffer.chunks_mut(self.stride).enumerate() {
                let value = ((row + index) % 256) as u8;
                chunk.fill(value);
            }
            let frame = RgbFrame::from_owned(self.width, self.height, self.stride, buffer)
                .map(|frame| frame.with_frame_index(Some(index as u64)));
            if tx.blocking_send(frame).is_err() {
                break;
            }
            if !self.frame_interval.is_zero() {
                thread::sleep(self.frame_interval);
            }
        }
    }
}

impl FrameSourceProvider for MockProvider {
    fn total_frames(&self) -> Option<u64> {
        Some(self.frame_count as u64)
    }

    fn into_stream(self: Box<Self>) -> FrameStream {
        let provider = *self;
        let capacity = provider.channel_capacity;
        spawn_stream_from_channel(capacity, move |tx| provider.emit_frames(tx))
    }
}

pub fn boxed_mock(config: &Configuration) -> FrameResult<DynFrameProvider> {
    Ok(Box::new(MockProvider::new(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    fn fast_config() -> Configuration {
        Configuration {
            width: 64,
            height: 36,
            frame_interval: Duration::ZERO,
            ..Configuration::default()
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn mock_backend_emits_indexed_frames() {
        let provider = Box::new(MockProvider::new(&fast_config()).unwrap());
        assert_eq!(provider.total_frames(), Some(MOCK_FRAME_COUNT as u64));

        let mut stream = provider.into_stream();
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.width(), 64);
        assert_eq!(first.height(), 36);
        assert_eq!(first.frame_index(), Some(0));
        assert_eq!(first.data().len(), 64 * 36 * RGB_CHANNELS);

        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.frame_index(), Some(1));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn gradient_rows_step_by_row_index() {
        let provider = Box::new(MockProvider::new(&fast_config()).unwrap());
        let mut stream = provider.into_stream();
        let frame = stream.next().await.unwrap().unwrap();
        assert_eq!(frame.row(0)[0], 0);
        assert_eq!(frame.row(5)[0], 5);
    }
}
