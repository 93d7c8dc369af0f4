use std::time::Duration;

use prize_watch_capture::{Backend, Configuration};
use tokio_stream::StreamExt;

#[tokio::test(flavor = "multi_thread")]
async fn mock_backend_produces_a_bounded_stream() {
    let mut config = Configuration::default();
    config.backend = Backend::Mock;
    config.frame_interval = Duration::ZERO;
    let provider = config.create_provider().expect("mock backend available");
    let total = provider.total_frames().expect("mock run is bounded");
    let mut stream = provider.into_stream();
    let mut frames = Vec::new();
    while let Some(frame) = stream.next().await {
        frames.push(frame.expect("mock frames decode"));
        if frames.len() == 3 {
            break;
        }
    }
    assert_eq!(frames.len(), 3);
    assert!(total >= 3);
    assert_eq!(frames[0].width(), 1280);
    assert_eq!(frames[0].height(), 720);
    assert_eq!(frames[0].frame_index(), Some(0));
}
