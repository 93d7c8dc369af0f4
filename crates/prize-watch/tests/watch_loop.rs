use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use prize_watch::pipeline::{self, PipelineConfig};
use prize_watch_capture::{FrameSourceProvider, FrameStream, spawn_stream_from_channel};
use prize_watch_extract::{AmountRules, ExtractionConfig, FrameProcessor};
use prize_watch_ocr::{Detection, OcrEngine, OcrError, OcrRequest, OcrResponse};
use prize_watch_store::{JsonPrizeStore, MemoryPrizeStore};
use prize_watch_types::{FrameError, RGB_CHANNELS, RgbFrame, RoiRect};

const FRAME_WIDTH: u32 = 48;
const FRAME_HEIGHT: u32 = 24;

fn test_frame(index: u64) -> RgbFrame {
    let stride = FRAME_WIDTH as usize * RGB_CHANNELS;
    let data = vec![200u8; stride * FRAME_HEIGHT as usize];
    RgbFrame::from_owned(FRAME_WIDTH, FRAME_HEIGHT, stride, data)
        .expect("valid frame")
        .with_frame_index(Some(index))
}

struct ShortTakeProvider {
    frames: u64,
}

impl FrameSourceProvider for ShortTakeProvider {
    fn total_frames(&self) -> Option<u64> {
        Some(self.frames)
    }

    fn into_stream(self: Box<Self>) -> FrameStream {
        let count = self.frames;
        spawn_stream_from_channel(4, move |tx| {
            for index in 0..count {
                if tx.blocking_send(Ok(test_frame(index))).is_err() {
                    break;
                }
            }
        })
    }
}

struct UnpluggedProvider;

impl FrameSourceProvider for UnpluggedProvider {
    fn into_stream(self: Box<Self>) -> FrameStream {
        spawn_stream_from_channel(4, move |tx| {
            let _ = tx.blocking_send(Ok(test_frame(0)));
            let _ = tx.blocking_send(Err(FrameError::backend_failure("mock", "cable unplugged")));
        })
    }
}

/// Reports a prize on the third frame only.
struct ThirdFrameEngine {
    calls: Mutex<u32>,
}

impl ThirdFrameEngine {
    fn new() -> Self {
        Self {
            calls: Mutex::new(0),
        }
    }
}

impl OcrEngine for ThirdFrameEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn recognize(&self, _: &OcrRequest<'_>) -> Result<OcrResponse, OcrError> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if *calls == 3 {
            Ok(OcrResponse::new(vec![Detection::new(
                "$1,234.56 WIN",
                0.91,
            )]))
        } else {
            Ok(OcrResponse::new(Vec::new()))
        }
    }
}

fn watch_config(report_path: Option<PathBuf>, store_path: PathBuf) -> PipelineConfig {
    PipelineConfig {
        machine_id: "floor-7-a".to_string(),
        extraction: ExtractionConfig {
            roi: RoiRect::new(4, 4, 20, 12),
            confidence_threshold: 0.6,
            rules: AmountRules::default(),
        },
        store_path,
        report_path,
        headless: true,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn a_prize_seen_on_one_frame_reaches_the_store_once() {
    let config = watch_config(None, PathBuf::from("unused.json"));
    let processor = FrameProcessor::new(
        config.extraction.clone(),
        Arc::new(ThirdFrameEngine::new()),
    )
    .expect("valid processor");
    let store = Arc::new(MemoryPrizeStore::new());
    let provider = Box::new(ShortTakeProvider { frames: 5 });

    pipeline::watch_frames(provider, &config, &processor, store.clone())
        .await
        .expect("watch loop completes");

    let upserts = store.upserts();
    assert_eq!(upserts.len(), 1);
    assert_eq!(upserts[0].machine_id, "floor-7-a");
    assert_eq!(upserts[0].prize_amount, 1234.56);
    assert_eq!(upserts[0].confidence, 0.91);
}

#[tokio::test(flavor = "multi_thread")]
async fn the_json_store_keeps_one_record_per_machine() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store_path = dir.path().join("prizes.json");
    let config = watch_config(None, store_path.clone());
    let processor = FrameProcessor::new(
        config.extraction.clone(),
        Arc::new(ThirdFrameEngine::new()),
    )
    .expect("valid processor");
    let store = Arc::new(JsonPrizeStore::new(&store_path));
    let provider = Box::new(ShortTakeProvider { frames: 5 });

    pipeline::watch_frames(provider, &config, &processor, store)
        .await
        .expect("watch loop completes");

    let records = JsonPrizeStore::new(&store_path)
        .records()
        .expect("readable store");
    assert_eq!(records.len(), 1);
    let record = records.get("floor-7-a").expect("record for the machine");
    assert_eq!(record.prize_amount, 1234.56);
}

#[tokio::test(flavor = "multi_thread")]
async fn a_source_failure_still_writes_the_run_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    let report_path = dir.path().join("report.json");
    let config = watch_config(Some(report_path.clone()), PathBuf::from("unused.json"));
    let processor = FrameProcessor::new(
        config.extraction.clone(),
        Arc::new(ThirdFrameEngine::new()),
    )
    .expect("valid processor");
    let store = Arc::new(MemoryPrizeStore::new());

    let outcome =
        pipeline::watch_frames(Box::new(UnpluggedProvider), &config, &processor, store).await;

    let (err, processed) = outcome.expect_err("source failure ends the run");
    assert_eq!(processed, 1);
    assert!(err.to_string().contains("cable unplugged"));

    let contents = std::fs::read_to_string(&report_path).expect("report written");
    let report: serde_json::Value = serde_json::from_str(&contents).expect("valid json");
    assert_eq!(report["machine_id"], "floor-7-a");
    assert_eq!(report["frames_processed"], 1);
    assert_eq!(report["successes"], 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn a_clean_run_writes_a_report_with_accuracy() {
    let dir = tempfile::tempdir().expect("tempdir");
    let report_path = dir.path().join("report.json");
    let config = watch_config(Some(report_path.clone()), PathBuf::from("unused.json"));
    let processor = FrameProcessor::new(
        config.extraction.clone(),
        Arc::new(ThirdFrameEngine::new()),
    )
    .expect("valid processor");
    let store = Arc::new(MemoryPrizeStore::new());
    let provider = Box::new(ShortTakeProvider { frames: 4 });

    pipeline::watch_frames(provider, &config, &processor, store)
        .await
        .expect("watch loop completes");

    let contents = std::fs::read_to_string(&report_path).expect("report written");
    let report: serde_json::Value = serde_json::from_str(&contents).expect("valid json");
    assert_eq!(report["frames_processed"], 4);
    assert_eq!(report["successes"], 1);
    assert_eq!(report["accuracy"], 0.25);
}
