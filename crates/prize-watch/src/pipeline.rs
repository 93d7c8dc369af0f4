use std::path::PathBuf;
use std::sync::Arc;

use prize_watch_capture::DynFrameProvider;
use prize_watch_extract::{ExtractionConfig, FrameProcessor, PipelineError};
use prize_watch_ocr::{NoopOcrEngine, OcrEngine, OcrError};
use prize_watch_store::{JsonPrizeStore, PrizeStore};
use prize_watch_types::FrameError;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use crate::progress;
use crate::report::{RunMetrics, RunReport};
use crate::settings::EffectiveSettings;

#[derive(Clone)]
pub struct PipelineConfig {
    pub machine_id: String,
    pub extraction: ExtractionConfig,
    pub store_path: PathBuf,
    pub report_path: Option<PathBuf>,
    pub headless: bool,
}

impl PipelineConfig {
    pub fn from_settings(settings: &EffectiveSettings) -> Self {
        Self {
            machine_id: settings.machine_id.clone(),
            extraction: settings.extraction.clone(),
            store_path: settings.store_path.clone(),
            report_path: settings.report_path.clone(),
            headless: settings.headless,
        }
    }
}

/// Builds the recognizer, processor, and store from the pipeline config,
/// then watches the provider's frames until the stream ends.
pub async fn run_watch(
    provider: DynFrameProvider,
    pipeline: &PipelineConfig,
) -> Result<(), (FrameError, u64)> {
    let engine = match build_ocr_engine() {
        Ok(engine) => engine,
        Err(err) => return Err((map_ocr_init_error(err), 0)),
    };
    let processor = match FrameProcessor::new(pipeline.extraction.clone(), engine) {
        Ok(processor) => processor,
        Err(err) => return Err((map_extraction_error(err), 0)),
    };
    let store = Arc::new(JsonPrizeStore::new(&pipeline.store_path));

    info!(
        machine_id = %pipeline.machine_id,
        engine = processor.engine_name(),
        roi = %pipeline.extraction.roi,
        confidence_threshold = pipeline.extraction.confidence_threshold,
        store = %pipeline.store_path.display(),
        "starting prize watch"
    );

    watch_frames(provider, pipeline, &processor, store).await
}

/// The frame loop: process, persist successes, keep the status line and
/// metrics current. Ends on stream end, source failure, or Ctrl-C; the run
/// report is emitted on every one of those paths.
pub async fn watch_frames(
    provider: DynFrameProvider,
    pipeline: &PipelineConfig,
    processor: &FrameProcessor,
    store: Arc<dyn PrizeStore>,
) -> Result<(), (FrameError, u64)> {
    let total_frames = provider.total_frames();
    let mut stream = provider.into_stream();

    let progress = progress::watch_progress(pipeline.headless, total_frames);
    let mut metrics = RunMetrics::new();
    let mut failure: Option<FrameError> = None;
    let mut interrupted = false;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                interrupted = true;
                break;
            }
            maybe_frame = stream.next() => {
                match maybe_frame {
                    Some(Ok(frame)) => {
                        let result = processor.process(&frame, &pipeline.machine_id);
                        metrics.record(&result);
                        debug!(
                            machine_id = %pipeline.machine_id,
                            frame = metrics.frames(),
                            status = %result.status,
                            "frame classified"
                        );
                        if let Some(amount) = result.prize_amount {
                            if let Err(err) = store.update_prize(
                                &pipeline.machine_id,
                                amount,
                                result.confidence,
                                result.timestamp,
                            ) {
                                warn!(
                                    machine_id = %pipeline.machine_id,
                                    error = %err,
                                    "failed to persist prize"
                                );
                            }
                        }
                        progress.set_position(metrics.frames());
                        progress.set_message(result.summary());
                    }
                    Some(Err(err)) => {
                        failure = Some(err);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    let report = RunReport::from_metrics(&pipeline.machine_id, &metrics);

    if let Some(err) = failure {
        progress.abandon_with_message(format!("failed after {} frames", metrics.frames()));
        emit_report(pipeline, &report);
        return Err((err, metrics.frames()));
    }

    if interrupted {
        progress.finish_with_message(format!(
            "interrupted after {} frames, {} prizes",
            metrics.frames(),
            metrics.successes()
        ));
    } else {
        progress.finish_with_message(format!(
            "completed {} frames, {} prizes",
            metrics.frames(),
            metrics.successes()
        ));
    }
    emit_report(pipeline, &report);

    Ok(())
}

fn emit_report(pipeline: &PipelineConfig, report: &RunReport) {
    info!(
        machine_id = %report.machine_id,
        frames = report.frames_processed,
        successes = report.successes,
        accuracy = report.accuracy,
        elapsed_seconds = report.elapsed_seconds,
        avg_frame_seconds = report.avg_frame_seconds,
        "run finished"
    );
    if let Some(path) = pipeline.report_path.as_ref() {
        if let Err(err) = report.write_json(path) {
            warn!(path = %path.display(), error = %err, "failed to write run report");
        }
    }
}

fn build_noop_engine() -> Result<Arc<dyn OcrEngine>, OcrError> {
    let engine = NoopOcrEngine::default();
    engine.warm_up()?;
    Ok(Arc::new(engine))
}

#[cfg(feature = "engine-tesseract")]
fn build_ocr_engine() -> Result<Arc<dyn OcrEngine>, OcrError> {
    use prize_watch_ocr::TesseractOcrEngine;

    let mut engine = TesseractOcrEngine::new();
    if let Ok(binary) = std::env::var("PRIZEWATCH_TESSERACT") {
        engine = engine.with_binary(binary);
    }
    match engine.warm_up() {
        Ok(()) => Ok(Arc::new(engine)),
        Err(err) => {
            warn!(error = %err, "tesseract unavailable, recognition disabled");
            build_noop_engine()
        }
    }
}

#[cfg(not(feature = "engine-tesseract"))]
fn build_ocr_engine() -> Result<Arc<dyn OcrEngine>, OcrError> {
    build_noop_engine()
}

fn map_ocr_init_error(err: OcrError) -> FrameError {
    FrameError::configuration(format!("failed to initialize the recognizer: {err}"))
}

fn map_extraction_error(err: PipelineError) -> FrameError {
    FrameError::configuration(format!("invalid extraction pipeline: {err}"))
}
