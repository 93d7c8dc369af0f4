use std::time::Instant;

use prize_watch_capture::{Backend, Configuration};
use prize_watch_types::FrameError;
use tracing::{info, warn};

use crate::pipeline::{self, PipelineConfig};
use crate::settings::EffectiveSettings;

#[derive(Clone)]
pub struct ExecutionPlan {
    pub config: Configuration,
    pub backend_locked: bool,
    pub pipeline: PipelineConfig,
}

impl ExecutionPlan {
    pub fn from_settings(settings: &EffectiveSettings) -> Result<Self, FrameError> {
        let env_backend_present = std::env::var("PRIZEWATCH_BACKEND").is_ok();
        let mut config = Configuration::from_env().unwrap_or_default();

        let selected_backend = match settings.backend.as_deref() {
            Some(name) => Some(parse_backend(name)?),
            None => None,
        };
        if let Some(backend) = selected_backend {
            config.backend = backend;
        }
        if let Some(index) = settings.camera_index {
            config.camera_index = index;
        }
        if let Some(width) = settings.width {
            config.width = width;
        }
        if let Some(height) = settings.height {
            config.height = height;
        }
        config.frame_interval = settings.frame_interval;

        let backend_locked = selected_backend.is_some() || env_backend_present;

        Ok(Self {
            config,
            backend_locked,
            pipeline: PipelineConfig::from_settings(settings),
        })
    }
}

/// Runs the watch with the planned backend, falling back through the
/// remaining compiled camera backends while the selection is not locked
/// and no frames have been produced yet. The synthetic mock source is
/// never a fallback target; it runs only when selected outright.
pub async fn run(plan: ExecutionPlan) -> Result<(), FrameError> {
    let ExecutionPlan {
        config,
        backend_locked,
        pipeline,
    } = plan;

    let available = Configuration::available_backends();
    if available.is_empty() {
        return Err(FrameError::configuration(
            "no capture backend available; rebuild with a backend feature such as \"backend-v4l\"",
        ));
    }
    if !available.contains(&config.backend) {
        return Err(FrameError::unsupported(config.backend.as_str()));
    }

    let mut attempt_config = config.clone();
    let mut tried = Vec::new();

    loop {
        if !tried.contains(&attempt_config.backend) {
            tried.push(attempt_config.backend);
        }

        let provider_started = Instant::now();
        let provider_result = attempt_config.create_provider();
        let provider_elapsed = provider_started.elapsed();
        let provider = match provider_result {
            Ok(provider) => {
                info!(
                    backend = attempt_config.backend.as_str(),
                    elapsed = ?provider_elapsed,
                    "capture backend initialized"
                );
                provider
            }
            Err(err) => {
                warn!(
                    backend = attempt_config.backend.as_str(),
                    error = %err,
                    "capture backend failed to initialize"
                );
                if !backend_locked {
                    if let Some(next_backend) = select_next_backend(&available, &tried) {
                        info!(next = next_backend.as_str(), "trying next capture backend");
                        attempt_config.backend = next_backend;
                        continue;
                    }
                }
                return Err(err);
            }
        };

        match pipeline::run_watch(provider, &pipeline).await {
            Ok(()) => return Ok(()),
            Err((err, processed)) => {
                if processed == 0 && !backend_locked {
                    if let Some(next_backend) = select_next_backend(&available, &tried) {
                        warn!(
                            backend = attempt_config.backend.as_str(),
                            error = %err,
                            next = next_backend.as_str(),
                            "capture backend produced no frames, trying next"
                        );
                        attempt_config.backend = next_backend;
                        continue;
                    }
                }
                return Err(err);
            }
        }
    }
}

pub fn display_available_backends() {
    let names: Vec<&'static str> = Configuration::available_backends()
        .iter()
        .map(Backend::as_str)
        .collect();
    if names.is_empty() {
        println!("available backends: (none compiled)");
    } else {
        println!("available backends: {}", names.join(", "));
    }
}

pub fn parse_backend(value: &str) -> Result<Backend, FrameError> {
    use std::str::FromStr;
    Backend::from_str(value)
}

fn select_next_backend(available: &[Backend], tried: &[Backend]) -> Option<Backend> {
    available
        .iter()
        .copied()
        .filter(|backend| *backend != Backend::Mock)
        .find(|backend| !tried.contains(backend))
}
