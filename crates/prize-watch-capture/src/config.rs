use std::env;
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use crate::core::DynFrameProvider;
use prize_watch_types::{FrameError, FrameResult};

const DEFAULT_WIDTH: u32 = 1280;
const DEFAULT_HEIGHT: u32 = 720;
const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Mock,
    V4l,
}

impl FromStr for Backend {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mock" => Ok(Backend::Mock),
            "v4l" => Ok(Backend::V4l),
            other => Err(FrameError::configuration(format!(
                "unknown backend '{other}'"
            ))),
        }
    }
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Mock => "mock",
            Backend::V4l => "v4l",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn compiled_backends() -> Vec<Backend> {
    let mut backends = Vec::new();
    #[cfg(all(feature = "backend-v4l", target_os = "linux"))]
    {
        backends.push(Backend::V4l);
    }
    #[cfg(feature = "backend-mock")]
    {
        backends.push(Backend::Mock);
    }
    backends
}

/// Capture settings shared by every backend.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub backend: Backend,
    pub camera_index: u32,
    pub width: u32,
    pub height: u32,
    pub frame_interval: Duration,
    pub channel_capacity: Option<NonZeroUsize>,
}

impl Default for Configuration {
    fn default() -> Self {
        let backend = compiled_backends().into_iter().next().unwrap_or(Backend::Mock);
        Self {
            backend,
            camera_index: 0,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            frame_interval: DEFAULT_FRAME_INTERVAL,
            channel_capacity: None,
        }
    }
}

impl Configuration {
    pub fn from_env() -> FrameResult<Self> {
        let mut config = Configuration::default();
        if let Ok(backend) = env::var("PRIZEWATCH_BACKEND") {
            config.backend = Backend::from_str(&backend)?;
        }
        if let Ok(camera) = env::var("PRIZEWATCH_CAMERA") {
            config.camera_index = camera.parse().map_err(|_| {
                FrameError::configuration(format!(
                    "failed to parse PRIZEWATCH_CAMERA='{camera}' as a device index"
                ))
            })?;
        }
        if let Ok(capacity) = env::var("PRIZEWATCH_CHANNEL_CAPACITY") {
            let parsed: usize = capacity.parse().map_err(|_| {
                FrameError::configuration(format!(
                    "failed to parse PRIZEWATCH_CHANNEL_CAPACITY='{capacity}' as a positive integer"
                ))
            })?;
            let Some(value) = NonZeroUsize::new(parsed) else {
                return Err(FrameError::configuration(
                    "PRIZEWATCH_CHANNEL_CAPACITY must be greater than zero",
                ));
            };
            config.channel_capacity = Some(value);
        }
        Ok(config)
    }

    pub fn available_backends() -> Vec<Backend> {
        compiled_backends()
    }

    pub fn create_provider(&self) -> FrameResult<DynFrameProvider> {
        match self.backend {
            Backend::Mock => {
                #[cfg(feature = "backend-mock")]
                {
                    return crate::backends::mock::boxed_mock(self);
                }
                #[cfg(not(feature = "backend-mock"))]
                {
                    return Err(FrameError::unsupported("mock"));
                }
            }
            Backend::V4l => {
                #[cfg(all(feature = "backend-v4l", target_os = "linux"))]
                {
                    return crate::backends::v4l::boxed_v4l(self);
                }
                #[cfg(not(all(feature = "backend-v4l", target_os = "linux")))]
                {
                    return Err(FrameError::unsupported("v4l"));
                }
            }
        }
    }
}
