use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::{BaseDirs, ProjectDirs};
use prize_watch_extract::{
    AmountRules, DEFAULT_CURRENCY_SYMBOLS, DEFAULT_MAX_AMOUNT, DEFAULT_MIN_AMOUNT,
    ExtractionConfig,
};
use prize_watch_types::RoiRect;
use serde::Deserialize;

use crate::cli::{CliArgs, CliSources};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    extraction: Option<ExtractionFileConfig>,
    capture: Option<CaptureFileConfig>,
    store: Option<StoreFileConfig>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
struct ExtractionFileConfig {
    roi: Option<RoiRect>,
    confidence_threshold: Option<f32>,
    currency_symbols: Option<Vec<char>>,
    min_amount: Option<f64>,
    max_amount: Option<f64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
struct CaptureFileConfig {
    camera_index: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
    frame_interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
struct StoreFileConfig {
    path: Option<String>,
}

/// CLI and file settings merged into one resolved value set.
#[derive(Debug)]
pub struct EffectiveSettings {
    pub machine_id: String,
    pub backend: Option<String>,
    pub camera_index: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_interval: Duration,
    pub extraction: ExtractionConfig,
    pub store_path: PathBuf,
    pub report_path: Option<PathBuf>,
    pub headless: bool,
    pub config_dir: Option<PathBuf>,
}

const DEFAULT_STORE_PATH: &str = "prizes.json";

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidValue {
        path: Option<PathBuf>,
        field: &'static str,
        value: String,
    },
    Missing {
        path: Option<PathBuf>,
        field: &'static str,
    },
    NotFound {
        path: PathBuf,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(
                    f,
                    "failed to read config file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "failed to parse config file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::InvalidValue { path, field, value } => {
                if let Some(path) = path {
                    write!(
                        f,
                        "invalid value '{}' for '{}' in {}",
                        value,
                        field,
                        path.display()
                    )
                } else {
                    write!(f, "invalid value '{}' for '{}'", value, field)
                }
            }
            ConfigError::Missing { path, field } => {
                if let Some(path) = path {
                    write!(f, "missing required field '{}' in {}", field, path.display())
                } else {
                    write!(f, "missing required value for '{}'", field)
                }
            }
            ConfigError::NotFound { path } => {
                write!(f, "config file {} does not exist", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::InvalidValue { .. } => None,
            ConfigError::Missing { .. } => None,
            ConfigError::NotFound { .. } => None,
        }
    }
}

pub fn resolve_settings(
    cli: &CliArgs,
    sources: &CliSources,
) -> Result<EffectiveSettings, ConfigError> {
    let (file, config_path) = load_config(cli.config.as_deref())?;
    merge(cli, sources, file, config_path)
}

fn load_config(path_override: Option<&Path>) -> Result<(FileConfig, Option<PathBuf>), ConfigError> {
    if let Some(path) = path_override {
        let path = path.to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound { path });
        }
        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        return Ok((config, Some(path)));
    }

    if let Some(project_path) = project_config_path() {
        if project_path.exists() {
            let contents = fs::read_to_string(&project_path).map_err(|source| ConfigError::Io {
                path: project_path.clone(),
                source,
            })?;
            let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: project_path.clone(),
                source,
            })?;
            return Ok((config, Some(project_path)));
        }
    }

    let Some(default_path) = default_config_path() else {
        return Ok((FileConfig::default(), None));
    };
    if !default_path.exists() {
        return Ok((FileConfig::default(), None));
    }
    let contents = fs::read_to_string(&default_path).map_err(|source| ConfigError::Io {
        path: default_path.clone(),
        source,
    })?;
    let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: default_path.clone(),
        source,
    })?;
    Ok((config, Some(default_path)))
}

fn merge(
    cli: &CliArgs,
    sources: &CliSources,
    file: FileConfig,
    config_path: Option<PathBuf>,
) -> Result<EffectiveSettings, ConfigError> {
    let config_dir = config_path
        .as_ref()
        .and_then(|path| path.parent().map(|dir| dir.to_path_buf()));

    let FileConfig {
        extraction: file_extraction,
        capture: file_capture,
        store: file_store,
    } = file;

    let machine_id = match normalize_string(cli.machine_id.clone()) {
        Some(id) => id,
        None => {
            return Err(ConfigError::Missing {
                path: None,
                field: "machine-id",
            });
        }
    };

    let mut backend = None;
    let mut camera_index = None;
    if let Some(selector) = normalize_string(cli.camera.clone()) {
        match selector.parse::<u32>() {
            Ok(index) => camera_index = Some(index),
            Err(_) => backend = Some(selector),
        }
    }
    if camera_index.is_none() {
        if let Some(value) = file_capture.as_ref().and_then(|cfg| cfg.camera_index) {
            camera_index = Some(value);
        }
    }

    let width = file_capture.as_ref().and_then(|cfg| cfg.width);
    let height = file_capture.as_ref().and_then(|cfg| cfg.height);

    let mut frame_interval_ms = cli.frame_interval_ms;
    if !sources.frame_interval_from_cli {
        if let Some(value) = file_capture.as_ref().and_then(|cfg| cfg.frame_interval_ms) {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    path: config_path,
                    field: "capture.frame_interval_ms",
                    value: value.to_string(),
                });
            }
            frame_interval_ms = value;
        }
    }

    let file_extraction = file_extraction.unwrap_or_default();

    let roi = match file_extraction.roi {
        Some(roi) => roi,
        None => {
            return Err(ConfigError::Missing {
                path: config_path,
                field: "extraction.roi",
            });
        }
    };
    if roi.validate().is_err() {
        return Err(ConfigError::InvalidValue {
            path: config_path,
            field: "extraction.roi",
            value: roi.to_string(),
        });
    }

    let mut confidence_threshold = None;
    if let Some(value) = cli.confidence_threshold {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::InvalidValue {
                path: None,
                field: "confidence_threshold",
                value: value.to_string(),
            });
        }
        confidence_threshold = Some(value);
    }
    if confidence_threshold.is_none() {
        if let Some(value) = file_extraction.confidence_threshold {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    path: config_path,
                    field: "extraction.confidence_threshold",
                    value: value.to_string(),
                });
            }
            confidence_threshold = Some(value);
        }
    }
    let Some(confidence_threshold) = confidence_threshold else {
        return Err(ConfigError::Missing {
            path: config_path,
            field: "extraction.confidence_threshold",
        });
    };

    let currency_symbols = file_extraction
        .currency_symbols
        .unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOLS.to_vec());
    if currency_symbols.is_empty() {
        return Err(ConfigError::InvalidValue {
            path: config_path,
            field: "extraction.currency_symbols",
            value: "[]".to_string(),
        });
    }

    let min_amount = file_extraction.min_amount.unwrap_or(DEFAULT_MIN_AMOUNT);
    if min_amount <= 0.0 {
        return Err(ConfigError::InvalidValue {
            path: config_path,
            field: "extraction.min_amount",
            value: min_amount.to_string(),
        });
    }
    let max_amount = file_extraction.max_amount.unwrap_or(DEFAULT_MAX_AMOUNT);
    if max_amount < min_amount {
        return Err(ConfigError::InvalidValue {
            path: config_path,
            field: "extraction.max_amount",
            value: max_amount.to_string(),
        });
    }

    let extraction = ExtractionConfig {
        roi,
        confidence_threshold,
        rules: AmountRules {
            currency_symbols,
            min_amount,
            max_amount,
        },
    };

    let store_path = if let Some(path) = cli.store.clone() {
        expand_pathbuf(path)
    } else if let Some(path) = file_store
        .as_ref()
        .and_then(|cfg| normalize_string(cfg.path.clone()))
        .and_then(|value| resolve_path_from_config(value, config_dir.as_deref()))
    {
        path
    } else {
        PathBuf::from(DEFAULT_STORE_PATH)
    };

    let report_path = cli.report.clone().map(expand_pathbuf);

    Ok(EffectiveSettings {
        machine_id,
        backend,
        camera_index,
        width,
        height,
        frame_interval: Duration::from_millis(frame_interval_ms),
        extraction,
        store_path,
        report_path,
        headless: cli.headless,
        config_dir,
    })
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("rs", "prize-watch", "prize-watch")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    env::current_dir()
        .ok()
        .map(|dir| dir.join("prize-watch.toml"))
}

fn normalize_string(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn expand_pathbuf(path: PathBuf) -> PathBuf {
    match path.to_str() {
        Some(s) => expand_home_path(s),
        None => path,
    }
}

fn resolve_path_from_config(value: String, base: Option<&Path>) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let expanded = expand_home_path(trimmed);
    if expanded.is_absolute() || base.is_none() {
        Some(expanded)
    } else {
        Some(base.unwrap().join(expanded))
    }
}

fn expand_home_path(value: &str) -> PathBuf {
    if value == "~" {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().to_path_buf();
        }
    } else if let Some(stripped) = value.strip_prefix("~/") {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().join(stripped);
        }
    }
    PathBuf::from(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CliArgs {
        CliArgs {
            machine_id: Some("machine-1".to_string()),
            camera: None,
            headless: false,
            config: None,
            store: None,
            report: None,
            frame_interval_ms: 100,
            confidence_threshold: None,
            list_backends: false,
        }
    }

    fn full_file() -> &'static str {
        r#"
            [extraction]
            roi = { x1 = 100, y1 = 200, x2 = 500, y2 = 320 }
            confidence_threshold = 0.6
            currency_symbols = ["$"]
            min_amount = 1.0
            max_amount = 50000.0

            [capture]
            camera_index = 2
            width = 1920
            height = 1080
            frame_interval_ms = 250

            [store]
            path = "state/prizes.json"
        "#
    }

    fn resolve_with_file(
        mut args: CliArgs,
        sources: &CliSources,
        contents: &str,
    ) -> Result<EffectiveSettings, ConfigError> {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("prize-watch.toml");
        fs::write(&path, contents).expect("write config");
        args.config = Some(path);
        resolve_settings(&args, sources)
    }

    #[test]
    fn a_full_file_resolves_every_section() {
        let settings =
            resolve_with_file(base_args(), &CliSources::default(), full_file()).expect("resolves");

        assert_eq!(settings.machine_id, "machine-1");
        assert_eq!(settings.extraction.roi, RoiRect::new(100, 200, 500, 320));
        assert_eq!(settings.extraction.confidence_threshold, 0.6);
        assert_eq!(settings.extraction.rules.currency_symbols, vec!['$']);
        assert_eq!(settings.extraction.rules.min_amount, 1.0);
        assert_eq!(settings.extraction.rules.max_amount, 50000.0);
        assert_eq!(settings.camera_index, Some(2));
        assert_eq!(settings.width, Some(1920));
        assert_eq!(settings.height, Some(1080));
        assert_eq!(settings.frame_interval, Duration::from_millis(250));
        assert!(settings.store_path.ends_with("state/prizes.json"));
    }

    #[test]
    fn cli_values_win_over_file_values() {
        let mut args = base_args();
        args.confidence_threshold = Some(0.9);
        args.frame_interval_ms = 40;
        args.store = Some(PathBuf::from("override.json"));
        let sources = CliSources {
            frame_interval_from_cli: true,
        };

        let settings = resolve_with_file(args, &sources, full_file()).expect("resolves");

        assert_eq!(settings.extraction.confidence_threshold, 0.9);
        assert_eq!(settings.frame_interval, Duration::from_millis(40));
        assert_eq!(settings.store_path, PathBuf::from("override.json"));
    }

    #[test]
    fn defaults_fill_the_optional_extraction_fields() {
        let contents = r#"
            [extraction]
            roi = { x1 = 0, y1 = 0, x2 = 64, y2 = 32 }
            confidence_threshold = 0.5
        "#;
        let settings =
            resolve_with_file(base_args(), &CliSources::default(), contents).expect("resolves");

        assert_eq!(
            settings.extraction.rules.currency_symbols,
            DEFAULT_CURRENCY_SYMBOLS.to_vec()
        );
        assert_eq!(settings.extraction.rules.min_amount, DEFAULT_MIN_AMOUNT);
        assert_eq!(settings.extraction.rules.max_amount, DEFAULT_MAX_AMOUNT);
        assert_eq!(settings.store_path, PathBuf::from(DEFAULT_STORE_PATH));
        assert_eq!(settings.frame_interval, Duration::from_millis(100));
    }

    #[test]
    fn a_missing_roi_is_a_startup_error() {
        let contents = r#"
            [extraction]
            confidence_threshold = 0.5
        "#;
        let err = resolve_with_file(base_args(), &CliSources::default(), contents).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing {
                field: "extraction.roi",
                ..
            }
        ));
    }

    #[test]
    fn an_empty_roi_is_rejected() {
        let contents = r#"
            [extraction]
            roi = { x1 = 64, y1 = 0, x2 = 64, y2 = 32 }
            confidence_threshold = 0.5
        "#;
        let err = resolve_with_file(base_args(), &CliSources::default(), contents).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "extraction.roi",
                ..
            }
        ));
    }

    #[test]
    fn an_out_of_range_threshold_is_rejected() {
        let contents = r#"
            [extraction]
            roi = { x1 = 0, y1 = 0, x2 = 64, y2 = 32 }
            confidence_threshold = 1.5
        "#;
        let err = resolve_with_file(base_args(), &CliSources::default(), contents).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "extraction.confidence_threshold",
                ..
            }
        ));
    }

    #[test]
    fn the_camera_selector_splits_names_and_indices() {
        let mut args = base_args();
        args.camera = Some("v4l".to_string());
        let settings =
            resolve_with_file(args, &CliSources::default(), full_file()).expect("resolves");
        assert_eq!(settings.backend.as_deref(), Some("v4l"));
        assert_eq!(settings.camera_index, Some(2));

        let mut args = base_args();
        args.camera = Some("3".to_string());
        let settings =
            resolve_with_file(args, &CliSources::default(), full_file()).expect("resolves");
        assert_eq!(settings.backend, None);
        assert_eq!(settings.camera_index, Some(3));
    }

    #[test]
    fn a_config_override_that_does_not_exist_is_fatal() {
        let mut args = base_args();
        args.config = Some(PathBuf::from("/definitely/not/here/prize-watch.toml"));
        let err = resolve_settings(&args, &CliSources::default()).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn a_blank_machine_id_is_rejected() {
        let mut args = base_args();
        args.machine_id = Some("   ".to_string());
        let err = resolve_with_file(args, &CliSources::default(), full_file()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing {
                field: "machine-id",
                ..
            }
        ));
    }
}
