use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};

#[derive(Debug, Default)]
pub struct CliSources {
    pub frame_interval_from_cli: bool,
}

impl CliSources {
    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            frame_interval_from_cli: value_from_cli(matches, "frame_interval_ms"),
        }
    }
}

fn value_from_cli(matches: &ArgMatches, id: &str) -> bool {
    matches
        .value_source(id)
        .is_some_and(|source| matches!(source, ValueSource::CommandLine))
}

pub fn parse_cli() -> (CliArgs, CliSources) {
    let command = CliArgs::command();
    let matches = command.get_matches();
    let args = match CliArgs::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(err) => err.exit(),
    };
    let sources = CliSources::from_matches(&matches);
    (args, sources)
}

#[derive(Debug, Parser)]
#[command(
    name = "prize-watch",
    about = "Watch a slot machine camera and record displayed prize amounts",
    disable_help_subcommand = true
)]
pub struct CliArgs {
    /// Machine identifier used as the persistence key
    #[arg(long = "machine-id", value_name = "ID")]
    pub machine_id: Option<String>,

    /// Capture backend name (mock, v4l) or a bare camera device index
    #[arg(long = "camera", value_name = "SELECTOR")]
    pub camera: Option<String>,

    /// Disable the interactive status line
    #[arg(long = "headless")]
    pub headless: bool,

    /// Override the configuration file path
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Override the prize store JSON path
    #[arg(long = "store", value_name = "FILE")]
    pub store: Option<PathBuf>,

    /// Write the final run report to this path as JSON
    #[arg(long = "report", value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Milliseconds the capture source waits between frames
    #[arg(
        long = "frame-interval-ms",
        id = "frame_interval_ms",
        default_value_t = 100,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub frame_interval_ms: u64,

    /// Minimum recognizer confidence for accepting an amount (0-1)
    #[arg(
        long = "confidence-threshold",
        id = "confidence_threshold",
        value_parser = clap::value_parser!(f32)
    )]
    pub confidence_threshold: Option<f32>,

    /// Print the list of available capture backends
    #[arg(long = "list-backends")]
    pub list_backends: bool,
}
