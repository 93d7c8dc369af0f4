use clap::CommandFactory;
use prize_watch::backend::{self, ExecutionPlan};
use prize_watch::cli::{self, CliArgs};
use prize_watch::settings::{self, ConfigError};
use prize_watch_types::FrameError;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), FrameError> {
    init_tracing();

    let (args, sources) = cli::parse_cli();

    if args.list_backends {
        backend::display_available_backends();
        return Ok(());
    }

    if args.machine_id.is_none() {
        let mut command = CliArgs::command();
        let _ = command.print_help();
        std::process::exit(2);
    }

    let settings = settings::resolve_settings(&args, &sources).map_err(map_config_error)?;
    let plan = ExecutionPlan::from_settings(&settings)?;
    backend::run(plan).await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn map_config_error(err: ConfigError) -> FrameError {
    FrameError::configuration(err.to_string())
}
