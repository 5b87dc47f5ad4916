use clap::Parser;
use portal_dash::args::{Args, Command};
use portal_dash::model::Action;
use portal_dash::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().home().path();

    // This allows for running the program without a portal. When PORTAL_DASH_IN_TEST_MODE is set
    // and non-zero in length, then the mode will be Mode::Test, otherwise it will be Mode::Portal.
    let mode = Mode::from_env();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.base_url()).await?.print(),

        Command::Show(show_args) => {
            let config = Config::load(home).await?;
            commands::show(config, mode, show_args).await?.print()
        }

        Command::Watch(watch_args) => {
            let config = Config::load(home).await?;
            commands::watch(config, mode, watch_args).await?.print()
        }

        Command::Overview(overview_args) => {
            let config = Config::load(home).await?;
            commands::overview(config, mode, overview_args)
                .await?
                .print()
        }

        Command::Approve(decision_args) => {
            let config = Config::load(home).await?;
            commands::decide(config, mode, Action::Approve, decision_args)
                .await?
                .print()
        }

        Command::Reject(decision_args) => {
            let config = Config::load(home).await?;
            commands::decide(config, mode, Action::Reject, decision_args)
                .await?
                .print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
