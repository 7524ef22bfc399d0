mod boot;
mod cli;
mod console;

use std::path::Path;
use std::process::ExitCode;

use roulette_common::RouletteError;
use roulette_config::RouletteConfig;
use roulette_session::Orchestrator;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

/// `--log-level` wins over `RUST_LOG`, which wins over the config file.
fn init_logging(override_directive: Option<&str>, config_directive: &str) {
    let filter = match override_directive {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config_directive)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read the user's name from stdin when it was not given on the command line.
async fn prompt_name() -> Result<String, RouletteError> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"Your name: ").await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(line.trim().to_string())
}

async fn run(args: cli::Args, config: RouletteConfig) -> Result<(), RouletteError> {
    let session_config = boot::session_config(&config);
    let deps = boot::session_deps(&session_config)?;

    let name = match args.name {
        Some(name) => name,
        None => prompt_name().await?,
    };

    let (handle, events) = Orchestrator::spawn(session_config, deps);
    handle.register(name.as_str()).await?;
    tracing::info!(user = %name, "Registered, waiting for a match");

    console::Console::new(handle, events).run().await?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = cli::parse();

    // An explicit config path must load; the default one falls back.
    let (mut config, load_error) = match &args.config {
        Some(path) => match roulette_config::load_config_from(Path::new(path)) {
            Ok(config) => (config, None),
            Err(e) => {
                eprintln!("roulette: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => match roulette_config::load_config() {
            Ok(config) => (config, None),
            Err(e) => (RouletteConfig::default(), Some(e)),
        },
    };

    init_logging(
        args.log_level.as_deref(),
        &config.logging.level.directive(),
    );

    tracing::info!("Roulette v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(e) = load_error {
        tracing::warn!("Config load failed, using defaults: {e}");
    }

    args.apply_overrides(&mut config);
    if let Err(e) = roulette_config::validation::validate(&config) {
        eprintln!("roulette: {e}");
        return ExitCode::FAILURE;
    }

    match run(args, config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("roulette: {e}");
            ExitCode::FAILURE
        }
    }
}
