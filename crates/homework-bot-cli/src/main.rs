//! Homework Bot CLI
//!
//! Main entry point: loads configuration, wires the status API client and
//! the Telegram bot into the poll loop, and runs it until Ctrl+C.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use homework_bot_orchestrator::{
    BotError, Config, Notifier, PracticumClient, Poller, TelegramBot,
};
use tracing_subscriber::EnvFilter;

/// Homework Bot - review status notifier
///
/// Polls the homework review API and sends a Telegram message whenever the
/// review status of the newest submission changes.
#[derive(Parser, Debug)]
#[command(name = "homework-bot")]
#[command(version, about, long_about = None)]
struct Args {
    /// Load environment variables from this file instead of ./.env
    #[arg(long, value_name = "FILE")]
    env_file: Option<PathBuf>,

    /// Seconds to wait between polls (overrides RETRY_PERIOD_SECS)
    #[arg(long, value_name = "SECS")]
    retry_period: Option<u64>,

    /// Run a single poll cycle and exit
    #[arg(long)]
    once: bool,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Environment first so RUST_LOG from the .env file takes effect.
    let env_file_result = load_env_file(args.env_file.as_ref());

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = env_file_result {
        tracing::error!(error = %e, "Cannot load environment file");
        eprintln!("Error: {e}");
        return ExitCode::from(1);
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Critical: bot cannot start");
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };

    match run_bot(config, args.once).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Loads `--env-file`, or `./.env` when present.
fn load_env_file(path: Option<&PathBuf>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(|e| {
                anyhow::anyhow!(
                    "Failed to load environment file '{}': {e}\n\nSuggestion: Check the path or remove --env-file",
                    path.display()
                )
            })?;
        }
        None => {
            // A missing .env is normal: variables may come from the real environment.
            let _ = dotenvy::dotenv();
        }
    }
    Ok(())
}

/// Reads the environment and applies CLI overrides.
fn load_config(args: &Args) -> Result<Config, BotError> {
    let mut config = Config::from_env()?;

    if let Some(retry_period) = args.retry_period {
        config.retry_period_secs = retry_period;
    }

    // Re-validate after overrides
    config.validate()?;
    Ok(config)
}

/// Builds the clients and runs the poll loop.
async fn run_bot(config: Config, once: bool) -> anyhow::Result<()> {
    tracing::info!(
        endpoint = %config.endpoint,
        chat_id = %config.telegram_chat_id,
        retry_period_secs = config.retry_period_secs,
        "Homework bot starting"
    );
    tracing::debug!(?config, "Configuration");

    let api = PracticumClient::new(
        &config.endpoint,
        &config.practicum_token,
        config.request_timeout(),
    )?;
    let bot = TelegramBot::new(&config.telegram_api_url, &config.telegram_token)?;
    let notifier = Notifier::new(bot, &config.telegram_chat_id);
    let mut poller = Poller::new(api, notifier, config.retry_period());

    if once {
        let outcome = poller.run_cycle().await;
        tracing::info!(?outcome, "Single cycle finished");
        return Ok(());
    }

    poller
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Cannot listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received Ctrl+C, shutting down");
        })
        .await;

    Ok(())
}
