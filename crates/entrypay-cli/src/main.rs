//! Entrypay CLI
//!
//! Plays the role of the registration screen: collects the team form, hands
//! the payer off to the gateway and resolves the redirect afterwards.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use entrypay::{CheckoutBuilder, HttpClient};
use entrypay_redb::IntentRedbStore;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use url::Url;

mod config;
mod sub_commands;

use crate::config::Settings;

const DEFAULT_WORK_DIR: &str = ".entrypay";
const CONFIG_FILE: &str = "config.toml";
const DB_FILE: &str = "entrypay.redb";

/// Exit status for a failed payment
pub const EXIT_FAILED: u8 = 1;
/// Exit status for an outcome that needs support attention
pub const EXIT_AMBIGUOUS: u8 = 2;
/// Exit status for any other error
pub const EXIT_ERROR: u8 = 3;

/// Simple CLI application to pay tournament entry fees and register teams
#[derive(Parser)]
#[command(name = "entrypay-cli", author = "Entrypay Developers", version, about, long_about = None)]
struct Cli {
    /// Work directory holding the database and config.toml [default: ~/.entrypay]
    #[arg(short, long)]
    work_dir: Option<PathBuf>,
    /// Backend API url
    #[arg(short, long, env = "ENTRYPAY_API_URL")]
    api_url: Option<String>,
    /// Session the pending registration belongs to
    #[arg(short, long)]
    session: Option<String>,
    /// Logging level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start paying the entry fee for a team
    Initiate(sub_commands::initiate::InitiateSubCommand),
    /// Resolve the redirect the gateway sent the payer back with
    Resolve(sub_commands::resolve::ResolveSubCommand),
    /// Retry a pending registration against the payment status
    Recover,
    /// Show the pending registration
    Pending,
    /// Drop the pending registration
    Discard,
}

fn init_logging(level: Level) {
    let level = level.as_str().to_lowercase();
    let default_filter = format!("entrypay={level},entrypay_redb={level},entrypay_cli={level}");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    init_logging(args.log_level);

    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn run(args: Cli) -> Result<ExitCode> {
    let work_dir = match args.work_dir {
        Some(dir) => dir,
        None => home::home_dir()
            .map(|home| home.join(DEFAULT_WORK_DIR))
            .context("Could not find home directory, pass --work-dir")?,
    };
    fs::create_dir_all(&work_dir)?;

    let mut settings = Settings::new(Some(&work_dir.join(CONFIG_FILE)))?;
    if let Some(api_url) = args.api_url {
        settings.api_url = api_url;
    }
    if let Some(session) = args.session {
        settings.session = session;
    }

    tracing::debug!("Using work dir {} and session {}", work_dir.display(), settings.session);

    let localstore = IntentRedbStore::new(work_dir.join(DB_FILE), &settings.session)
        .context("Could not open intent database")?;

    let base_url = Url::parse(&settings.api_url)
        .with_context(|| format!("Invalid api url {}", settings.api_url))?;
    let mut client = HttpClient::with_timeout(base_url, Duration::from_secs(settings.timeout_secs))?
        .provider(settings.provider.clone());
    if let Some(token) = &settings.auth_token {
        client = client.auth_token(token.clone());
    }

    let checkout = CheckoutBuilder::new()
        .localstore(Arc::new(localstore))
        .client(Arc::new(client))
        .navigator(Arc::new(sub_commands::PrintNavigator))
        .options(settings.resolver_options())
        .build()?;

    match args.command {
        Commands::Initiate(sub_command_args) => {
            sub_commands::initiate::initiate(&checkout, &sub_command_args).await
        }
        Commands::Resolve(sub_command_args) => {
            sub_commands::resolve::resolve(&checkout, &sub_command_args).await
        }
        Commands::Recover => sub_commands::recover::recover(&checkout).await,
        Commands::Pending => sub_commands::pending::pending(&checkout).await,
        Commands::Discard => sub_commands::pending::discard(&checkout).await,
    }
}
