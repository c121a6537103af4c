//! NeerOrbit CLI - flood reporting and alerts

mod commands;
mod config;
mod logging;
mod state_dir;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::{Commands, Context};
use config::CliConfig;
use state_dir::StateDir;
use std::path::PathBuf;
use tracing::{Level, debug, error};

#[derive(Parser, Debug)]
#[command(name = "neerorbit")]
#[command(about = "Flood reporting, crowdsourcing and alerts")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Directory for configuration, session tokens and logs
    #[arg(short = 'd', long, global = true, env = "NEERORBIT_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Configuration file (defaults to config.toml in the config directory)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds, overriding the configuration (0 = no timeout)
    #[arg(short = 't', long, global = true)]
    timeout: Option<u64>,

    /// Also write logs to cli.log in the data directory
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let state_dir = StateDir::resolve(cli.state_dir.as_deref());

    let log_path = cli.log_file.then(|| state_dir.log_path());
    logging::init_logging(cli.log_level.into(), log_path.as_deref())?;

    let mut config = CliConfig::load(cli.config.as_deref(), &state_dir.config_path())?;
    if let Some(timeout) = cli.timeout {
        config.api.timeout_secs = timeout;
    }

    let ctx = Context { config, state_dir };
    match cli.command.execute(&ctx).await {
        Ok(()) => {
            debug!("Command completed successfully");
        }
        Err(e) => {
            error!("Command failed: {e:#}");
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }

    Ok(())
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}
