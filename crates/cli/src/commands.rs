//! CLI commands

use anyhow::{Result, bail, ensure};
use clap::Subcommand;
use neerorbit_client::{
    ApiClient, ClientError, CrowdsourceReport, FileTokenStore, HelpRequest, LoginTokens, Urgency,
};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::CliConfig;
use crate::state_dir::StateDir;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new account
    Register {
        #[arg(long)]
        email: String,

        #[arg(long, env = "NEERORBIT_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        name: String,
    },

    /// Sign in and store the session tokens
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "NEERORBIT_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show whether a session is stored
    Status,

    /// Show the signed-in user's profile
    Profile,

    /// Email a password reset link
    ResetPassword {
        #[arg(long)]
        email: String,
    },

    /// Show the flood forecast
    Forecast {
        /// Fetch map data instead of the summary
        #[arg(long)]
        map: bool,
    },

    /// Show flood safety tips
    Tips,

    /// Run the safety check for the current account
    SafetyCheck,

    /// Show inundation data
    Inundation,

    /// Community flood reports
    Crowdsource {
        #[command(subcommand)]
        command: CrowdsourceCommands,
    },

    /// Rescue and assistance requests
    HelpRequest {
        #[command(subcommand)]
        command: HelpCommands,
    },

    /// Broadcast an alert to an area
    Broadcast {
        #[arg(long)]
        message: String,

        #[arg(long)]
        area: String,
    },

    /// Configuration file management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum CrowdsourceCommands {
    /// Report flooding at a location
    Submit {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        #[arg(long)]
        description: String,

        #[arg(long)]
        image_url: Option<String>,
    },

    /// List community reports
    List,

    /// Show one report
    Show { id: u64 },
}

#[derive(Subcommand, Debug)]
pub enum HelpCommands {
    /// Ask for help at a location
    Submit {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        #[arg(long)]
        description: String,

        /// low, medium or high
        #[arg(long, default_value = "medium")]
        urgency: Urgency,
    },

    /// List help requests
    List,

    /// Show one help request
    Show { id: u64 },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write the default configuration file
    Init {
        /// Output file path (defaults to the platform config directory)
        output: Option<PathBuf>,
    },
}

/// Everything a command needs: resolved configuration and directories
pub struct Context {
    pub config: CliConfig,
    pub state_dir: StateDir,
}

impl Context {
    pub fn token_path(&self) -> PathBuf {
        self.config
            .storage
            .token_file
            .clone()
            .unwrap_or_else(|| self.state_dir.token_path())
    }

    fn client(&self) -> Result<ApiClient> {
        let api = &self.config.api;
        let mut builder = ApiClient::builder()
            .base_url(&api.base_url)
            .token_store(Arc::new(FileTokenStore::new(self.token_path())));
        if let Some(timeout) = api.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = &api.user_agent {
            builder = builder.user_agent(user_agent);
        }
        debug!(base_url = %api.base_url, "Using API");
        Ok(builder.build()?)
    }
}

impl Commands {
    pub async fn execute(self, ctx: &Context) -> Result<()> {
        if let Commands::Config { command } = self {
            return command.execute(ctx);
        }

        let client = ctx.client()?;
        let output = match self {
            Commands::Register {
                email,
                password,
                name,
            } => client.register(&email, &password, &name).await,
            Commands::Login { email, password } => {
                let body = client.login(&email, &password).await.map_err(describe)?;
                ensure!(
                    LoginTokens::from_response(&body).is_some(),
                    "Login succeeded but the server issued no session tokens"
                );
                Ok(body)
            }
            Commands::Logout => {
                client.logout().map_err(describe)?;
                info!("Session cleared");
                Ok(json!({"authenticated": false}))
            }
            Commands::Status => Ok(json!({
                "authenticated": client.is_authenticated(),
                "base_url": client.base_url(),
                "token_file": ctx.token_path().display().to_string(),
            })),
            Commands::Profile => client.profile().await,
            Commands::ResetPassword { email } => client.send_reset_password_email(&email).await,
            Commands::Forecast { map: false } => client.forecast().await,
            Commands::Forecast { map: true } => client.forecast_map().await,
            Commands::Tips => client.tips().await,
            Commands::SafetyCheck => client.safety_check().await,
            Commands::Inundation => client.inundation().await,
            Commands::Crowdsource { command } => command.execute(&client).await?,
            Commands::HelpRequest { command } => command.execute(&client).await?,
            Commands::Broadcast { message, area } => client.broadcast_alert(&message, &area).await,
            Commands::Config { .. } => bail!("configuration commands do not call the API"),
        };

        print_json(&output.map_err(describe)?)
    }
}

impl CrowdsourceCommands {
    async fn execute(self, client: &ApiClient) -> Result<Result<Value, ClientError>> {
        Ok(match self {
            CrowdsourceCommands::Submit {
                lat,
                lon,
                description,
                image_url,
            } => {
                check_coordinates(lat, lon)?;
                let report = CrowdsourceReport {
                    latitude: lat,
                    longitude: lon,
                    description,
                    image_url,
                };
                client.submit_crowdsource(&report).await
            }
            CrowdsourceCommands::List => client.crowdsource_list().await,
            CrowdsourceCommands::Show { id } => client.crowdsource_details(id).await,
        })
    }
}

impl HelpCommands {
    async fn execute(self, client: &ApiClient) -> Result<Result<Value, ClientError>> {
        Ok(match self {
            HelpCommands::Submit {
                lat,
                lon,
                description,
                urgency,
            } => {
                check_coordinates(lat, lon)?;
                let request = HelpRequest {
                    latitude: lat,
                    longitude: lon,
                    description,
                    urgency,
                };
                client.submit_help_request(&request).await
            }
            HelpCommands::List => client.help_list().await,
            HelpCommands::Show { id } => client.help_details(id).await,
        })
    }
}

impl ConfigCommands {
    pub fn execute(self, ctx: &Context) -> Result<()> {
        match self {
            ConfigCommands::Init { output } => {
                let config_path = output.unwrap_or_else(|| ctx.state_dir.config_path());
                ensure!(
                    !config_path.exists(),
                    "Refusing to overwrite existing configuration at {}",
                    config_path.display()
                );

                CliConfig::default().save(&config_path)?;
                println!("Generated configuration at: {}", config_path.display());
                Ok(())
            }
        }
    }
}

fn check_coordinates(lat: f64, lon: f64) -> Result<()> {
    ensure!((-90.0..=90.0).contains(&lat), "Latitude {lat} is out of range");
    ensure!((-180.0..=180.0).contains(&lon), "Longitude {lon} is out of range");
    Ok(())
}

fn describe(err: ClientError) -> anyhow::Error {
    if err.is_session_expired() {
        anyhow::anyhow!("{err} Run `neerorbit login` to start a new session.")
    } else {
        err.into()
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_are_range_checked() {
        assert!(check_coordinates(23.8, 90.4).is_ok());
        assert!(check_coordinates(-90.0, -180.0).is_ok());
        assert!(check_coordinates(91.0, 0.0).is_err());
        assert!(check_coordinates(0.0, 180.5).is_err());
    }

    #[test]
    fn session_expiry_suggests_login() {
        let err = describe(ClientError::SessionExpired);
        assert!(err.to_string().contains("neerorbit login"));
    }

    #[test]
    fn token_path_prefers_config() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut ctx = Context {
            config: CliConfig::default(),
            state_dir: StateDir::with_override(temp_dir.path()),
        };
        assert_eq!(ctx.token_path(), temp_dir.path().join("data").join("tokens.json"));

        ctx.config.storage.token_file = Some(PathBuf::from("/tmp/custom.json"));
        assert_eq!(ctx.token_path(), PathBuf::from("/tmp/custom.json"));
    }

    #[test]
    fn config_init_writes_defaults_once() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let ctx = Context {
            config: CliConfig::default(),
            state_dir: StateDir::with_override(temp_dir.path()),
        };

        ConfigCommands::Init { output: None }.execute(&ctx).unwrap();
        let written = ctx.state_dir.config_path();
        assert!(written.exists());

        let loaded = CliConfig::load(Some(&written), &written).unwrap();
        assert_eq!(loaded, CliConfig::default());

        assert!(ConfigCommands::Init { output: None }.execute(&ctx).is_err());
    }
}
