mod commands;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use sessionline_auth::SessionManager;
use sessionline_config::{
    CONFIG_FILE_NAME, SessionlineConfig, default_config_dir, load_config_from_dir,
    write_default_config,
};
use tracing_subscriber::EnvFilter;

use crate::commands::sessions::{self, SessionsCommands};
use crate::commands::token::{self, TokenCommands};

#[derive(Debug, Parser)]
#[command(name = "sessionline", about = "Inspect and manage sessions held by a session core")]
struct Cli {
    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write a default sessionline.toml if none exists
    Init,
    /// Show the core's handshake: signing key expiry and feature flags
    Handshake {
        /// Fetch again even if a handshake is cached
        #[arg(long)]
        refresh: bool,
    },
    /// List and revoke sessions
    Sessions {
        #[command(subcommand)]
        command: SessionsCommands,
    },
    /// Session data stored at the core
    Data {
        #[command(subcommand)]
        command: DataCommands,
    },
    /// JWT payload of a session
    Payload {
        #[command(subcommand)]
        command: PayloadCommands,
    },
    /// Access token tools
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DataCommands {
    Get { session_handle: String },
}

#[derive(Debug, Subcommand)]
enum PayloadCommands {
    Get { session_handle: String },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg_dir = cli.config_dir.clone().unwrap_or_else(default_config_dir);

    match cli.command {
        Commands::Init => {
            let path = write_default_config(&cfg_dir)?;
            pout(
                cli.json,
                serde_json::json!({"message":"init complete","config_file":path}),
                &format!("Config written to {}", path.display()),
            )
        }
        Commands::Handshake { refresh } => {
            let manager = connect(&cfg_dir)?;
            let info = if refresh {
                manager.refresh_handshake().await?
            } else {
                manager.handshake().await?
            };
            let text = format!(
                "Signing key valid until {} ms\nanti-csrf: {}\nblacklisting: {}\nsession expired status: {}",
                info.signing_public_key_expiry,
                info.anti_csrf_enabled,
                info.access_token_blacklisting_enabled,
                info.session_expired_status_code,
            );
            pout(cli.json, serde_json::to_value(&*info)?, &text)
        }
        Commands::Sessions { command } => {
            let manager = connect(&cfg_dir)?;
            sessions::cmd_sessions(&manager, command, cli.json).await
        }
        Commands::Data {
            command: DataCommands::Get { session_handle },
        } => {
            let manager = connect(&cfg_dir)?;
            let data = manager.get_session_data(&session_handle).await?;
            print_map(cli.json, data)
        }
        Commands::Payload {
            command: PayloadCommands::Get { session_handle },
        } => {
            let manager = connect(&cfg_dir)?;
            let payload = manager.get_jwt_payload(&session_handle).await?;
            print_map(cli.json, payload)
        }
        Commands::Token { command } => {
            let manager = connect(&cfg_dir)?;
            token::cmd_token(&manager, command, cli.json).await
        }
    }
}

fn connect(cfg_dir: &Path) -> anyhow::Result<SessionManager> {
    let config = load_config(cfg_dir)?;
    Ok(SessionManager::from_config(&config)?)
}

fn print_map(json: bool, map: serde_json::Map<String, serde_json::Value>) -> anyhow::Result<()> {
    let value = serde_json::Value::Object(map);
    let text = serde_json::to_string_pretty(&value)?;
    pout(json, value, &text)
}

/// Load `sessionline.toml`, or defaults when the file does not exist yet.
fn load_config(dir: &Path) -> anyhow::Result<SessionlineConfig> {
    if dir.join(CONFIG_FILE_NAME).exists() {
        Ok(load_config_from_dir(dir)?)
    } else {
        tracing::debug!(dir = %dir.display(), "no config file, using defaults");
        Ok(SessionlineConfig::default())
    }
}

pub fn pout(json_mode: bool, value: serde_json::Value, text: &str) -> anyhow::Result<()> {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{text}");
    }
    Ok(())
}
