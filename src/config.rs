//! Layered application configuration.
//!
//! Priority (lowest to highest): built-in defaults, YAML config file,
//! `RELMEM__SECTION__KEY` environment variables, explicit CLI flags.

use std::path::Path;

use clap::{Args, Parser, Subcommand};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

/// Default location of the relationship-memory `/ask` endpoint.
pub const DEFAULT_ASK_ENDPOINT: &str = "http://localhost:8000/ask";

/// Company identifier used when neither an explicit id nor the URL names one.
pub const DEFAULT_COMPANY_ID: &str = "techparts";

/// Room joined when a token request does not name one.
pub const DEFAULT_ROOM: &str = "galactactocus-room";

#[derive(Parser, Debug)]
#[command(name = "relmem", author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Flags shared by every subcommand.
#[derive(Args, Debug, Default, Clone)]
pub struct GlobalArgs {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE", global = true)]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT", global = true)]
    pub port: Option<u16>,

    /// Interface to bind
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Override the `/ask` endpoint URL
    #[arg(long, env = "ASK_ENDPOINT", global = true)]
    pub ask_endpoint: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the web client (default).
    Serve,
    /// Ask a single question and print the answer.
    Ask {
        /// Question text.
        question: String,
        /// Company identifier (falls back to the configured default).
        #[arg(long)]
        company: Option<String>,
    },
    /// Join the configured room until Ctrl-C.
    Room {
        /// Participant identity.
        #[arg(long)]
        identity: Option<String>,
        /// Room name.
        #[arg(long)]
        room: Option<String>,
    },
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ask: AskConfig,
    pub chat: ChatConfig,
    pub room: RoomConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub static_dir: String,
    /// Conversations idle longer than this are swept.
    pub conversation_idle_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AskConfig {
    pub endpoint: String,
    /// No timeout when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    pub default_company_id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoomConfig {
    #[serde(default)]
    pub server_url: Option<String>,
    /// Pre-issued access token. Takes precedence over minting.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_secret: Option<String>,
    pub default_room: String,
    pub token_ttl_secs: u64,
    pub adaptive_stream: bool,
    pub dynacast: bool,
}

impl RoomConfig {
    /// Key and secret, if both are configured and non-blank.
    #[must_use]
    pub fn signing_credentials(&self) -> Option<(&str, &str)> {
        let key = self.api_key.as_deref().filter(|s| !s.trim().is_empty())?;
        let secret = self.api_secret.as_deref().filter(|s| !s.trim().is_empty())?;
        Some((key, secret))
    }
}

impl AppConfig {
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::load_with(&cli.global)
    }

    /// Build the configuration from already-parsed global flags.
    pub fn load_with(args: &GlobalArgs) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.static_dir", "static")?
            .set_default("server.conversation_idle_secs", 30 * 60)?
            .set_default("ask.endpoint", DEFAULT_ASK_ENDPOINT)?
            .set_default("chat.default_company_id", DEFAULT_COMPANY_ID)?
            .set_default("room.default_room", DEFAULT_ROOM)?
            .set_default("room.token_ttl_secs", 6 * 60 * 60)?
            .set_default("room.adaptive_stream", true)?
            .set_default("room.dynacast", true)?;

        match &args.config {
            Some(path) => {
                builder = builder.add_source(File::new(path, FileFormat::Yaml).required(true));
            }
            None if Path::new("config.yaml").exists() => {
                builder = builder.add_source(File::new("config.yaml", FileFormat::Yaml));
            }
            None => {}
        }

        // E.g. RELMEM__SERVER__PORT=8080, RELMEM__ROOM__API_SECRET=...
        builder = builder.add_source(
            Environment::with_prefix("RELMEM")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(port) = args.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(host) = &args.host {
            builder = builder.set_override("server.host", host.as_str())?;
        }
        if let Some(endpoint) = &args.ask_endpoint {
            builder = builder.set_override("ask.endpoint", endpoint.as_str())?;
        }

        builder.build()?.try_deserialize()
    }
}
