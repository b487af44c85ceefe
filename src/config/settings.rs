use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sendgrid: SendGridConfig,
    #[serde(default)]
    pub termii: TermiiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Store backend: "memory" (default) or "postgres"
    #[serde(default = "default_store_backend")]
    pub backend: String,
    /// PostgreSQL connection URL (required for the postgres backend)
    pub url: Option<String>,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
}

/// SendGrid email provider credentials.
///
/// Both fields are optional: a missing key degrades delivery attempts to
/// failure results instead of preventing startup.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SendGridConfig {
    pub api_key: Option<String>,
    /// Verified sender address
    pub from: Option<String>,
}

/// Termii SMS provider credentials.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TermiiConfig {
    pub api_key: Option<String>,
    pub sender_id: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_store_backend() -> String {
    "memory".to_string()
}

fn default_pool_size() -> u32 {
    5
}

fn default_connect_timeout() -> u32 {
    10
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 4000)?
            .set_default("database.backend", "memory")?
            .set_default("database.pool_size", 5)?
            .set_default("database.connect_timeout_seconds", 10)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // SERVER_HOST, SERVER_PORT, DATABASE_URL, etc.
            .add_source(
                Environment::default()
                    .separator("_")
                    .try_parsing(true),
            )
            // Provider credentials keep their conventional variable names,
            // which the separator above would otherwise split apart
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("sendgrid.api_key", env::var("SENDGRID_API_KEY").ok())?
            .set_override_option("sendgrid.from", env::var("SENDGRID_FROM").ok())?
            .set_override_option("termii.api_key", env::var("TERMII_API_KEY").ok())?
            .set_override_option("termii.sender_id", env::var("TERMII_SENDER_ID").ok())?;

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            url: None,
            pool_size: default_pool_size(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}
