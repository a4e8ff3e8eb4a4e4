// Application configuration: generation settings from config.json plus
// serving knobs from environment variables and CLI flags.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(1800);

/// Errors that prevent the process from serving requests.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found at '{0}'; create it with your settings")]
    NotFound(String),
    #[error("invalid JSON in config file: {0}")]
    Invalid(#[from] serde_json::Error),
    #[error("openai_api_key missing or empty in config file")]
    MissingApiKey,
}

/// On-disk shape of config.json. Only the API credential is required.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    openai_api_key: Option<String>,
    #[serde(default = "default_model")]
    model: String,
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,
    #[serde(default = "default_temperature")]
    temperature: f32,
    #[serde(default = "default_api_base")]
    api_base: String,
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_tokens() -> u32 {
    300
}

fn default_temperature() -> f32 {
    0.7
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API credential for the chat-completion backend.
    pub api_key: String,
    /// Model identifier sent with every generation request.
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Directory containing the pre-built game page to serve.
    /// When set, the backend serves static files from this path.
    pub static_dir: Option<PathBuf>,
    /// How long an idle session lives before the store drops it.
    pub session_ttl: Duration,
}

impl Config {
    /// Load configuration from config.json, environment variables, and CLI
    /// arguments. A missing or malformed config file, or a missing API
    /// credential, is fatal: the caller must not serve requests.
    ///
    /// Environment variables:
    /// - `CONFIG_PATH` - Path to the config file (default: `config.json`)
    /// - `PORT` - HTTP server port (default: 3000)
    /// - `STATIC_DIR` - Path to the game page directory for static serving
    /// - `SESSION_TTL_SECS` - Idle session lifetime (default: 1800)
    ///
    /// CLI flags:
    /// - `--port <PORT>` - Override the port
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.json".to_string());
        let contents =
            std::fs::read_to_string(&path).map_err(|_| ConfigError::NotFound(path.clone()))?;
        let mut config = Self::from_json(&contents)?;

        let args: Vec<String> = std::env::args().collect();

        // Port: CLI flag --port takes precedence, then env var, then default
        config.port = Self::parse_cli_value(&args, "--port")
            .and_then(|v| v.parse().ok())
            .or_else(|| std::env::var("PORT").ok().and_then(|v| v.parse().ok()))
            .unwrap_or(3000);

        config.static_dir = std::env::var("STATIC_DIR").ok().map(PathBuf::from);

        config.session_ttl = std::env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SESSION_TTL);

        Ok(config)
    }

    /// Parse the config file contents, applying generation defaults and
    /// rejecting a missing or empty credential.
    fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(contents)?;
        let api_key = file
            .openai_api_key
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(Config {
            api_key,
            model: file.model,
            max_tokens: file.max_tokens,
            temperature: file.temperature,
            api_base: file.api_base,
            port: 3000,
            static_dir: None,
            session_ttl: DEFAULT_SESSION_TTL,
        })
    }

    /// Parse a CLI flag value like `--port 8080`.
    fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }
}
