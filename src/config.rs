use crate::qa::prompt::DEFAULT_EXCERPT_CHARS;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_COHERE_BASE_URL: &str = "https://api.cohere.ai";
const DEFAULT_COHERE_MODEL: &str = "command";
const DEFAULT_MAX_TOKENS: u32 = 300;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
    /// Configuration was initialized more than once.
    #[error("Configuration already initialized")]
    AlreadyInitialized,
}

/// Runtime configuration for the PDF question-answering server.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key presented to the Cohere generation endpoint.
    pub cohere_api_key: String,
    /// Base URL of the Cohere API.
    pub cohere_base_url: String,
    /// Generation model identifier.
    pub cohere_model: String,
    /// Maximum number of tokens requested per answer.
    pub generation_max_tokens: u32,
    /// Sampling temperature requested per answer.
    pub generation_temperature: f32,
    /// Number of leading document characters placed into each prompt.
    pub context_excerpt_chars: usize,
    /// Upper bound on the multipart upload body.
    pub max_upload_bytes: usize,
    /// Directory that receives scoped temporary copies of uploads.
    pub upload_tmp_dir: Option<PathBuf>,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as absent, so `COHERE_API_KEY=""` is reported as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            cohere_api_key: get("COHERE_API_KEY")
                .ok_or_else(|| ConfigError::MissingVariable("COHERE_API_KEY".into()))?,
            cohere_base_url: get("COHERE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_COHERE_BASE_URL.to_string()),
            cohere_model: get("COHERE_MODEL").unwrap_or_else(|| DEFAULT_COHERE_MODEL.to_string()),
            generation_max_tokens: parse_optional(get("GENERATION_MAX_TOKENS"), "GENERATION_MAX_TOKENS")?
                .unwrap_or(DEFAULT_MAX_TOKENS),
            generation_temperature: parse_optional(
                get("GENERATION_TEMPERATURE"),
                "GENERATION_TEMPERATURE",
            )?
            .unwrap_or(DEFAULT_TEMPERATURE),
            context_excerpt_chars: parse_optional(get("CONTEXT_EXCERPT_CHARS"), "CONTEXT_EXCERPT_CHARS")?
                .unwrap_or(DEFAULT_EXCERPT_CHARS),
            max_upload_bytes: parse_optional(get("MAX_UPLOAD_BYTES"), "MAX_UPLOAD_BYTES")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            upload_tmp_dir: get("UPLOAD_TMP_DIR").map(PathBuf::from),
            server_port: parse_optional(get("SERVER_PORT"), "SERVER_PORT")?,
        })
    }
}

fn parse_optional<T: std::str::FromStr>(
    value: Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
///
/// Reads a `.env` file first when one is present. Fails when `COHERE_API_KEY` is absent so the
/// process refuses to start without a credential.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        cohere_base_url = %config.cohere_base_url,
        model = %config.cohere_model,
        max_tokens = config.generation_max_tokens,
        temperature = config.generation_temperature,
        excerpt_chars = config.context_excerpt_chars,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG
        .set(config)
        .map_err(|_| ConfigError::AlreadyInitialized)?;
    Ok(get_config())
}
