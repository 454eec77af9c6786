use std::env;
use std::fmt;
use std::path::PathBuf;
use anyhow::{Result, Context};
use tracing::{info, warn};

pub const DEFAULT_COMPLETIONS_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "openchat/openchat-3.5-1210";

/// Bearer token for the completion service. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub max_file_size_mb: usize,
    pub max_concurrent_analyses: usize,
    pub request_timeout_seconds: u64,
    pub export_dir: PathBuf,
    pub openai_api_key: ApiKey,
    pub completions_url: String,
    pub model: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key = lookup("OPENAI_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .map(ApiKey::new)
            .context("OPENAI_API_KEY must be set to reach the completion service")?;

        // PORT takes precedence for hosting platforms that inject it
        let server_port = match lookup("PORT") {
            Some(_) => Self::parse_var(&lookup, "PORT", 8080)
                .context("Failed to parse PORT")?,
            None => Self::parse_var(&lookup, "SERVER_PORT", 8080)
                .context("Failed to parse SERVER_PORT")?,
        };

        let config = Config {
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| {
                info!("SERVER_HOST not set, using default: 0.0.0.0");
                "0.0.0.0".to_string()
            }),
            server_port,
            max_file_size_mb: Self::parse_var(&lookup, "MAX_FILE_SIZE_MB", 10)
                .context("Failed to parse MAX_FILE_SIZE_MB")?,
            max_concurrent_analyses: Self::parse_var(&lookup, "MAX_CONCURRENT_ANALYSES", 1)
                .context("Failed to parse MAX_CONCURRENT_ANALYSES")?,
            request_timeout_seconds: Self::parse_var(&lookup, "REQUEST_TIMEOUT_SECONDS", 120)
                .context("Failed to parse REQUEST_TIMEOUT_SECONDS")?,
            export_dir: lookup("EXPORT_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            openai_api_key,
            completions_url: lookup("OPENROUTER_API_URL")
                .unwrap_or_else(|| DEFAULT_COMPLETIONS_URL.to_string()),
            model: lookup("OPENROUTER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        };

        config.validate()?;

        info!("Configuration loaded successfully: {:?}", config);
        Ok(config)
    }

    fn parse_var<F, T>(lookup: &F, var_name: &str, default: T) -> Result<T>
    where
        F: Fn(&str) -> Option<String>,
        T: std::str::FromStr + Copy + std::fmt::Debug,
        T::Err: std::fmt::Display,
    {
        match lookup(var_name) {
            Some(val) => match val.trim().parse() {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {} (using default: {:?})", var_name, e, default);
                    Ok(default)
                }
            },
            None => {
                info!("{} not set, using default: {:?}", var_name, default);
                Ok(default)
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            return Err(anyhow::anyhow!("SERVER_PORT must be greater than 0"));
        }
        if self.max_file_size_mb == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }
        if self.max_concurrent_analyses == 0 {
            return Err(anyhow::anyhow!("MAX_CONCURRENT_ANALYSES must be greater than 0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("REQUEST_TIMEOUT_SECONDS must be greater than 0"));
        }
        if !self.completions_url.starts_with("http://") && !self.completions_url.starts_with("https://") {
            return Err(anyhow::anyhow!("OPENROUTER_API_URL must be an http(s) URL"));
        }
        if self.model.trim().is_empty() {
            return Err(anyhow::anyhow!("OPENROUTER_MODEL must not be empty"));
        }
        Ok(())
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }
}
