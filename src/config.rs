use std::net::SocketAddr;

use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_API_VERSION: &str = "v1beta";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub api_version: String,
    pub api_base: String,
    pub bind_addr: SocketAddr,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = var("GEMINI_API_KEY")
            .or_else(|| var("GOOGLE_GENERATIVE_AI_API_KEY"))
            .ok_or(ConfigError::MissingApiKey)?;

        let bind_addr = match var("BIND_ADDR") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                name: "BIND_ADDR",
                value: raw,
            })?,
            None => DEFAULT_BIND_ADDR
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    name: "BIND_ADDR",
                    value: DEFAULT_BIND_ADDR.to_string(),
                })?,
        };

        let max_upload_bytes = match var("MAX_UPLOAD_BYTES") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "MAX_UPLOAD_BYTES",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            api_key,
            model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_version: var("GEMINI_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            api_base: var("GEMINI_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            bind_addr,
            max_upload_bytes,
        })
    }
}
