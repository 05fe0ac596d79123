//! Environment-backed configuration, loaded once at startup.

use di::{inject, injectable};
use std::env;
use std::net::SocketAddr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingVar(&'static str),
    #[error("invalid value for environment variable {0}: {1}")]
    InvalidValue(&'static str, String),
}

/// Holds all configuration loaded from the environment.
///
/// Variables:
/// * `BIND_ADDRESS`: address and port to serve on (default "0.0.0.0:3000").
/// * `BACKEND_URL`: base URL of the generation backend.
/// * `PROVIDER_API_URL`: base URL of the conversation provider's REST API.
/// * `PROVIDER_WS_URL`: websocket URL for realtime agent sessions.
/// * `PROVIDER_API_KEY`: secret key for the conversation provider.
/// * `STORAGE_URL`: base URL of the hosted object storage service.
/// * `STORAGE_KEY`: service key for the storage API.
/// * `STORAGE_BUCKET`: bucket holding roleplay images (default "roleplay").
/// * `AUTH_URL`: the hosted auth provider's authorize endpoint.
/// * `PUBLIC_URL`: this app's public origin, used for the OAuth callback.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub backend_url: String,
    pub provider_api_url: String,
    pub provider_ws_url: String,
    pub provider_api_key: String,
    pub storage_url: String,
    pub storage_key: String,
    pub storage_bucket: String,
    pub auth_url: String,
    pub public_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let bind_address_str =
            env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_owned());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS", e.to_string()))?;

        Ok(Self {
            bind_address,
            backend_url: require("BACKEND_URL")?,
            provider_api_url: require("PROVIDER_API_URL")?,
            provider_ws_url: require("PROVIDER_WS_URL")?,
            provider_api_key: require("PROVIDER_API_KEY")?,
            storage_url: require("STORAGE_URL")?,
            storage_key: require("STORAGE_KEY")?,
            storage_bucket: env::var("STORAGE_BUCKET").unwrap_or_else(|_| "roleplay".to_owned()),
            auth_url: require("AUTH_URL")?,
            public_url: env::var("PUBLIC_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned()),
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

#[injectable]
impl Config {
    #[inject]
    pub fn create() -> Config {
        Config::from_env().expect("configuration must be valid")
    }
}
