//! Client configuration, including the environment-variable reader.

use crate::network::NetworkConfig;
use eigenda_core::{BlobRequestSigner, SignerError};
use std::{env, time::Duration};

/// Hex private key, with or without a `0x` prefix. Required.
pub const ENV_PRIVATE_KEY: &str = "EIGENDA_PRIVATE_KEY";
/// Disperser host. Defaults to the sepolia disperser.
pub const ENV_DISPERSER_HOST: &str = "EIGENDA_DISPERSER_HOST";
/// Disperser port. Defaults to 443.
pub const ENV_DISPERSER_PORT: &str = "EIGENDA_DISPERSER_PORT";
/// "true"/"false". Defaults to true when the port is 443.
pub const ENV_USE_SECURE_GRPC: &str = "EIGENDA_USE_SECURE_GRPC";

/// Errors from reading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// the private key variable is unset
    #[error("environment variable {0} must be set")]
    MissingPrivateKey(&'static str),
    /// a variable holds an unparseable value
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
    /// the private key did not parse
    #[error(transparent)]
    Signer(#[from] SignerError),
}

/// Connection settings for the disperser.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub disperser_host: String,
    pub disperser_port: u16,
    pub use_secure_grpc: bool,
    /// Deadline applied to every RPC.
    pub timeout: Duration,
    /// Use per-quorum reservations instead of the account-level state.
    pub per_quorum_payments: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let network = NetworkConfig::sepolia();
        Self {
            disperser_host: network.disperser_host,
            disperser_port: network.disperser_port,
            use_secure_grpc: true,
            timeout: Duration::from_secs(30),
            per_quorum_payments: false,
        }
    }
}

impl ClientConfig {
    /// Build a config and signer from `EIGENDA_*` environment variables,
    /// loading a `.env` file when present.
    pub fn from_env() -> Result<(Self, BlobRequestSigner), ConfigError> {
        dotenvy::dotenv().ok();

        let private_key = env::var(ENV_PRIVATE_KEY)
            .map_err(|_| ConfigError::MissingPrivateKey(ENV_PRIVATE_KEY))?;
        let signer = BlobRequestSigner::from_hex(private_key.trim())?;

        let disperser_host = env::var(ENV_DISPERSER_HOST)
            .unwrap_or_else(|_| NetworkConfig::sepolia().disperser_host);

        let disperser_port = match env::var(ENV_DISPERSER_PORT) {
            Ok(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                name: ENV_DISPERSER_PORT,
                value: raw.clone(),
            })?,
            Err(_) => 443,
        };

        let use_secure_grpc = match env::var(ENV_USE_SECURE_GRPC) {
            Ok(raw) => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: ENV_USE_SECURE_GRPC,
                        value: raw,
                    })
                }
            },
            Err(_) => disperser_port == 443,
        };

        let config = Self { disperser_host, disperser_port, use_secure_grpc, ..Self::default() };
        Ok((config, signer))
    }
}
