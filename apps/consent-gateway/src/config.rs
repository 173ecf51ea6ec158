// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment at startup. Every variable has
//! a default suited to the local Docker testnet.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3001` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `CONSENT_STORE` | Registry backend (`memory` or `ledger`) | `memory` |
//! | `NETWORK_ID` | Network label reported by `/health` | `undeployed` |
//! | `CONTRACT_ADDRESS` | Deployed consent contract | Read from `DEPLOYMENT_FILE` |
//! | `DEPLOYMENT_FILE` | Deployment record written by the deploy step | `deployment-consent.json` |
//! | `LEDGER_BRIDGE_URL` | Ledger SDK bridge | `http://127.0.0.1:6310` |
//! | `INDEXER_URL` | Indexer GraphQL endpoint | `http://127.0.0.1:8088/api/v3/graphql` |
//! | `INDEXER_FALLBACK_URL` | Secondary indexer endpoint | `INDEXER_URL` with `/api/v3/` replaced by `/api/v1/` |
//! | `STORE_TIMEOUT_SECS` | Upper bound on each store call | `15` |
//! | `SEED_CONSENT_IDENTIFIERS` | Comma-separated identifiers granted at startup (memory store only) | None |

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::ledger::{
    fallback_indexer_url, parse_endpoint, ContractAddress, DEFAULT_BRIDGE_URL,
    DEFAULT_INDEXER_URL, DEFAULT_NETWORK_ID,
};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const CONSENT_STORE_ENV: &str = "CONSENT_STORE";
pub const NETWORK_ID_ENV: &str = "NETWORK_ID";
pub const CONTRACT_ADDRESS_ENV: &str = "CONTRACT_ADDRESS";
pub const DEPLOYMENT_FILE_ENV: &str = "DEPLOYMENT_FILE";
pub const LEDGER_BRIDGE_URL_ENV: &str = "LEDGER_BRIDGE_URL";
pub const INDEXER_URL_ENV: &str = "INDEXER_URL";
pub const INDEXER_FALLBACK_URL_ENV: &str = "INDEXER_FALLBACK_URL";
pub const STORE_TIMEOUT_SECS_ENV: &str = "STORE_TIMEOUT_SECS";

/// Identifiers granted consent when the in-memory store starts.
///
/// Useful for demos where the child UI should see an authorized identity
/// without a parent first visiting the grant page.
pub const SEED_CONSENT_IDENTIFIERS_ENV: &str = "SEED_CONSENT_IDENTIFIERS";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_DEPLOYMENT_FILE: &str = "deployment-consent.json";
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(15);

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "" => Ok(LogFormat::Pretty),
            other => Err(ConfigError::Invalid {
                var: LOG_FORMAT_ENV,
                reason: format!("expected `json` or `pretty`, got `{other}`"),
            }),
        }
    }
}

/// Which registry backend the gateway serves from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreMode {
    #[default]
    Memory,
    Ledger,
}

impl StoreMode {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "memory" | "mock" | "" => Ok(StoreMode::Memory),
            "ledger" => Ok(StoreMode::Ledger),
            other => Err(ConfigError::Invalid {
                var: CONSENT_STORE_ENV,
                reason: format!("expected `memory` or `ledger`, got `{other}`"),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("Failed to read deployment file {path}: {source}")]
    DeploymentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed deployment file {path}: {reason}")]
    DeploymentFormat { path: PathBuf, reason: String },
}

/// Fully resolved gateway settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
    pub store_mode: StoreMode,
    pub network_id: String,
    pub contract_address: Option<ContractAddress>,
    pub deployment_file: PathBuf,
    pub bridge_url: Url,
    pub indexer_url: Url,
    pub indexer_fallback_url: Option<Url>,
    pub store_timeout: Duration,
    pub seed_identifiers: Vec<String>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Resolve the configuration through `lookup` instead of the process
    /// environment.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let host = var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match var(PORT_ENV) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: PORT_ENV,
                reason: format!("`{raw}` is not a port number"),
            })?,
            None => DEFAULT_PORT,
        };

        let log_format = var(LOG_FORMAT_ENV)
            .map(|raw| LogFormat::parse(&raw))
            .transpose()?
            .unwrap_or_default();
        let store_mode = var(CONSENT_STORE_ENV)
            .map(|raw| StoreMode::parse(&raw))
            .transpose()?
            .unwrap_or_default();

        let network_id = var(NETWORK_ID_ENV).unwrap_or_else(|| DEFAULT_NETWORK_ID.to_string());
        let deployment_file = var(DEPLOYMENT_FILE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DEPLOYMENT_FILE));

        let contract_address = match var(CONTRACT_ADDRESS_ENV) {
            Some(raw) => Some(ContractAddress::parse(&raw).map_err(|e| ConfigError::Invalid {
                var: CONTRACT_ADDRESS_ENV,
                reason: e.to_string(),
            })?),
            None if store_mode == StoreMode::Ledger => load_deployment(&deployment_file)?,
            None => None,
        };

        let bridge_url = endpoint(
            LEDGER_BRIDGE_URL_ENV,
            var(LEDGER_BRIDGE_URL_ENV).as_deref(),
            DEFAULT_BRIDGE_URL,
        )?;
        let indexer_url = endpoint(
            INDEXER_URL_ENV,
            var(INDEXER_URL_ENV).as_deref(),
            DEFAULT_INDEXER_URL,
        )?;
        let indexer_fallback_url = match var(INDEXER_FALLBACK_URL_ENV) {
            Some(raw) => Some(endpoint(INDEXER_FALLBACK_URL_ENV, Some(raw.as_str()), &raw)?),
            None => fallback_indexer_url(&indexer_url),
        };

        let store_timeout = match var(STORE_TIMEOUT_SECS_ENV) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: STORE_TIMEOUT_SECS_ENV,
                        reason: format!("`{raw}` is not a positive number of seconds"),
                    })
                }
            },
            None => DEFAULT_STORE_TIMEOUT,
        };

        let seed_identifiers = var(SEED_CONSENT_IDENTIFIERS_ENV)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            log_format,
            store_mode,
            network_id,
            contract_address,
            deployment_file,
            bridge_url,
            indexer_url,
            indexer_fallback_url,
            store_timeout,
            seed_identifiers,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::Invalid {
                var: HOST_ENV,
                reason: format!("`{}` is not a valid bind address", self.host),
            })
    }
}

fn endpoint(var: &'static str, raw: Option<&str>, default: &str) -> Result<Url, ConfigError> {
    parse_endpoint(raw.unwrap_or(default)).map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}

/// Deployment record written next to the gateway by the deploy step.
///
/// The record also carries the deployer wallet seed. That field is never
/// deserialized.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeploymentRecord {
    contract_address: Option<String>,
}

/// Read the contract address from a deployment file.
///
/// A missing file means the contract has not been deployed yet and yields
/// `Ok(None)`.
pub fn load_deployment(path: &Path) -> Result<Option<ContractAddress>, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "Deployment file not found; contract not deployed");
            return Ok(None);
        }
        Err(source) => {
            return Err(ConfigError::DeploymentRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let record: DeploymentRecord =
        serde_json::from_str(&raw).map_err(|e| ConfigError::DeploymentFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let Some(address) = record.contract_address else {
        return Ok(None);
    };

    ContractAddress::parse(&address)
        .map(Some)
        .map_err(|e| ConfigError::DeploymentFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<GatewayConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GatewayConfig::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_target_local_testnet() {
        let cfg = config(&[]).unwrap();

        assert_eq!(cfg.port, 3001);
        assert_eq!(cfg.store_mode, StoreMode::Memory);
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert_eq!(cfg.network_id, "undeployed");
        assert_eq!(cfg.indexer_url.as_str(), DEFAULT_INDEXER_URL);
        assert_eq!(
            cfg.indexer_fallback_url.as_ref().unwrap().as_str(),
            "http://127.0.0.1:8088/api/v1/graphql"
        );
        assert_eq!(cfg.store_timeout, DEFAULT_STORE_TIMEOUT);
        assert!(cfg.contract_address.is_none());
        assert!(cfg.seed_identifiers.is_empty());
        assert_eq!(cfg.bind_addr().unwrap().port(), 3001);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let cfg = config(&[
            ("PORT", "8080"),
            ("LOG_FORMAT", "JSON"),
            ("CONSENT_STORE", "ledger"),
            ("CONTRACT_ADDRESS", "0xABCD"),
            ("INDEXER_FALLBACK_URL", "http://backup.local/graphql"),
            ("STORE_TIMEOUT_SECS", "3"),
            ("SEED_CONSENT_IDENTIFIERS", "kid@example.com, ,other_kid"),
        ])
        .unwrap();

        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(cfg.store_mode, StoreMode::Ledger);
        assert_eq!(cfg.contract_address.unwrap().as_str(), "abcd");
        assert_eq!(
            cfg.indexer_fallback_url.unwrap().as_str(),
            "http://backup.local/graphql"
        );
        assert_eq!(cfg.store_timeout, Duration::from_secs(3));
        assert_eq!(cfg.seed_identifiers, vec!["kid@example.com", "other_kid"]);
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(config(&[("PORT", "http")]).is_err());
        assert!(config(&[("CONSENT_STORE", "postgres")]).is_err());
        assert!(config(&[("LOG_FORMAT", "xml")]).is_err());
        assert!(config(&[("STORE_TIMEOUT_SECS", "0")]).is_err());
        assert!(config(&[("INDEXER_URL", "not a url")]).is_err());
        assert!(config(&[("CONTRACT_ADDRESS", "xyz")]).is_err());
    }

    #[test]
    fn ledger_mode_reads_deployment_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"contractAddress":"0x826827cd05cbd054","seed":"do-not-log"}}"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cfg = config(&[("CONSENT_STORE", "ledger"), ("DEPLOYMENT_FILE", &path)]).unwrap();
        assert_eq!(cfg.contract_address.unwrap().as_str(), "826827cd05cbd054");
    }

    #[test]
    fn missing_deployment_file_means_not_deployed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployment-consent.json");
        assert!(load_deployment(&path).unwrap().is_none());
    }

    #[test]
    fn malformed_deployment_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            load_deployment(file.path()),
            Err(ConfigError::DeploymentFormat { .. })
        ));
    }
}
