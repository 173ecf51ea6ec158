// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger types and constants.

use std::fmt;

use url::Url;

/// Default ledger bridge endpoint (local SDK sidecar).
pub const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:6310";

/// Default indexer GraphQL endpoint of the local Docker testnet.
pub const DEFAULT_INDEXER_URL: &str = "http://127.0.0.1:8088/api/v3/graphql";

/// Network label used when none is configured.
pub const DEFAULT_NETWORK_ID: &str = "undeployed";

/// Indexer API version segments used to derive the fallback endpoint.
const INDEXER_PRIMARY_SEGMENT: &str = "/api/v3/";
const INDEXER_FALLBACK_SEGMENT: &str = "/api/v1/";

/// Circuits exposed by the consent contract that mutate the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Circuit {
    GrantConsent,
    RevokeConsent,
}

impl Circuit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Circuit::GrantConsent => "grant_consent",
            Circuit::RevokeConsent => "revoke_consent",
        }
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of a deployed consent contract.
///
/// Stored as lower-case hex without a `0x` prefix, the form the indexer
/// expects for `HexEncodedBytes`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContractAddress(String);

impl ContractAddress {
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.is_empty() || digits.len() % 2 != 0 {
            return Err(LedgerError::InvalidContractAddress(raw.to_string()));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(LedgerError::InvalidContractAddress(raw.to_string()));
        }

        Ok(Self(digits.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse an endpoint URL, rejecting forms that cannot carry a path.
pub fn parse_endpoint(raw: &str) -> Result<Url, LedgerError> {
    let url = Url::parse(raw.trim()).map_err(|e| LedgerError::InvalidUrl(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(LedgerError::InvalidUrl(format!(
            "{raw}: expected an http(s) URL"
        )));
    }
    Ok(url)
}

/// Derive the secondary indexer endpoint from the primary one.
///
/// Returns `None` when the primary URL does not carry the versioned segment.
pub fn fallback_indexer_url(primary: &Url) -> Option<Url> {
    let path = primary.path();
    if !path.contains(INDEXER_PRIMARY_SEGMENT) {
        return None;
    }
    let mut fallback = primary.clone();
    fallback.set_path(&path.replacen(INDEXER_PRIMARY_SEGMENT, INDEXER_FALLBACK_SEGMENT, 1));
    Some(fallback)
}

/// Errors that can occur while talking to the ledger bridge or indexer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid contract address: {0}")]
    InvalidContractAddress(String),

    #[error("Unreachable: {0}")]
    Unreachable(String),

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Contract {0} not found on the indexer")]
    ContractNotFound(String),

    #[error("Contract state could not be decoded: {0}")]
    UndecodableState(String),

    #[error("All indexer endpoints failed: {0}")]
    IndexerUnavailable(String),
}
