// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Indexer Reader
//!
//! Reads the consent contract's public ledger through the indexer's GraphQL
//! API. The `consent_registry` ledger field is public, so membership checks
//! need no proof and no transaction.
//!
//! ## Lookup
//!
//! The indexer returns the decoded ledger view, a list of `{key, value}`
//! entries. Each key is parsed into a [`ConsentHash`] and membership is exact
//! equality. Raw state blobs are refused rather than searched as text: a hex
//! substring match can collide with unrelated state.
//!
//! ## Fallback
//!
//! When the primary endpoint fails, the secondary endpoint (by default the
//! same indexer on its older API version) is tried before giving up.

use std::collections::BTreeSet;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::types::{ContractAddress, LedgerError};
use crate::consent::ConsentHash;

const CONSENT_REGISTRY_QUERY: &str = r#"
query ConsentRegistry($address: HexEncodedBytes!) {
  contractState(contractAddress: $address) {
    ledger {
      consentRegistry { key value }
    }
  }
}
"#;

/// Registry members at the time of the query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    members: BTreeSet<ConsentHash>,
}

impl RegistrySnapshot {
    pub fn contains(&self, hash: &ConsentHash) -> bool {
        self.members.contains(hash)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConsentHash> {
        self.members.iter()
    }
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<QueryData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryData {
    contract_state: Option<ContractStateView>,
}

#[derive(Deserialize)]
struct ContractStateView {
    ledger: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConsentLedgerView {
    consent_registry: Vec<RegistryEntry>,
}

#[derive(Deserialize)]
struct RegistryEntry {
    key: String,
    value: bool,
}

#[derive(Debug, Clone)]
pub struct IndexerClient {
    primary: Url,
    fallback: Option<Url>,
    http: Client,
}

impl IndexerClient {
    pub fn new(primary: Url, fallback: Option<Url>, timeout: Duration) -> Result<Self, LedgerError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Unreachable(format!("failed to build HTTP client: {e}")))?;

        let fallback = fallback.filter(|url| url != &primary);
        Ok(Self {
            primary,
            fallback,
            http,
        })
    }

    pub fn primary_url(&self) -> &Url {
        &self.primary
    }

    pub fn fallback_url(&self) -> Option<&Url> {
        self.fallback.as_ref()
    }

    /// Fetch the current registry, trying the fallback endpoint if needed.
    pub async fn registry(
        &self,
        contract: &ContractAddress,
    ) -> Result<RegistrySnapshot, LedgerError> {
        let primary_err = match self.query(&self.primary, contract).await {
            Ok(snapshot) => return Ok(snapshot),
            Err(e) => e,
        };

        let Some(fallback) = &self.fallback else {
            return Err(primary_err);
        };

        tracing::warn!(
            endpoint = %self.primary,
            error = %primary_err,
            "Primary indexer query failed, trying fallback"
        );

        self.query(fallback, contract).await.map_err(|fallback_err| {
            LedgerError::IndexerUnavailable(format!(
                "primary: {primary_err}; fallback: {fallback_err}"
            ))
        })
    }

    /// Whether `hash` is currently in the registry.
    pub async fn is_member(
        &self,
        contract: &ContractAddress,
        hash: &ConsentHash,
    ) -> Result<bool, LedgerError> {
        Ok(self.registry(contract).await?.contains(hash))
    }

    async fn query(
        &self,
        endpoint: &Url,
        contract: &ContractAddress,
    ) -> Result<RegistrySnapshot, LedgerError> {
        let response = self
            .http
            .post(endpoint.clone())
            .json(&json!({
                "query": CONSENT_REGISTRY_QUERY,
                "variables": { "address": contract.as_str() }
            }))
            .send()
            .await
            .map_err(|e| LedgerError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LedgerError::Unreachable(format!(
                "indexer returned {status}"
            )));
        }

        let body: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;

        parse_registry(body, contract)
    }
}

fn parse_registry(
    body: GraphQlResponse,
    contract: &ContractAddress,
) -> Result<RegistrySnapshot, LedgerError> {
    if !body.errors.is_empty() {
        let messages: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
        return Err(LedgerError::InvalidResponse(messages.join("; ")));
    }

    let state = body
        .data
        .and_then(|data| data.contract_state)
        .ok_or_else(|| LedgerError::ContractNotFound(contract.to_string()))?;

    let ledger = state.ledger.ok_or_else(|| {
        LedgerError::UndecodableState("response has no decoded ledger view".to_string())
    })?;

    let view: ConsentLedgerView = serde_json::from_value(ledger)
        .map_err(|e| LedgerError::UndecodableState(e.to_string()))?;

    let mut members = BTreeSet::new();
    for entry in view.consent_registry {
        let hash = ConsentHash::from_hex(&entry.key).map_err(|e| {
            LedgerError::UndecodableState(format!("registry key {:?}: {e}", entry.key))
        })?;
        if entry.value {
            members.insert(hash);
        }
    }

    Ok(RegistrySnapshot { members })
}
