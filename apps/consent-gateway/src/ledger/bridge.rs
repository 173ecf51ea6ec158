// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client for the ledger bridge.
//!
//! The bridge wraps the blockchain SDK: it holds the deployer wallet, builds
//! the circuit call, fetches the proof, balances and signs the transaction
//! and submits it. We only hand it a circuit name and a consent hash.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use super::types::{Circuit, ContractAddress, LedgerError};
use crate::consent::ConsentHash;

/// Bridge readiness as reported by `GET /status`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BridgeStatus {
    /// Whether the bridge wallet has caught up with the chain.
    pub synced: bool,
    #[serde(default)]
    pub network_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CircuitCallRequest {
    child_id_hash: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CircuitCallResponse {
    tx_id: String,
}

#[derive(Deserialize)]
struct BridgeErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
pub struct LedgerBridge {
    base_url: Url,
    http: Client,
}

impl LedgerBridge {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, LedgerError> {
        if base_url.cannot_be_a_base() {
            return Err(LedgerError::InvalidUrl(base_url.to_string()));
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Unreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Query bridge readiness.
    pub async fn status(&self) -> Result<BridgeStatus, LedgerError> {
        let url = self.endpoint(&["status"])?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| LedgerError::Unreachable(e.to_string()))?;

        read_json(response).await
    }

    /// Submit a circuit call and return the transaction id once the bridge
    /// has accepted it.
    pub async fn submit(
        &self,
        contract: &ContractAddress,
        circuit: Circuit,
        hash: &ConsentHash,
    ) -> Result<String, LedgerError> {
        let url = self.endpoint(&["contracts", contract.as_str(), "circuits", circuit.as_str()])?;

        tracing::debug!(
            circuit = %circuit,
            contract = %contract,
            hash = %hash.short(),
            "Submitting circuit call to ledger bridge"
        );

        let response = self
            .http
            .post(url)
            .json(&CircuitCallRequest {
                child_id_hash: hash.to_hex(),
            })
            .send()
            .await
            .map_err(|e| LedgerError::Unreachable(e.to_string()))?;

        let body: CircuitCallResponse = read_json(response).await?;
        if body.tx_id.trim().is_empty() {
            return Err(LedgerError::InvalidResponse(
                "bridge returned an empty transaction id".to_string(),
            ));
        }
        Ok(body.tx_id)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, LedgerError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LedgerError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Decode a bridge response, classifying failures.
///
/// 4xx answers are explicit refusals (bad proof, invalid signature) and keep
/// the bridge's message verbatim. Everything else is treated as the bridge
/// being unavailable.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, LedgerError> {
    let status = response.status();

    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()));
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<BridgeErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or_else(|_| {
            if text.trim().is_empty() {
                status.to_string()
            } else {
                text
            }
        });

    if status.is_client_error() {
        Err(LedgerError::Rejected(message))
    } else {
        Err(LedgerError::Unreachable(format!(
            "bridge returned {status}: {message}"
        )))
    }
}
