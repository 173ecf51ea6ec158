// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Consent store backed by a remote gateway's REST API.
//!
//! Used by the CLI to drive a running gateway. Verification can fall back to
//! reading the indexer directly when the gateway itself is unreachable.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use super::{
    Authorization, ConsentEntry, ConsentStore, GrantReceipt, RevokeReceipt, StoreBackend,
    StoreError,
};
use crate::consent::ConsentHash;
use crate::error::{ErrorBody, ErrorKind};
use crate::ledger::{ContractAddress, IndexerClient};
use crate::models::{
    ConsentListResponse, ConsentRequest, GrantConsentResponse, HealthResponse,
    RevokeConsentResponse, VerifyConsentResponse,
};

pub struct GatewayConsentStore {
    base_url: Url,
    http: Client,
    fallback: Option<(IndexerClient, ContractAddress)>,
}

impl GatewayConsentStore {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, StoreError> {
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Unavailable(format!(
                "invalid gateway URL {base_url}"
            )));
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            http,
            fallback: None,
        })
    }

    /// Read the indexer directly when the gateway cannot answer a verify.
    pub fn with_indexer_fallback(mut self, indexer: IndexerClient, contract: ContractAddress) -> Self {
        self.fallback = Some((indexer, contract));
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Unavailable(format!("invalid gateway URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post<T: DeserializeOwned>(&self, path: &[&str], hash: &ConsentHash) -> Result<T, StoreError> {
        let response = self
            .http
            .post(self.endpoint(path)?)
            .json(&ConsentRequest {
                child_id_hash: Some(hash.to_hex()),
            })
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("gateway unreachable: {e}")))?;

        read_json(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &[&str]) -> Result<T, StoreError> {
        let response = self
            .http
            .get(self.endpoint(path)?)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("gateway unreachable: {e}")))?;

        read_json(response).await
    }

    async fn verify_via_indexer(&self, hash: &ConsentHash, gateway_error: String) -> Authorization {
        let Some((indexer, contract)) = &self.fallback else {
            return Authorization::Unknown(gateway_error);
        };

        tracing::warn!(error = %gateway_error, "Gateway verify failed, reading indexer directly");

        match indexer.is_member(contract, hash).await {
            Ok(true) => Authorization::Authorized,
            Ok(false) => Authorization::Denied,
            Err(e) => Authorization::Unknown(format!("{gateway_error}; indexer: {e}")),
        }
    }
}

/// Decode a gateway response, mapping the error envelope back to a
/// [`StoreError`].
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let status = response.status();

    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Unavailable(format!("unexpected gateway response: {e}")));
    }

    let text = response.text().await.unwrap_or_default();
    let (message, kind) = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => (body.error, body.kind),
        Err(_) => (format!("gateway returned {status}"), None),
    };

    Err(store_error(status, kind, message))
}

/// A 500 is only a rejection when the gateway says so; otherwise the
/// gateway's own backend was unreachable.
fn store_error(status: StatusCode, kind: Option<ErrorKind>, message: String) -> StoreError {
    match (status, kind) {
        (StatusCode::SERVICE_UNAVAILABLE, _) => StoreError::NotInitialized(message),
        (StatusCode::NOT_IMPLEMENTED, _) => StoreError::Unsupported("gateway"),
        (StatusCode::INTERNAL_SERVER_ERROR, Some(ErrorKind::Rejected)) => {
            StoreError::Rejected(message)
        }
        (s, _) if s.is_client_error() => StoreError::Rejected(message),
        _ => StoreError::Unavailable(message),
    }
}

fn authorization_from(response: VerifyConsentResponse) -> Authorization {
    match response.status.as_str() {
        "authorized" if response.is_authorized => Authorization::Authorized,
        "denied" => Authorization::Denied,
        _ => Authorization::Unknown(
            response
                .error
                .unwrap_or_else(|| "gateway could not verify consent".to_string()),
        ),
    }
}

#[async_trait]
impl ConsentStore for GatewayConsentStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Gateway
    }

    async fn is_ready(&self) -> bool {
        self.get::<HealthResponse>(&["health"])
            .await
            .map(|health| health.ready)
            .unwrap_or(false)
    }

    async fn grant(&self, hash: &ConsentHash) -> Result<GrantReceipt, StoreError> {
        let response: GrantConsentResponse = self.post(&["api", "consent", "grant"], hash).await?;
        if !response.success {
            return Err(StoreError::Rejected(
                response.error.unwrap_or_else(|| "grant was not accepted".to_string()),
            ));
        }

        Ok(GrantReceipt {
            tx_id: response.tx_hash,
            already_granted: response.already_granted,
        })
    }

    async fn revoke(&self, hash: &ConsentHash) -> Result<RevokeReceipt, StoreError> {
        let response: RevokeConsentResponse =
            self.post(&["api", "consent", "revoke"], hash).await?;
        if !response.success {
            return Err(StoreError::Rejected(
                response.error.unwrap_or_else(|| "revoke was not accepted".to_string()),
            ));
        }

        Ok(RevokeReceipt {
            tx_id: response.tx_hash,
            existed: response.existed,
        })
    }

    async fn verify(&self, hash: &ConsentHash) -> Authorization {
        let hex = hash.to_hex();
        match self
            .get::<VerifyConsentResponse>(&["api", "consent", "verify", &hex])
            .await
        {
            Ok(response) => authorization_from(response),
            Err(e) => self.verify_via_indexer(hash, e.to_string()).await,
        }
    }

    async fn list(&self) -> Result<Vec<ConsentEntry>, StoreError> {
        let response: ConsentListResponse = self.get(&["api", "consent", "list"]).await?;

        response
            .consents
            .into_iter()
            .map(|entry| {
                let hash = ConsentHash::from_hex(&entry.child_id_hash)
                    .map_err(|e| StoreError::Unavailable(format!("unexpected gateway response: {e}")))?;
                Ok(ConsentEntry {
                    hash,
                    granted_at: entry.granted_at,
                    tx_id: entry.tx_hash,
                })
            })
            .collect()
    }
}
