// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Consent registry endpoints.
//!
//! Handlers parse the hex `childIdHash` into a [`ConsentHash`] before the
//! store sees it, bound every store call by the configured timeout and render
//! hashes back at full 64-digit width.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::Utc;

use crate::{
    consent::ConsentHash,
    error::{ApiError, ErrorBody},
    models::{
        ConsentListEntry, ConsentListResponse, ConsentRequest, GrantConsentResponse,
        RevokeConsentResponse, VerifyConsentResponse,
    },
    state::AppState,
    store::{bounded, bounded_verify, Authorization},
};

fn parse_request(
    payload: Result<Json<ConsentRequest>, JsonRejection>,
) -> Result<ConsentHash, ApiError> {
    let Json(request) = payload?;
    let raw = request
        .child_id_hash
        .ok_or_else(|| ApiError::bad_request("childIdHash is required"))?;
    Ok(ConsentHash::from_hex(&raw)?)
}

#[utoipa::path(
    post,
    path = "/api/consent/grant",
    request_body = ConsentRequest,
    tag = "Consent",
    responses(
        (status = 200, description = "Consent recorded", body = GrantConsentResponse),
        (status = 400, description = "Missing or malformed childIdHash", body = ErrorBody),
        (status = 500, description = "Store failed or rejected the grant", body = ErrorBody),
        (status = 503, description = "Contract not initialized", body = ErrorBody)
    )
)]
pub async fn grant_consent(
    State(state): State<AppState>,
    payload: Result<Json<ConsentRequest>, JsonRejection>,
) -> Result<Json<GrantConsentResponse>, ApiError> {
    let hash = parse_request(payload)?;

    let receipt = bounded(state.store_timeout, state.store.grant(&hash))
        .await
        .map_err(|e| {
            tracing::warn!(hash = %hash.short(), error = %e, "Grant failed");
            ApiError::from(e)
        })?;

    Ok(Json(GrantConsentResponse {
        success: true,
        tx_hash: receipt.tx_id,
        child_id_hash: Some(hash.to_hex()),
        contract_address: state.contract_address.clone(),
        already_granted: receipt.already_granted,
        timestamp: Utc::now(),
        error: None,
    }))
}

#[utoipa::path(
    post,
    path = "/api/consent/revoke",
    request_body = ConsentRequest,
    tag = "Consent",
    responses(
        (status = 200, description = "Consent removed (or was never present)", body = RevokeConsentResponse),
        (status = 400, description = "Missing or malformed childIdHash", body = ErrorBody),
        (status = 500, description = "Store failed or rejected the revoke", body = ErrorBody),
        (status = 503, description = "Contract not initialized", body = ErrorBody)
    )
)]
pub async fn revoke_consent(
    State(state): State<AppState>,
    payload: Result<Json<ConsentRequest>, JsonRejection>,
) -> Result<Json<RevokeConsentResponse>, ApiError> {
    let hash = parse_request(payload)?;

    let receipt = bounded(state.store_timeout, state.store.revoke(&hash))
        .await
        .map_err(|e| {
            tracing::warn!(hash = %hash.short(), error = %e, "Revoke failed");
            ApiError::from(e)
        })?;

    Ok(Json(RevokeConsentResponse {
        success: true,
        existed: receipt.existed,
        tx_hash: receipt.tx_id,
        child_id_hash: Some(hash.to_hex()),
        contract_address: state.contract_address.clone(),
        timestamp: Utc::now(),
        error: None,
    }))
}

/// Membership check. Always answers 200; failures are reported in-band.
#[utoipa::path(
    get,
    path = "/api/consent/verify/{child_id_hash}",
    params(
        ("child_id_hash" = String, Path, description = "Hex-encoded consent hash")
    ),
    tag = "Consent",
    responses((status = 200, body = VerifyConsentResponse))
)]
pub async fn verify_consent(
    State(state): State<AppState>,
    Path(child_id_hash): Path<String>,
) -> Json<VerifyConsentResponse> {
    let (hash, outcome) = match ConsentHash::from_hex(&child_id_hash) {
        Ok(hash) => (
            Some(hash),
            bounded_verify(state.store_timeout, state.store.verify(&hash)).await,
        ),
        Err(e) => (None, Authorization::Unknown(e.to_string())),
    };

    tracing::debug!(
        hash = %child_id_hash,
        status = outcome.status(),
        "Consent verified"
    );

    Json(VerifyConsentResponse {
        is_authorized: outcome.is_authorized(),
        status: outcome.status().to_string(),
        child_id_hash: hash.map(|h| h.to_hex()),
        contract_address: state.contract_address.clone(),
        timestamp: Utc::now(),
        error: outcome.error().map(str::to_string),
    })
}

/// Registry dump for debugging.
#[utoipa::path(
    get,
    path = "/api/consent/list",
    tag = "Consent",
    responses(
        (status = 200, body = ConsentListResponse),
        (status = 501, description = "Backend cannot enumerate the registry", body = ErrorBody),
        (status = 503, description = "Contract not initialized", body = ErrorBody)
    )
)]
pub async fn list_consents(
    State(state): State<AppState>,
) -> Result<Json<ConsentListResponse>, ApiError> {
    let entries = bounded(state.store_timeout, state.store.list()).await?;

    let consents: Vec<ConsentListEntry> = entries
        .into_iter()
        .map(|entry| ConsentListEntry {
            child_id_hash: entry.hash.to_hex(),
            granted_at: entry.granted_at,
            tx_hash: entry.tx_id,
        })
        .collect();

    Ok(Json(ConsentListResponse {
        total: consents.len(),
        consents,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::http::StatusCode;

    use super::*;
    use crate::consent::hash_identifier;
    use crate::store::{
        ConsentEntry, ConsentStore, GrantReceipt, RevokeReceipt, StoreBackend, StoreError,
    };

    const CHILD_HASH: &str = "0c122e20824bdb992685421cd322a5d391b89cdbe59dea875fbd1c7e87b56727";

    fn request(hash: &str) -> Result<Json<ConsentRequest>, JsonRejection> {
        Ok(Json(ConsentRequest {
            child_id_hash: Some(hash.to_string()),
        }))
    }

    /// Store whose mutations always fail the same way and whose reads are
    /// always unknown.
    struct FailingStore(StoreError);

    #[async_trait]
    impl ConsentStore for FailingStore {
        fn backend(&self) -> StoreBackend {
            StoreBackend::Ledger
        }

        async fn is_ready(&self) -> bool {
            false
        }

        async fn grant(&self, _hash: &ConsentHash) -> Result<GrantReceipt, StoreError> {
            Err(self.0.clone())
        }

        async fn revoke(&self, _hash: &ConsentHash) -> Result<RevokeReceipt, StoreError> {
            Err(self.0.clone())
        }

        async fn verify(&self, _hash: &ConsentHash) -> Authorization {
            Authorization::Unknown(self.0.to_string())
        }

        async fn list(&self) -> Result<Vec<ConsentEntry>, StoreError> {
            Err(self.0.clone())
        }
    }

    fn failing(err: StoreError) -> AppState {
        AppState::new(Arc::new(FailingStore(err)))
    }

    #[tokio::test]
    async fn grant_then_verify_round_trip() {
        let state = AppState::default();

        let Json(granted) = grant_consent(State(state.clone()), request(CHILD_HASH))
            .await
            .expect("grant succeeds");
        assert!(granted.success);
        assert!(granted.tx_hash.unwrap().starts_with("0xmock"));
        assert_eq!(granted.child_id_hash.as_deref(), Some(CHILD_HASH));

        let Json(verdict) = verify_consent(State(state.clone()), Path(CHILD_HASH.into())).await;
        assert!(verdict.is_authorized);
        assert_eq!(verdict.status, "authorized");
        assert!(verdict.error.is_none());
    }

    #[tokio::test]
    async fn revoke_then_verify_denies() {
        let state = AppState::default();
        grant_consent(State(state.clone()), request(CHILD_HASH))
            .await
            .unwrap();

        let Json(revoked) = revoke_consent(State(state.clone()), request(CHILD_HASH))
            .await
            .expect("revoke succeeds");
        assert!(revoked.success);
        assert!(revoked.existed);

        let Json(verdict) = verify_consent(State(state), Path(CHILD_HASH.into())).await;
        assert!(!verdict.is_authorized);
        assert_eq!(verdict.status, "denied");
        assert!(verdict.error.is_none());
    }

    #[tokio::test]
    async fn revoke_of_unknown_hash_succeeds() {
        let state = AppState::default();
        let Json(revoked) = revoke_consent(State(state), request(CHILD_HASH))
            .await
            .unwrap();

        assert!(revoked.success);
        assert!(!revoked.existed);
        assert!(revoked.tx_hash.is_none());
    }

    #[tokio::test]
    async fn short_hashes_are_rendered_at_full_width() {
        let state = AppState::default();
        let Json(granted) = grant_consent(State(state.clone()), request("0xabc"))
            .await
            .unwrap();

        let rendered = granted.child_id_hash.unwrap();
        assert_eq!(rendered.len(), 64);
        assert!(rendered.ends_with("abc"));

        let Json(verdict) = verify_consent(State(state), Path(rendered)).await;
        assert!(verdict.is_authorized);
    }

    #[tokio::test]
    async fn malformed_or_missing_hashes_are_bad_requests() {
        let state = AppState::default();

        let inputs = [
            String::new(),
            "xyz".to_string(),
            "f".repeat(65),
            "f".repeat(64),
        ];
        for raw in &inputs {
            let err = grant_consent(State(state.clone()), request(raw))
                .await
                .unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST, "input {raw:?}");
        }

        let err = grant_consent(State(state.clone()), Ok(Json(ConsentRequest::default())))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "childIdHash is required");
    }

    #[tokio::test]
    async fn verify_of_malformed_hash_is_unknown() {
        let Json(verdict) =
            verify_consent(State(AppState::default()), Path("not-hex".into())).await;

        assert!(!verdict.is_authorized);
        assert_eq!(verdict.status, "unknown");
        assert!(verdict.error.is_some());
        assert!(verdict.child_id_hash.is_none());
    }

    #[tokio::test]
    async fn uninitialized_store_returns_503() {
        let state = failing(StoreError::NotInitialized("Contract not initialized".into()));

        let err = grant_consent(State(state.clone()), request(CHILD_HASH))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.message, "Contract not initialized");

        let err = revoke_consent(State(state), request(CHILD_HASH))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn rejected_grant_is_not_reported_as_success() {
        let state = failing(StoreError::Rejected("proof verification failed".into()));

        let err = grant_consent(State(state), request(CHILD_HASH))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "proof verification failed");
    }

    #[tokio::test]
    async fn unreachable_store_verifies_as_unknown() {
        let state = failing(StoreError::Unavailable("indexer offline".into()));

        let Json(verdict) = verify_consent(State(state), Path(CHILD_HASH.into())).await;
        assert!(!verdict.is_authorized);
        assert_eq!(verdict.status, "unknown");
        assert!(verdict.error.unwrap().contains("indexer offline"));
    }

    #[tokio::test]
    async fn list_reports_granted_hashes() {
        let state = AppState::default();
        let other = hash_identifier("sibling@example.com").unwrap();
        grant_consent(State(state.clone()), request(CHILD_HASH))
            .await
            .unwrap();
        grant_consent(State(state.clone()), request(&other.to_hex()))
            .await
            .unwrap();

        let Json(list) = list_consents(State(state)).await.unwrap();
        assert_eq!(list.total, 2);
        assert!(list.consents.iter().any(|c| c.child_id_hash == CHILD_HASH));
    }

    #[tokio::test]
    async fn list_on_unsupported_store_is_501() {
        let state = failing(StoreError::Unsupported("gateway"));
        let err = list_consents(State(state)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn list_on_unreachable_store_is_500() {
        let state = failing(StoreError::Unavailable("indexer offline".into()));
        let err = list_consents(State(state)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message.contains("indexer offline"));
    }
}
