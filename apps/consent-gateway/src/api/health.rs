// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use chrono::Utc;

use crate::models::{HealthResponse, LivenessResponse};
use crate::state::AppState;
use crate::store::StoreBackend;

/// Health check endpoint handler.
///
/// Always returns 200. `ready` tells whether mutations can be accepted yet
/// (for the ledger backend: whether the bridge session is up).
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service status", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let ready = state.store.is_ready().await;

    // Only the local registry is cheap enough to count on every probe.
    let total_consents = if state.store.backend() == StoreBackend::Memory {
        state.store.list().await.ok().map(|entries| entries.len())
    } else {
        None
    };

    Json(HealthResponse {
        status: if ready { "ok" } else { "starting" }.to_string(),
        network: state.network_id.clone(),
        mode: state.store.backend().to_string(),
        ready,
        contract_address: state.contract_address.clone(),
        total_consents,
        timestamp: Utc::now(),
    })
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
/// Does not check dependencies - use `/health` for that.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = LivenessResponse)
    )
)]
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "ok".to_string(),
    })
}
