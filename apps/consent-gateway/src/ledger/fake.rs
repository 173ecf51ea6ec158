// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process stand-ins for the ledger bridge and indexer, served over real
//! HTTP on an ephemeral port so the clients are exercised end to end.

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use url::Url;

use crate::consent::ConsentHash;

pub(crate) const CONTRACT: &str =
    "826827cd05cbd054e3df19010ae3a30f57dc50cf6c77f5280635a2cba03ab423";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IndexerMode {
    Healthy,
    Down,
    /// Serve the ledger as an opaque hex blob instead of a decoded view.
    RawBlob,
}

struct FakeState {
    registry: BTreeSet<ConsentHash>,
    synced: bool,
    reject: Option<String>,
    primary: IndexerMode,
    fallback: IndexerMode,
    submissions: usize,
}

#[derive(Clone)]
pub(crate) struct FakeLedger {
    addr: SocketAddr,
    state: Arc<Mutex<FakeState>>,
}

impl FakeLedger {
    pub(crate) async fn start() -> Self {
        let state = Arc::new(Mutex::new(FakeState {
            registry: BTreeSet::new(),
            synced: true,
            reject: None,
            primary: IndexerMode::Healthy,
            fallback: IndexerMode::Healthy,
            submissions: 0,
        }));

        let router = Router::new()
            .route("/status", get(status))
            .route(
                "/contracts/{address}/circuits/{circuit}",
                post(submit_circuit),
            )
            .route("/api/v3/graphql", post(primary_indexer))
            .route("/api/v1/graphql", post(fallback_indexer))
            .with_state(state.clone());

        let addr = serve(router).await;
        Self { addr, state }
    }

    pub(crate) fn bridge_url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).unwrap()
    }

    pub(crate) fn primary_indexer_url(&self) -> Url {
        Url::parse(&format!("http://{}/api/v3/graphql", self.addr)).unwrap()
    }

    pub(crate) fn fallback_indexer_url(&self) -> Url {
        Url::parse(&format!("http://{}/api/v1/graphql", self.addr)).unwrap()
    }

    pub(crate) fn insert(&self, hash: &ConsentHash) {
        self.state.lock().unwrap().registry.insert(*hash);
    }

    pub(crate) fn contains(&self, hash: &ConsentHash) -> bool {
        self.state.lock().unwrap().registry.contains(hash)
    }

    pub(crate) fn submissions(&self) -> usize {
        self.state.lock().unwrap().submissions
    }

    pub(crate) fn set_synced(&self, synced: bool) {
        self.state.lock().unwrap().synced = synced;
    }

    pub(crate) fn reject_submissions(&self, message: &str) {
        self.state.lock().unwrap().reject = Some(message.to_string());
    }

    pub(crate) fn set_primary_indexer(&self, mode: IndexerMode) {
        self.state.lock().unwrap().primary = mode;
    }

    pub(crate) fn set_fallback_indexer(&self, mode: IndexerMode) {
        self.state.lock().unwrap().fallback = mode;
    }
}

/// Serve `router` on an ephemeral local port.
pub(crate) async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

type Shared = State<Arc<Mutex<FakeState>>>;

async fn status(State(state): Shared) -> Response {
    let synced = state.lock().unwrap().synced;
    Json(json!({ "synced": synced, "networkId": "undeployed" })).into_response()
}

async fn submit_circuit(
    State(state): Shared,
    Path((address, circuit)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();

    if address != CONTRACT {
        return error(StatusCode::NOT_FOUND, "unknown contract");
    }
    if let Some(message) = state.reject.clone() {
        return error(StatusCode::UNPROCESSABLE_ENTITY, &message);
    }

    let Some(hash) = body
        .get("childIdHash")
        .and_then(Value::as_str)
        .and_then(|raw| ConsentHash::from_hex(raw).ok())
    else {
        return error(StatusCode::BAD_REQUEST, "childIdHash is required");
    };

    match circuit.as_str() {
        "grant_consent" => {
            state.registry.insert(hash);
        }
        "revoke_consent" => {
            state.registry.remove(&hash);
        }
        _ => return error(StatusCode::NOT_FOUND, "unknown circuit"),
    }

    state.submissions += 1;
    let tx_id = format!("0x{:064x}", state.submissions);
    Json(json!({ "txId": tx_id })).into_response()
}

async fn primary_indexer(State(state): Shared, Json(body): Json<Value>) -> Response {
    let state = state.lock().unwrap();
    indexer_response(state.primary, &state.registry, &body)
}

async fn fallback_indexer(State(state): Shared, Json(body): Json<Value>) -> Response {
    let state = state.lock().unwrap();
    indexer_response(state.fallback, &state.registry, &body)
}

fn indexer_response(mode: IndexerMode, registry: &BTreeSet<ConsentHash>, body: &Value) -> Response {
    let address = body
        .pointer("/variables/address")
        .and_then(Value::as_str)
        .unwrap_or_default();

    if mode == IndexerMode::Down {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "indexer offline");
    }
    if address != CONTRACT {
        return Json(json!({ "data": { "contractState": null } })).into_response();
    }

    let ledger = match mode {
        IndexerMode::RawBlob => {
            let blob: String = registry.iter().map(|h| h.to_hex()).collect();
            json!(blob)
        }
        _ => {
            let entries: Vec<Value> = registry
                .iter()
                .map(|h| json!({ "key": h.to_hex(), "value": true }))
                .collect();
            json!({ "consentRegistry": entries })
        }
    };

    Json(json!({ "data": { "contractState": { "ledger": ledger } } })).into_response()
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
