// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wiring between configuration, the selected consent store and the HTTP
//! server.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::api::router;
use crate::config::{ConfigError, GatewayConfig, StoreMode};
use crate::consent::{hash_identifier, validate_identifier};
use crate::ledger::{IndexerClient, LedgerBridge, LedgerError};
use crate::state::AppState;
use crate::store::{ConsentStore, InMemoryConsentStore, LedgerConsentStore};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// A configured gateway, ready to serve.
pub struct Gateway {
    pub state: AppState,
    /// Set when the ledger backend is selected, so its session can be warmed.
    pub ledger: Option<Arc<LedgerConsentStore>>,
}

/// Build the ledger-backed store described by `config`.
pub fn ledger_store(config: &GatewayConfig) -> Result<LedgerConsentStore, LedgerError> {
    let bridge = LedgerBridge::new(config.bridge_url.clone(), config.store_timeout)?;
    let indexer = IndexerClient::new(
        config.indexer_url.clone(),
        config.indexer_fallback_url.clone(),
        config.store_timeout,
    )?;
    Ok(LedgerConsentStore::new(
        config.contract_address.clone(),
        bridge,
        indexer,
    ))
}

pub async fn build(config: &GatewayConfig) -> Result<Gateway, AppError> {
    let mut ledger = None;
    let store: Arc<dyn ConsentStore> = match config.store_mode {
        StoreMode::Memory => {
            let store = InMemoryConsentStore::new();
            seed(&store, &config.seed_identifiers).await;
            Arc::new(store)
        }
        StoreMode::Ledger => {
            if !config.seed_identifiers.is_empty() {
                tracing::warn!("Seed identifiers are ignored by the ledger store");
            }
            let store = Arc::new(ledger_store(config)?);
            ledger = Some(store.clone());
            store
        }
    };

    let state = AppState::new(store)
        .with_network(config.network_id.clone())
        .with_contract_address(config.contract_address.as_ref().map(|c| c.to_string()))
        .with_store_timeout(config.store_timeout);

    Ok(Gateway { state, ledger })
}

/// Grant consent for each identifier. Invalid identifiers are skipped.
pub async fn seed(store: &dyn ConsentStore, identifiers: &[String]) -> usize {
    let mut seeded = 0;
    for identifier in identifiers {
        let hash = match validate_identifier(identifier).and_then(|id| hash_identifier(&id)) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping seed identifier");
                continue;
            }
        };
        match store.grant(&hash).await {
            Ok(_) => seeded += 1,
            Err(e) => tracing::warn!(hash = %hash.short(), error = %e, "Seeding consent failed"),
        }
    }
    if seeded > 0 {
        tracing::info!(count = seeded, "Seeded consent registry");
    }
    seeded
}

/// Establish the ledger session in the background so the first grant does
/// not pay for it. Failure leaves the store serving 503 until a later call
/// succeeds.
pub fn warm_up(ledger: Arc<LedgerConsentStore>, shutdown: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            result = ledger.connect() => match result {
                Ok(()) => tracing::info!("Ledger store ready"),
                Err(e) => tracing::warn!(error = %e, "Ledger store not ready yet"),
            },
            _ = shutdown.cancelled() => {}
        }
    });
}

/// Serve the API until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

/// Cancel `token` on Ctrl-C or SIGTERM.
pub async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    token.cancel();
}
