// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Consent Stores
//!
//! [`ConsentStore`] is the single authority for grant, revoke and verify.
//! Callers (HTTP handlers, the CLI) only see the trait, so the backing store
//! can be swapped without touching them.
//!
//! | Backend | Mutations | Reads |
//! |---------|-----------|-------|
//! | [`InMemoryConsentStore`] | process-local set | same set |
//! | [`LedgerConsentStore`] | ledger bridge (proved + signed transactions) | indexer, with fallback endpoint |
//! | [`GatewayConsentStore`] | remote gateway REST API | gateway, then indexer fallback |
//!
//! The registry is a set: grants and revokes are idempotent and the latest
//! one for a given hash wins.

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::consent::ConsentHash;

pub mod gateway;
pub mod ledger;
pub mod memory;

pub use gateway::GatewayConsentStore;
pub use ledger::LedgerConsentStore;
pub use memory::InMemoryConsentStore;

/// Which kind of backend a store talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    Ledger,
    Gateway,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::Ledger => "ledger",
            StoreBackend::Gateway => "gateway",
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acknowledgement of a grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantReceipt {
    /// Transaction recorded by the store, if it issues one.
    pub tx_id: Option<String>,
    /// The hash was already present before this call.
    pub already_granted: bool,
}

/// Acknowledgement of a revoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevokeReceipt {
    pub tx_id: Option<String>,
    /// Whether a record was present to remove.
    pub existed: bool,
}

/// Outcome of a membership check.
///
/// `Unknown` is kept apart from `Denied` so callers can show "cannot verify
/// right now" instead of a refusal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Authorized,
    Denied,
    Unknown(String),
}

impl Authorization {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Authorization::Authorized)
    }

    pub fn status(&self) -> &'static str {
        match self {
            Authorization::Authorized => "authorized",
            Authorization::Denied => "denied",
            Authorization::Unknown(_) => "unknown",
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Authorization::Unknown(reason) => Some(reason),
            _ => None,
        }
    }
}

/// One registry member as reported by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentEntry {
    pub hash: ConsentHash,
    pub granted_at: Option<DateTime<Utc>>,
    pub tx_id: Option<String>,
}

/// Errors reported by consent stores.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Consent store not initialized: {0}")]
    NotInitialized(String),

    #[error("Consent store unavailable: {0}")]
    Unavailable(String),

    #[error("Consent store rejected the request: {0}")]
    Rejected(String),

    #[error("Operation not supported by the {0} store")]
    Unsupported(&'static str),
}

/// Capability set shared by every consent backend.
#[async_trait]
pub trait ConsentStore: Send + Sync {
    fn backend(&self) -> StoreBackend;

    /// Whether mutations can currently be accepted.
    async fn is_ready(&self) -> bool {
        true
    }

    /// Insert `hash` into the registry. Idempotent.
    async fn grant(&self, hash: &ConsentHash) -> Result<GrantReceipt, StoreError>;

    /// Remove `hash` from the registry. Removing an absent hash is not an error.
    async fn revoke(&self, hash: &ConsentHash) -> Result<RevokeReceipt, StoreError>;

    /// Read-only membership check. Never fails; failures become `Unknown`.
    async fn verify(&self, hash: &ConsentHash) -> Authorization;

    /// Current registry members.
    async fn list(&self) -> Result<Vec<ConsentEntry>, StoreError>;
}

/// Run a fallible store call with an upper bound on its duration.
pub async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Unavailable(format!(
            "timed out after {}s",
            timeout.as_secs_f32()
        ))),
    }
}

/// Run a verification with an upper bound on its duration.
pub async fn bounded_verify<F>(timeout: Duration, call: F) -> Authorization
where
    F: Future<Output = Authorization>,
{
    tokio::time::timeout(timeout, call).await.unwrap_or_else(|_| {
        Authorization::Unknown(format!(
            "verification timed out after {}s",
            timeout.as_secs_f32()
        ))
    })
}
