// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory consent registry for local development.
//!
//! Simulates the on-chain set without a wallet, proof server or deployed
//! contract. State is lost when the process exits.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Authorization, ConsentEntry, ConsentStore, GrantReceipt, RevokeReceipt, StoreBackend,
    StoreError,
};
use crate::consent::ConsentHash;

#[derive(Debug, Clone)]
struct GrantRecord {
    granted_at: DateTime<Utc>,
    tx_id: String,
}

#[derive(Default)]
pub struct InMemoryConsentStore {
    registry: RwLock<HashMap<ConsentHash, GrantRecord>>,
}

impl InMemoryConsentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of granted hashes.
    pub async fn len(&self) -> usize {
        self.registry.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.registry.read().await.is_empty()
    }
}

fn simulated_tx_id() -> String {
    format!("0xmock{}", Uuid::new_v4().simple())
}

#[async_trait]
impl ConsentStore for InMemoryConsentStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Memory
    }

    async fn grant(&self, hash: &ConsentHash) -> Result<GrantReceipt, StoreError> {
        let mut registry = self.registry.write().await;

        if let Some(existing) = registry.get(hash) {
            tracing::debug!(hash = %hash.short(), "Consent already granted");
            return Ok(GrantReceipt {
                tx_id: Some(existing.tx_id.clone()),
                already_granted: true,
            });
        }

        let tx_id = simulated_tx_id();
        registry.insert(
            *hash,
            GrantRecord {
                granted_at: Utc::now(),
                tx_id: tx_id.clone(),
            },
        );

        tracing::info!(
            hash = %hash.short(),
            tx_id = %tx_id,
            total = registry.len(),
            "Consent granted (simulated)"
        );

        Ok(GrantReceipt {
            tx_id: Some(tx_id),
            already_granted: false,
        })
    }

    async fn revoke(&self, hash: &ConsentHash) -> Result<RevokeReceipt, StoreError> {
        let existed = self.registry.write().await.remove(hash).is_some();

        if existed {
            tracing::info!(hash = %hash.short(), "Consent revoked (simulated)");
        } else {
            tracing::debug!(hash = %hash.short(), "Revoke for hash with no consent");
        }

        Ok(RevokeReceipt {
            tx_id: existed.then(simulated_tx_id),
            existed,
        })
    }

    async fn verify(&self, hash: &ConsentHash) -> Authorization {
        if self.registry.read().await.contains_key(hash) {
            Authorization::Authorized
        } else {
            Authorization::Denied
        }
    }

    async fn list(&self) -> Result<Vec<ConsentEntry>, StoreError> {
        let registry = self.registry.read().await;
        let mut entries: Vec<ConsentEntry> = registry
            .iter()
            .map(|(hash, record)| ConsentEntry {
                hash: *hash,
                granted_at: Some(record.granted_at),
                tx_id: Some(record.tx_id.clone()),
            })
            .collect();
        entries.sort_by_key(|entry| entry.granted_at);
        Ok(entries)
    }
}
