// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger-backed consent registry.
//!
//! Grants and revokes become `grant_consent` / `revoke_consent` transactions
//! submitted through the ledger bridge; verification reads the public
//! registry through the indexer.
//!
//! The bridge session is established once, on first use or by the startup
//! warm-up. Until it succeeds, mutations fail with `NotInitialized` while
//! reads keep working.

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::{
    Authorization, ConsentEntry, ConsentStore, GrantReceipt, RevokeReceipt, StoreBackend,
    StoreError,
};
use crate::consent::ConsentHash;
use crate::ledger::{Circuit, ContractAddress, IndexerClient, LedgerBridge, LedgerError};

#[derive(Debug, Clone)]
struct BridgeSession {
    network_id: Option<String>,
}

pub struct LedgerConsentStore {
    contract: Option<ContractAddress>,
    bridge: LedgerBridge,
    indexer: IndexerClient,
    session: OnceCell<BridgeSession>,
}

impl LedgerConsentStore {
    pub fn new(
        contract: Option<ContractAddress>,
        bridge: LedgerBridge,
        indexer: IndexerClient,
    ) -> Self {
        Self {
            contract,
            bridge,
            indexer,
            session: OnceCell::new(),
        }
    }

    pub fn contract_address(&self) -> Option<&ContractAddress> {
        self.contract.as_ref()
    }

    /// Establish the bridge session if it is not up yet.
    pub async fn connect(&self) -> Result<(), StoreError> {
        self.session().await.map(|_| ())
    }

    fn deployed_contract(&self) -> Result<&ContractAddress, StoreError> {
        self.contract
            .as_ref()
            .ok_or_else(|| StoreError::NotInitialized("Contract not deployed".to_string()))
    }

    async fn session(&self) -> Result<&BridgeSession, StoreError> {
        let contract = self.deployed_contract()?;

        self.session
            .get_or_try_init(|| async {
                let status = self.bridge.status().await.map_err(|e| {
                    StoreError::NotInitialized(format!("ledger bridge not reachable: {e}"))
                })?;

                if !status.synced {
                    return Err(StoreError::NotInitialized(
                        "ledger bridge wallet is still syncing".to_string(),
                    ));
                }

                tracing::info!(
                    contract = %contract,
                    bridge = %self.bridge.base_url(),
                    network = status.network_id.as_deref().unwrap_or("unknown"),
                    "Ledger bridge session established"
                );

                Ok(BridgeSession {
                    network_id: status.network_id,
                })
            })
            .await
    }

    async fn submit(
        &self,
        contract: &ContractAddress,
        circuit: Circuit,
        hash: &ConsentHash,
    ) -> Result<String, StoreError> {
        let session = self.session().await?;

        let tx_id = self
            .bridge
            .submit(contract, circuit, hash)
            .await
            .map_err(store_error)?;

        tracing::info!(
            circuit = %circuit,
            hash = %hash.short(),
            tx_id = %tx_id,
            network = session.network_id.as_deref().unwrap_or("unknown"),
            "Circuit call accepted by ledger"
        );

        Ok(tx_id)
    }
}

fn store_error(err: LedgerError) -> StoreError {
    match err {
        LedgerError::Rejected(message) => StoreError::Rejected(message),
        other => StoreError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl ConsentStore for LedgerConsentStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Ledger
    }

    async fn is_ready(&self) -> bool {
        self.session.initialized()
    }

    async fn grant(&self, hash: &ConsentHash) -> Result<GrantReceipt, StoreError> {
        let contract = self.deployed_contract()?;
        let tx_id = self.submit(contract, Circuit::GrantConsent, hash).await?;

        // The on-chain set absorbs duplicates, so no pre-read is made here.
        Ok(GrantReceipt {
            tx_id: Some(tx_id),
            already_granted: false,
        })
    }

    async fn revoke(&self, hash: &ConsentHash) -> Result<RevokeReceipt, StoreError> {
        let contract = self.deployed_contract()?;
        self.session().await?;

        let existed = self.indexer.is_member(contract, hash).await.map_err(|e| {
            StoreError::Unavailable(format!("cannot confirm existing consent: {e}"))
        })?;

        if !existed {
            tracing::debug!(hash = %hash.short(), "Nothing to revoke on ledger");
            return Ok(RevokeReceipt {
                tx_id: None,
                existed: false,
            });
        }

        let tx_id = self.submit(contract, Circuit::RevokeConsent, hash).await?;
        Ok(RevokeReceipt {
            tx_id: Some(tx_id),
            existed: true,
        })
    }

    async fn verify(&self, hash: &ConsentHash) -> Authorization {
        let Some(contract) = self.contract.as_ref() else {
            return Authorization::Unknown("Contract not deployed".to_string());
        };

        match self.indexer.is_member(contract, hash).await {
            Ok(true) => Authorization::Authorized,
            Ok(false) => Authorization::Denied,
            Err(e) => {
                tracing::warn!(hash = %hash.short(), error = %e, "Consent verification failed");
                Authorization::Unknown(e.to_string())
            }
        }
    }

    async fn list(&self) -> Result<Vec<ConsentEntry>, StoreError> {
        let contract = self.deployed_contract()?;
        let snapshot = self
            .indexer
            .registry(contract)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(snapshot
            .iter()
            .map(|hash| ConsentEntry {
                hash: *hash,
                granted_at: None,
                tx_id: None,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::consent::hash_identifier;
    use crate::ledger::fake::{FakeLedger, IndexerMode, CONTRACT};

    fn child() -> ConsentHash {
        hash_identifier("child@example.com").unwrap()
    }

    fn store_for(fake: &FakeLedger, contract: Option<&str>) -> LedgerConsentStore {
        let timeout = Duration::from_secs(5);
        LedgerConsentStore::new(
            contract.map(|c| ContractAddress::parse(c).unwrap()),
            LedgerBridge::new(fake.bridge_url(), timeout).unwrap(),
            IndexerClient::new(
                fake.primary_indexer_url(),
                Some(fake.fallback_indexer_url()),
                timeout,
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn grant_then_verify_round_trip() {
        let fake = FakeLedger::start().await;
        let store = store_for(&fake, Some(CONTRACT));

        assert!(!store.is_ready().await);
        let receipt = store.grant(&child()).await.unwrap();
        assert!(receipt.tx_id.is_some());
        assert!(store.is_ready().await);

        assert_eq!(store.verify(&child()).await, Authorization::Authorized);

        let other = hash_identifier("stranger@example.com").unwrap();
        assert_eq!(store.verify(&other).await, Authorization::Denied);
    }

    #[tokio::test]
    async fn revoke_removes_membership() {
        let fake = FakeLedger::start().await;
        let store = store_for(&fake, Some(CONTRACT));
        store.grant(&child()).await.unwrap();

        let receipt = store.revoke(&child()).await.unwrap();
        assert!(receipt.existed);
        assert!(receipt.tx_id.is_some());
        assert_eq!(store.verify(&child()).await, Authorization::Denied);
    }

    #[tokio::test]
    async fn revoke_of_absent_hash_submits_nothing() {
        let fake = FakeLedger::start().await;
        let store = store_for(&fake, Some(CONTRACT));

        let receipt = store.revoke(&child()).await.unwrap();
        assert!(!receipt.existed);
        assert!(receipt.tx_id.is_none());
        assert_eq!(fake.submissions(), 0);
    }

    #[tokio::test]
    async fn mutations_wait_for_bridge_sync() {
        let fake = FakeLedger::start().await;
        fake.set_synced(false);
        let store = store_for(&fake, Some(CONTRACT));

        let err = store.grant(&child()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotInitialized(_)));
        assert!(!store.is_ready().await);

        fake.set_synced(true);
        store.connect().await.unwrap();
        assert!(store.grant(&child()).await.is_ok());
    }

    #[tokio::test]
    async fn missing_contract_blocks_mutations_and_reads() {
        let fake = FakeLedger::start().await;
        let store = store_for(&fake, None);

        assert!(matches!(
            store.grant(&child()).await,
            Err(StoreError::NotInitialized(_))
        ));
        assert!(matches!(
            store.verify(&child()).await,
            Authorization::Unknown(_)
        ));
    }

    #[tokio::test]
    async fn rejection_is_surfaced_verbatim() {
        let fake = FakeLedger::start().await;
        fake.reject_submissions("invalid signature");
        let store = store_for(&fake, Some(CONTRACT));

        let err = store.grant(&child()).await.unwrap_err();
        assert_eq!(err, StoreError::Rejected("invalid signature".to_string()));
    }

    #[tokio::test]
    async fn verify_uses_fallback_indexer() {
        let fake = FakeLedger::start().await;
        fake.insert(&child());
        fake.set_primary_indexer(IndexerMode::Down);
        let store = store_for(&fake, Some(CONTRACT));

        assert_eq!(store.verify(&child()).await, Authorization::Authorized);
    }

    #[tokio::test]
    async fn verify_is_unknown_when_indexers_fail() {
        let fake = FakeLedger::start().await;
        fake.insert(&child());
        fake.set_primary_indexer(IndexerMode::Down);
        fake.set_fallback_indexer(IndexerMode::Down);
        let store = store_for(&fake, Some(CONTRACT));

        let outcome = store.verify(&child()).await;
        assert!(matches!(outcome, Authorization::Unknown(_)));
        assert!(!outcome.is_authorized());
    }

    #[tokio::test]
    async fn raw_state_blob_never_authorizes() {
        let fake = FakeLedger::start().await;
        fake.insert(&child());
        fake.set_primary_indexer(IndexerMode::RawBlob);
        fake.set_fallback_indexer(IndexerMode::RawBlob);
        let store = store_for(&fake, Some(CONTRACT));

        assert!(matches!(
            store.verify(&child()).await,
            Authorization::Unknown(_)
        ));
    }

    #[tokio::test]
    async fn revoke_fails_when_membership_cannot_be_read() {
        let fake = FakeLedger::start().await;
        fake.insert(&child());
        fake.set_primary_indexer(IndexerMode::Down);
        fake.set_fallback_indexer(IndexerMode::Down);
        let store = store_for(&fake, Some(CONTRACT));

        assert!(matches!(
            store.revoke(&child()).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(fake.contains(&child()));
    }

    #[tokio::test]
    async fn list_reads_registry() {
        let fake = FakeLedger::start().await;
        fake.insert(&child());
        let store = store_for(&fake, Some(CONTRACT));

        let entries = store.list().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].hash, child());
    }
}
