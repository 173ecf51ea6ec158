// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Duration;

use crate::config::DEFAULT_STORE_TIMEOUT;
use crate::ledger::DEFAULT_NETWORK_ID;
use crate::store::{ConsentStore, InMemoryConsentStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ConsentStore>,
    pub network_id: String,
    /// Reported in responses; `None` until a contract is deployed.
    pub contract_address: Option<String>,
    pub store_timeout: Duration,
}

impl AppState {
    pub fn new(store: Arc<dyn ConsentStore>) -> Self {
        Self {
            store,
            network_id: DEFAULT_NETWORK_ID.to_string(),
            contract_address: None,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_network(mut self, network_id: impl Into<String>) -> Self {
        self.network_id = network_id.into();
        self
    }

    pub fn with_contract_address(mut self, address: Option<String>) -> Self {
        self.contract_address = address;
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryConsentStore::new()))
    }
}
