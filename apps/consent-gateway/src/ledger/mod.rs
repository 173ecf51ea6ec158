// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger integration for the consent registry contract.
//!
//! This module provides clients for the two external services that front
//! the blockchain:
//! - the **ledger bridge**, which proves, balances, signs and submits
//!   `grant_consent` / `revoke_consent` circuit calls on our behalf
//! - the **indexer**, which serves the contract's decoded public ledger state

pub mod bridge;
pub mod indexer;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

pub use bridge::{BridgeStatus, LedgerBridge};
pub use indexer::{IndexerClient, RegistrySnapshot};
pub use types::*;
