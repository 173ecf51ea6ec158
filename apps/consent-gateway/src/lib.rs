// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ZK Consent Gateway - Parental Consent Registry Service
//!
//! Parents grant consent for a child's identifier; child-facing apps verify
//! it. Only a 252-bit hash of the identifier ever leaves the client, and the
//! registry itself lives on a privacy-preserving ledger.
//!
//! ## Modules
//!
//! - `consent` - Identifier normalization, validation and hashing
//! - `store` - The `ConsentStore` trait and its memory, ledger and gateway backends
//! - `ledger` - Ledger bridge and indexer clients
//! - `api` - HTTP API handlers (Axum)
//! - `app` - Store selection, seeding and server lifecycle

pub mod api;
pub mod app;
pub mod config;
pub mod consent;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod state;
pub mod store;
