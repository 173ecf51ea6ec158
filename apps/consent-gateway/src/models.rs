// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the consent REST API. Field names are
//! camelCase on the wire. Consent hashes travel as 64-character hex strings.
//!
//! Responses also derive `Deserialize` so the gateway client can read them
//! back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Consent Operations
// =============================================================================

/// Body of `POST /api/consent/grant` and `POST /api/consent/revoke`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConsentRequest {
    /// Hex-encoded consent hash (up to 64 digits, optional `0x` prefix).
    #[schema(example = "0c122e20824bdb992685421cd322a5d391b89cdbe59dea875fbd1c7e87b56727")]
    pub child_id_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GrantConsentResponse {
    pub success: bool,
    /// Transaction recorded for the grant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_id_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    /// The hash was already in the registry.
    #[serde(default)]
    pub already_granted: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RevokeConsentResponse {
    pub success: bool,
    /// Whether the hash was present before the revoke.
    pub existed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_id_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Verification verdict.
///
/// `status` is `authorized`, `denied` or `unknown`. An `unknown` verdict
/// always carries `error` and must not be read as a denial.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerifyConsentResponse {
    pub is_authorized: bool,
    #[schema(example = "authorized")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_id_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConsentListEntry {
    pub child_id_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConsentListResponse {
    pub total: usize,
    pub consents: Vec<ConsentListEntry>,
}

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `ok` when mutations can be served, `starting` otherwise.
    pub status: String,
    pub network: String,
    /// Registry backend (`memory` or `ledger`).
    pub mode: String,
    pub ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    /// Registry size, when the backend can count cheaply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_consents: Option<usize>,
    pub timestamp: DateTime<Utc>,
}

/// Liveness probe response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct LivenessResponse {
    pub status: String,
}
