// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

/// Errors raised before anything reaches a consent store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsentError {
    /// The identifier failed the input rules (length or character class).
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Normalization left nothing to hash.
    #[error("Identifier cannot be empty")]
    EmptyIdentifier,

    /// A hex-rendered consent hash could not be parsed.
    #[error("Malformed consent hash: {0}")]
    MalformedHash(String),
}
