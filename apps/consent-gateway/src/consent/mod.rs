// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Consent Identifiers
//!
//! Turns a free-text child identifier (email, username, handle) into the
//! [`ConsentHash`] stored in the on-chain consent registry.
//!
//! The parent UI, the child UI, the CLI and the gateway must all derive the
//! same key for the same person, so the derivation here is bit-exact:
//!
//! 1. trim surrounding whitespace and lower-case,
//! 2. SHA-256 over the UTF-8 bytes,
//! 3. read the digest as a big-endian integer and keep the low 252 bits.
//!
//! The 252-bit mask keeps the value inside the proving system's scalar field.

mod error;
mod hash;
mod identifier;

pub use error::ConsentError;
pub use hash::{ConsentHash, FIELD_BITS, HEX_WIDTH};
pub use identifier::{
    hash_identifier, is_valid_identifier, normalize, validate_identifier, MIN_IDENTIFIER_LEN,
};
