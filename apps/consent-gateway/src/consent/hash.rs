// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{fmt, str::FromStr};

use alloy::primitives::U256;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::ConsentError;

/// Number of low-order digest bits kept in a consent hash.
pub const FIELD_BITS: usize = 252;

/// Width of the wire rendering: 256 bits as zero-padded hex.
pub const HEX_WIDTH: usize = 64;

/// `2^252 - 1`, limbs are little-endian.
const FIELD_MASK: U256 = U256::from_limbs([u64::MAX, u64::MAX, u64::MAX, u64::MAX >> 4]);

/// A field element identifying one child in the consent registry.
///
/// Always strictly below `2^252`. On the wire it is rendered as 64 lower-case
/// hex characters, big-endian and zero-padded, so renderings round-trip
/// exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConsentHash(U256);

impl ConsentHash {
    /// Build a hash from a raw 256-bit digest, discarding the top four bits.
    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self(U256::from_be_bytes(digest) & FIELD_MASK)
    }

    /// Wrap an integer that is already a field element.
    pub fn from_u256(value: U256) -> Result<Self, ConsentError> {
        if value > FIELD_MASK {
            return Err(ConsentError::MalformedHash(format!(
                "value does not fit in {FIELD_BITS} bits"
            )));
        }
        Ok(Self(value))
    }

    /// Parse a hex rendering.
    ///
    /// Accepts an optional `0x` prefix followed by 1 to 64 hex digits in
    /// either case. Shorter inputs are treated as left-padded with zeros.
    pub fn from_hex(raw: &str) -> Result<Self, ConsentError> {
        let digits = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .unwrap_or(raw);

        if digits.is_empty() {
            return Err(ConsentError::MalformedHash(
                "hash must not be empty".to_string(),
            ));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ConsentError::MalformedHash(
                "hash must be a valid hex string".to_string(),
            ));
        }
        if digits.len() > HEX_WIDTH {
            return Err(ConsentError::MalformedHash(format!(
                "expected at most {HEX_WIDTH} hex digits, got {}",
                digits.len()
            )));
        }

        let value = U256::from_str_radix(digits, 16)
            .map_err(|e| ConsentError::MalformedHash(e.to_string()))?;
        Self::from_u256(value)
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0.to_be_bytes::<32>()
    }

    /// Fixed-width wire rendering (64 lower-case hex characters, no prefix).
    pub fn to_hex(&self) -> String {
        alloy::primitives::hex::encode(self.to_be_bytes())
    }

    /// Abbreviated form for log lines, e.g. `0x0c122e20...87b56727`.
    pub fn short(&self) -> String {
        let hex = self.to_hex();
        format!("0x{}...{}", &hex[..8], &hex[HEX_WIDTH - 8..])
    }
}

impl fmt::Display for ConsentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ConsentHash {
    type Err = ConsentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for ConsentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ConsentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(&raw).map_err(de::Error::custom)
    }
}
