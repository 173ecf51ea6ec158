// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use sha2::{Digest, Sha256};

use super::{ConsentError, ConsentHash};

/// Shortest identifier accepted by [`validate_identifier`].
pub const MIN_IDENTIFIER_LEN: usize = 3;

/// Whitespace as browsers trim it: Unicode `White_Space` plus the BOM,
/// minus NEXT LINE (U+0085), which `String.prototype.trim` keeps.
fn is_trim_char(c: char) -> bool {
    (c.is_whitespace() && c != '\u{85}') || c == '\u{feff}'
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '-' | '_')
}

/// Canonical form of an identifier: trimmed and lower-cased.
pub fn normalize(identifier: &str) -> String {
    identifier.trim_matches(is_trim_char).to_lowercase()
}

/// Check an identifier against the input rules and return its normalized form.
///
/// The rules apply to the trimmed input before lower-casing, so characters
/// that only become ASCII once lower-cased (such as the Kelvin sign) are
/// still rejected.
pub fn validate_identifier(identifier: &str) -> Result<String, ConsentError> {
    let trimmed = identifier.trim_matches(is_trim_char);

    if trimmed.is_empty() {
        return Err(ConsentError::InvalidIdentifier(
            "identifier is required".to_string(),
        ));
    }

    let len = trimmed.chars().count();
    if len < MIN_IDENTIFIER_LEN {
        return Err(ConsentError::InvalidIdentifier(format!(
            "identifier must be at least {MIN_IDENTIFIER_LEN} characters"
        )));
    }

    if let Some(bad) = trimmed.chars().find(|c| !is_identifier_char(*c)) {
        return Err(ConsentError::InvalidIdentifier(format!(
            "unsupported character {bad:?}; use letters, digits, '@', '.', '-' or '_'"
        )));
    }

    Ok(trimmed.to_lowercase())
}

pub fn is_valid_identifier(identifier: &str) -> bool {
    validate_identifier(identifier).is_ok()
}

/// Derive the registry key for an identifier.
///
/// Only rejects identifiers that normalize to nothing; callers that take user
/// input run [`validate_identifier`] first.
pub fn hash_identifier(identifier: &str) -> Result<ConsentHash, ConsentError> {
    let normalized = normalize(identifier);
    if normalized.is_empty() {
        return Err(ConsentError::EmptyIdentifier);
    }

    let digest: [u8; 32] = Sha256::digest(normalized.as_bytes()).into();
    Ok(ConsentHash::from_digest(digest))
}
