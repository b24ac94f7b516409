// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identifier validation and cleaning.
//!
//! Identifiers must be unique within a model, at most 100 characters, and
//! limited to ASCII letters, digits, underscores, hyphens and periods.

use crate::error::{Error, Result};

pub const MAX_IDENTIFIER_LENGTH: usize = 100;

fn is_legal_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.'
}

/// Validates an identifier, returning it on success.
pub fn validate_identifier(id: &str) -> Result<&str> {
    if id.is_empty() {
        return Err(Error::InvalidIdentifier {
            id: id.to_string(),
            reason: "identifier cannot be empty".to_string(),
        });
    }
    if id.len() > MAX_IDENTIFIER_LENGTH {
        return Err(Error::InvalidIdentifier {
            id: id.to_string(),
            reason: format!("identifier exceeds {MAX_IDENTIFIER_LENGTH} characters"),
        });
    }
    if let Some(bad) = id.chars().find(|c| !is_legal_char(*c)) {
        return Err(Error::InvalidIdentifier {
            id: id.to_string(),
            reason: format!("illegal character {bad:?}"),
        });
    }
    Ok(id)
}

/// Replaces illegal characters with underscores and truncates to the
/// maximum length. Used when deriving identifiers from display names or
/// prefixes rather than validating user input.
pub fn clean_identifier(id: &str) -> String {
    let mut cleaned: String = id
        .chars()
        .map(|c| if is_legal_char(c) { c } else { '_' })
        .collect();
    cleaned.truncate(MAX_IDENTIFIER_LENGTH);
    if cleaned.is_empty() {
        cleaned.push('_');
    }
    cleaned
}
