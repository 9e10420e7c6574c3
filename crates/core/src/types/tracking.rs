//! Order tracking codes for guest order lookup.
//!
//! Codes are generated by the backend when an order is created. Customers
//! type them back into the lookup form, so parsing is forgiving about case
//! and surrounding whitespace.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`TrackingCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackingCodeError {
    #[error("tracking code cannot be empty")]
    Empty,
    #[error("tracking code must be at most {max} characters")]
    TooLong { max: usize },
    #[error("tracking code may only contain letters, digits and '-'")]
    InvalidCharacter,
}

/// A backend-generated order tracking code, e.g. `LD-7F3K9Q`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingCode(String);

impl TrackingCode {
    /// Maximum accepted length.
    pub const MAX_LENGTH: usize = 32;

    /// Parse a tracking code the customer typed.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is empty, too long, or contains
    /// characters other than ASCII letters, digits and `-`.
    pub fn parse(s: &str) -> Result<Self, TrackingCodeError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TrackingCodeError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(TrackingCodeError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(TrackingCodeError::InvalidCharacter);
        }
        Ok(Self(s.to_ascii_uppercase()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalises() {
        let code = TrackingCode::parse("  ld-7f3k9q ").unwrap();
        assert_eq!(code.as_str(), "LD-7F3K9Q");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(TrackingCode::parse(""), Err(TrackingCodeError::Empty));
        assert_eq!(
            TrackingCode::parse("LD 7F3"),
            Err(TrackingCodeError::InvalidCharacter)
        );
        assert_eq!(
            TrackingCode::parse("../etc"),
            Err(TrackingCodeError::InvalidCharacter)
        );
        assert!(matches!(
            TrackingCode::parse(&"A".repeat(40)),
            Err(TrackingCodeError::TooLong { .. })
        ));
    }
}
