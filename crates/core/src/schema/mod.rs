//! Backend REST payloads.
//!
//! The backend owns the schema; these types only mirror the JSON shapes so
//! handlers get compile-time checked fields. Optional fields default when
//! the backend omits them, and no invariants are enforced here.

pub mod account;
pub mod catalog;
pub mod order;

pub use account::*;
pub use catalog::*;
pub use order::*;

use serde::{Deserialize, Serialize};

/// Page-number paginated list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Total number of matching records across all pages.
    pub count: u64,
    /// URL of the next page, if any.
    #[serde(default)]
    pub next: Option<String>,
    /// URL of the previous page, if any.
    #[serde(default)]
    pub previous: Option<String>,
    /// Records on this page.
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    /// An empty page, used when a listing fails to load.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}

impl<T> Default for Paginated<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Field-level validation errors returned with HTTP 400.
///
/// The backend answers `{"field": ["message", ...], "detail": "..."}`.
pub type FieldErrors = std::collections::BTreeMap<String, Vec<String>>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_paginated_decodes_without_links() {
        let page: Paginated<u32> =
            serde_json::from_str(r#"{"count": 2, "results": [1, 2]}"#).unwrap();
        assert_eq!(page.count, 2);
        assert!(page.next.is_none());
        assert_eq!(page.results, vec![1, 2]);
    }
}
