//! Cache types for backend responses.

use std::sync::Arc;

use lodra_core::schema::{Brand, Category};

/// Cache key for slow-changing catalog lists.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Categories,
    Brands,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Categories(Arc<Vec<Category>>),
    Brands(Arc<Vec<Brand>>),
}
