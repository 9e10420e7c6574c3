//! Cache types for the product form's select options.

use std::sync::Arc;

use lodra_core::schema::{Brand, Category};

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Categories,
    Brands,
}

#[derive(Debug, Clone)]
pub enum CacheValue {
    Categories(Arc<Vec<Category>>),
    Brands(Arc<Vec<Brand>>),
}
