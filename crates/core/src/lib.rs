//! Lodra Core - Shared types library.
//!
//! This crate provides common types used across all Lodra components:
//! - `storefront` - Public-facing toy store
//! - `admin` - Staff dashboard for catalog, orders, and customers
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients. The backend REST API owns pricing, inventory, loyalty points and
//! order calculation; this crate only mirrors its JSON shapes and owns the
//! few things that live in the browser session (cart, wishlist).
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, tracking codes, and statuses
//! - [`schema`] - Backend REST payloads (products, orders, accounts)
//! - [`cart`] - Key-unique, insertion-ordered cart and wishlist lists
//! - [`pagination`] - Page-number pagination helpers
//! - [`phone`] - Albanian phone number validation
//! - [`password`] - Password strength scoring

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod pagination;
pub mod password;
pub mod phone;
pub mod schema;
pub mod types;

pub use cart::{Cart, CartItem, ItemList, ListItem, Wishlist, WishlistItem};
pub use pagination::{PageLink, PageLinks, Pagination};
pub use password::{PasswordStrength, score_password};
pub use phone::{PhoneError, PhoneNumber};
pub use types::*;
