//! Session-backed services for the storefront.
//!
//! # Services
//!
//! - `storage` - Cart, wishlist and flash messages kept in the browser session
//! - `auth` - Login state and authenticated backend calls with token refresh

pub mod auth;
pub mod storage;
