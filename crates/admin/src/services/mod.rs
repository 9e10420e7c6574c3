//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Staff login state and token-refreshing backend calls
//! - `flash` - One-shot toasts carried across redirects

pub mod auth;
pub mod flash;
