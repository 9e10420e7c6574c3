//! Session-backed models for admin.

pub mod session;

pub use session::{CurrentAdmin, Flash, FlashKind, keys as session_keys};
