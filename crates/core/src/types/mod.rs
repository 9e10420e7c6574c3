//! Core types for Lodra.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod status;
pub mod tracking;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, format_lek};
pub use status::*;
pub use tracking::{TrackingCode, TrackingCodeError};
