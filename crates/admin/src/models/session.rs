//! Session-related types for admin authentication.
//!
//! Types stored in the session for authentication state.

use lodra_core::UserId;
use lodra_core::schema::User;
use serde::{Deserialize, Serialize};

/// Session-stored staff identity.
///
/// Minimal data stored in the session to identify the logged-in staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Backend user ID.
    pub id: UserId,
    /// Staff member's email address.
    pub email: String,
    /// Staff member's display name.
    pub name: String,
}

impl CurrentAdmin {
    /// Build the session identity from a backend user.
    ///
    /// Returns `None` for users without staff rights.
    #[must_use]
    pub fn from_staff(user: &User) -> Option<Self> {
        user.is_staff.then(|| Self {
            id: user.id,
            email: user.email.clone(),
            name: user.display_name(),
        })
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in staff member.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Backend access token.
    pub const TOKEN: &str = "token";

    /// Backend refresh token.
    pub const REFRESH_TOKEN: &str = "refresh_token";

    /// One-shot toast shown on the next rendered page.
    pub const FLASH: &str = "flash";
}

/// Toast style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    /// CSS modifier for the toast.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self {
            Self::Success => "toast-success",
            Self::Error => "toast-error",
        }
    }
}

/// A toast message carried across one redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_only_staff_become_admins() {
        let mut user: User = serde_json::from_str(
            r#"{"id": 2, "email": "staf@lodra.al", "first_name": "Era", "last_name": "Krasniqi"}"#,
        )
        .unwrap();
        assert!(CurrentAdmin::from_staff(&user).is_none());

        user.is_staff = true;
        let admin = CurrentAdmin::from_staff(&user).unwrap();
        assert_eq!(admin.name, "Era Krasniqi");
        assert_eq!(admin.id, UserId::new(2));
    }
}
