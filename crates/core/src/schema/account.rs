//! Account payloads: authentication, profile, addresses, loyalty points,
//! and the admin view of customers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AddressId, CustomerId, Price, UserId};

/// The logged-in user, as returned by `/me/` and `/login/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub loyalty_points: i64,
}

impl User {
    /// Name for greetings, falling back to the email address.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }
}

/// Body of `POST /login/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response of `POST /login/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub user: Option<User>,
}

/// Body of `POST /token/refresh/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Response of `POST /token/refresh/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access: String,
}

/// Body of `POST /register/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// Body of `PATCH /me/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// Saved delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    #[serde(default)]
    pub label: Option<String>,
    pub full_name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Create/update payload for addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInput {
    pub label: Option<String>,
    pub full_name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub postal_code: Option<String>,
    pub is_default: bool,
}

/// One earn/spend entry in the loyalty history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyTransaction {
    pub points: i64,
    #[serde(default)]
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Response of `GET /loyalty-points/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyPoints {
    pub balance: i64,
    #[serde(default)]
    pub lifetime_earned: i64,
    #[serde(default)]
    pub history: Vec<LoyaltyTransaction>,
}

/// A customer as seen from the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub date_joined: DateTime<Utc>,
    #[serde(default)]
    pub orders_count: u64,
    #[serde(default)]
    pub total_spent: Price,
    #[serde(default)]
    pub loyalty_points: i64,
}

/// Response of `GET /admin/stats/`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub products_count: u64,
    #[serde(default)]
    pub orders_count: u64,
    #[serde(default)]
    pub customers_count: u64,
    #[serde(default)]
    pub pending_orders: u64,
    #[serde(default)]
    pub revenue: Price,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_email() {
        let mut user: User =
            serde_json::from_str(r#"{"id": 1, "email": "ana@lodra.al"}"#).unwrap();
        assert_eq!(user.display_name(), "ana@lodra.al");
        assert!(!user.is_staff);

        user.first_name = "Ana".to_string();
        assert_eq!(user.display_name(), "Ana");
    }

    #[test]
    fn test_token_pair_without_user() {
        let tokens: TokenPair =
            serde_json::from_str(r#"{"access": "a", "refresh": "r"}"#).unwrap();
        assert!(tokens.user.is_none());
    }
}
