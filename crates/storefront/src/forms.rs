//! Form payloads and server-side validation.
//!
//! Validation runs before any backend call, so a rejected form never reaches
//! the backend. Messages are Albanian and shown next to each field.

use std::collections::BTreeMap;

use lodra_core::schema::{
    AddressInput, CreateOrderRequest, GuestInfo, OrderCalculationRequest, ProfileUpdate,
    RegisterRequest,
};
use lodra_core::{AddressId, Cart, Email, PaymentMethod, PhoneNumber, score_password};
use serde::Deserialize;

use crate::api::ApiError;

pub const REQUIRED: &str = "Kjo fushë është e detyrueshme";
pub const PASSWORD_MISMATCH: &str = "Fjalëkalimet nuk përputhen";
pub const PASSWORD_TOO_WEAK: &str = "Fjalëkalimi është shumë i dobët";

/// Per-field error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<String, String>,
    /// Form-level message not tied to a field.
    pub general: Option<String>,
}

impl FormErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field. The first message per field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    /// Message for a field, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.general.is_none()
    }

    /// Form-level error with no field messages.
    #[must_use]
    pub fn general(message: impl Into<String>) -> Self {
        Self {
            fields: BTreeMap::new(),
            general: Some(message.into()),
        }
    }

    /// Build from a backend error: field errors map onto inputs, anything
    /// else becomes the form-level message.
    #[must_use]
    pub fn from_api(err: &ApiError, fallback: &str) -> Self {
        let mut errors = Self::new();
        if let ApiError::Validation(fields) = err {
            for (field, messages) in fields {
                if matches!(field.as_str(), "detail" | "non_field_errors") {
                    continue;
                }
                if let Some(message) = messages.first() {
                    let field = field.rsplit('.').next().unwrap_or(field);
                    errors.add(field, message.clone());
                }
            }
        }
        errors.general = Some(
            err.first_message()
                .filter(|_| errors.fields.is_empty())
                .unwrap_or(fallback)
                .to_string(),
        );
        errors
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Trimmed value, recording `REQUIRED` when blank.
fn required(errors: &mut FormErrors, field: &str, value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
    }
    value.to_string()
}

fn email(errors: &mut FormErrors, field: &str, value: &str) -> String {
    match Email::parse(value) {
        Ok(email) => email.into_inner(),
        Err(e) => {
            errors.add(field, e.message_sq());
            value.trim().to_string()
        }
    }
}

fn phone(errors: &mut FormErrors, field: &str, value: &str) -> String {
    match PhoneNumber::parse(value) {
        Ok(phone) => phone.as_str().to_string(),
        Err(e) => {
            errors.add(field, e.message_sq());
            value.trim().to_string()
        }
    }
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// HTML checkboxes post a value only when ticked.
fn checked(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty() && v != "false")
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Path to return to after logging in.
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginForm {
    /// Check both fields are filled. The email is normalised the same way
    /// registration normalises it.
    ///
    /// # Errors
    ///
    /// Returns the field errors for a blank or malformed email or a blank
    /// password.
    pub fn validate(&self) -> Result<(String, String), FormErrors> {
        let mut errors = FormErrors::new();
        let email = email(&mut errors, "email", &self.email);
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.into_result((email, self.password.clone()))
    }

    /// Safe local return path (never an external URL).
    #[must_use]
    pub fn return_path(&self) -> String {
        safe_next(self.next.as_deref())
    }
}

/// Only same-site absolute paths are followed after login.
#[must_use]
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => "/account".to_string(),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

impl RegisterForm {
    /// Validate every field and build the backend request.
    ///
    /// # Errors
    ///
    /// Returns all field errors found, including
    /// [`PASSWORD_MISMATCH`] when the confirmation differs.
    pub fn validate(&self) -> Result<RegisterRequest, FormErrors> {
        let mut errors = FormErrors::new();

        let first_name = required(&mut errors, "first_name", &self.first_name);
        let last_name = required(&mut errors, "last_name", &self.last_name);
        let email = email(&mut errors, "email", &self.email);
        let phone = phone(&mut errors, "phone", &self.phone);

        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        } else if !score_password(
            &self.password,
            &[&self.first_name, &self.last_name, &self.email],
        )
        .is_acceptable()
        {
            errors.add("password", PASSWORD_TOO_WEAK);
        }

        if self.password_confirm.is_empty() {
            errors.add("password_confirm", REQUIRED);
        } else if self.password != self.password_confirm {
            errors.add("password_confirm", PASSWORD_MISMATCH);
        }

        errors.into_result(RegisterRequest {
            first_name,
            last_name,
            email,
            phone,
            password: self.password.clone(),
        })
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// The checkout form, posted both for the live summary and for placing the order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    /// Saved address (logged-in customers).
    #[serde(default)]
    pub address_id: Option<String>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub use_loyalty_points: Option<String>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CheckoutForm {
    /// Selected saved address, if the value parses.
    #[must_use]
    pub fn address_id(&self) -> Option<AddressId> {
        self.address_id.as_deref()?.parse().ok()
    }

    #[must_use]
    pub fn payment_method(&self) -> PaymentMethod {
        PaymentMethod::ALL
            .into_iter()
            .find(|m| Some(m.as_str()) == self.payment_method.as_deref())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn uses_loyalty_points(&self) -> bool {
        checked(self.use_loyalty_points.as_deref())
    }

    /// Price request for the live summary. No validation: the summary
    /// refreshes while the customer is still typing.
    #[must_use]
    pub fn calculation(&self, cart: &Cart) -> OrderCalculationRequest {
        let address_id = self.address_id();
        OrderCalculationRequest {
            items: cart.order_lines(),
            address_id,
            city: if address_id.is_some() {
                None
            } else {
                optional(Some(&self.city))
            },
            use_loyalty_points: self.uses_loyalty_points(),
            coupon_code: optional(self.coupon_code.as_deref()),
        }
    }

    /// Validate the form and build the create-order request.
    ///
    /// Logged-in customers who picked a saved address skip the delivery
    /// fields; everyone else fills them in.
    ///
    /// # Errors
    ///
    /// Returns field errors for blank required fields, an invalid email, or
    /// a phone number that is not Albanian.
    pub fn validate(
        &self,
        cart: &Cart,
        logged_in: bool,
    ) -> Result<CreateOrderRequest, FormErrors> {
        let mut errors = FormErrors::new();
        if cart.is_empty() {
            errors.general = Some("Shporta është bosh".to_string());
        }

        let address_id = self.address_id().filter(|_| logged_in);
        let guest = if address_id.is_some() {
            None
        } else {
            Some(GuestInfo {
                full_name: required(&mut errors, "full_name", &self.full_name),
                email: email(&mut errors, "email", &self.email),
                phone: phone(&mut errors, "phone", &self.phone),
                address: required(&mut errors, "address", &self.address),
                city: required(&mut errors, "city", &self.city),
            })
        };

        errors.into_result(CreateOrderRequest {
            items: cart.order_lines(),
            address_id,
            guest,
            payment_method: self.payment_method(),
            use_loyalty_points: logged_in && self.uses_loyalty_points(),
            coupon_code: optional(self.coupon_code.as_deref()),
            notes: optional(self.notes.as_deref()),
        })
    }
}

// =============================================================================
// Account
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
}

impl ProfileForm {
    /// # Errors
    ///
    /// Returns field errors for blank names or an invalid phone number.
    pub fn validate(&self) -> Result<ProfileUpdate, FormErrors> {
        let mut errors = FormErrors::new();
        let update = ProfileUpdate {
            first_name: required(&mut errors, "first_name", &self.first_name),
            last_name: required(&mut errors, "last_name", &self.last_name),
            phone: phone(&mut errors, "phone", &self.phone),
        };
        errors.into_result(update)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressForm {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub is_default: Option<String>,
}

impl AddressForm {
    /// # Errors
    ///
    /// Returns field errors for blank required fields or an invalid phone.
    pub fn validate(&self) -> Result<AddressInput, FormErrors> {
        let mut errors = FormErrors::new();
        let input = AddressInput {
            label: optional(self.label.as_deref()),
            full_name: required(&mut errors, "full_name", &self.full_name),
            phone: phone(&mut errors, "phone", &self.phone),
            street: required(&mut errors, "street", &self.street),
            city: required(&mut errors, "city", &self.city),
            postal_code: optional(self.postal_code.as_deref()),
            is_default: checked(self.is_default.as_deref()),
        };
        errors.into_result(input)
    }
}
