//! Admin form payloads and validation.
//!
//! Forms keep the raw strings the staff member typed so a rejected form is
//! re-rendered exactly as submitted, with an Albanian message per field.

use std::collections::BTreeMap;
use std::str::FromStr;

use lodra_core::schema::{
    Brand, BrandInput, Category, CategoryInput, LoginRequest, Product, ProductInput,
};
use lodra_core::{BrandId, CategoryId, Email, OrderStatus, Price};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::api::ApiError;

pub const REQUIRED: &str = "Kjo fushë është e detyrueshme";
pub const INVALID_PRICE: &str = "Çmimi duhet të jetë një numër jo negativ";
pub const INVALID_STOCK: &str = "Stoku duhet të jetë një numër i plotë jo negativ";
pub const DISCOUNT_NOT_LOWER: &str = "Çmimi i zbritur duhet të jetë më i ulët se çmimi";
pub const INVALID_CHOICE: &str = "Zgjedhje e pavlefshme";

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

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.general.is_none()
    }

    #[must_use]
    pub fn general(message: impl Into<String>) -> Self {
        Self {
            fields: BTreeMap::new(),
            general: Some(message.into()),
        }
    }

    /// Map backend validation errors onto form fields.
    #[must_use]
    pub fn from_api(err: &ApiError) -> Self {
        let mut errors = Self::new();
        if let ApiError::Validation(fields) = err {
            for (field, messages) in fields {
                if matches!(field.as_str(), "detail" | "non_field_errors") {
                    continue;
                }
                if let Some(message) = messages.first() {
                    errors.add(field, message.clone());
                }
            }
        }
        if errors.fields.is_empty() {
            errors.general = Some(
                err.first_message()
                    .unwrap_or("Ruajtja dështoi. Provoni përsëri.")
                    .to_string(),
            );
        }
        errors
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

fn required(errors: &mut FormErrors, field: &str, value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
    }
    value.to_string()
}

fn optional(value: &str) -> Option<String> {
    Some(value.trim()).filter(|v| !v.is_empty()).map(String::from)
}

/// HTML checkboxes post a value only when ticked.
fn checked(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty() && v != "false")
}

/// Parse a Lek amount. Accepts `1250`, `1250.50`, `1.250`, `1.250,50` and
/// `1250,5`. Without a comma, dots that split the number into groups of three
/// digits are thousands separators, matching how prices are displayed.
#[must_use]
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let normalized = if compact.contains(',') || is_grouped_thousands(&compact) {
        compact.replace('.', "").replace(',', ".")
    } else {
        compact
    };
    Decimal::from_str(&normalized)
        .ok()
        .filter(|amount| !amount.is_sign_negative())
}

/// `1.250` or `12.500.000`: a leading group of 1-3 digits, then `.ddd` groups.
fn is_grouped_thousands(value: &str) -> bool {
    let mut groups = value.split('.');
    let Some(lead) = groups.next() else {
        return false;
    };
    let lead_ok = (1..=3).contains(&lead.len())
        && !lead.starts_with('0')
        && lead.chars().all(|c| c.is_ascii_digit());
    let mut rest = groups.peekable();
    lead_ok
        && rest.peek().is_some()
        && rest.all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}

fn price(errors: &mut FormErrors, field: &str, raw: &str) -> Price {
    if raw.trim().is_empty() {
        errors.add(field, REQUIRED);
        return Price::ZERO;
    }
    parse_amount(raw).map_or_else(
        || {
            errors.add(field, INVALID_PRICE);
            Price::ZERO
        },
        Price::new,
    )
}

fn select_id<T: FromStr>(errors: &mut FormErrors, field: &str, raw: &str) -> Option<T> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse().map_or_else(
        |_| {
            errors.add(field, INVALID_CHOICE);
            None
        },
        Some,
    )
}

// =============================================================================
// Auth
// =============================================================================

/// Staff login form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    /// # Errors
    ///
    /// Returns field errors for a blank or malformed email or a blank password.
    pub fn validate(&self) -> Result<LoginRequest, FormErrors> {
        let mut errors = FormErrors::new();
        let email = match Email::parse(&self.email) {
            Ok(email) => email.into_inner(),
            Err(e) => {
                errors.add("email", e.message_sq());
                String::new()
            }
        };
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.into_result(LoginRequest {
            email,
            password: self.password.clone(),
        })
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Product create/edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub discount_price: String,
    #[serde(default)]
    pub stock: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub age_range: String,
    #[serde(default)]
    pub is_featured: Option<String>,
}

impl ProductForm {
    /// Prefill from an existing product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.amount().normalize().to_string(),
            discount_price: product
                .discount_price
                .map(|p| p.amount().normalize().to_string())
                .unwrap_or_default(),
            stock: product.stock.to_string(),
            category: product
                .category
                .as_ref()
                .map(|c| c.id.to_string())
                .unwrap_or_default(),
            brand: product
                .brand
                .as_ref()
                .map(|b| b.id.to_string())
                .unwrap_or_default(),
            image: product.image.clone().unwrap_or_default(),
            age_range: product.age_range.clone().unwrap_or_default(),
            is_featured: product.is_featured.then(|| "on".to_string()),
        }
    }

    #[must_use]
    pub fn featured(&self) -> bool {
        checked(self.is_featured.as_deref())
    }

    /// # Errors
    ///
    /// Returns field errors for a blank name, a negative or malformed price,
    /// or a stock that is not a non-negative integer.
    pub fn validate(&self) -> Result<ProductInput, FormErrors> {
        let mut errors = FormErrors::new();
        let name = required(&mut errors, "name", &self.name);
        let price = price(&mut errors, "price", &self.price);

        let discount_price = if self.discount_price.trim().is_empty() {
            None
        } else {
            match parse_amount(&self.discount_price) {
                Some(amount) if errors.get("price").is_none() && Price::new(amount) >= price => {
                    errors.add("discount_price", DISCOUNT_NOT_LOWER);
                    None
                }
                Some(amount) => Some(Price::new(amount)),
                None => {
                    errors.add("discount_price", INVALID_PRICE);
                    None
                }
            }
        };

        let stock = match self.stock.trim() {
            "" => {
                errors.add("stock", REQUIRED);
                0
            }
            raw => raw.parse::<i64>().ok().filter(|s| *s >= 0).unwrap_or_else(|| {
                errors.add("stock", INVALID_STOCK);
                0
            }),
        };

        let category = select_id::<CategoryId>(&mut errors, "category", &self.category);
        let brand = select_id::<BrandId>(&mut errors, "brand", &self.brand);

        errors.into_result(ProductInput {
            name,
            description: self.description.trim().to_string(),
            price,
            discount_price,
            stock,
            category,
            brand,
            image: optional(&self.image),
            age_range: optional(&self.age_range),
            is_featured: self.featured(),
        })
    }
}

/// Category create/edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent: String,
    #[serde(default)]
    pub image: String,
}

impl CategoryForm {
    #[must_use]
    pub fn from_category(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            description: category.description.clone(),
            parent: category.parent.map(|p| p.to_string()).unwrap_or_default(),
            image: category.image.clone().unwrap_or_default(),
        }
    }

    /// # Errors
    ///
    /// Returns field errors for a blank name, an unknown parent, or a
    /// category chosen as its own parent.
    pub fn validate(&self, editing: Option<CategoryId>) -> Result<CategoryInput, FormErrors> {
        let mut errors = FormErrors::new();
        let name = required(&mut errors, "name", &self.name);
        let parent = select_id::<CategoryId>(&mut errors, "parent", &self.parent);
        if parent.is_some() && parent == editing {
            errors.add("parent", INVALID_CHOICE);
        }
        errors.into_result(CategoryInput {
            name,
            description: self.description.trim().to_string(),
            parent,
            image: optional(&self.image),
        })
    }
}

/// Brand create/edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BrandForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub logo: String,
}

impl BrandForm {
    #[must_use]
    pub fn from_brand(brand: &Brand) -> Self {
        Self {
            name: brand.name.clone(),
            description: brand.description.clone(),
            logo: brand.logo.clone().unwrap_or_default(),
        }
    }

    /// # Errors
    ///
    /// Returns field errors for a blank name.
    pub fn validate(&self) -> Result<BrandInput, FormErrors> {
        let mut errors = FormErrors::new();
        let name = required(&mut errors, "name", &self.name);
        errors.into_result(BrandInput {
            name,
            description: self.description.trim().to_string(),
            logo: optional(&self.logo),
        })
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Order status change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusForm {
    #[serde(default)]
    pub status: String,
}

impl StatusForm {
    /// # Errors
    ///
    /// Returns a form-level error for an unknown status value.
    pub fn validate(&self) -> Result<OrderStatus, FormErrors> {
        OrderStatus::from_wire(self.status.trim())
            .ok_or_else(|| FormErrors::general(INVALID_CHOICE))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product_form() -> ProductForm {
        ProductForm {
            name: "Tren druri".to_string(),
            price: "2.400,50".to_string(),
            stock: "7".to_string(),
            category: "3".to_string(),
            is_featured: Some("on".to_string()),
            ..ProductForm::default()
        }
    }

    #[test]
    fn test_parse_amount_reads_displayed_prices() {
        let shown = Price::from_lek(1250).display();
        let typed = shown.trim_end_matches(lodra_core::types::price::LEK_SUFFIX).trim();
        assert_eq!(typed, "1.250");
        assert_eq!(parse_amount(typed), Some(Decimal::from(1250)));
        assert_eq!(parse_amount("12.500.000"), Some(Decimal::from(12_500_000)));
    }

    #[test]
    fn test_parse_amount_separators() {
        assert_eq!(parse_amount("1250"), Some(Decimal::from(1250)));
        assert_eq!(parse_amount("1250.50"), Decimal::from_str("1250.50").ok());
        assert_eq!(parse_amount("1.250,50"), Decimal::from_str("1250.50").ok());
        assert_eq!(parse_amount("-5"), None);
        assert_eq!(parse_amount("1250.5"), Decimal::from_str("1250.5").ok());
        assert_eq!(parse_amount("0.250"), Decimal::from_str("0.250").ok());
        assert_eq!(parse_amount("pesë"), None);
    }

    #[test]
    fn test_valid_product() {
        let input = product_form().validate().unwrap();
        assert_eq!(input.name, "Tren druri");
        assert_eq!(input.price, Price::new(Decimal::from_str("2400.50").unwrap()));
        assert_eq!(input.stock, 7);
        assert_eq!(input.category, Some(CategoryId::new(3)));
        assert!(input.brand.is_none());
        assert!(input.is_featured);
        assert!(input.image.is_none());
    }

    #[test]
    fn test_product_requires_name_price_and_stock() {
        let errors = ProductForm::default().validate().unwrap_err();
        assert_eq!(errors.get("name"), Some(REQUIRED));
        assert_eq!(errors.get("price"), Some(REQUIRED));
        assert_eq!(errors.get("stock"), Some(REQUIRED));
    }

    #[test]
    fn test_product_rejects_negative_values() {
        let form = ProductForm {
            price: "-100".to_string(),
            stock: "2.5".to_string(),
            ..product_form()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("price"), Some(INVALID_PRICE));
        assert_eq!(errors.get("stock"), Some(INVALID_STOCK));

        let form = ProductForm {
            stock: "-1".to_string(),
            ..product_form()
        };
        assert_eq!(form.validate().unwrap_err().get("stock"), Some(INVALID_STOCK));
    }

    #[test]
    fn test_discount_must_be_lower() {
        let form = ProductForm {
            price: "1000".to_string(),
            discount_price: "1000".to_string(),
            ..product_form()
        };
        assert_eq!(
            form.validate().unwrap_err().get("discount_price"),
            Some(DISCOUNT_NOT_LOWER)
        );
    }

    #[test]
    fn test_category_cannot_be_its_own_parent() {
        let form = CategoryForm {
            name: "Lodra druri".to_string(),
            parent: "4".to_string(),
            ..CategoryForm::default()
        };
        assert!(form.validate(None).is_ok());
        assert_eq!(
            form.validate(Some(CategoryId::new(4))).unwrap_err().get("parent"),
            Some(INVALID_CHOICE)
        );
    }

    #[test]
    fn test_status_form() {
        let form = StatusForm {
            status: "delivered".to_string(),
        };
        assert_eq!(form.validate().unwrap(), OrderStatus::Delivered);
        assert!(StatusForm::default().validate().is_err());
    }

    #[test]
    fn test_backend_field_errors_map_onto_form() {
        let mut fields = lodra_core::schema::FieldErrors::new();
        fields.insert("name".to_string(), vec!["Ekziston tashmë.".to_string()]);
        let errors = FormErrors::from_api(&ApiError::Validation(fields));
        assert_eq!(errors.get("name"), Some("Ekziston tashmë."));
        assert!(errors.general.is_none());
    }
}
