//! Catalog payloads: products, categories, brands.

use serde::{Deserialize, Serialize};

use crate::types::{BrandId, CategoryId, Price, ProductId};

/// Short category reference embedded in products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// Short brand reference embedded in products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandRef {
    pub id: BrandId,
    pub name: String,
    pub slug: String,
}

/// A toy in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    /// Regular price.
    pub price: Price,
    /// Sale price, when the product is discounted.
    #[serde(default)]
    pub discount_price: Option<Price>,
    #[serde(default)]
    pub stock: i64,
    /// Main image path or URL.
    #[serde(default)]
    pub image: Option<String>,
    /// Additional gallery images.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub brand: Option<BrandRef>,
    /// Recommended age, e.g. "3-5 vjeç".
    #[serde(default)]
    pub age_range: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
}

impl Product {
    /// Price the customer pays: the sale price when set and lower.
    #[must_use]
    pub fn effective_price(&self) -> Price {
        match self.discount_price {
            Some(discount) if discount < self.price => discount,
            _ => self.price,
        }
    }

    /// Whether a sale price applies.
    #[must_use]
    pub fn on_sale(&self) -> bool {
        self.effective_price() < self.price
    }

    /// Whether any stock is left.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub parent: Option<CategoryId>,
    #[serde(default)]
    pub product_count: u64,
}

/// Toy brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub logo: Option<String>,
}

/// Create/update payload for products (admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub discount_price: Option<Price>,
    pub stock: i64,
    pub category: Option<CategoryId>,
    pub brand: Option<BrandId>,
    pub image: Option<String>,
    pub age_range: Option<String>,
    pub is_featured: bool,
}

/// Create/update payload for categories (admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    pub description: String,
    pub parent: Option<CategoryId>,
    pub image: Option<String>,
}

/// Create/update payload for brands (admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandInput {
    pub name: String,
    pub description: String,
    pub logo: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(price: i64, discount: Option<i64>) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Kukull".to_string(),
            slug: "kukull".to_string(),
            description: String::new(),
            price: Price::from_lek(price),
            discount_price: discount.map(Price::from_lek),
            stock: 3,
            image: None,
            images: vec![],
            category: None,
            brand: None,
            age_range: None,
            is_featured: false,
        }
    }

    #[test]
    fn test_effective_price_uses_lower_discount() {
        let p = product(2000, Some(1500));
        assert_eq!(p.effective_price(), Price::from_lek(1500));
        assert!(p.on_sale());
    }

    #[test]
    fn test_effective_price_ignores_higher_discount() {
        let p = product(2000, Some(2500));
        assert_eq!(p.effective_price(), Price::from_lek(2000));
        assert!(!p.on_sale());
    }

    #[test]
    fn test_product_decodes_minimal_payload() {
        let p: Product = serde_json::from_str(
            r#"{"id": 5, "name": "Top", "slug": "top", "price": "350.00"}"#,
        )
        .unwrap();
        assert_eq!(p.price, Price::from_lek(350));
        assert!(!p.in_stock());
        assert!(p.category.is_none());
    }
}
