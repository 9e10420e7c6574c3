//! Catalog endpoints: products, categories, brands.

use std::sync::Arc;

use lodra_core::schema::{Brand, Category, Paginated, Product};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::{ApiError, BackendClient, ListOrPage};

/// Sort orders offered on listing pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProductSort {
    #[default]
    #[serde(rename = "-created_at")]
    Newest,
    #[serde(rename = "price")]
    PriceAsc,
    #[serde(rename = "-price")]
    PriceDesc,
    #[serde(rename = "name")]
    Name,
}

impl ProductSort {
    pub const ALL: [Self; 4] = [Self::Newest, Self::PriceAsc, Self::PriceDesc, Self::Name];

    /// Value of the backend's `ordering` parameter.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Newest => "-created_at",
            Self::PriceAsc => "price",
            Self::PriceDesc => "-price",
            Self::Name => "name",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Newest => "Më të rejat",
            Self::PriceAsc => "Çmimi: nga më i ulëti",
            Self::PriceDesc => "Çmimi: nga më i larti",
            Self::Name => "Emri (A-Z)",
        }
    }

    /// Parse an `ordering` value, falling back to the default for unknown input.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        value
            .and_then(|v| Self::ALL.into_iter().find(|s| s.as_str() == v))
            .unwrap_or_default()
    }
}

/// Query parameters for `GET /products/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductQuery {
    pub page: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Category slug.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Brand slug.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering: Option<ProductSort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
}

impl BackendClient {
    /// Get a page of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(page = query.page))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Paginated<Product>, ApiError> {
        let request = self.request(Method::GET, "products/", None)?.query(query);
        let page: Paginated<Product> = self.send(request).await?;
        Ok(Paginated {
            results: page
                .results
                .into_iter()
                .map(|p| self.resolve_product(p))
                .collect(),
            ..page
        })
    }

    /// Get featured products for the home page.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    pub async fn featured_products(&self, limit: u32) -> Result<Vec<Product>, ApiError> {
        let query = ProductQuery {
            page: 1,
            page_size: limit,
            is_featured: Some(true),
            ..ProductQuery::default()
        };
        Ok(self.list_products(&query).await?.results)
    }

    /// Get a product by slug.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no product has this slug.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_product(&self, slug: &str) -> Result<Product, ApiError> {
        let path = format!("products/{}/", urlencoding::encode(slug));
        let request = self.request(Method::GET, &path, None)?;
        let product: Product = self.send(request).await?;
        Ok(self.resolve_product(product))
    }

    /// Get all categories (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Arc<Vec<Category>>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let request = self.request(Method::GET, "categories/", None)?;
        let list: ListOrPage<Category> = self.send(request).await?;
        let categories = Arc::new(
            list.into_vec()
                .into_iter()
                .map(|c| self.resolve_category(c))
                .collect::<Vec<_>>(),
        );

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::clone(&categories)),
            )
            .await;

        Ok(categories)
    }

    /// Get all brands (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_brands(&self) -> Result<Arc<Vec<Brand>>, ApiError> {
        if let Some(CacheValue::Brands(brands)) = self.inner.cache.get(&CacheKey::Brands).await {
            debug!("Cache hit for brands");
            return Ok(brands);
        }

        let request = self.request(Method::GET, "brands/", None)?;
        let list: ListOrPage<Brand> = self.send(request).await?;
        let brands = Arc::new(
            list.into_vec()
                .into_iter()
                .map(|b| self.resolve_brand(b))
                .collect::<Vec<_>>(),
        );

        self.inner
            .cache
            .insert(CacheKey::Brands, CacheValue::Brands(Arc::clone(&brands)))
            .await;

        Ok(brands)
    }

    /// Find a category by slug in the cached list.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no category has this slug.
    pub async fn category_by_slug(&self, slug: &str) -> Result<Category, ApiError> {
        self.list_categories()
            .await?
            .iter()
            .find(|c| c.slug == slug)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("category {slug}")))
    }

    /// Find a brand by slug in the cached list.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if no brand has this slug.
    pub async fn brand_by_slug(&self, slug: &str) -> Result<Brand, ApiError> {
        self.list_brands()
            .await?
            .iter()
            .find(|b| b.slug == slug)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("brand {slug}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_sort_from_param() {
        assert_eq!(ProductSort::from_param(Some("-price")), ProductSort::PriceDesc);
        assert_eq!(ProductSort::from_param(Some("bogus")), ProductSort::Newest);
        assert_eq!(ProductSort::from_param(None), ProductSort::Newest);
    }

    #[test]
    fn test_product_query_serializes_only_set_filters() {
        let query = ProductQuery {
            page: 2,
            page_size: 12,
            category: Some("lodra-druri".to_string()),
            ordering: Some(ProductSort::PriceAsc),
            ..ProductQuery::default()
        };
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "page": 2,
                "page_size": 12,
                "category": "lodra-druri",
                "ordering": "price",
            })
        );
    }
}
