//! Catalog management: products, categories, brands.

use std::sync::Arc;

use lodra_core::schema::{
    Brand, BrandInput, Category, CategoryInput, Paginated, Product, ProductInput,
};
use lodra_core::{BrandId, CategoryId, ProductId};
use reqwest::Method;
use secrecy::SecretString;
use serde::Serialize;
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::{AdminClient, ApiError, ListOrPage};

/// Query parameters for paginated admin tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl AdminClient {
    /// Get a page of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(page = query.page))]
    pub async fn list_products(
        &self,
        token: &SecretString,
        query: &ListQuery,
    ) -> Result<Paginated<Product>, ApiError> {
        let request = self
            .request(Method::GET, "products/", Some(token))?
            .query(query);
        let page = self.send::<ListOrPage<Product>>(request).await?.into_page();
        Ok(Paginated {
            results: page
                .results
                .into_iter()
                .map(|p| self.resolve_product(p))
                .collect(),
            ..page
        })
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn get_product(
        &self,
        token: &SecretString,
        id: ProductId,
    ) -> Result<Product, ApiError> {
        let request = self.request(Method::GET, &format!("products/{id}/"), Some(token))?;
        let product: Product = self.send(request).await?;
        Ok(self.resolve_product(product))
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend rejects a field.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        token: &SecretString,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        let request = self
            .request(Method::POST, "products/", Some(token))?
            .json(input);
        self.send(request).await
    }

    /// Replace a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend rejects a field.
    #[instrument(skip(self, token, input), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &SecretString,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, ApiError> {
        let request = self
            .request(Method::PUT, &format!("products/{id}/"), Some(token))?
            .json(input);
        self.send(request).await
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(&self, token: &SecretString, id: ProductId) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &format!("products/{id}/"), Some(token))?;
        self.send_empty(request).await
    }

    /// All categories (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn list_categories(&self, token: &SecretString) -> Result<Arc<Vec<Category>>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let request = self.request(Method::GET, "categories/", Some(token))?;
        let list: ListOrPage<Category> = self.send(request).await?;
        let categories = Arc::new(
            list.into_vec()
                .into_iter()
                .map(|mut c| {
                    c.image = self.resolve(c.image.as_deref());
                    c
                })
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

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend rejects a field.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn create_category(
        &self,
        token: &SecretString,
        input: &CategoryInput,
    ) -> Result<Category, ApiError> {
        let request = self
            .request(Method::POST, "categories/", Some(token))?
            .json(input);
        let category = self.send(request).await?;
        self.inner.cache.invalidate(&CacheKey::Categories).await;
        Ok(category)
    }

    /// Replace a category.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend rejects a field.
    #[instrument(skip(self, token, input), fields(category_id = %id))]
    pub async fn update_category(
        &self,
        token: &SecretString,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, ApiError> {
        let request = self
            .request(Method::PUT, &format!("categories/{id}/"), Some(token))?
            .json(input);
        let category = self.send(request).await?;
        self.inner.cache.invalidate(&CacheKey::Categories).await;
        Ok(category)
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the category does not exist.
    #[instrument(skip(self, token), fields(category_id = %id))]
    pub async fn delete_category(
        &self,
        token: &SecretString,
        id: CategoryId,
    ) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &format!("categories/{id}/"), Some(token))?;
        self.send_empty(request).await?;
        self.inner.cache.invalidate(&CacheKey::Categories).await;
        Ok(())
    }

    /// All brands (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn list_brands(&self, token: &SecretString) -> Result<Arc<Vec<Brand>>, ApiError> {
        if let Some(CacheValue::Brands(brands)) = self.inner.cache.get(&CacheKey::Brands).await {
            debug!("Cache hit for brands");
            return Ok(brands);
        }

        let request = self.request(Method::GET, "brands/", Some(token))?;
        let list: ListOrPage<Brand> = self.send(request).await?;
        let brands = Arc::new(
            list.into_vec()
                .into_iter()
                .map(|mut b| {
                    b.logo = self.resolve(b.logo.as_deref());
                    b
                })
                .collect::<Vec<_>>(),
        );

        self.inner
            .cache
            .insert(CacheKey::Brands, CacheValue::Brands(Arc::clone(&brands)))
            .await;

        Ok(brands)
    }

    /// Create a brand.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend rejects a field.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn create_brand(
        &self,
        token: &SecretString,
        input: &BrandInput,
    ) -> Result<Brand, ApiError> {
        let request = self.request(Method::POST, "brands/", Some(token))?.json(input);
        let brand = self.send(request).await?;
        self.inner.cache.invalidate(&CacheKey::Brands).await;
        Ok(brand)
    }

    /// Replace a brand.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend rejects a field.
    #[instrument(skip(self, token, input), fields(brand_id = %id))]
    pub async fn update_brand(
        &self,
        token: &SecretString,
        id: BrandId,
        input: &BrandInput,
    ) -> Result<Brand, ApiError> {
        let request = self
            .request(Method::PUT, &format!("brands/{id}/"), Some(token))?
            .json(input);
        let brand = self.send(request).await?;
        self.inner.cache.invalidate(&CacheKey::Brands).await;
        Ok(brand)
    }

    /// Delete a brand.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the brand does not exist.
    #[instrument(skip(self, token), fields(brand_id = %id))]
    pub async fn delete_brand(&self, token: &SecretString, id: BrandId) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &format!("brands/{id}/"), Some(token))?;
        self.send_empty(request).await?;
        self.inner.cache.invalidate(&CacheKey::Brands).await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_omits_empty_search() {
        let query = ListQuery {
            page: 3,
            page_size: 20,
            search: None,
        };
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            serde_json::json!({"page": 3, "page_size": 20})
        );
    }
}
