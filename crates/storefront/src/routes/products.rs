//! Catalog route handlers: listings, search suggestions, product detail.
//!
//! Listings degrade to an empty grid with a notice when the backend is
//! unreachable. A missing product, category or brand is a 404.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use lodra_core::schema::Product;
use lodra_core::{PageLinks, Pagination, ProductId, Wishlist};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use url::form_urlencoded;

use crate::api::{ApiError, ProductQuery, ProductSort};
use crate::error::AppError;
use crate::filters;
use crate::page::PageContext;
use crate::services::storage;
use crate::state::AppState;

/// Notice shown when products could not be loaded.
pub const LOAD_FAILED: &str = "Nuk mund të ngarkoheshin produktet";

const PAGE_RADIUS: u32 = 2;
const SUGGESTION_LIMIT: u32 = 6;
const RELATED_LIMIT: u32 = 4;

// =============================================================================
// View Types
// =============================================================================

/// Product display data for cards and suggestion lists.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub price: String,
    /// Regular price, shown struck through when on sale.
    pub original_price: Option<String>,
    pub image: Option<String>,
    pub brand: Option<String>,
    pub age_range: Option<String>,
    pub in_stock: bool,
    pub in_wishlist: bool,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, wishlist: &Wishlist) -> Self {
        Self {
            id: product.id,
            slug: product.slug.clone(),
            name: product.name.clone(),
            price: product.effective_price().display(),
            original_price: product.on_sale().then(|| product.price.display()),
            image: product.image.clone(),
            brand: product.brand.as_ref().map(|b| b.name.clone()),
            age_range: product.age_range.clone(),
            in_stock: product.in_stock(),
            in_wishlist: wishlist.contains(product.id),
        }
    }
}

/// Cards for a list of products.
#[must_use]
pub fn cards(products: &[Product], wishlist: &Wishlist) -> Vec<ProductCard> {
    products
        .iter()
        .map(|p| ProductCard::new(p, wishlist))
        .collect()
}

/// One `<option>` of a filter select.
#[derive(Debug, Clone)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

// =============================================================================
// Query
// =============================================================================

/// Listing query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    pub page: Option<u32>,
    /// Search text.
    pub q: Option<String>,
    /// Category slug.
    pub category: Option<String>,
    /// Brand slug.
    pub brand: Option<String>,
    pub ordering: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

impl ListingQuery {
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    #[must_use]
    pub fn search(&self) -> Option<String> {
        non_blank(self.q.as_deref())
    }

    #[must_use]
    pub fn sort(&self) -> ProductSort {
        ProductSort::from_param(self.ordering.as_deref())
    }

    /// Backend query for this listing, with an optional fixed category or brand.
    #[must_use]
    pub fn product_query(&self, per_page: u32, scope: &ListingScope) -> ProductQuery {
        ProductQuery {
            page: self.page(),
            page_size: per_page,
            search: self.search(),
            category: scope
                .category
                .clone()
                .or_else(|| non_blank(self.category.as_deref())),
            brand: scope
                .brand
                .clone()
                .or_else(|| non_blank(self.brand.as_deref())),
            ordering: Some(self.sort()),
            is_featured: None,
        }
    }

    /// URL of `page` under `base`, keeping the other filters.
    #[must_use]
    pub fn page_href(&self, base: &str, page: u32) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(q) = self.search() {
            query.append_pair("q", &q);
        }
        if let Some(category) = non_blank(self.category.as_deref()) {
            query.append_pair("category", &category);
        }
        if let Some(brand) = non_blank(self.brand.as_deref()) {
            query.append_pair("brand", &brand);
        }
        if self.ordering.is_some() {
            query.append_pair("ordering", self.sort().as_str());
        }
        if page > 1 {
            query.append_pair("page", &page.to_string());
        }

        let query = query.finish();
        if query.is_empty() {
            base.to_string()
        } else {
            format!("{base}?{query}")
        }
    }
}

/// What a listing page shows: all products, one category, or one brand.
#[derive(Debug, Clone, Default)]
pub struct ListingScope {
    pub heading: String,
    pub description: Option<String>,
    /// Path the filter form and pagination links point at.
    pub action: String,
    pub category: Option<String>,
    pub brand: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub heading: String,
    pub description: Option<String>,
    pub action: String,
    pub search: String,
    pub products: Vec<ProductCard>,
    pub total: u64,
    pub pagination: PageLinks,
    /// Empty when the page is already scoped to a category.
    pub categories: Vec<FilterOption>,
    /// Empty when the page is already scoped to a brand.
    pub brands: Vec<FilterOption>,
    pub sorts: Vec<FilterOption>,
    pub notice: Option<&'static str>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: Product,
    pub card: ProductCard,
    pub gallery: Vec<String>,
    /// Quantity already in the cart.
    pub in_cart: u32,
    pub related: Vec<ProductCard>,
}

/// Search suggestions fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/search_results.html")]
pub struct SearchResultsTemplate {
    pub query: String,
    pub products: Vec<ProductCard>,
    pub failed: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Render a listing page; backend failures become an empty grid with a notice.
async fn render_listing(
    state: &AppState,
    session: &Session,
    page: PageContext,
    query: &ListingQuery,
    scope: ListingScope,
) -> ProductsIndexTemplate {
    let per_page = state.config().ui.products_per_page;
    let api = state.api();
    let wishlist = storage::load_wishlist(session).await;

    let (results, notice) = match api.list_products(&query.product_query(per_page, &scope)).await
    {
        Ok(results) => (results, None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load products");
            (lodra_core::schema::Paginated::empty(), Some(LOAD_FAILED))
        }
    };

    let pagination = Pagination::new(query.page(), per_page, results.count)
        .links(PAGE_RADIUS, |n| query.page_href(&scope.action, n));

    let selected_category = non_blank(query.category.as_deref());
    let categories = if scope.category.is_some() {
        Vec::new()
    } else {
        match api.list_categories().await {
            Ok(list) => list
                .iter()
                .map(|c| FilterOption {
                    value: c.slug.clone(),
                    label: c.name.clone(),
                    selected: selected_category.as_deref() == Some(c.slug.as_str()),
                })
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load categories");
                Vec::new()
            }
        }
    };

    let selected_brand = non_blank(query.brand.as_deref());
    let brands = if scope.brand.is_some() {
        Vec::new()
    } else {
        match api.list_brands().await {
            Ok(list) => list
                .iter()
                .map(|b| FilterOption {
                    value: b.slug.clone(),
                    label: b.name.clone(),
                    selected: selected_brand.as_deref() == Some(b.slug.as_str()),
                })
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load brands");
                Vec::new()
            }
        }
    };

    let sort = query.sort();
    let sorts = ProductSort::ALL
        .into_iter()
        .map(|s| FilterOption {
            value: s.as_str().to_string(),
            label: s.label().to_string(),
            selected: s == sort,
        })
        .collect();

    let search = query.search().unwrap_or_default();
    ProductsIndexTemplate {
        page: page.with_search(search.clone()),
        heading: scope.heading,
        description: scope.description,
        action: scope.action,
        search,
        products: cards(&results.results, &wishlist),
        total: results.count,
        pagination,
        categories,
        brands,
        sorts,
        notice,
    }
}

/// Display product listing page.
#[instrument(skip(state, session, page))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Query(query): Query<ListingQuery>,
) -> ProductsIndexTemplate {
    let heading = match query.search() {
        Some(q) => format!("Rezultatet për \"{q}\""),
        None => "Të gjitha lodrat".to_string(),
    };
    let scope = ListingScope {
        heading,
        action: "/products".to_string(),
        ..ListingScope::default()
    };
    render_listing(&state, &session, page, &query, scope).await
}

/// Display the products of one category.
#[instrument(skip(state, session, page, query))]
pub async fn category(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Path(slug): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Result<ProductsIndexTemplate, AppError> {
    let scope = match state.api().category_by_slug(&slug).await {
        Ok(category) => ListingScope {
            heading: category.name,
            description: non_blank(Some(&category.description)),
            action: format!("/categories/{}", urlencoding::encode(&category.slug)),
            category: Some(category.slug),
            brand: None,
        },
        Err(ApiError::NotFound(_)) => return Err(AppError::NotFound(format!("category {slug}"))),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load category");
            ListingScope {
                heading: slug.clone(),
                action: format!("/categories/{}", urlencoding::encode(&slug)),
                category: Some(slug),
                ..ListingScope::default()
            }
        }
    };
    Ok(render_listing(&state, &session, page, &query, scope).await)
}

/// Display the products of one brand.
#[instrument(skip(state, session, page, query))]
pub async fn brand(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Path(slug): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Result<ProductsIndexTemplate, AppError> {
    let scope = match state.api().brand_by_slug(&slug).await {
        Ok(brand) => ListingScope {
            heading: brand.name,
            description: non_blank(Some(&brand.description)),
            action: format!("/brands/{}", urlencoding::encode(&brand.slug)),
            category: None,
            brand: Some(brand.slug),
        },
        Err(ApiError::NotFound(_)) => return Err(AppError::NotFound(format!("brand {slug}"))),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load brand");
            ListingScope {
                heading: slug.clone(),
                action: format!("/brands/{}", urlencoding::encode(&slug)),
                brand: Some(slug),
                ..ListingScope::default()
            }
        }
    };
    Ok(render_listing(&state, &session, page, &query, scope).await)
}

/// Search suggestions under the header search box (HTMX).
#[instrument(skip(state, session))]
pub async fn search(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListingQuery>,
) -> SearchResultsTemplate {
    let Some(q) = query.search() else {
        return SearchResultsTemplate {
            query: String::new(),
            products: Vec::new(),
            failed: false,
        };
    };

    let request = ProductQuery {
        page: 1,
        page_size: SUGGESTION_LIMIT,
        search: Some(q.clone()),
        ..ProductQuery::default()
    };
    let wishlist = storage::load_wishlist(&session).await;

    match state.api().list_products(&request).await {
        Ok(results) => SearchResultsTemplate {
            query: q,
            products: cards(&results.results, &wishlist),
            failed: false,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Search failed");
            SearchResultsTemplate {
                query: q,
                products: Vec::new(),
                failed: true,
            }
        }
    }
}

/// Display product detail page.
#[instrument(skip(state, session, page))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Path(slug): Path<String>,
) -> Result<ProductShowTemplate, AppError> {
    let api = state.api();
    let product = api.get_product(&slug).await?;

    let wishlist = storage::load_wishlist(&session).await;
    let in_cart = storage::load_cart(&session)
        .await
        .get_item(product.id)
        .map_or(0, |line| line.quantity);

    let related = match &product.category {
        Some(category) => {
            let query = ProductQuery {
                page: 1,
                page_size: RELATED_LIMIT + 1,
                category: Some(category.slug.clone()),
                ..ProductQuery::default()
            };
            match api.list_products(&query).await {
                Ok(results) => results
                    .results
                    .iter()
                    .filter(|p| p.id != product.id)
                    .take(RELATED_LIMIT as usize)
                    .map(|p| ProductCard::new(p, &wishlist))
                    .collect(),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to load related products");
                    Vec::new()
                }
            }
        }
        None => Vec::new(),
    };

    let gallery = product
        .image
        .iter()
        .chain(product.images.iter())
        .cloned()
        .collect();

    Ok(ProductShowTemplate {
        page,
        card: ProductCard::new(&product, &wishlist),
        product,
        gallery,
        in_cart,
        related,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lodra_core::{Price, WishlistItem};

    use super::*;

    fn product() -> Product {
        serde_json::from_value(serde_json::json!({
            "id": 3,
            "name": "Tren druri",
            "slug": "tren-druri",
            "price": "2500.00",
            "discount_price": "1990.00",
            "stock": 4,
            "brand": {"id": 1, "name": "Janod", "slug": "janod"}
        }))
        .unwrap()
    }

    #[test]
    fn test_card_shows_sale_price() {
        let card = ProductCard::new(&product(), &Wishlist::default());
        assert_eq!(card.price, Price::from_lek(1990).display());
        assert_eq!(card.original_price, Some(Price::from_lek(2500).display()));
        assert_eq!(card.brand.as_deref(), Some("Janod"));
        assert!(card.in_stock);
        assert!(!card.in_wishlist);
    }

    #[test]
    fn test_card_marks_wishlisted() {
        let product = product();
        let mut wishlist = Wishlist::default();
        wishlist.add(WishlistItem::from_product(&product));
        assert!(ProductCard::new(&product, &wishlist).in_wishlist);
    }

    #[test]
    fn test_page_href_keeps_filters() {
        let query = ListingQuery {
            page: Some(1),
            q: Some(" lego ".to_string()),
            category: Some(String::new()),
            brand: Some("lego".to_string()),
            ordering: Some("-price".to_string()),
        };
        assert_eq!(
            query.page_href("/products", 3),
            "/products?q=lego&brand=lego&ordering=-price&page=3"
        );
        assert_eq!(
            ListingQuery::default().page_href("/products", 1),
            "/products"
        );
    }

    #[test]
    fn test_scope_overrides_query_filters() {
        let query = ListingQuery {
            category: Some("kukulla".to_string()),
            ..ListingQuery::default()
        };
        let scope = ListingScope {
            category: Some("lodra-druri".to_string()),
            ..ListingScope::default()
        };
        let request = query.product_query(12, &scope);
        assert_eq!(request.category.as_deref(), Some("lodra-druri"));
        assert_eq!(request.page, 1);
        assert_eq!(request.ordering, Some(ProductSort::Newest));
    }
}
