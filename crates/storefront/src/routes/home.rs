//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use lodra_core::schema::{Brand, Category};
use tower_sessions::Session;
use tracing::instrument;

use super::products::{LOAD_FAILED, ProductCard, cards};
use crate::filters;
use crate::page::PageContext;
use crate::services::storage;
use crate::state::AppState;

const FEATURED_LIMIT: u32 = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub featured: Vec<ProductCard>,
    pub categories: Vec<Category>,
    pub brands: Vec<Brand>,
    pub notice: Option<&'static str>,
}

/// Display the home page.
///
/// Each section loads independently; a failed section is left empty.
#[instrument(skip(state, session, page))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
) -> HomeTemplate {
    let api = state.api();
    let (featured, categories, brands) = tokio::join!(
        api.featured_products(FEATURED_LIMIT),
        api.list_categories(),
        api.list_brands(),
    );

    let wishlist = storage::load_wishlist(&session).await;
    let (featured, notice) = match featured {
        Ok(products) => (cards(&products, &wishlist), None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load featured products");
            (Vec::new(), Some(LOAD_FAILED))
        }
    };

    let categories = categories.map_or_else(
        |e| {
            tracing::warn!(error = %e, "Failed to load categories");
            Vec::new()
        },
        |list| list.iter().filter(|c| c.parent.is_none()).cloned().collect(),
    );
    let brands = brands.map_or_else(
        |e| {
            tracing::warn!(error = %e, "Failed to load brands");
            Vec::new()
        },
        |list| list.as_ref().clone(),
    );

    HomeTemplate {
        page,
        featured,
        categories,
        brands,
        notice,
    }
}
