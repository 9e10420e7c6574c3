//! Dashboard: store counters and the latest orders.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use lodra_core::schema::{DashboardStats, Order};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::OrderQuery;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::page::AdminPage;
use crate::services::auth::with_token;
use crate::state::AppState;

const RECENT_ORDERS: u32 = 8;

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub page: AdminPage,
    pub stats: Option<DashboardStats>,
    pub recent_orders: Vec<Order>,
}

/// Dashboard page handler.
///
/// Counters and recent orders load independently; a failure of either is
/// shown as a notice in its panel.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    page: AdminPage,
) -> Result<DashboardTemplate, AppError> {
    let api = state.api();

    let stats = match with_token(&session, api, |token| async move { api.stats(&token).await }).await
    {
        Ok(stats) => Some(stats),
        Err(e) if e.requires_login() => return Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load dashboard stats");
            None
        }
    };

    let query = OrderQuery {
        page: 1,
        page_size: RECENT_ORDERS,
        ..OrderQuery::default()
    };
    let query = &query;
    let recent_orders = match with_token(&session, api, |token| async move {
        api.list_orders(&token, query).await
    })
    .await
    {
        Ok(page) => page.results,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load recent orders");
            Vec::new()
        }
    };

    Ok(DashboardTemplate {
        page,
        stats,
        recent_orders,
    })
}
