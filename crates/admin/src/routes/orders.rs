//! Order management: filtered table, detail, status changes.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
};
use lodra_core::schema::Order;
use lodra_core::{OrderId, OrderStatus, PageLinks, Pagination};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use url::form_urlencoded;

use crate::api::OrderQuery;
use crate::error::AppError;
use crate::filters;
use crate::forms::StatusForm;
use crate::middleware::RequireAdminAuth;
use crate::models::Flash;
use crate::page::AdminPage;
use crate::services::auth::with_token;
use crate::services::flash::set_flash;
use crate::state::AppState;

use super::{LOAD_FAILED, PAGE_RADIUS, SelectOption, redirect};

/// Query string of the order table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrdersQuery {
    pub page: Option<u32>,
    pub status: Option<String>,
}

impl OrdersQuery {
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Selected status filter; unknown values show every order.
    #[must_use]
    pub fn status(&self) -> Option<OrderStatus> {
        self.status.as_deref().and_then(OrderStatus::from_wire)
    }

    #[must_use]
    pub fn page_href(&self, page: u32) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(status) = self.status() {
            query.append_pair("status", status.as_str());
        }
        if page > 1 {
            query.append_pair("page", &page.to_string());
        }
        let query = query.finish();
        if query.is_empty() {
            "/orders".to_string()
        } else {
            format!("/orders?{query}")
        }
    }
}

/// Status options, with the current one selected.
fn status_options(current: Option<OrderStatus>) -> Vec<SelectOption> {
    let current = current.map_or("", |s| s.as_str());
    OrderStatus::ALL
        .into_iter()
        .map(|s| SelectOption::new(s.as_str(), s.label(), current))
        .collect()
}

/// Order table page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub page: AdminPage,
    pub orders: Vec<Order>,
    pub statuses: Vec<SelectOption>,
    pub total: u64,
    pub pagination: PageLinks,
    pub notice: Option<&'static str>,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub page: AdminPage,
    pub order: Order,
    pub statuses: Vec<SelectOption>,
}

/// Order table handler.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    page: AdminPage,
    Query(query): Query<OrdersQuery>,
) -> Result<OrdersIndexTemplate, AppError> {
    let per_page = state.config().page_size;
    let api = state.api();
    let order_query = OrderQuery {
        page: query.page(),
        page_size: per_page,
        status: query.status(),
        customer: None,
    };
    let order_query = &order_query;

    let (results, notice) = match with_token(&session, api, |token| async move {
        api.list_orders(&token, order_query).await
    })
    .await
    {
        Ok(results) => (results, None),
        Err(e) if e.requires_login() => return Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load orders");
            (lodra_core::schema::Paginated::empty(), Some(LOAD_FAILED))
        }
    };

    let pagination = Pagination::new(query.page(), per_page, results.count)
        .links(PAGE_RADIUS, |n| query.page_href(n));

    Ok(OrdersIndexTemplate {
        page,
        orders: results.results,
        statuses: status_options(query.status()),
        total: results.count,
        pagination,
        notice,
    })
}

/// Order detail handler.
#[instrument(skip_all, fields(admin_id = %admin.id, order_id = %id))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    page: AdminPage,
    Path(id): Path<OrderId>,
) -> Result<OrderShowTemplate, AppError> {
    let api = state.api();
    let order = with_token(&session, api, |token| async move {
        api.get_order(&token, id).await
    })
    .await?;

    Ok(OrderShowTemplate {
        page,
        statuses: status_options(Some(order.status)),
        order,
    })
}

/// Change an order's status.
///
/// The backend decides which transitions are allowed; a refusal is shown as
/// an error toast on the detail page.
#[instrument(skip_all, fields(admin_id = %admin.id, order_id = %id))]
pub async fn update_status(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Response, AppError> {
    let back = format!("/orders/{id}");
    let Ok(status) = form.validate() else {
        set_flash(&session, Flash::error("Statusi i zgjedhur nuk është i vlefshëm.")).await;
        return Ok(redirect(&headers, &back));
    };

    let api = state.api();
    let result = with_token(&session, api, |token| async move {
        api.update_order_status(&token, id, status).await
    })
    .await;

    match result {
        Ok(order) => {
            tracing::info!(status = order.status.as_str(), "Order status changed");
            set_flash(
                &session,
                Flash::success(format!("Statusi u ndryshua në \"{}\".", order.status.label())),
            )
            .await;
        }
        Err(e) if e.requires_login() => return Err(e),
        Err(AppError::Api(err)) if !err.is_unavailable() => {
            let message = err
                .first_message()
                .unwrap_or("Statusi nuk mund të ndryshohej.")
                .to_string();
            set_flash(&session, Flash::error(message)).await;
        }
        Err(e) => {
            tracing::error!(error = %e, "Order status change failed");
            set_flash(&session, Flash::error("Statusi nuk mund të ndryshohej.")).await;
        }
    }

    Ok(redirect(&headers, &back))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_query_ignores_unknown_status() {
        let query = OrdersQuery {
            page: Some(2),
            status: Some("lost".to_string()),
        };
        assert_eq!(query.status(), None);
        assert_eq!(query.page_href(3), "/orders?page=3");

        let query = OrdersQuery {
            page: None,
            status: Some("shipped".to_string()),
        };
        assert_eq!(query.page_href(2), "/orders?status=shipped&page=2");
    }

    #[test]
    fn test_status_options_select_current() {
        let options = status_options(Some(OrderStatus::Processing));
        let selected: Vec<_> = options.iter().filter(|o| o.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected.first().map(|o| o.value.as_str()), Some("processing"));
    }
}
