//! Customer lookup: searchable table and detail with order history.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use lodra_core::schema::{Customer, Order};
use lodra_core::{CustomerId, PageLinks, Pagination};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{ListQuery, OrderQuery};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::page::AdminPage;
use crate::services::auth::with_token;
use crate::state::AppState;

use super::{LOAD_FAILED, PAGE_RADIUS, TableQuery};

const ORDERS_PER_CUSTOMER_PAGE: u32 = 10;

/// Customer table page template.
#[derive(Template, WebTemplate)]
#[template(path = "customers/index.html")]
pub struct CustomersIndexTemplate {
    pub page: AdminPage,
    pub customers: Vec<Customer>,
    pub search: String,
    pub total: u64,
    pub pagination: PageLinks,
    pub notice: Option<&'static str>,
}

/// Customer detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "customers/show.html")]
pub struct CustomerShowTemplate {
    pub page: AdminPage,
    pub customer: Customer,
    pub orders: Vec<Order>,
    pub pagination: PageLinks,
    pub orders_notice: Option<&'static str>,
}

/// Customer table handler.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    page: AdminPage,
    Query(query): Query<TableQuery>,
) -> Result<CustomersIndexTemplate, AppError> {
    let per_page = state.config().page_size;
    let api = state.api();
    let list_query = ListQuery {
        page: query.page(),
        page_size: per_page,
        search: query.search(),
    };
    let list_query = &list_query;

    let (results, notice) = match with_token(&session, api, |token| async move {
        api.list_customers(&token, list_query).await
    })
    .await
    {
        Ok(results) => (results, None),
        Err(e) if e.requires_login() => return Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load customers");
            (lodra_core::schema::Paginated::empty(), Some(LOAD_FAILED))
        }
    };

    let pagination = Pagination::new(query.page(), per_page, results.count)
        .links(PAGE_RADIUS, |n| query.page_href("/customers", n));

    Ok(CustomersIndexTemplate {
        page,
        customers: results.results,
        search: query.search().unwrap_or_default(),
        total: results.count,
        pagination,
        notice,
    })
}

/// Customer detail handler.
///
/// A missing customer is a 404; failing to load their orders only shows a
/// notice in the orders panel.
#[instrument(skip_all, fields(admin_id = %admin.id, customer_id = %id))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    page: AdminPage,
    Path(id): Path<CustomerId>,
    Query(query): Query<TableQuery>,
) -> Result<CustomerShowTemplate, AppError> {
    let api = state.api();
    let customer = with_token(&session, api, |token| async move {
        api.get_customer(&token, id).await
    })
    .await?;

    let order_query = OrderQuery {
        page: query.page(),
        page_size: ORDERS_PER_CUSTOMER_PAGE,
        status: None,
        customer: Some(id),
    };
    let order_query = &order_query;
    let (orders, orders_notice) = match with_token(&session, api, |token| async move {
        api.list_orders(&token, order_query).await
    })
    .await
    {
        Ok(results) => (results, None),
        Err(e) if e.requires_login() => return Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load customer orders");
            (lodra_core::schema::Paginated::empty(), Some(LOAD_FAILED))
        }
    };

    let base = format!("/customers/{id}");
    let pagination = Pagination::new(query.page(), ORDERS_PER_CUSTOMER_PAGE, orders.count)
        .links(PAGE_RADIUS, |n| TableQuery::default().page_href(&base, n));

    Ok(CustomerShowTemplate {
        page,
        customer,
        orders: orders.results,
        pagination,
        orders_notice,
    })
}
