//! Product management: table, modal create/edit forms, delete.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use lodra_core::schema::Product;
use lodra_core::{PageLinks, Pagination, ProductId};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ListQuery;
use crate::error::AppError;
use crate::filters;
use crate::forms::{FormErrors, ProductForm};
use crate::middleware::RequireAdminAuth;
use crate::models::Flash;
use crate::page::AdminPage;
use crate::services::auth::with_token;
use crate::services::flash::set_flash;
use crate::state::AppState;

use super::{LOAD_FAILED, PAGE_RADIUS, SelectOption, TableQuery, form_outcome, redirect};

/// Product table page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: AdminPage,
    pub products: Vec<Product>,
    pub search: String,
    pub total: u64,
    pub pagination: PageLinks,
    pub notice: Option<&'static str>,
}

/// Product modal form fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub title: &'static str,
    pub action: String,
    pub form: ProductForm,
    pub errors: FormErrors,
    pub categories: Vec<SelectOption>,
    pub brands: Vec<SelectOption>,
}

/// Build the form fragment with category and brand selects.
///
/// When the selects cannot be loaded the form still renders with empty
/// selects ("pa kategori").
async fn form_template(
    state: &AppState,
    session: &Session,
    title: &'static str,
    action: String,
    form: ProductForm,
    errors: FormErrors,
) -> Result<ProductFormTemplate, AppError> {
    let api = state.api();

    let categories = match with_token(session, api, |token| async move {
        api.list_categories(&token).await
    })
    .await
    {
        Ok(list) => list
            .iter()
            .map(|c| SelectOption::new(c.id, c.name.clone(), &form.category))
            .collect(),
        Err(e) if e.requires_login() => return Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load categories");
            Vec::new()
        }
    };

    let brands = match with_token(session, api, |token| async move {
        api.list_brands(&token).await
    })
    .await
    {
        Ok(list) => list
            .iter()
            .map(|b| SelectOption::new(b.id, b.name.clone(), &form.brand))
            .collect(),
        Err(e) if e.requires_login() => return Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load brands");
            Vec::new()
        }
    };

    Ok(ProductFormTemplate {
        title,
        action,
        form,
        errors,
        categories,
        brands,
    })
}

/// Product table handler.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    page: AdminPage,
    Query(query): Query<TableQuery>,
) -> Result<ProductsIndexTemplate, AppError> {
    let per_page = state.config().page_size;
    let api = state.api();
    let list_query = ListQuery {
        page: query.page(),
        page_size: per_page,
        search: query.search(),
    };
    let list_query = &list_query;

    let (results, notice) = match with_token(&session, api, |token| async move {
        api.list_products(&token, list_query).await
    })
    .await
    {
        Ok(results) => (results, None),
        Err(e) if e.requires_login() => return Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load products");
            (lodra_core::schema::Paginated::empty(), Some(LOAD_FAILED))
        }
    };

    let pagination = Pagination::new(query.page(), per_page, results.count)
        .links(PAGE_RADIUS, |n| query.page_href("/products", n));

    Ok(ProductsIndexTemplate {
        page,
        products: results.results,
        search: query.search().unwrap_or_default(),
        total: results.count,
        pagination,
        notice,
    })
}

/// Empty create form (modal fragment).
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn new_form(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<ProductFormTemplate, AppError> {
    form_template(
        &state,
        &session,
        "Produkt i ri",
        "/products".to_string(),
        ProductForm::default(),
        FormErrors::new(),
    )
    .await
}

/// Create a product.
#[instrument(skip_all, fields(admin_id = %admin.id, name = %form.name))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let template = form_template(
                &state,
                &session,
                "Produkt i ri",
                "/products".to_string(),
                form,
                errors,
            )
            .await?;
            return Ok(template.into_response());
        }
    };

    let api = state.api();
    let input = &input;
    let result = with_token(&session, api, |token| async move {
        api.create_product(&token, input).await
    })
    .await;

    match form_outcome(result)? {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "Product created");
            set_flash(
                &session,
                Flash::success(format!("Produkti \"{}\" u krijua.", product.name)),
            )
            .await;
            Ok(redirect(&headers, "/products"))
        }
        Err(errors) => {
            let template = form_template(
                &state,
                &session,
                "Produkt i ri",
                "/products".to_string(),
                form,
                errors,
            )
            .await?;
            Ok(template.into_response())
        }
    }
}

/// Prefilled edit form (modal fragment).
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn edit_form(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<ProductFormTemplate, AppError> {
    let api = state.api();
    let product = with_token(&session, api, |token| async move {
        api.get_product(&token, id).await
    })
    .await?;

    form_template(
        &state,
        &session,
        "Ndrysho produktin",
        format!("/products/{id}"),
        ProductForm::from_product(&product),
        FormErrors::new(),
    )
    .await
}

/// Update a product.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    let action = format!("/products/{id}");
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let template =
                form_template(&state, &session, "Ndrysho produktin", action, form, errors).await?;
            return Ok(template.into_response());
        }
    };

    let api = state.api();
    let input = &input;
    let result = with_token(&session, api, |token| async move {
        api.update_product(&token, id, input).await
    })
    .await;

    match form_outcome(result)? {
        Ok(product) => {
            tracing::info!("Product updated");
            set_flash(
                &session,
                Flash::success(format!("Produkti \"{}\" u ruajt.", product.name)),
            )
            .await;
            Ok(redirect(&headers, "/products"))
        }
        Err(errors) => {
            let template =
                form_template(&state, &session, "Ndrysho produktin", action, form, errors).await?;
            Ok(template.into_response())
        }
    }
}

/// Delete a product.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
) -> Result<Response, AppError> {
    let api = state.api();
    let result = with_token(&session, api, |token| async move {
        api.delete_product(&token, id).await
    })
    .await;
    match result {
        Ok(()) => {
            tracing::info!("Product deleted");
            set_flash(&session, Flash::success("Produkti u fshi.")).await;
        }
        Err(e) if e.requires_login() => return Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "Product delete failed");
            set_flash(&session, Flash::error("Produkti nuk mund të fshihej.")).await;
        }
    }
    Ok(redirect(&headers, "/products"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::forms::INVALID_STOCK;

    #[test]
    fn test_form_fragment_shows_errors_and_keeps_input() {
        let form = ProductForm {
            name: "Kamion zjarrfikës".to_string(),
            price: "1500".to_string(),
            stock: "-3".to_string(),
            category: "2".to_string(),
            ..ProductForm::default()
        };
        let errors = form.validate().unwrap_err();
        let html = ProductFormTemplate {
            title: "Produkt i ri",
            action: "/products".to_string(),
            form,
            errors,
            categories: vec![
                SelectOption::new(1, "Makina", "2"),
                SelectOption::new(2, "Zjarrfikës", "2"),
            ],
            brands: Vec::new(),
        }
        .render()
        .unwrap();

        assert!(html.contains(INVALID_STOCK));
        assert!(html.contains("Kamion zjarrfikës"));
        assert!(html.contains(r#"<option value="2" selected>Zjarrfikës</option>"#));
        assert!(html.contains(r#"hx-post="/products""#));
    }
}
