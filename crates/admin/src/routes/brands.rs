//! Brand management.
//!
//! Like categories, brands arrive as one list and are paginated here.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use lodra_core::schema::Brand;
use lodra_core::{BrandId, PageLinks, Pagination};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::error::AppError;
use crate::filters;
use crate::forms::{BrandForm, FormErrors};
use crate::middleware::RequireAdminAuth;
use crate::models::Flash;
use crate::page::AdminPage;
use crate::services::auth::with_token;
use crate::services::flash::set_flash;
use crate::state::AppState;

use super::{LOAD_FAILED, PAGE_RADIUS, TableQuery, form_outcome, matches_search, page_slice, redirect};

/// Brand table page template.
#[derive(Template, WebTemplate)]
#[template(path = "brands/index.html")]
pub struct BrandsIndexTemplate {
    pub page: AdminPage,
    pub brands: Vec<Brand>,
    pub search: String,
    pub total: u64,
    pub pagination: PageLinks,
    pub notice: Option<&'static str>,
}

/// Brand modal form fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "brands/form.html")]
pub struct BrandFormTemplate {
    pub title: &'static str,
    pub action: String,
    pub form: BrandForm,
    pub errors: FormErrors,
}

impl BrandFormTemplate {
    fn new(editing: Option<BrandId>, form: BrandForm, errors: FormErrors) -> Self {
        let (title, action) = match editing {
            Some(id) => ("Ndrysho markën", format!("/brands/{id}")),
            None => ("Markë e re", "/brands".to_string()),
        };
        Self {
            title,
            action,
            form,
            errors,
        }
    }
}

/// Brand table handler.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    page: AdminPage,
    Query(query): Query<TableQuery>,
) -> Result<BrandsIndexTemplate, AppError> {
    let per_page = state.config().page_size;
    let api = state.api();
    let search = query.search();

    let (brands, notice) = match with_token(&session, api, |token| async move {
        api.list_brands(&token).await
    })
    .await
    {
        Ok(list) => (
            list.iter()
                .filter(|b| matches_search(&b.name, search.as_deref()))
                .cloned()
                .collect::<Vec<_>>(),
            None,
        ),
        Err(e) if e.requires_login() => return Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load brands");
            (Vec::new(), Some(LOAD_FAILED))
        }
    };

    let total = brands.len() as u64;
    let paging = Pagination::new(query.page(), per_page, total);
    let pagination = paging.links(PAGE_RADIUS, |n| query.page_href("/brands", n));

    Ok(BrandsIndexTemplate {
        page,
        brands: page_slice(&brands, paging.page, per_page),
        search: search.unwrap_or_default(),
        total,
        pagination,
        notice,
    })
}

/// Empty create form (modal fragment).
pub async fn new_form(RequireAdminAuth(_admin): RequireAdminAuth) -> BrandFormTemplate {
    BrandFormTemplate::new(None, BrandForm::default(), FormErrors::new())
}

/// Create a brand.
#[instrument(skip_all, fields(admin_id = %admin.id, name = %form.name))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<BrandForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => return Ok(BrandFormTemplate::new(None, form, errors).into_response()),
    };

    let api = state.api();
    let input = &input;
    let result = with_token(&session, api, |token| async move {
        api.create_brand(&token, input).await
    })
    .await;

    match form_outcome(result)? {
        Ok(brand) => {
            tracing::info!(brand_id = %brand.id, "Brand created");
            set_flash(&session, Flash::success("Marka u krijua.")).await;
            Ok(redirect(&headers, "/brands"))
        }
        Err(errors) => Ok(BrandFormTemplate::new(None, form, errors).into_response()),
    }
}

/// Prefilled edit form (modal fragment).
#[instrument(skip_all, fields(admin_id = %admin.id, brand_id = %id))]
pub async fn edit_form(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<BrandId>,
) -> Result<BrandFormTemplate, AppError> {
    let api = state.api();
    let brands = with_token(&session, api, |token| async move {
        api.list_brands(&token).await
    })
    .await?;
    let brand = brands
        .iter()
        .find(|b| b.id == id)
        .ok_or_else(|| AppError::Api(ApiError::NotFound(format!("brand {id}"))))?;

    Ok(BrandFormTemplate::new(
        Some(id),
        BrandForm::from_brand(brand),
        FormErrors::new(),
    ))
}

/// Update a brand.
#[instrument(skip_all, fields(admin_id = %admin.id, brand_id = %id))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(id): Path<BrandId>,
    Form(form): Form<BrandForm>,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => return Ok(BrandFormTemplate::new(Some(id), form, errors).into_response()),
    };

    let api = state.api();
    let input = &input;
    let result = with_token(&session, api, |token| async move {
        api.update_brand(&token, id, input).await
    })
    .await;

    match form_outcome(result)? {
        Ok(_) => {
            tracing::info!("Brand updated");
            set_flash(&session, Flash::success("Marka u ruajt.")).await;
            Ok(redirect(&headers, "/brands"))
        }
        Err(errors) => Ok(BrandFormTemplate::new(Some(id), form, errors).into_response()),
    }
}

/// Delete a brand.
#[instrument(skip_all, fields(admin_id = %admin.id, brand_id = %id))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(id): Path<BrandId>,
) -> Result<Response, AppError> {
    let api = state.api();
    let result = with_token(&session, api, |token| async move {
        api.delete_brand(&token, id).await
    })
    .await;
    match result {
        Ok(()) => set_flash(&session, Flash::success("Marka u fshi.")).await,
        Err(e) if e.requires_login() => return Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "Brand delete failed");
            set_flash(&session, Flash::error("Marka nuk mund të fshihej.")).await;
        }
    }
    Ok(redirect(&headers, "/brands"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::forms::REQUIRED;

    #[test]
    fn test_edit_form_posts_to_brand() {
        let html = BrandFormTemplate::new(
            Some(BrandId::new(7)),
            BrandForm::default(),
            BrandForm::default().validate().unwrap_err(),
        )
        .render()
        .unwrap();
        assert!(html.contains(r#"hx-post="/brands/7""#));
        assert!(html.contains("Ndrysho markën"));
        assert!(html.contains(REQUIRED));
    }
}
