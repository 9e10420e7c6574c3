//! Category management.
//!
//! The backend returns every category at once, so the table is searched and
//! paginated here from the cached list.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use lodra_core::schema::Category;
use lodra_core::{CategoryId, PageLinks, Pagination};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::error::AppError;
use crate::filters;
use crate::forms::{CategoryForm, FormErrors};
use crate::middleware::RequireAdminAuth;
use crate::models::Flash;
use crate::page::AdminPage;
use crate::services::auth::with_token;
use crate::services::flash::set_flash;
use crate::state::AppState;

use super::{
    LOAD_FAILED, PAGE_RADIUS, SelectOption, TableQuery, form_outcome, matches_search, page_slice,
    redirect,
};

/// Table row: the category and its parent's name.
#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub category: Category,
    pub parent_name: Option<String>,
}

/// Category table page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub page: AdminPage,
    pub rows: Vec<CategoryRow>,
    pub search: String,
    pub total: u64,
    pub pagination: PageLinks,
    pub notice: Option<&'static str>,
}

/// Category modal form fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "categories/form.html")]
pub struct CategoryFormTemplate {
    pub title: &'static str,
    pub action: String,
    pub form: CategoryForm,
    pub errors: FormErrors,
    pub parents: Vec<SelectOption>,
}

/// Rows matching `search`, in backend order.
fn filter_rows(categories: &[Category], search: Option<&str>) -> Vec<CategoryRow> {
    categories
        .iter()
        .filter(|c| matches_search(&c.name, search))
        .map(|c| CategoryRow {
            category: c.clone(),
            parent_name: c.parent.and_then(|parent| {
                categories
                    .iter()
                    .find(|p| p.id == parent)
                    .map(|p| p.name.clone())
            }),
        })
        .collect()
}

async fn form_template(
    state: &AppState,
    session: &Session,
    editing: Option<CategoryId>,
    form: CategoryForm,
    errors: FormErrors,
) -> Result<CategoryFormTemplate, AppError> {
    let api = state.api();
    let parents = match with_token(session, api, |token| async move {
        api.list_categories(&token).await
    })
    .await
    {
        Ok(list) => list
            .iter()
            .filter(|c| Some(c.id) != editing)
            .map(|c| SelectOption::new(c.id, c.name.clone(), &form.parent))
            .collect(),
        Err(e) if e.requires_login() => return Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load parent categories");
            Vec::new()
        }
    };

    let (title, action) = match editing {
        Some(id) => ("Ndrysho kategorinë", format!("/categories/{id}")),
        None => ("Kategori e re", "/categories".to_string()),
    };

    Ok(CategoryFormTemplate {
        title,
        action,
        form,
        errors,
        parents,
    })
}

/// Category table handler.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    page: AdminPage,
    Query(query): Query<TableQuery>,
) -> Result<CategoriesIndexTemplate, AppError> {
    let per_page = state.config().page_size;
    let api = state.api();
    let search = query.search();

    let (rows, notice) = match with_token(&session, api, |token| async move {
        api.list_categories(&token).await
    })
    .await
    {
        Ok(list) => (filter_rows(&list, search.as_deref()), None),
        Err(e) if e.requires_login() => return Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load categories");
            (Vec::new(), Some(LOAD_FAILED))
        }
    };

    let total = rows.len() as u64;
    let paging = Pagination::new(query.page(), per_page, total);
    let pagination = paging.links(PAGE_RADIUS, |n| query.page_href("/categories", n));

    Ok(CategoriesIndexTemplate {
        page,
        rows: page_slice(&rows, paging.page, per_page),
        search: search.unwrap_or_default(),
        total,
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
) -> Result<CategoryFormTemplate, AppError> {
    form_template(&state, &session, None, CategoryForm::default(), FormErrors::new()).await
}

/// Create a category.
#[instrument(skip_all, fields(admin_id = %admin.id, name = %form.name))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<CategoryForm>,
) -> Result<Response, AppError> {
    let input = match form.validate(None) {
        Ok(input) => input,
        Err(errors) => {
            return Ok(form_template(&state, &session, None, form, errors)
                .await?
                .into_response());
        }
    };

    let api = state.api();
    let input = &input;
    let result = with_token(&session, api, |token| async move {
        api.create_category(&token, input).await
    })
    .await;

    match form_outcome(result)? {
        Ok(category) => {
            tracing::info!(category_id = %category.id, "Category created");
            set_flash(&session, Flash::success("Kategoria u krijua.")).await;
            Ok(redirect(&headers, "/categories"))
        }
        Err(errors) => Ok(form_template(&state, &session, None, form, errors)
            .await?
            .into_response()),
    }
}

/// Prefilled edit form (modal fragment).
#[instrument(skip_all, fields(admin_id = %admin.id, category_id = %id))]
pub async fn edit_form(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<CategoryId>,
) -> Result<CategoryFormTemplate, AppError> {
    let api = state.api();
    let categories = with_token(&session, api, |token| async move {
        api.list_categories(&token).await
    })
    .await?;
    let category = categories
        .iter()
        .find(|c| c.id == id)
        .ok_or_else(|| AppError::Api(ApiError::NotFound(format!("category {id}"))))?;

    form_template(
        &state,
        &session,
        Some(id),
        CategoryForm::from_category(category),
        FormErrors::new(),
    )
    .await
}

/// Update a category.
#[instrument(skip_all, fields(admin_id = %admin.id, category_id = %id))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(id): Path<CategoryId>,
    Form(form): Form<CategoryForm>,
) -> Result<Response, AppError> {
    let input = match form.validate(Some(id)) {
        Ok(input) => input,
        Err(errors) => {
            return Ok(form_template(&state, &session, Some(id), form, errors)
                .await?
                .into_response());
        }
    };

    let api = state.api();
    let input = &input;
    let result = with_token(&session, api, |token| async move {
        api.update_category(&token, id, input).await
    })
    .await;

    match form_outcome(result)? {
        Ok(_) => {
            tracing::info!("Category updated");
            set_flash(&session, Flash::success("Kategoria u ruajt.")).await;
            Ok(redirect(&headers, "/categories"))
        }
        Err(errors) => Ok(form_template(&state, &session, Some(id), form, errors)
            .await?
            .into_response()),
    }
}

/// Delete a category.
#[instrument(skip_all, fields(admin_id = %admin.id, category_id = %id))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Path(id): Path<CategoryId>,
) -> Result<Response, AppError> {
    let api = state.api();
    let result = with_token(&session, api, |token| async move {
        api.delete_category(&token, id).await
    })
    .await;
    match result {
        Ok(()) => set_flash(&session, Flash::success("Kategoria u fshi.")).await,
        Err(e) if e.requires_login() => return Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "Category delete failed");
            set_flash(
                &session,
                Flash::error("Kategoria nuk mund të fshihej. Kontrolloni nëse ka produkte."),
            )
            .await;
        }
    }
    Ok(redirect(&headers, "/categories"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn category(id: i64, name: &str, parent: Option<i64>) -> Category {
        Category {
            id: CategoryId::new(id),
            name: name.to_string(),
            slug: name.to_lowercase(),
            description: String::new(),
            image: None,
            parent: parent.map(CategoryId::new),
            product_count: 0,
        }
    }

    #[test]
    fn test_filter_rows_resolves_parent_names() {
        let categories = vec![
            category(1, "Lodra", None),
            category(2, "Lodra druri", Some(1)),
            category(3, "Libra", None),
        ];

        let rows = filter_rows(&categories, Some("druri"));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.first().unwrap().parent_name.as_deref(), Some("Lodra"));

        assert_eq!(filter_rows(&categories, None).len(), 3);
    }
}
