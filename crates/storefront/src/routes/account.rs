//! Account route handlers (require a logged-in customer).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use lodra_core::schema::{Address, LoyaltyPoints, Order, User};
use lodra_core::{AddressId, OrderId, PageLinks, Pagination};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::orders::{StatusStep, status_steps};
use crate::api::ApiError;
use crate::error::AppError;
use crate::filters;
use crate::forms::{AddressForm, FormErrors, ProfileForm};
use crate::middleware::RequireAuth;
use crate::models::Flash;
use crate::page::PageContext;
use crate::services::{auth, storage};
use crate::state::AppState;

const ORDERS_PER_PAGE: u32 = 10;
const SAVE_FAILED: &str = "Ndryshimet nuk u ruajtën. Kontrolloni të dhënat.";

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// Account overview template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountTemplate {
    pub page: PageContext,
    pub user: User,
    pub form: ProfileForm,
    pub errors: FormErrors,
    pub loyalty: Option<LoyaltyPoints>,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub page: PageContext,
    pub orders: Vec<Order>,
    pub pagination: PageLinks,
    pub notice: Option<&'static str>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderTemplate {
    pub page: PageContext,
    pub order: Order,
    pub steps: Vec<StatusStep>,
}

/// A saved address with its inline edit form.
#[derive(Debug, Clone)]
pub struct AddressCard {
    pub address: Address,
    pub form: AddressForm,
    pub errors: FormErrors,
}

/// Address book template.
#[derive(Template, WebTemplate)]
#[template(path = "account/addresses.html")]
pub struct AddressesTemplate {
    pub page: PageContext,
    pub addresses: Vec<AddressCard>,
    pub form: AddressForm,
    pub errors: FormErrors,
    pub notice: Option<&'static str>,
}

impl From<&Address> for AddressForm {
    fn from(address: &Address) -> Self {
        Self {
            label: address.label.clone(),
            full_name: address.full_name.clone(),
            phone: address.phone.clone(),
            street: address.street.clone(),
            city: address.city.clone(),
            postal_code: address.postal_code.clone(),
            is_default: address.is_default.then(|| "on".to_string()),
        }
    }
}

impl From<&User> for ProfileForm {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone().unwrap_or_default(),
        }
    }
}

// =============================================================================
// Profile
// =============================================================================

async fn render_account(
    state: &AppState,
    session: &Session,
    page: PageContext,
    user: User,
    form: Option<ProfileForm>,
    errors: FormErrors,
) -> Result<AccountTemplate, AppError> {
    let api = state.api();
    let loyalty = match auth::with_token(session, api, |token| async move {
        api.loyalty_points(&token).await
    })
    .await
    {
        Ok(points) => Some(points),
        Err(e @ (AppError::Unauthorized(_) | AppError::Api(ApiError::Unauthorized))) => {
            return Err(e);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load loyalty points");
            None
        }
    };

    Ok(AccountTemplate {
        page,
        form: form.unwrap_or_else(|| ProfileForm::from(&user)),
        user,
        errors,
        loyalty,
    })
}

/// Display the account overview: profile form and loyalty points.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    RequireAuth(user): RequireAuth,
) -> Result<AccountTemplate, AppError> {
    render_account(&state, &session, page, user, None, FormErrors::new()).await
}

/// Update the profile.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    let update = match form.validate() {
        Ok(update) => update,
        Err(errors) => {
            let page = render_account(&state, &session, page, user, Some(form), errors).await?;
            return Ok(page.into_response());
        }
    };

    let api = state.api();
    let update = &update;
    let result = auth::with_token(&session, api, |token| async move {
        api.update_me(&token, update).await
    })
    .await;

    match result {
        Ok(updated) => {
            auth::store_user(&session, &updated).await?;
            tracing::info!("Profile updated");
            storage::set_flash(&session, Flash::success("Profili u përditësua")).await;
            Ok(Redirect::to("/account").into_response())
        }
        Err(AppError::Api(err @ ApiError::Validation(_))) => {
            let errors = FormErrors::from_api(&err, SAVE_FAILED);
            let page = render_account(&state, &session, page, user, Some(form), errors).await?;
            Ok(page.into_response())
        }
        Err(e) => Err(e),
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Display order history.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn orders(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    RequireAuth(user): RequireAuth,
    Query(query): Query<PageQuery>,
) -> Result<OrdersTemplate, AppError> {
    let number = query.page.unwrap_or(1).max(1);
    let api = state.api();
    let result = auth::with_token(&session, api, |token| async move {
        api.my_orders(&token, number, ORDERS_PER_PAGE).await
    })
    .await;

    let (orders, total, notice) = match result {
        Ok(results) => (results.results, results.count, None),
        Err(e @ (AppError::Unauthorized(_) | AppError::Api(ApiError::Unauthorized))) => {
            return Err(e);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load order history");
            (Vec::new(), 0, Some("Nuk mund të ngarkoheshin porositë"))
        }
    };

    let pagination = Pagination::new(number, ORDERS_PER_PAGE, total).links(2, |n| {
        if n > 1 {
            format!("/account/orders?page={n}")
        } else {
            "/account/orders".to_string()
        }
    });

    Ok(OrdersTemplate {
        page,
        orders,
        pagination,
        notice,
    })
}

/// Display one order.
#[instrument(skip_all, fields(user_id = %user.id, order_id = %id))]
pub async fn order(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<OrderTemplate, AppError> {
    let api = state.api();
    let order = auth::with_token(&session, api, |token| async move {
        api.get_order(&token, id).await
    })
    .await?;

    Ok(OrderTemplate {
        page,
        steps: status_steps(order.status),
        order,
    })
}

// =============================================================================
// Addresses
// =============================================================================

async fn load_addresses(
    state: &AppState,
    session: &Session,
) -> Result<(Vec<Address>, Option<&'static str>), AppError> {
    let api = state.api();
    match auth::with_token(session, api, |token| async move { api.addresses(&token).await }).await
    {
        Ok(addresses) => Ok((addresses, None)),
        Err(e @ (AppError::Unauthorized(_) | AppError::Api(ApiError::Unauthorized))) => Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load addresses");
            Ok((Vec::new(), Some("Nuk mund të ngarkoheshin adresat")))
        }
    }
}

/// Render the address book. `failed` puts a rejected form back in place:
/// `None` for the new-address form, `Some(id)` for an edit form.
async fn render_addresses(
    state: &AppState,
    session: &Session,
    page: PageContext,
    failed: Option<(Option<AddressId>, AddressForm, FormErrors)>,
) -> Result<AddressesTemplate, AppError> {
    let (addresses, notice) = load_addresses(state, session).await?;

    let mut form = AddressForm::default();
    let mut errors = FormErrors::new();
    let mut edit: Option<(AddressId, AddressForm, FormErrors)> = None;
    match failed {
        Some((None, f, e)) => {
            form = f;
            errors = e;
        }
        Some((Some(id), f, e)) => edit = Some((id, f, e)),
        None => {}
    }

    let addresses = addresses
        .into_iter()
        .map(|address| match edit.take_if(|(id, _, _)| *id == address.id) {
            Some((_, form, errors)) => AddressCard {
                address,
                form,
                errors,
            },
            None => AddressCard {
                form: AddressForm::from(&address),
                address,
                errors: FormErrors::new(),
            },
        })
        .collect();

    Ok(AddressesTemplate {
        page,
        addresses,
        form,
        errors,
        notice,
    })
}

/// Display the address book.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn addresses(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    RequireAuth(user): RequireAuth,
) -> Result<AddressesTemplate, AppError> {
    render_addresses(&state, &session, page, None).await
}

/// Save a new address.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_address(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    RequireAuth(user): RequireAuth,
    Form(form): Form<AddressForm>,
) -> Result<Response, AppError> {
    save_address(&state, &session, page, None, form).await
}

/// Update a saved address.
#[instrument(skip_all, fields(user_id = %user.id, address_id = %id))]
pub async fn update_address(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
    Form(form): Form<AddressForm>,
) -> Result<Response, AppError> {
    save_address(&state, &session, page, Some(id), form).await
}

async fn save_address(
    state: &AppState,
    session: &Session,
    page: PageContext,
    id: Option<AddressId>,
    form: AddressForm,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            let page = render_addresses(state, session, page, Some((id, form, errors))).await?;
            return Ok(page.into_response());
        }
    };

    let api = state.api();
    let input = &input;
    let result = auth::with_token(session, api, |token| async move {
        match id {
            Some(id) => api.update_address(&token, id, input).await,
            None => api.create_address(&token, input).await,
        }
    })
    .await;

    match result {
        Ok(address) => {
            tracing::info!(address_id = %address.id, "Address saved");
            let message = if id.is_some() {
                "Adresa u përditësua"
            } else {
                "Adresa u shtua"
            };
            storage::set_flash(session, Flash::success(message)).await;
            Ok(Redirect::to("/account/addresses").into_response())
        }
        Err(AppError::Api(err @ ApiError::Validation(_))) => {
            let errors = FormErrors::from_api(&err, SAVE_FAILED);
            let page = render_addresses(state, session, page, Some((id, form, errors))).await?;
            Ok(page.into_response())
        }
        Err(e) => Err(e),
    }
}

/// Delete a saved address.
#[instrument(skip_all, fields(user_id = %user.id, address_id = %id))]
pub async fn delete_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Response, AppError> {
    let api = state.api();
    match auth::with_token(&session, api, |token| async move {
        api.delete_address(&token, id).await
    })
    .await
    {
        Ok(()) | Err(AppError::Api(ApiError::NotFound(_))) => {
            tracing::info!("Address deleted");
            storage::set_flash(&session, Flash::success("Adresa u fshi")).await;
        }
        Err(e) => return Err(e),
    }
    Ok(Redirect::to("/account/addresses").into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lodra_core::UserId;

    use super::*;

    #[test]
    fn test_address_form_prefill() {
        let address = Address {
            id: AddressId::new(5),
            label: None,
            full_name: "Ana Hoxha".to_string(),
            phone: "+355691234567".to_string(),
            street: "Rruga Myslym Shyri 4".to_string(),
            city: "Tiranë".to_string(),
            postal_code: Some("1001".to_string()),
            is_default: true,
        };
        let form = AddressForm::from(&address);
        assert_eq!(form.is_default.as_deref(), Some("on"));
        let input = form.validate().unwrap();
        assert!(input.is_default);
        assert_eq!(input.postal_code.as_deref(), Some("1001"));
    }

    #[test]
    fn test_profile_form_prefill() {
        let user = User {
            id: UserId::new(2),
            email: "besa@lodra.al".to_string(),
            first_name: "Besa".to_string(),
            last_name: "Kola".to_string(),
            phone: None,
            is_staff: false,
            loyalty_points: 0,
        };
        let form = ProfileForm::from(&user);
        assert_eq!(form.first_name, "Besa");
        assert!(form.phone.is_empty());
    }
}
