//! Checkout route handlers.
//!
//! The browser never computes money. The summary panel posts the whole
//! checkout form to `/checkout/summary` on load, on every change, and on a
//! timer; the backend's `calculate-order` answers with the breakdown.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use lodra_core::schema::{Address, Order, OrderCalculation, OrderCalculationRequest, User};
use lodra_core::{Cart, PaymentMethod, TrackingCode};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::ApiError;
use crate::error::AppError;
use crate::filters;
use crate::forms::{CheckoutForm, FormErrors};
use crate::middleware::OptionalAuth;
use crate::models::Flash;
use crate::page::PageContext;
use crate::services::{auth, storage};
use crate::state::AppState;

const CALCULATION_FAILED: &str = "Totali nuk mund të llogaritej. Provoni përsëri.";
const ORDER_FAILED: &str = "Porosia nuk mund të krijohej. Provoni përsëri.";

/// Saved address `<option>` / radio.
#[derive(Debug, Clone)]
pub struct AddressOption {
    pub id: String,
    pub summary: String,
    pub selected: bool,
}

/// Payment method radio.
#[derive(Debug, Clone)]
pub struct PaymentOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub cart: Cart,
    pub form: CheckoutForm,
    pub errors: FormErrors,
    pub addresses: Vec<AddressOption>,
    pub payment_methods: Vec<PaymentOption>,
    pub logged_in: bool,
    pub loyalty_balance: i64,
    pub refresh_secs: u64,
}

/// Price breakdown fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/checkout_summary.html")]
pub struct CheckoutSummaryTemplate {
    pub calculation: Option<OrderCalculation>,
    pub error: Option<String>,
}

/// Order confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct CheckoutSuccessTemplate {
    pub page: PageContext,
    pub code: TrackingCode,
    pub order: Option<Order>,
}

fn address_summary(address: &Address) -> String {
    let mut summary = format!("{}, {}, {}", address.full_name, address.street, address.city);
    if let Some(label) = address.label.as_deref().filter(|l| !l.is_empty()) {
        summary = format!("{label}: {summary}");
    }
    summary
}

fn address_options(addresses: &[Address], selected: Option<&str>) -> Vec<AddressOption> {
    addresses
        .iter()
        .map(|address| {
            let id = address.id.to_string();
            AddressOption {
                selected: selected == Some(id.as_str()),
                summary: address_summary(address),
                id,
            }
        })
        .collect()
}

fn payment_options(selected: PaymentMethod) -> Vec<PaymentOption> {
    PaymentMethod::ALL
        .into_iter()
        .map(|method| PaymentOption {
            value: method.as_str(),
            label: method.label(),
            selected: method == selected,
        })
        .collect()
}

/// Saved addresses of the logged-in customer; empty on failure.
async fn load_addresses(state: &AppState, session: &Session) -> Vec<Address> {
    let api = state.api();
    match auth::with_token(session, api, |token| async move { api.addresses(&token).await }).await
    {
        Ok(addresses) => addresses,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load saved addresses");
            Vec::new()
        }
    }
}

/// Prefill the form for a first visit.
fn initial_form(user: Option<&User>, addresses: &[Address]) -> CheckoutForm {
    let mut form = CheckoutForm::default();
    if let Some(user) = user {
        form.full_name = user.display_name();
        form.email.clone_from(&user.email);
        form.phone = user.phone.clone().unwrap_or_default();
        form.address_id = addresses
            .iter()
            .find(|a| a.is_default)
            .or_else(|| addresses.first())
            .map(|a| a.id.to_string());
    }
    form.payment_method = Some(PaymentMethod::default().as_str().to_string());
    form
}

async fn render_page(
    state: &AppState,
    session: &Session,
    page: PageContext,
    user: Option<&User>,
    form: Option<CheckoutForm>,
    errors: FormErrors,
) -> CheckoutTemplate {
    let cart = storage::load_cart(session).await;
    let addresses = if user.is_some() {
        load_addresses(state, session).await
    } else {
        Vec::new()
    };
    let form = form.unwrap_or_else(|| initial_form(user, &addresses));

    CheckoutTemplate {
        page,
        addresses: address_options(&addresses, form.address_id.as_deref()),
        payment_methods: payment_options(form.payment_method()),
        logged_in: user.is_some(),
        loyalty_balance: user.map_or(0, |u| u.loyalty_points),
        refresh_secs: state.config().ui.checkout_refresh_secs,
        cart,
        form,
        errors,
    }
}

/// Display the checkout page. An empty cart goes back to the cart page.
#[instrument(skip(state, session, page, user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    OptionalAuth(user): OptionalAuth,
) -> Response {
    if storage::load_cart(&session).await.is_empty() {
        return Redirect::to("/cart").into_response();
    }
    render_page(&state, &session, page, user.as_ref(), None, FormErrors::new())
        .await
        .into_response()
}

/// Price the cart for the summary panel (HTMX).
///
/// Always answers 200 so htmx swaps the message in place.
#[instrument(skip(state, session, user, form))]
pub async fn summary(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<CheckoutForm>,
) -> CheckoutSummaryTemplate {
    let cart = storage::load_cart(&session).await;
    if cart.is_empty() {
        return CheckoutSummaryTemplate {
            calculation: None,
            error: Some("Shporta juaj është bosh".to_string()),
        };
    }

    let mut request = form.calculation(&cart);
    request.use_loyalty_points &= user.is_some();

    match calculate(&state, &session, user.is_some(), &request).await {
        Ok(calculation) => CheckoutSummaryTemplate {
            calculation: Some(calculation),
            error: None,
        },
        Err(AppError::Api(err @ ApiError::Validation(_))) => {
            CheckoutSummaryTemplate {
                calculation: None,
                error: Some(err.first_message().unwrap_or(CALCULATION_FAILED).to_string()),
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Order calculation failed");
            CheckoutSummaryTemplate {
                calculation: None,
                error: Some(CALCULATION_FAILED.to_string()),
            }
        }
    }
}

async fn calculate(
    state: &AppState,
    session: &Session,
    logged_in: bool,
    request: &OrderCalculationRequest,
) -> Result<OrderCalculation, AppError> {
    let api = state.api();
    if logged_in {
        auth::with_token(session, api, |token| async move {
            api.calculate_order(Some(&token), request).await
        })
        .await
    } else {
        Ok(api.calculate_order(None, request).await?)
    }
}

/// Place the order.
///
/// Validation failures and backend rejections re-render the form with
/// messages. On success the cart is cleared and the customer lands on the
/// confirmation page.
#[instrument(skip(state, session, page, user, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<CheckoutForm>,
) -> Result<Response, AppError> {
    let cart = storage::load_cart(&session).await;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let request = match form.validate(&cart, user.is_some()) {
        Ok(request) => request,
        Err(errors) => {
            let page = render_page(&state, &session, page, user.as_ref(), Some(form), errors);
            return Ok(page.await.into_response());
        }
    };

    let api = state.api();
    let result = if user.is_some() {
        let request = &request;
        auth::with_token(&session, api, |token| async move {
            api.create_order(Some(&token), request).await
        })
        .await
    } else {
        api.create_order(None, &request).await.map_err(AppError::from)
    };

    let created = match result {
        Ok(created) => created,
        Err(AppError::Api(err @ ApiError::Validation(_))) => {
            let errors = FormErrors::from_api(&err, ORDER_FAILED);
            let page = render_page(&state, &session, page, user.as_ref(), Some(form), errors);
            return Ok(page.await.into_response());
        }
        Err(e) => return Err(e),
    };

    tracing::info!(
        order_id = %created.id,
        tracking_code = %created.tracking_code,
        "Order placed"
    );

    storage::update_cart(&session, Cart::clear).await?;
    storage::set_last_tracking_code(&session, &created.tracking_code).await?;
    storage::set_flash(&session, Flash::success("Porosia u krye me sukses")).await;

    let to = format!(
        "/checkout/success/{}",
        urlencoding::encode(created.tracking_code.as_str())
    );
    Ok(Redirect::to(&to).into_response())
}

/// Display the order confirmation page.
#[instrument(skip(state, page))]
pub async fn success(
    State(state): State<AppState>,
    page: PageContext,
    Path(code): Path<String>,
) -> Result<CheckoutSuccessTemplate, AppError> {
    let code = TrackingCode::parse(&code)
        .map_err(|_| AppError::NotFound(format!("tracking code {code}")))?;

    let order = match state.api().track_order(&code).await {
        Ok(order) => Some(order),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load placed order");
            None
        }
    };

    Ok(CheckoutSuccessTemplate { page, code, order })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lodra_core::{AddressId, Price, UserId};

    use super::*;

    fn address(id: i64, is_default: bool) -> Address {
        Address {
            id: AddressId::new(id),
            label: Some("Shtëpi".to_string()),
            full_name: "Ana Hoxha".to_string(),
            phone: "+355691234567".to_string(),
            street: "Rruga e Durrësit 12".to_string(),
            city: "Tiranë".to_string(),
            postal_code: None,
            is_default,
        }
    }

    #[test]
    fn test_initial_form_prefers_default_address() {
        let user = User {
            id: UserId::new(1),
            email: "ana@lodra.al".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Hoxha".to_string(),
            phone: Some("+355691234567".to_string()),
            is_staff: false,
            loyalty_points: 50,
        };
        let form = initial_form(Some(&user), &[address(1, false), address(2, true)]);
        assert_eq!(form.address_id.as_deref(), Some("2"));
        assert_eq!(form.email, "ana@lodra.al");
        assert_eq!(form.payment_method(), PaymentMethod::CashOnDelivery);
    }

    #[test]
    fn test_guest_form_is_blank() {
        let form = initial_form(None, &[]);
        assert!(form.address_id.is_none());
        assert!(form.full_name.is_empty());
    }

    #[test]
    fn test_address_options_mark_selection() {
        let options = address_options(&[address(1, true), address(2, false)], Some("2"));
        assert!(!options[0].selected);
        assert!(options[1].selected);
        assert_eq!(
            options[0].summary,
            "Shtëpi: Ana Hoxha, Rruga e Durrësit 12, Tiranë"
        );
    }

    #[test]
    fn test_summary_fragment_renders_breakdown() {
        let html = CheckoutSummaryTemplate {
            calculation: Some(OrderCalculation {
                subtotal: Price::from_lek(3000),
                discount: Price::ZERO,
                shipping_cost: Price::from_lek(200),
                loyalty_points_used: 0,
                loyalty_discount: Price::ZERO,
                total: Price::from_lek(3200),
                loyalty_points_earned: 32,
            }),
            error: None,
        }
        .render()
        .unwrap();
        assert!(html.contains(&Price::from_lek(3200).display()));
        assert!(html.contains("32"));
    }

    #[test]
    fn test_summary_fragment_renders_error() {
        let html = CheckoutSummaryTemplate {
            calculation: None,
            error: Some("Kuponi nuk është i vlefshëm".to_string()),
        }
        .render()
        .unwrap();
        assert!(html.contains("Kuponi nuk është i vlefshëm"));
    }
}
