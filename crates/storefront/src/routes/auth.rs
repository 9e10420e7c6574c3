//! Authentication route handlers.
//!
//! Credentials go to the backend's `/login/` and `/register/` endpoints. The
//! returned tokens stay in the session; the browser only holds the session
//! cookie.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use lodra_core::schema::{LoginRequest, TokenPair, User};
use lodra_core::score_password;
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{ApiError, BackendClient};
use crate::error::AppError;
use crate::filters;
use crate::forms::{FormErrors, LoginForm, RegisterForm, safe_next};
use crate::middleware::OptionalAuth;
use crate::models::Flash;
use crate::page::PageContext;
use crate::services::{auth, storage};
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Email ose fjalëkalim i gabuar";
const REGISTER_FAILED: &str = "Regjistrimi dështoi. Kontrolloni të dhënat.";

/// Query parameters for login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub form: LoginForm,
    pub errors: FormErrors,
}

/// Registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub form: RegisterForm,
    pub errors: FormErrors,
}

/// Password strength meter fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/password_strength.html")]
pub struct PasswordStrengthTemplate {
    pub empty: bool,
    pub score: u8,
    pub label: &'static str,
    pub acceptable: bool,
}

#[derive(Debug, Deserialize)]
pub struct PasswordStrengthForm {
    #[serde(default)]
    pub password: String,
}

fn login_page_response(page: PageContext, mut form: LoginForm, errors: FormErrors) -> Response {
    form.password.clear();
    LoginTemplate { page, form, errors }.into_response()
}

fn register_page_response(
    page: PageContext,
    mut form: RegisterForm,
    errors: FormErrors,
) -> Response {
    form.password.clear();
    form.password_confirm.clear();
    RegisterTemplate { page, form, errors }.into_response()
}

/// Store the tokens and the user in the session.
///
/// Older backends omit the user from the login response; it is then read
/// from `/me/`.
async fn complete_login(
    api: &BackendClient,
    session: &Session,
    tokens: TokenPair,
) -> Result<User, AppError> {
    let user = match tokens.user.clone() {
        Some(user) => user,
        None => api.me(&SecretString::from(tokens.access.clone())).await?,
    };
    auth::log_in(session, &tokens, &user).await?;
    tracing::info!(user_id = %user.id, "Customer logged in");
    Ok(user)
}

/// Display login page.
#[instrument(skip(page, user))]
pub async fn login_page(
    page: PageContext,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<LoginQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to(&safe_next(query.next.as_deref())).into_response();
    }
    let form = LoginForm {
        next: query.next,
        ..LoginForm::default()
    };
    login_page_response(page, form, FormErrors::new())
}

/// Handle login form submission.
#[instrument(skip(state, session, page, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let (email, password) = match form.validate() {
        Ok(credentials) => credentials,
        Err(errors) => return Ok(login_page_response(page, form, errors)),
    };

    let api = state.api();
    let tokens = match api.login(&LoginRequest { email, password }).await {
        Ok(tokens) => tokens,
        Err(ApiError::Unauthorized) => {
            tracing::info!("Login rejected");
            let errors = FormErrors::general(INVALID_CREDENTIALS);
            return Ok(login_page_response(page, form, errors));
        }
        Err(err @ ApiError::Validation(_)) => {
            let errors = FormErrors::from_api(&err, INVALID_CREDENTIALS);
            return Ok(login_page_response(page, form, errors));
        }
        Err(e) => return Err(e.into()),
    };

    let user = complete_login(api, &session, tokens).await?;
    storage::set_flash(
        &session,
        Flash::success(format!("Mirë se erdhët, {}!", user.display_name())),
    )
    .await;

    Ok(Redirect::to(&form.return_path()).into_response())
}

/// Display registration page.
#[instrument(skip(page, user))]
pub async fn register_page(page: PageContext, OptionalAuth(user): OptionalAuth) -> Response {
    if user.is_some() {
        return Redirect::to("/account").into_response();
    }
    register_page_response(page, RegisterForm::default(), FormErrors::new())
}

/// Handle registration form submission.
///
/// The form is validated first; the backend is only called with a valid form.
/// After registering the customer is logged in with the same credentials.
#[instrument(skip(state, session, page, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let request = match form.validate() {
        Ok(request) => request,
        Err(errors) => {
            tracing::debug!("Registration form rejected");
            return Ok(register_page_response(page, form, errors));
        }
    };

    let api = state.api();
    match api.register(&request).await {
        Ok(()) => tracing::info!("Customer registered"),
        Err(err @ ApiError::Validation(_)) => {
            let errors = FormErrors::from_api(&err, REGISTER_FAILED);
            return Ok(register_page_response(page, form, errors));
        }
        Err(e) => return Err(e.into()),
    }

    let credentials = LoginRequest {
        email: request.email,
        password: request.password,
    };
    let logged_in = match api.login(&credentials).await {
        Ok(tokens) => complete_login(api, &session, tokens).await.map(|_| ()),
        Err(e) => Err(e.into()),
    };

    if let Err(e) = logged_in {
        tracing::warn!(error = %e, "Login after registration failed");
        storage::set_flash(
            &session,
            Flash::info("Llogaria u krijua. Hyni me email dhe fjalëkalim."),
        )
        .await;
        return Ok(Redirect::to("/auth/login").into_response());
    }

    storage::set_flash(&session, Flash::success("Llogaria u krijua me sukses")).await;
    Ok(Redirect::to("/account").into_response())
}

/// Handle logout. Cart and wishlist stay in the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Response, AppError> {
    auth::log_out(&session).await?;
    storage::set_flash(&session, Flash::info("Dolët nga llogaria")).await;
    Ok(Redirect::to("/").into_response())
}

/// Strength meter under the registration password field (HTMX).
pub async fn password_strength(Form(form): Form<PasswordStrengthForm>) -> PasswordStrengthTemplate {
    let strength = score_password(&form.password, &[]);
    PasswordStrengthTemplate {
        empty: form.password.is_empty(),
        score: strength.score,
        label: strength.label(),
        acceptable: strength.is_acceptable(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::forms::PASSWORD_MISMATCH;

    #[test]
    fn test_register_page_shows_mismatch_and_drops_passwords() {
        let form = RegisterForm {
            first_name: "Ana".to_string(),
            last_name: "Hoxha".to_string(),
            email: "ana@lodra.al".to_string(),
            phone: "0691234567".to_string(),
            password: "Lodra-2024!".to_string(),
            password_confirm: "Lodra-2025!".to_string(),
        };
        let errors = form.validate().unwrap_err();

        let mut form = form;
        form.password.clear();
        form.password_confirm.clear();
        let html = RegisterTemplate {
            page: PageContext::default(),
            form,
            errors,
        }
        .render()
        .unwrap();

        assert!(html.contains(PASSWORD_MISMATCH));
        assert!(!html.contains("Lodra-2024!"));
        assert!(html.contains("ana@lodra.al"));
    }

    #[tokio::test]
    async fn test_password_strength_fragment() {
        let weak = password_strength(Form(PasswordStrengthForm {
            password: "abc".to_string(),
        }))
        .await;
        assert!(!weak.acceptable);

        let strong = password_strength(Form(PasswordStrengthForm {
            password: "Kamion-Blu-Zjarri-84!".to_string(),
        }))
        .await;
        assert!(strong.acceptable);
        assert!(strong.render().unwrap().contains(strong.label));
    }
}
