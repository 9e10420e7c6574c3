//! Staff login and logout.
//!
//! Staff log in with their backend account. Accounts without `is_staff`
//! are refused before anything is stored in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::forms::{FormErrors, LoginForm};
use crate::middleware::OptionalAdminAuth;
use crate::models::Flash;
use crate::page::AdminPage;
use crate::services::{auth, flash};
use crate::state::AppState;

use super::redirect;

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub page: AdminPage,
    pub form: LoginForm,
    pub errors: FormErrors,
}

fn login_page_response(page: AdminPage, mut form: LoginForm, errors: FormErrors) -> Response {
    form.password.clear();
    LoginTemplate { page, form, errors }.into_response()
}

/// Display login page.
#[instrument(skip(page, admin))]
pub async fn login_page(page: AdminPage, OptionalAdminAuth(admin): OptionalAdminAuth) -> Response {
    if admin.is_some() {
        return Redirect::to("/").into_response();
    }
    login_page_response(page, LoginForm::default(), FormErrors::new())
}

/// Handle login form submission.
#[instrument(skip(state, session, page, headers, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    page: AdminPage,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let credentials = match form.validate() {
        Ok(credentials) => credentials,
        Err(errors) => return login_page_response(page, form, errors),
    };

    match auth::log_in(&session, state.api(), &credentials).await {
        Ok(admin) => {
            flash::set_flash(&session, Flash::success(format!("Mirë se erdhe, {}!", admin.name)))
                .await;
            redirect(&headers, "/")
        }
        Err(e) => {
            tracing::info!(error = %e, "Staff login refused");
            login_page_response(page, form, FormErrors::general(e.message()))
        }
    }
}

/// End the staff session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Response, AppError> {
    auth::log_out(&session).await?;
    Ok(Redirect::to("/login").into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::auth::LoginError;

    #[test]
    fn test_refused_login_keeps_email_and_drops_password() {
        let form = LoginForm {
            email: "prind@lodra.al".to_string(),
            password: "sekret-123".to_string(),
        };
        let mut cleared = form.clone();
        cleared.password.clear();

        let html = LoginTemplate {
            page: AdminPage::default(),
            form: cleared,
            errors: FormErrors::general(LoginError::NotStaff.message()),
        }
        .render()
        .unwrap();

        assert!(html.contains("Kjo llogari nuk ka të drejta administratori."));
        assert!(html.contains("prind@lodra.al"));
        assert!(!html.contains("sekret-123"));
    }
}
