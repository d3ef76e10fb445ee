//! Authentication route handlers.
//!
//! Login, registration and logout against the account store. A successful
//! login or registration caches the account in the session and rotates the
//! session id.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::{clear_current_account, safe_next, set_current_account};
use crate::models::CurrentAccount;
use crate::services::{AuthError, Registration};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub next: Option<String>,
}

/// Query parameters for the login and register pages.
#[derive(Debug, Default, Deserialize)]
pub struct AuthQuery {
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub next: String,
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub next: String,
    pub error: Option<String>,
}

impl RegisterTemplate {
    fn from_form(form: &RegisterForm, error: String) -> Self {
        Self {
            email: form.email.clone(),
            name: form.name.clone(),
            phone: form.phone.clone().unwrap_or_default(),
            address: form.address.clone().unwrap_or_default(),
            next: safe_next(form.next.as_deref()).to_owned(),
            error: Some(error),
        }
    }
}

/// Whether `err` is the user's to fix, as opposed to a server fault.
const fn is_form_problem(err: &AuthError) -> bool {
    !matches!(err, AuthError::Store(_) | AuthError::PasswordHash)
}

fn form_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::DuplicateAccount => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<AuthQuery>) -> impl IntoResponse {
    LoginTemplate {
        email: String::new(),
        next: safe_next(query.next.as_deref()).to_owned(),
        error: None,
    }
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match state.identity().login(&form.email, &form.password).await {
        Ok(account) => {
            set_current_account(&session, &CurrentAccount::from(&account)).await?;
            tracing::info!(account_id = %account.id, "logged in");
            Ok(Redirect::to(safe_next(form.next.as_deref())).into_response())
        }
        Err(e) if is_form_problem(&e) => {
            tracing::info!(error = %e, "login rejected");
            let page = LoginTemplate {
                email: form.email.clone(),
                next: safe_next(form.next.as_deref()).to_owned(),
                error: Some(e.user_message()),
            };
            Ok((form_status(&e), page).into_response())
        }
        Err(e) => Err(AppError::from(e)),
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(Query(query): Query<AuthQuery>) -> impl IntoResponse {
    RegisterTemplate {
        email: String::new(),
        name: String::new(),
        phone: String::new(),
        address: String::new(),
        next: safe_next(query.next.as_deref()).to_owned(),
        error: None,
    }
}

/// Handle registration form submission.
///
/// A new account is a customer and is logged in straight away.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    if form.password != form.password_confirm {
        let page = RegisterTemplate::from_form(&form, "Passwords do not match.".to_owned());
        return Ok((StatusCode::BAD_REQUEST, page).into_response());
    }

    let registration = Registration {
        email: form.email.clone(),
        password: form.password.clone(),
        name: form.name.clone(),
        phone: form.phone.clone(),
        address: form.address.clone(),
    };

    match state.identity().register(registration).await {
        Ok(account) => {
            set_current_account(&session, &CurrentAccount::from(&account)).await?;
            Ok(Redirect::to(safe_next(form.next.as_deref())).into_response())
        }
        Err(e) if is_form_problem(&e) => {
            let page = RegisterTemplate::from_form(&form, e.user_message());
            Ok((form_status(&e), page).into_response())
        }
        Err(e) => Err(AppError::from(e)),
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Log out and return to the menu. The cart stays with the browser.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_account(&session).await?;
    Ok(Redirect::to("/"))
}
