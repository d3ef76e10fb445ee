//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Store failures never reach the client in detail: they become a generic
//! "try again" message. A partially saved order gets its own message and a
//! reference so staff can find it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use menuboard_core::ValidationError;
use menuboard_core::access::Denial;

use crate::db::StoreError;
use crate::services::{AuthError, CatalogError, OrderError};

const RETRY_MESSAGE: &str = "Something went wrong on our side. Please try again in a moment.";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order operation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Form input was malformed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn is_server_error(&self) -> bool {
        match self {
            Self::Store(_) | Self::Session(_) | Self::Internal(_) => true,
            Self::Auth(err) => matches!(err, AuthError::Store(_) | AuthError::PasswordHash),
            Self::Order(err) => matches!(
                err,
                OrderError::PartialOrder { .. } | OrderError::StoreUnavailable(_)
            ),
            Self::Catalog(err) => matches!(err, CatalogError::Store(_)),
            _ => false,
        }
    }

    /// Where to send the client instead of an error page, if anywhere.
    fn redirect(&self) -> Option<&'static str> {
        match self {
            Self::Order(OrderError::Unauthenticated) => {
                Some(Denial::Unauthenticated.redirect_target())
            }
            Self::Order(OrderError::Forbidden) => Some(Denial::Forbidden.redirect_target()),
            Self::Order(OrderError::EmptyCart) => Some("/cart"),
            _ => None,
        }
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    if err.is_transient() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        if let Some(target) = self.redirect() {
            return Redirect::to(target).into_response();
        }

        let status = match &self {
            Self::Store(err)
            | Self::Auth(AuthError::Store(err))
            | Self::Order(OrderError::StoreUnavailable(err))
            | Self::Catalog(CatalogError::Store(err)) => store_status(err),
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::DuplicateAccount => StatusCode::CONFLICT,
                AuthError::InvalidEmail(_)
                | AuthError::WeakPassword(_)
                | AuthError::Validation(_) => StatusCode::BAD_REQUEST,
                AuthError::Store(_) | AuthError::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Order(err) => match err {
                OrderError::Validation(_) => StatusCode::BAD_REQUEST,
                OrderError::NotFound => StatusCode::NOT_FOUND,
                OrderError::InvalidTransition { .. } => StatusCode::CONFLICT,
                OrderError::Unauthenticated => StatusCode::UNAUTHORIZED,
                OrderError::Forbidden => StatusCode::FORBIDDEN,
                OrderError::EmptyCart => StatusCode::BAD_REQUEST,
                OrderError::PartialOrder { .. } | OrderError::StoreUnavailable(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Catalog(err) => match err {
                CatalogError::ItemNotFound | CatalogError::CategoryNotFound => {
                    StatusCode::NOT_FOUND
                }
                CatalogError::DuplicateCategory => StatusCode::CONFLICT,
                CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
                CatalogError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Order(OrderError::PartialOrder { order_id, .. }) => format!(
                "Your order could not be completed. Please contact us and quote reference {}.",
                order_id.short()
            ),
            _ if self.is_server_error() => RETRY_MESSAGE.to_owned(),
            Self::Auth(err) => err.user_message(),
            Self::Order(err) => err.to_string(),
            Self::Catalog(err) => err.to_string(),
            Self::Validation(err) => err.to_string(),
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::BadRequest(msg) => msg.clone(),
            _ => RETRY_MESSAGE.to_owned(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from an account ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(account_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(account_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("item_id", "3f2a...")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_owned()),
        message: Some(message.to_owned()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_owned(),
                serde_json::Value::String((*value).to_owned()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use axum::http::header::LOCATION;

    use menuboard_core::OrderId;

    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            status_of(AppError::NotFound("item".to_owned())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Auth(AuthError::DuplicateAccount)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Validation(ValidationError::NegativePrice)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Store(StoreError::Unavailable("down".to_owned()))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(AppError::Store(StoreError::DataCorruption("bad".to_owned()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_order_failures_redirect() {
        let response = AppError::Order(OrderError::EmptyCart).into_response();
        assert!(response.status().is_redirection());
        assert_eq!(response.headers()[LOCATION], "/cart");

        let response = AppError::Order(OrderError::Unauthenticated).into_response();
        assert_eq!(response.headers()[LOCATION], "/auth/login");
    }

    #[test]
    fn test_partial_order_is_distinct_server_error() {
        let err = AppError::Order(OrderError::PartialOrder {
            order_id: OrderId::new(),
            compensated: true,
            source: StoreError::Unavailable("lines".to_owned()),
        });
        assert!(err.is_server_error());
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
