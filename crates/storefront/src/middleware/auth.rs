//! Authentication middleware and extractors.
//!
//! The session caches a [`CurrentAccount`]. Every extractor here re-resolves
//! it against the account store before a handler sees it, so a deleted
//! account is logged out and a role change applies on the next request.
//! A store failure during that check never logs anyone out.

use std::convert::Infallible;
use std::marker::PhantomData;

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use menuboard_core::access::{Capability, Denial, authorize};

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::models::{CurrentAccount, session_keys};
use crate::services::{AuthError, CartToken};
use crate::state::AppState;

/// Extractor for the optional logged-in account.
///
/// Never rejects. A store failure during revalidation is treated as
/// anonymous for this request and leaves the session untouched. Protected
/// pages use [`Authorized`], which reports that failure instead.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentSubject(account): CurrentSubject) -> impl IntoResponse {
///     match account {
///         Some(a) => format!("Hello, {}!", a.name),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct CurrentSubject(pub Option<CurrentAccount>);

impl FromRequestParts<AppState> for CurrentSubject {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let account = match resolve_subject(parts, state).await {
            Ok(account) => account,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "account revalidation failed; treating request as anonymous"
                );
                None
            }
        };
        Ok(Self(account))
    }
}

/// The session's account, re-read from the store.
///
/// `Ok(None)` means nobody is logged in, or the account is gone and has been
/// logged out. `Err` means the store could not answer.
async fn resolve_subject(
    parts: &Parts,
    state: &AppState,
) -> Result<Option<CurrentAccount>, AuthError> {
    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };
    let cached = match session
        .get::<CurrentAccount>(session_keys::CURRENT_ACCOUNT)
        .await
    {
        Ok(Some(cached)) => cached,
        Ok(None) => return Ok(None),
        Err(e) => {
            tracing::warn!(error = %e, "could not read session account");
            return Ok(None);
        }
    };

    match state.identity().restore(Some(&cached)).await? {
        Some(fresh) => {
            if fresh != cached
                && let Err(e) = session.insert(session_keys::CURRENT_ACCOUNT, &fresh).await
            {
                tracing::warn!(error = %e, "could not refresh session account");
            }
            Ok(Some(fresh))
        }
        None => {
            if let Err(e) = session
                .remove::<CurrentAccount>(session_keys::CURRENT_ACCOUNT)
                .await
            {
                tracing::warn!(error = %e, "could not discard stale session account");
            }
            Ok(None)
        }
    }
}

/// Type-level name for a capability, so handlers can state what they need
/// in their signature.
pub trait CapabilityMarker: Send + Sync + 'static {
    const CAPABILITY: Capability;
}

macro_rules! capability_marker {
    ($name:ident => $capability:expr) => {
        #[doc = concat!("Marker for `", stringify!($capability), "`.")]
        pub struct $name;

        impl CapabilityMarker for $name {
            const CAPABILITY: Capability = $capability;
        }
    };
}

capability_marker!(CanCheckout => Capability::Checkout);
capability_marker!(CanViewOrders => Capability::ViewOwnOrders);
capability_marker!(CanManageCatalog => Capability::ManageCatalog);
capability_marker!(CanViewDashboard => Capability::ViewAdminDashboard);

/// Extractor that runs the access gate for `C`.
///
/// # Example
///
/// ```rust,ignore
/// async fn orders(Authorized { account, .. }: Authorized<CanViewOrders>) -> impl IntoResponse {
///     format!("Orders for {}", account.email)
/// }
/// ```
pub struct Authorized<C: CapabilityMarker> {
    pub account: CurrentAccount,
    _capability: PhantomData<C>,
}

/// Why an [`Authorized`] extractor turned the request away.
#[derive(Debug)]
pub enum AccessRejection {
    /// The gate said no. Sent to login (keeping the path) or to the landing page.
    Denied { denial: Denial, return_to: String },
    /// The account could not be re-checked. Answered like any store failure.
    Unavailable(AuthError),
}

impl IntoResponse for AccessRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Denied {
                denial: Denial::Unauthenticated,
                return_to,
            } => Redirect::to(&login_redirect(&return_to)).into_response(),
            Self::Denied {
                denial: Denial::Forbidden,
                ..
            } => Redirect::to(Denial::LANDING_PATH).into_response(),
            Self::Unavailable(err) => AppError::Auth(err).into_response(),
        }
    }
}

impl<C: CapabilityMarker> FromRequestParts<AppState> for Authorized<C> {
    type Rejection = AccessRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let subject = resolve_subject(parts, state)
            .await
            .map_err(AccessRejection::Unavailable)?;

        let denial = match (authorize(subject.as_ref().map(|a| a.role), C::CAPABILITY), subject) {
            (Ok(()), Some(account)) => {
                return Ok(Self {
                    account,
                    _capability: PhantomData,
                });
            }
            (Err(denial), _) => denial,
            (Ok(()), None) => Denial::Unauthenticated,
        };

        // Nested routers see a stripped URI.
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.path(), |original| original.0.path())
            .to_owned();

        tracing::debug!(capability = %C::CAPABILITY, ?denial, "access denied");
        Err(AccessRejection::Denied {
            denial,
            return_to: path,
        })
    }
}

/// Login URL that returns to `path` afterwards.
fn login_redirect(path: &str) -> String {
    if path == "/" || !is_local_path(path) {
        return Denial::LOGIN_PATH.to_owned();
    }
    let encoded: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
    format!("{}?next={encoded}", Denial::LOGIN_PATH)
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

/// Post-login destination, accepting only same-site paths.
#[must_use]
pub fn safe_next(next: Option<&str>) -> &str {
    next.filter(|p| is_local_path(p)).unwrap_or(Denial::LANDING_PATH)
}

/// Log `account` in on this session.
///
/// The session id is rotated first so a pre-login id cannot be fixed.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_account(
    session: &Session,
    account: &CurrentAccount,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(session_keys::CURRENT_ACCOUNT, account)
        .await?;
    set_sentry_user(&account.id, Some(account.email.as_str()));
    Ok(())
}

/// Log out. Runs whether or not anyone was logged in.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_account(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAccount>(session_keys::CURRENT_ACCOUNT)
        .await?;
    session.cycle_id().await?;
    clear_sentry_user();
    Ok(())
}

/// This session's cart token, if a cart was ever opened.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn cart_token(
    session: &Session,
) -> Result<Option<CartToken>, tower_sessions::session::Error> {
    session.get(session_keys::CART_TOKEN).await
}

/// This session's cart token, creating one on first use.
///
/// # Errors
///
/// Returns an error if the session cannot be read or modified.
pub async fn ensure_cart_token(
    session: &Session,
) -> Result<CartToken, tower_sessions::session::Error> {
    if let Some(token) = cart_token(session).await? {
        return Ok(token);
    }
    let token = CartToken::generate();
    session.insert(session_keys::CART_TOKEN, token).await?;
    Ok(token)
}
