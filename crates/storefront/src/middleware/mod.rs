//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded on that span)
//! 4. Security headers
//! 5. Session layer (tower-sessions, signed cookie)
//! 6. Rate limiting on the auth routes only (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AccessRejection, Authorized, CanCheckout, CanManageCatalog, CanViewDashboard, CanViewOrders,
    CapabilityMarker, CurrentSubject, cart_token, clear_current_account, ensure_cart_token,
    safe_next, set_current_account,
};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{SESSION_COOKIE_NAME, StorefrontSessionLayer, create_session_layer};
