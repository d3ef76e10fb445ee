//! Capability checks over role tiers.
//!
//! Every protected page or mutation names a [`Capability`]. [`authorize`]
//! evaluates two gates in order: is there an authenticated subject at all,
//! and does its role meet the capability's minimum tier.

use core::fmt;

use crate::types::Role;

/// A protected action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ViewOwnOrders,
    Checkout,
    /// Create, update, delete or toggle catalog items and categories.
    ManageCatalog,
    ViewAdminDashboard,
}

impl Capability {
    pub const ALL: [Self; 4] = [
        Self::ViewOwnOrders,
        Self::Checkout,
        Self::ManageCatalog,
        Self::ViewAdminDashboard,
    ];

    /// Minimum tier required. Staff is deliberately absent from this table.
    #[must_use]
    pub const fn min_role(self) -> Role {
        match self {
            Self::ViewOwnOrders | Self::Checkout => Role::Customer,
            Self::ManageCatalog | Self::ViewAdminDashboard => Role::Admin,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ViewOwnOrders => "view_own_orders",
            Self::Checkout => "checkout",
            Self::ManageCatalog => "manage_catalog",
            Self::ViewAdminDashboard => "view_admin_dashboard",
        };
        f.write_str(name)
    }
}

/// Why a subject was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    /// No authenticated account. Always sent to the login entry point,
    /// whatever role the action needs.
    #[error("authentication required")]
    Unauthenticated,
    /// Authenticated, but the role is below the minimum.
    #[error("insufficient role")]
    Forbidden,
}

impl Denial {
    pub const LOGIN_PATH: &'static str = "/auth/login";
    pub const LANDING_PATH: &'static str = "/";

    #[must_use]
    pub const fn redirect_target(self) -> &'static str {
        match self {
            Self::Unauthenticated => Self::LOGIN_PATH,
            Self::Forbidden => Self::LANDING_PATH,
        }
    }
}

/// Run the gate for `capability` against the subject's role.
///
/// `None` means nobody is logged in.
///
/// # Errors
///
/// [`Denial::Unauthenticated`] when `role` is `None`, otherwise
/// [`Denial::Forbidden`] when the role is below the capability minimum.
pub const fn authorize(role: Option<Role>, capability: Capability) -> Result<(), Denial> {
    let Some(role) = role else {
        return Err(Denial::Unauthenticated);
    };
    if !role.satisfies(capability.min_role()) {
        return Err(Denial::Forbidden);
    }
    Ok(())
}
