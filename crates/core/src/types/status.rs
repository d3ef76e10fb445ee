//! Role tiers, delivery modes and order statuses.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing one of the enums in this module from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Account role tier.
///
/// Stored as its ordinal (0, 1, 2). Tiers are ordered, so a higher tier
/// satisfies every gate a lower tier does.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Customer,
    /// Reserved tier. Defined in the role model but granted nothing beyond
    /// `Customer` until product intent for staff is settled.
    Staff,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn ordinal(self) -> i16 {
        match self {
            Self::Customer => 0,
            Self::Staff => 1,
            Self::Admin => 2,
        }
    }

    #[must_use]
    pub const fn from_ordinal(ordinal: i16) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Customer),
            1 => Some(Self::Staff),
            2 => Some(Self::Admin),
            _ => None,
        }
    }

    /// Whether this tier meets `min`.
    #[must_use]
    pub const fn satisfies(self, min: Self) -> bool {
        self.ordinal() >= min.ordinal()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Staff => "staff",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" | "0" => Ok(Self::Customer),
            "staff" | "1" => Ok(Self::Staff),
            "admin" | "2" => Ok(Self::Admin),
            _ => Err(ParseEnumError::new("role", s)),
        }
    }
}

/// How an order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryMode {
    /// Eaten or picked up at the counter. Never carries a fee.
    #[default]
    InVenue,
    /// Sent to an address for the configured flat fee.
    Delivery,
}

impl DeliveryMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InVenue => "in-venue",
            Self::Delivery => "delivery",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::InVenue => "Eat in",
            Self::Delivery => "Delivery",
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in-venue" => Ok(Self::InVenue),
            "delivery" => Ok(Self::Delivery),
            _ => Err(ParseEnumError::new("delivery mode", s)),
        }
    }
}

/// Order lifecycle status.
///
/// ```text
/// pending ──► completed
///    │
///    └──────► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Only a pending order may move, and only to a terminal state.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Completed | Self::Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseEnumError::new("order status", s)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ROLES: [Role; 3] = [Role::Customer, Role::Staff, Role::Admin];

    #[test]
    fn test_role_ordinal_roundtrip() {
        for role in ROLES {
            assert_eq!(Role::from_ordinal(role.ordinal()), Some(role));
        }
        assert_eq!(Role::from_ordinal(3), None);
        assert_eq!(Role::from_ordinal(-1), None);
    }

    #[test]
    fn test_role_satisfies_is_monotonic() {
        for held in ROLES {
            for min in ROLES {
                assert_eq!(held.satisfies(min), held.ordinal() >= min.ordinal());
            }
        }
        assert!(Role::Admin.satisfies(Role::Staff));
        assert!(!Role::Staff.satisfies(Role::Admin));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("1".parse::<Role>().unwrap(), Role::Staff);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_delivery_mode_wire_names() {
        assert_eq!(
            serde_json::to_string(&DeliveryMode::InVenue).unwrap(),
            "\"in-venue\""
        );
        assert_eq!(
            "delivery".parse::<DeliveryMode>().unwrap(),
            DeliveryMode::Delivery
        );
    }

    #[test]
    fn test_status_transitions() {
        use OrderStatus::{Cancelled, Completed, Pending};
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(Completed.is_terminal());
    }
}
