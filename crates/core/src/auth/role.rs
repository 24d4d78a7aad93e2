//! Caller roles and guard points.
//!
//! The caller's role arrives as an explicit value threaded into each guarded
//! operation; nothing here reads ambient request state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role of the authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Administrator: manages rates, users, and billing.
    Admin,
    /// Seller: records deliveries.
    Seller,
    /// Buyer: read-only consumer of their own data.
    Buyer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Seller => write!(f, "seller"),
            Self::Buyer => write!(f, "buyer"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "seller" => Ok(Self::Seller),
            "buyer" => Ok(Self::Buyer),
            _ => Err(format!("Unknown role: {s}")),
        }
    }
}

/// Role precondition failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleError {
    /// The caller's role does not satisfy the operation's precondition.
    #[error("Access denied: {0}")]
    Forbidden(&'static str),
}

/// Guard for rate-mutating and buyer-billing operations.
///
/// # Errors
///
/// Returns `RoleError::Forbidden` unless the caller is an admin.
pub fn require_admin(role: Role) -> Result<(), RoleError> {
    if role == Role::Admin {
        Ok(())
    } else {
        Err(RoleError::Forbidden("admin role required"))
    }
}

/// Guard for recording deliveries: buyers may not record milk transactions.
///
/// # Errors
///
/// Returns `RoleError::Forbidden` when the caller is a buyer.
pub fn require_delivery_recorder(role: Role) -> Result<(), RoleError> {
    if role == Role::Buyer {
        Err(RoleError::Forbidden(
            "Buyers are not allowed to record milk transactions",
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_require_admin() {
        assert!(require_admin(Role::Admin).is_ok());
        assert!(require_admin(Role::Seller).is_err());
        assert!(require_admin(Role::Buyer).is_err());
    }

    #[test]
    fn test_require_delivery_recorder() {
        assert!(require_delivery_recorder(Role::Admin).is_ok());
        assert!(require_delivery_recorder(Role::Seller).is_ok());
        assert!(require_delivery_recorder(Role::Buyer).is_err());
    }

    #[test]
    fn test_role_roundtrip() {
        for role in [Role::Admin, Role::Seller, Role::Buyer] {
            assert_eq!(Role::from_str(&role.to_string()).unwrap(), role);
        }
        assert!(Role::from_str("owner").is_err());
    }
}
