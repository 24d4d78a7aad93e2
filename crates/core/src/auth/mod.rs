//! Password hashing and role guards.

pub mod password;
pub mod role;

pub use password::{hash_password, verify_password, PasswordError};
pub use role::{require_admin, require_delivery_recorder, Role, RoleError};
