//! Caller identity and authorization.
//!
//! Authentication itself (sessions, tokens) lives outside this crate; the
//! session layer hands every operation an [`AuthenticatedUser`] and the
//! [`policy`] module decides what that user may do.

pub mod policy;

pub use policy::{authorize, Permission};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role granted to a caller by the user administration surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Manager,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::Staff => "STAFF",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ADMIN" => Some(Role::Admin),
            "MANAGER" => Some(Role::Manager),
            "STAFF" => Some(Role::Staff),
            _ => None,
        }
    }
}

/// Identity supplied by the session layer for a single call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }
}
