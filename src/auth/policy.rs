//! Role-based permission policy.
//!
//! One table, one check. Every service entry point funnels through
//! [`authorize`] instead of carrying its own role list.

use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};

use crate::auth::{AuthenticatedUser, Role};
use crate::errors::ServiceError;

/// Actions the inventory core guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    InventoryRead,
    InventoryAdjust,
    InventoryTransfer,
    InventoryAllocate,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::InventoryRead => "inventory:read",
            Permission::InventoryAdjust => "inventory:adjust",
            Permission::InventoryTransfer => "inventory:transfer",
            Permission::InventoryAllocate => "inventory:allocate",
        }
    }
}

lazy_static! {
    static ref ROLE_PERMISSIONS: HashMap<Role, HashSet<Permission>> = {
        let mut roles = HashMap::new();

        roles.insert(
            Role::Admin,
            HashSet::from([
                Permission::InventoryRead,
                Permission::InventoryAdjust,
                Permission::InventoryTransfer,
                Permission::InventoryAllocate,
            ]),
        );

        roles.insert(
            Role::Manager,
            HashSet::from([
                Permission::InventoryRead,
                Permission::InventoryAdjust,
                Permission::InventoryTransfer,
                Permission::InventoryAllocate,
            ]),
        );

        // Staff may look but not touch.
        roles.insert(Role::Staff, HashSet::from([Permission::InventoryRead]));

        roles
    };
}

/// Checks that a caller is present and permitted to perform `permission`.
///
/// Returns the user on success so callers can stamp `performed_by` without
/// re-unwrapping the option.
pub fn authorize<'a>(
    actor: Option<&'a AuthenticatedUser>,
    permission: Permission,
) -> Result<&'a AuthenticatedUser, ServiceError> {
    let user = actor.ok_or_else(|| {
        ServiceError::Unauthorized("operation requires an authenticated caller".to_string())
    })?;

    let allowed = ROLE_PERMISSIONS
        .get(&user.role)
        .map(|granted| granted.contains(&permission))
        .unwrap_or(false);

    if allowed {
        Ok(user)
    } else {
        Err(ServiceError::Forbidden(format!(
            "role {} does not grant {}",
            user.role.as_str(),
            permission.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(role: Role) -> AuthenticatedUser {
        AuthenticatedUser::new(Uuid::new_v4(), role)
    }

    #[test]
    fn missing_actor_is_unauthorized() {
        let err = authorize(None, Permission::InventoryRead).unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[test]
    fn staff_reads_but_does_not_mutate() {
        let staff = user(Role::Staff);
        assert!(authorize(Some(&staff), Permission::InventoryRead).is_ok());
        for denied in [
            Permission::InventoryAdjust,
            Permission::InventoryTransfer,
            Permission::InventoryAllocate,
        ] {
            let err = authorize(Some(&staff), denied).unwrap_err();
            assert!(matches!(err, ServiceError::Forbidden(_)));
        }
    }

    #[test]
    fn admin_and_manager_mutate() {
        for role in [Role::Admin, Role::Manager] {
            let actor = user(role);
            assert!(authorize(Some(&actor), Permission::InventoryAdjust).is_ok());
            assert!(authorize(Some(&actor), Permission::InventoryTransfer).is_ok());
            assert!(authorize(Some(&actor), Permission::InventoryAllocate).is_ok());
        }
    }
}
