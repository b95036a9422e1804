// src/common/scope.rs

use crate::common::error::AppError;
use crate::models::auth::{Principal, Role};

/// Até onde um principal enxerga uma família de registros com dono.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerScope {
    All,
    OwnedBy(i64),
}

impl OwnerScope {
    /// Vendedor só enxerga os próprios registros; os demais enxergam tudo.
    pub fn restricted_by(principal: &Principal, role: Role) -> Self {
        if principal.has_role(role) {
            OwnerScope::OwnedBy(principal.id)
        } else {
            OwnerScope::All
        }
    }

    /// Escopo de quem é sempre dono (ex.: professor e suas aulas).
    pub fn owner(principal: &Principal) -> Self {
        OwnerScope::OwnedBy(principal.id)
    }

    pub fn admits(&self, owner_id: Option<i64>) -> bool {
        match self {
            OwnerScope::All => true,
            OwnerScope::OwnedBy(id) => owner_id == Some(*id),
        }
    }

    pub fn owner_id(&self) -> Option<i64> {
        match self {
            OwnerScope::All => None,
            OwnerScope::OwnedBy(id) => Some(*id),
        }
    }
}

/// Se uma família de recursos aceita DELETE.
/// `Forbidden` vale para todos os papéis, inclusive administrativos.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    Allowed,
    Forbidden(&'static str),
}

impl DeletePolicy {
    pub fn check(self) -> Result<(), AppError> {
        match self {
            DeletePolicy::Allowed => Ok(()),
            DeletePolicy::Forbidden(reason) => Err(AppError::permission_denied(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn principal(id: i64, roles: &[Role]) -> Principal {
        Principal {
            id,
            username: format!("user{}", id),
            roles: roles.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    #[test]
    fn seller_is_scoped_to_own_records() {
        let seller = principal(7, &[Role::Seller]);
        let scope = OwnerScope::restricted_by(&seller, Role::Seller);

        assert_eq!(scope, OwnerScope::OwnedBy(7));
        assert!(scope.admits(Some(7)));
        assert!(!scope.admits(Some(8)));
        assert!(!scope.admits(None));
    }

    #[test]
    fn other_roles_see_everything() {
        let manager = principal(1, &[Role::Child]);
        let scope = OwnerScope::restricted_by(&manager, Role::Seller);

        assert_eq!(scope, OwnerScope::All);
        assert!(scope.admits(None));
        assert!(scope.admits(Some(99)));
    }

    #[test]
    fn forbidden_delete_policy_always_denies() {
        let policy = DeletePolicy::Forbidden("Nenhum registro pode ser deletado.");
        assert!(matches!(policy.check(), Err(AppError::PermissionDenied(_))));
        assert!(DeletePolicy::Allowed.check().is_ok());
    }
}
