use async_trait::async_trait;

use super::{AdminCapability, AuthError};
use crate::common::entity_ids::AdminId;

/// Entry point for authorization checks.
pub struct Actor {
    actor_id: AdminId,
    is_admin: bool,
}

impl Actor {
    /// `is_admin` comes from an already-validated session token.
    pub fn new(actor_id: AdminId, is_admin: bool) -> Self {
        Self { actor_id, is_admin }
    }

    pub fn can(self, capability: AdminCapability) -> CapabilityBuilder {
        CapabilityBuilder {
            actor_id: self.actor_id,
            is_admin: self.is_admin,
            capability,
        }
    }
}

pub struct CapabilityBuilder {
    actor_id: AdminId,
    is_admin: bool,
    capability: AdminCapability,
}

impl CapabilityBuilder {
    pub async fn check<D>(self, deps: &D) -> Result<(), AuthError>
    where
        D: HasAuthContext,
    {
        if !self.is_admin {
            return Err(AuthError::AdminRequired);
        }

        // Tokens outlive account removal; the record is the source of truth.
        if !deps.admin_exists(self.actor_id).await? {
            return Err(AuthError::PermissionDenied(self.capability));
        }

        Ok(())
    }
}

/// Dependencies that can answer authorization questions.
#[async_trait]
pub trait HasAuthContext: Send + Sync {
    async fn admin_exists(&self, admin_id: AdminId) -> anyhow::Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestDeps {
        admins: Vec<AdminId>,
    }

    #[async_trait]
    impl HasAuthContext for TestDeps {
        async fn admin_exists(&self, admin_id: AdminId) -> anyhow::Result<bool> {
            Ok(self.admins.contains(&admin_id))
        }
    }

    #[tokio::test]
    async fn test_admin_check() {
        let admin_id = AdminId::new();
        let deps = TestDeps {
            admins: vec![admin_id],
        };

        let result = Actor::new(admin_id, true)
            .can(AdminCapability::ReviewReceipts)
            .check(&deps)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_non_admin_rejected() {
        let deps = TestDeps { admins: vec![] };

        let result = Actor::new(AdminId::new(), false)
            .can(AdminCapability::ReviewReceipts)
            .check(&deps)
            .await;

        assert!(matches!(result, Err(AuthError::AdminRequired)));
    }

    #[tokio::test]
    async fn test_removed_admin_rejected() {
        let deps = TestDeps { admins: vec![] };

        let result = Actor::new(AdminId::new(), true)
            .can(AdminCapability::ResetPasswords)
            .check(&deps)
            .await;

        match result {
            Err(AuthError::PermissionDenied(capability)) => {
                assert_eq!(capability, AdminCapability::ResetPasswords)
            }
            other => panic!("expected PermissionDenied, got {other:?}"),
        }
    }
}
