//! Per-request session context.
//!
//! A `SessionContext` is built from the bearer token when a request arrives
//! (`init`) and cleared on logout (`teardown`). Nothing about the current
//! user lives in shared state; only revoked token ids do.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::common::{Actor, AdminId, AuthError, MemberId};
use crate::domains::auth::jwt::{Claims, SessionRole};
use crate::kernel::ServerDeps;

/// Token ids revoked before their natural expiry.
#[derive(Clone, Default)]
pub struct RevokedTokens {
    inner: Arc<RwLock<HashMap<String, DateTime<Utc>>>>,
}

impl RevokedTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) {
        let now = Utc::now();
        let mut revoked = self.inner.write().await;
        revoked.retain(|_, exp| *exp > now);
        if expires_at > now {
            revoked.insert(jti.to_string(), expires_at);
        }
    }

    pub async fn is_revoked(&self, jti: &str) -> bool {
        self.inner.read().await.contains_key(jti)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

/// The authenticated subject of a session token.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub subject: Uuid,
    pub role: SessionRole,
    pub email: String,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionUser {
    fn from_claims(claims: Claims) -> Option<Self> {
        Some(Self {
            subject: Uuid::parse_str(&claims.sub).ok()?,
            role: claims.role,
            expires_at: claims.expires_at(),
            email: claims.email,
            jti: claims.jti,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == SessionRole::Admin
    }

    pub fn member_id(&self) -> Option<MemberId> {
        (self.role == SessionRole::Member).then(|| MemberId::from_uuid(self.subject))
    }

    pub fn admin_id(&self) -> Option<AdminId> {
        self.is_admin().then(|| AdminId::from_uuid(self.subject))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    user: Option<SessionUser>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Load and validate a token. Invalid, expired or revoked tokens give
    /// an anonymous context rather than an error.
    pub async fn init(token: Option<&str>, deps: &ServerDeps) -> Self {
        let Some(token) = token else {
            return Self::anonymous();
        };

        let claims = match deps.jwt_service.verify_token(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "session token rejected");
                return Self::anonymous();
            }
        };

        if deps.revoked_tokens.is_revoked(&claims.jti).await {
            debug!("revoked session token presented");
            return Self::anonymous();
        }

        if let Some(member_id) = claims.member_id() {
            if !password_epoch_current(member_id, claims.pwd, deps).await {
                return Self::anonymous();
            }
        }

        Self {
            user: SessionUser::from_claims(claims),
        }
    }

    /// Revoke the token this context was built from and forget the user.
    pub async fn teardown(&mut self, deps: &ServerDeps) {
        if let Some(user) = self.user.take() {
            deps.revoked_tokens.revoke(&user.jti, user.expires_at).await;
            debug!(role = ?user.role, "session torn down");
        }
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn require_member(&self) -> Result<MemberId, AuthError> {
        let user = self.user.as_ref().ok_or(AuthError::SignInRequired)?;
        user.member_id().ok_or(AuthError::SignInRequired)
    }

    /// Actor for admin capability checks.
    pub fn actor(&self) -> Result<Actor, AuthError> {
        let user = self.user.as_ref().ok_or(AuthError::SignInRequired)?;
        let admin_id = user.admin_id().ok_or(AuthError::AdminRequired)?;
        Ok(Actor::new(admin_id, true))
    }
}

/// A member session stays valid until the member is removed or changes
/// their password.
async fn password_epoch_current(
    member_id: MemberId,
    pwd: Option<i64>,
    deps: &ServerDeps,
) -> bool {
    match deps.members.find_by_id(member_id).await {
        Ok(Some(member)) if pwd == Some(member.password_epoch()) => true,
        Ok(Some(_)) => {
            debug!(%member_id, "session predates a password change");
            false
        }
        Ok(None) => {
            debug!(%member_id, "session for unknown member");
            false
        }
        Err(e) => {
            warn!(error = %e, "member lookup failed while loading session");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::member::models::{Member, NewMember};
    use crate::kernel::TestDependencies;

    async fn stored_member(deps: &ServerDeps, email: &str) -> Member {
        let new = NewMember::builder()
            .name("A")
            .business_name("B")
            .email(email)
            .username(email.replace(['@', '.'], "_"))
            .password_hash("$argon2id$original")
            .build();
        deps.members.insert(MemberId::new(), &new).await.unwrap()
    }

    #[tokio::test]
    async fn test_missing_token_is_anonymous() {
        let deps = TestDependencies::new().into_server_deps();
        let ctx = SessionContext::init(None, &deps).await;
        assert!(!ctx.is_authenticated());
        assert!(matches!(
            ctx.require_member(),
            Err(AuthError::SignInRequired)
        ));
    }

    #[tokio::test]
    async fn test_garbage_token_is_anonymous() {
        let deps = TestDependencies::new().into_server_deps();
        let ctx = SessionContext::init(Some("not-a-jwt"), &deps).await;
        assert!(!ctx.is_authenticated());
    }

    #[tokio::test]
    async fn test_member_token_loads_member() {
        let deps = TestDependencies::new().into_server_deps();
        let member = stored_member(&deps, "a@x.com").await;
        let token = deps
            .jwt_service
            .create_member_token(member.id, member.email.clone(), member.password_epoch())
            .unwrap();

        let ctx = SessionContext::init(Some(&token), &deps).await;
        assert_eq!(ctx.require_member().unwrap(), member.id);
        assert!(matches!(ctx.actor(), Err(AuthError::AdminRequired)));
    }

    #[tokio::test]
    async fn test_member_token_without_member_is_anonymous() {
        let deps = TestDependencies::new().into_server_deps();
        let token = deps
            .jwt_service
            .create_member_token(MemberId::new(), "gone@x.com".into(), 0)
            .unwrap();

        let ctx = SessionContext::init(Some(&token), &deps).await;
        assert!(!ctx.is_authenticated());
    }

    #[tokio::test]
    async fn test_password_change_ends_member_sessions() {
        let deps = TestDependencies::new().into_server_deps();
        let member = stored_member(&deps, "b@x.com").await;
        let token = deps
            .jwt_service
            .create_member_token(member.id, member.email.clone(), member.password_epoch())
            .unwrap();
        assert!(SessionContext::init(Some(&token), &deps).await.is_authenticated());

        // A member token without an epoch is never accepted
        let unbound = deps
            .jwt_service
            .create_token(member.id.into_uuid(), SessionRole::Member, member.email.clone())
            .unwrap();
        assert!(!SessionContext::init(Some(&unbound), &deps).await.is_authenticated());

        deps.members
            .update_password(member.id, "$argon2id$changed")
            .await
            .unwrap();

        let ctx = SessionContext::init(Some(&token), &deps).await;
        assert!(!ctx.is_authenticated());
    }

    #[tokio::test]
    async fn test_teardown_revokes_token() {
        let deps = TestDependencies::new().into_server_deps();
        let token = deps
            .jwt_service
            .create_token(Uuid::new_v4(), SessionRole::Admin, "admin@x.com".into())
            .unwrap();

        let mut ctx = SessionContext::init(Some(&token), &deps).await;
        assert!(ctx.actor().is_ok());

        ctx.teardown(&deps).await;
        assert!(!ctx.is_authenticated());

        let again = SessionContext::init(Some(&token), &deps).await;
        assert!(!again.is_authenticated());
    }

    #[tokio::test]
    async fn test_revocations_of_expired_tokens_are_pruned() {
        let revoked = RevokedTokens::new();
        revoked
            .revoke("old", Utc::now() - chrono::Duration::seconds(1))
            .await;
        assert_eq!(revoked.len().await, 0);

        revoked
            .revoke("live", Utc::now() + chrono::Duration::hours(1))
            .await;
        assert!(revoked.is_revoked("live").await);
    }
}
