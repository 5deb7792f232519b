//! Server dependencies for activities (using traits for testability)
//!
//! This module provides the central dependency container used by all domain
//! activities. All external services use trait abstractions to enable testing.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use twilio::{TwilioOptions, TwilioService};

use crate::common::auth::HasAuthContext;
use crate::common::AdminId;
use crate::config::{Config, OtpPolicy};
use crate::domains::auth::{JwtService, RevokedTokens};
use crate::kernel::{
    BaseAdminStore, BaseBlobStore, BaseMemberStore, BaseMessageStore, BaseMessagingService,
    BaseOtpStore, BaseReceiptStore, FsBlobStore, PgStore,
};

// =============================================================================
// TwilioService Adapter (implements BaseMessagingService trait)
// =============================================================================

/// Wrapper around TwilioService that implements BaseMessagingService trait
pub struct TwilioAdapter(pub Arc<TwilioService>);

impl TwilioAdapter {
    pub fn new(service: Arc<TwilioService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BaseMessagingService for TwilioAdapter {
    async fn send_sms(&self, phone_number: &str, body: &str) -> Result<()> {
        self.0
            .send_sms(phone_number, body)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to activities (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub members: Arc<dyn BaseMemberStore>,
    pub otp_store: Arc<dyn BaseOtpStore>,
    pub receipts: Arc<dyn BaseReceiptStore>,
    pub messages: Arc<dyn BaseMessageStore>,
    pub admins: Arc<dyn BaseAdminStore>,
    pub blobs: Arc<dyn BaseBlobStore>,
    pub messaging: Arc<dyn BaseMessagingService>,
    /// JWT service for session and grant tokens
    pub jwt_service: Arc<JwtService>,
    pub revoked_tokens: RevokedTokens,
    pub otp_policy: OtpPolicy,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        members: Arc<dyn BaseMemberStore>,
        otp_store: Arc<dyn BaseOtpStore>,
        receipts: Arc<dyn BaseReceiptStore>,
        messages: Arc<dyn BaseMessageStore>,
        admins: Arc<dyn BaseAdminStore>,
        blobs: Arc<dyn BaseBlobStore>,
        messaging: Arc<dyn BaseMessagingService>,
        jwt_service: Arc<JwtService>,
        otp_policy: OtpPolicy,
    ) -> Self {
        Self {
            members,
            otp_store,
            receipts,
            messages,
            admins,
            blobs,
            messaging,
            jwt_service,
            revoked_tokens: RevokedTokens::new(),
            otp_policy,
        }
    }

    /// Production wiring: Postgres stores, filesystem blobs, Twilio SMS.
    pub fn from_config(pool: PgPool, config: &Config) -> Self {
        let store = Arc::new(PgStore::new(pool));
        let twilio = Arc::new(TwilioService::new(TwilioOptions {
            account_sid: config.twilio_account_sid.clone(),
            auth_token: config.twilio_auth_token.clone(),
            from_number: config.twilio_from_number.clone(),
        }));

        Self::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            Arc::new(FsBlobStore::new(&config.receipt_storage_dir)),
            Arc::new(TwilioAdapter::new(twilio)),
            Arc::new(JwtService::new(
                &config.jwt_secret,
                config.jwt_issuer.clone(),
            )),
            config.otp_policy,
        )
    }
}

/// Implement HasAuthContext for ServerDeps to enable authorization checks
#[async_trait]
impl HasAuthContext for ServerDeps {
    async fn admin_exists(&self, admin_id: AdminId) -> Result<bool> {
        Ok(self.admins.find_admin(admin_id).await?.is_some())
    }
}
