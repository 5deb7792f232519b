//! Postgres implementation of every store trait.
//!
//! Thin delegation; the SQL lives on the model types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::common::{AdminId, AppError, AppResult, ChallengeId, MemberId, ReceiptId};
use crate::domains::auth::models::{AdminUser, OtpChallenge, OtpPurpose};
use crate::domains::member::models::{
    Member, MemberFilter, MemberMessage, NewMember, RegistrationStats, VerificationStatus,
};
use crate::domains::receipts::models::ReceiptUpload;
use crate::kernel::{
    BaseAdminStore, BaseMemberStore, BaseMessageStore, BaseOtpStore, BaseReceiptStore,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn found(matched: bool, what: &'static str) -> AppResult<()> {
    if matched {
        Ok(())
    } else {
        Err(AppError::NotFound(what))
    }
}

#[async_trait]
impl BaseMemberStore for PgStore {
    async fn find_by_id(&self, id: MemberId) -> AppResult<Option<Member>> {
        Member::find_by_id(id, &self.pool).await
    }

    async fn find_all_by_email(&self, email: &str) -> AppResult<Vec<Member>> {
        Member::find_all_by_email(email, &self.pool).await
    }

    async fn find_all_by_username(&self, username: &str) -> AppResult<Vec<Member>> {
        Member::find_all_by_username(username, &self.pool).await
    }

    async fn find_all_by_phone_or_email(&self, identifier: &str) -> AppResult<Vec<Member>> {
        Member::find_all_by_phone_or_email(identifier, &self.pool).await
    }

    async fn insert(&self, id: MemberId, member: &NewMember) -> AppResult<Member> {
        Member::insert(id, member, &self.pool).await
    }

    async fn update_password(&self, id: MemberId, password_hash: &str) -> AppResult<()> {
        found(
            Member::update_password(id, password_hash, &self.pool).await?,
            "Member",
        )
    }

    async fn record_decision(
        &self,
        id: MemberId,
        status: VerificationStatus,
        reason: Option<&str>,
        message: &MemberMessage,
    ) -> AppResult<()> {
        found(
            Member::record_decision(id, status, reason, message, &self.pool).await?,
            "Member",
        )
    }

    async fn set_receipt_ref(&self, id: MemberId, receipt_ref: &str) -> AppResult<()> {
        found(
            Member::set_receipt_ref(id, receipt_ref, &self.pool).await?,
            "Member",
        )
    }

    async fn list(&self, filter: &MemberFilter) -> AppResult<Vec<Member>> {
        Member::list(filter, &self.pool).await
    }

    async fn stats(&self) -> AppResult<RegistrationStats> {
        Member::stats(&self.pool).await
    }
}

#[async_trait]
impl BaseOtpStore for PgStore {
    async fn replace_open_challenge(&self, challenge: &OtpChallenge) -> AppResult<()> {
        challenge.replace_open(&self.pool).await
    }

    async fn find_challenge(&self, id: ChallengeId) -> AppResult<Option<OtpChallenge>> {
        OtpChallenge::find_by_id(id, &self.pool).await
    }

    async fn latest_challenge(
        &self,
        phone_number: &str,
        purpose: OtpPurpose,
    ) -> AppResult<Option<OtpChallenge>> {
        OtpChallenge::latest_for(phone_number, purpose, &self.pool).await
    }

    async fn record_failed_attempt(&self, id: ChallengeId) -> AppResult<()> {
        OtpChallenge::record_failed_attempt(id, &self.pool).await
    }

    async fn consume_challenge(
        &self,
        id: ChallengeId,
        now: DateTime<Utc>,
        max_attempts: i32,
    ) -> AppResult<bool> {
        OtpChallenge::consume(id, now, max_attempts, &self.pool).await
    }
}

#[async_trait]
impl BaseReceiptStore for PgStore {
    async fn insert_receipt(&self, receipt: &ReceiptUpload) -> AppResult<ReceiptUpload> {
        receipt.insert(&self.pool).await
    }

    async fn find_receipt(&self, id: ReceiptId) -> AppResult<Option<ReceiptUpload>> {
        ReceiptUpload::find_by_id(id, &self.pool).await
    }

    async fn receipts_for_member(&self, member_id: MemberId) -> AppResult<Vec<ReceiptUpload>> {
        ReceiptUpload::find_for_member(member_id, &self.pool).await
    }

    async fn receipts_by_status(
        &self,
        status: Option<VerificationStatus>,
    ) -> AppResult<Vec<ReceiptUpload>> {
        ReceiptUpload::find_by_status(status, &self.pool).await
    }

    async fn gate_used(&self, gate_id: ChallengeId) -> AppResult<bool> {
        ReceiptUpload::gate_used(gate_id, &self.pool).await
    }

    async fn update_receipt_status(
        &self,
        id: ReceiptId,
        status: VerificationStatus,
    ) -> AppResult<()> {
        found(
            ReceiptUpload::update_status(id, status, &self.pool).await?,
            "Receipt",
        )
    }
}

#[async_trait]
impl BaseMessageStore for PgStore {
    async fn insert_message(&self, message: &MemberMessage) -> AppResult<MemberMessage> {
        message.insert(&self.pool).await
    }

    async fn messages_for_member(&self, member_id: MemberId) -> AppResult<Vec<MemberMessage>> {
        MemberMessage::find_for_member(member_id, &self.pool).await
    }
}

#[async_trait]
impl BaseAdminStore for PgStore {
    async fn find_admin(&self, id: AdminId) -> AppResult<Option<AdminUser>> {
        AdminUser::find_by_id(id, &self.pool).await
    }

    async fn find_admin_by_email(&self, email: &str) -> AppResult<Option<AdminUser>> {
        AdminUser::find_by_email(email, &self.pool).await
    }

    async fn insert_admin(&self, admin: &AdminUser) -> AppResult<AdminUser> {
        admin.insert(&self.pool).await
    }
}
