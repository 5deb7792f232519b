// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Workflow rules live in domain activities that call these traits.
//
// Naming convention: Base* for trait names (e.g., BaseMemberStore, BaseBlobStore)
//
// Store traits return AppResult so uniqueness violations surface as domain
// errors (Conflict, Rejected); transport traits return anyhow::Result.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::common::{AdminId, AppError, AppResult, ChallengeId, MemberId, ReceiptId};
use crate::domains::auth::models::{AdminUser, OtpChallenge, OtpPurpose};
use crate::domains::member::models::{
    Member, MemberFilter, MemberMessage, NewMember, RegistrationStats, VerificationStatus,
};
use crate::domains::receipts::models::ReceiptUpload;

// =============================================================================
// Identity Store (registrations)
// =============================================================================

#[async_trait]
pub trait BaseMemberStore: Send + Sync {
    async fn find_by_id(&self, id: MemberId) -> AppResult<Option<Member>>;

    async fn find_all_by_email(&self, email: &str) -> AppResult<Vec<Member>>;

    async fn find_all_by_username(&self, username: &str) -> AppResult<Vec<Member>>;

    async fn find_all_by_phone_or_email(&self, identifier: &str) -> AppResult<Vec<Member>>;

    /// Fails with `Conflict` when the email, username or phone is taken.
    async fn insert(&self, id: MemberId, member: &NewMember) -> AppResult<Member>;

    /// `NotFound` when no such member exists.
    async fn update_password(&self, id: MemberId, password_hash: &str) -> AppResult<()>;

    /// Set the verification status and post `message` atomically: either
    /// both are stored or neither is.
    async fn record_decision(
        &self,
        id: MemberId,
        status: VerificationStatus,
        reason: Option<&str>,
        message: &MemberMessage,
    ) -> AppResult<()>;

    /// Attach a membership receipt and reset status to pending.
    async fn set_receipt_ref(&self, id: MemberId, receipt_ref: &str) -> AppResult<()>;

    async fn list(&self, filter: &MemberFilter) -> AppResult<Vec<Member>>;

    async fn stats(&self) -> AppResult<RegistrationStats>;

    /// Email when the identifier contains `@`, username otherwise.
    /// Anything but exactly one match is `NotFound`.
    async fn find_by_identifier(&self, identifier: &str) -> AppResult<Member> {
        let identifier = identifier.trim();
        let matches = if identifier.contains('@') {
            self.find_all_by_email(&identifier.to_lowercase()).await?
        } else {
            self.find_all_by_username(identifier).await?
        };
        exactly_one(matches)
    }

    async fn find_by_phone_or_email(&self, identifier: &str) -> AppResult<Member> {
        let matches = self.find_all_by_phone_or_email(identifier.trim()).await?;
        exactly_one(matches)
    }
}

fn exactly_one(mut matches: Vec<Member>) -> AppResult<Member> {
    match matches.len() {
        1 => Ok(matches.remove(0)),
        _ => Err(AppError::NotFound("Member")),
    }
}

// =============================================================================
// OTP Challenge Store
// =============================================================================

#[async_trait]
pub trait BaseOtpStore: Send + Sync {
    /// Invalidate open challenges for the same (phone, purpose) and store
    /// the new one, as one unit.
    async fn replace_open_challenge(&self, challenge: &OtpChallenge) -> AppResult<()>;

    async fn find_challenge(&self, id: ChallengeId) -> AppResult<Option<OtpChallenge>>;

    async fn latest_challenge(
        &self,
        phone_number: &str,
        purpose: OtpPurpose,
    ) -> AppResult<Option<OtpChallenge>>;

    async fn record_failed_attempt(&self, id: ChallengeId) -> AppResult<()>;

    /// Atomically mark an open challenge consumed. Returns false if it was
    /// already consumed, invalidated, expired or exhausted.
    async fn consume_challenge(
        &self,
        id: ChallengeId,
        now: DateTime<Utc>,
        max_attempts: i32,
    ) -> AppResult<bool>;
}

// =============================================================================
// Receipt Store
// =============================================================================

#[async_trait]
pub trait BaseReceiptStore: Send + Sync {
    /// `Rejected` when the receipt's gate has already been used.
    async fn insert_receipt(&self, receipt: &ReceiptUpload) -> AppResult<ReceiptUpload>;

    async fn find_receipt(&self, id: ReceiptId) -> AppResult<Option<ReceiptUpload>>;

    /// Newest first
    async fn receipts_for_member(&self, member_id: MemberId) -> AppResult<Vec<ReceiptUpload>>;

    async fn receipts_by_status(
        &self,
        status: Option<VerificationStatus>,
    ) -> AppResult<Vec<ReceiptUpload>>;

    async fn gate_used(&self, gate_id: ChallengeId) -> AppResult<bool>;

    async fn update_receipt_status(
        &self,
        id: ReceiptId,
        status: VerificationStatus,
    ) -> AppResult<()>;
}

// =============================================================================
// Member Message Store
// =============================================================================

#[async_trait]
pub trait BaseMessageStore: Send + Sync {
    async fn insert_message(&self, message: &MemberMessage) -> AppResult<MemberMessage>;

    /// Newest first
    async fn messages_for_member(&self, member_id: MemberId) -> AppResult<Vec<MemberMessage>>;
}

// =============================================================================
// Admin Store
// =============================================================================

#[async_trait]
pub trait BaseAdminStore: Send + Sync {
    async fn find_admin(&self, id: AdminId) -> AppResult<Option<AdminUser>>;

    async fn find_admin_by_email(&self, email: &str) -> AppResult<Option<AdminUser>>;

    async fn insert_admin(&self, admin: &AdminUser) -> AppResult<AdminUser>;
}

// =============================================================================
// Blob Store (Infrastructure - receipt files)
// =============================================================================

#[async_trait]
pub trait BaseBlobStore: Send + Sync {
    async fn upload(&self, bucket: &str, key: &str, bytes: &[u8], content_type: &str)
        -> Result<()>;

    async fn download(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    async fn remove(&self, bucket: &str, key: &str) -> Result<()>;
}

// =============================================================================
// Messaging Service Trait (Infrastructure - SMS)
// =============================================================================

#[async_trait]
pub trait BaseMessagingService: Send + Sync {
    /// Send a text message to an E.164 phone number
    async fn send_sms(&self, phone_number: &str, body: &str) -> Result<()>;
}
