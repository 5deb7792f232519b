// TestDependencies - in-memory implementations for testing
//
// Provides stores, blob storage and an SMS spy that can be injected into
// ServerDeps for tests. Behaviour mirrors the Postgres store: unique email
// and username, single-use receipt gates, compare-and-set consumption.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::{
    BaseAdminStore, BaseBlobStore, BaseMemberStore, BaseMessageStore, BaseMessagingService,
    BaseOtpStore, BaseReceiptStore, ServerDeps,
};
use crate::common::{AdminId, AppError, AppResult, ChallengeId, MemberId, ReceiptId};
use crate::config::OtpPolicy;
use crate::domains::auth::models::{AdminUser, OtpChallenge, OtpPurpose};
use crate::domains::auth::JwtService;
use crate::domains::member::models::{
    Member, MemberFilter, MemberMessage, NewMember, RegistrationStats, VerificationStatus,
};
use crate::domains::receipts::models::ReceiptUpload;

pub const TEST_JWT_SECRET: &str = "test_secret_key";
pub const TEST_JWT_ISSUER: &str = "chamber-test";

// =============================================================================
// In-memory Store
// =============================================================================

#[derive(Default)]
struct Tables {
    members: Vec<Member>,
    challenges: Vec<OtpChallenge>,
    receipts: Vec<ReceiptUpload>,
    messages: Vec<MemberMessage>,
    admins: Vec<AdminUser>,
}

/// Implements every store trait over plain vectors.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    fail_receipt_inserts: AtomicBool,
    fail_message_inserts: AtomicBool,
    member_writes: Mutex<usize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every receipt metadata insert fail with a database-style error.
    pub fn fail_receipt_inserts(&self, fail: bool) {
        self.fail_receipt_inserts.store(fail, Ordering::SeqCst);
    }

    /// Make every message write fail, including the one inside a decision.
    pub fn fail_message_inserts(&self, fail: bool) {
        self.fail_message_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn member_count(&self) -> usize {
        self.tables.lock().unwrap().members.len()
    }

    /// Number of successful writes to member rows (inserts and updates).
    pub fn member_writes(&self) -> usize {
        *self.member_writes.lock().unwrap()
    }

    pub fn challenges(&self) -> Vec<OtpChallenge> {
        self.tables.lock().unwrap().challenges.clone()
    }

    pub fn receipts(&self) -> Vec<ReceiptUpload> {
        self.tables.lock().unwrap().receipts.clone()
    }

    /// Overwrite a stored challenge, e.g. to age it past expiry.
    pub fn put_challenge(&self, challenge: OtpChallenge) {
        let mut tables = self.tables.lock().unwrap();
        tables.challenges.retain(|c| c.id != challenge.id);
        tables.challenges.push(challenge);
    }

    fn count_member_write(&self) {
        *self.member_writes.lock().unwrap() += 1;
    }

    fn update_member(&self, id: MemberId, apply: impl FnOnce(&mut Member)) -> AppResult<()> {
        let mut tables = self.tables.lock().unwrap();
        let member = tables
            .members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(AppError::NotFound("Member"))?;
        apply(member);
        drop(tables);
        self.count_member_write();
        Ok(())
    }
}

fn newest_first<T, F>(mut rows: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    rows.sort_by_key(|row| std::cmp::Reverse(key(row)));
    rows
}

#[async_trait]
impl BaseMemberStore for InMemoryStore {
    async fn find_by_id(&self, id: MemberId) -> AppResult<Option<Member>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.members.iter().find(|m| m.id == id).cloned())
    }

    async fn find_all_by_email(&self, email: &str) -> AppResult<Vec<Member>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .members
            .iter()
            .filter(|m| m.email == email)
            .cloned()
            .collect())
    }

    async fn find_all_by_username(&self, username: &str) -> AppResult<Vec<Member>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .members
            .iter()
            .filter(|m| m.username == username)
            .cloned()
            .collect())
    }

    async fn find_all_by_phone_or_email(&self, identifier: &str) -> AppResult<Vec<Member>> {
        let email = identifier.to_lowercase();
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .members
            .iter()
            .filter(|m| m.phone.as_deref() == Some(identifier) || m.email == email)
            .cloned()
            .collect())
    }

    async fn insert(&self, id: MemberId, member: &NewMember) -> AppResult<Member> {
        let mut tables = self.tables.lock().unwrap();
        if tables.members.iter().any(|m| m.email == member.email) {
            return Err(AppError::Conflict("Email address"));
        }
        if tables.members.iter().any(|m| m.username == member.username) {
            return Err(AppError::Conflict("Username"));
        }
        if member.phone.is_some() && tables.members.iter().any(|m| m.phone == member.phone) {
            return Err(AppError::Conflict("Phone number"));
        }
        let row = Member::from_new(id, member.clone(), Utc::now());
        tables.members.push(row.clone());
        drop(tables);
        self.count_member_write();
        Ok(row)
    }

    async fn update_password(&self, id: MemberId, password_hash: &str) -> AppResult<()> {
        self.update_member(id, |m| {
            m.password_hash = password_hash.to_string();
            // Strictly later even when called within the same microsecond
            m.password_changed_at =
                Utc::now().max(m.password_changed_at + chrono::Duration::microseconds(1));
        })
    }

    async fn record_decision(
        &self,
        id: MemberId,
        status: VerificationStatus,
        reason: Option<&str>,
        message: &MemberMessage,
    ) -> AppResult<()> {
        // Checked up front so a failure leaves both tables untouched
        if self.fail_message_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        self.update_member(id, |m| {
            m.verification_status = Some(status);
            m.verification_reason = reason.map(String::from);
        })?;
        self.tables.lock().unwrap().messages.push(message.clone());
        Ok(())
    }

    async fn set_receipt_ref(&self, id: MemberId, receipt_ref: &str) -> AppResult<()> {
        self.update_member(id, |m| {
            m.receipt_ref = Some(receipt_ref.to_string());
            m.verification_status = Some(VerificationStatus::Pending);
        })
    }

    async fn list(&self, filter: &MemberFilter) -> AppResult<Vec<Member>> {
        let rows: Vec<Member> = {
            let tables = self.tables.lock().unwrap();
            tables
                .members
                .iter()
                .filter(|m| filter.status.map_or(true, |s| m.status() == s))
                .cloned()
                .collect()
        };
        Ok(newest_first(rows, |m| m.created_at)
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit() as usize)
            .collect())
    }

    async fn stats(&self) -> AppResult<RegistrationStats> {
        let tables = self.tables.lock().unwrap();
        let mut stats = RegistrationStats::default();
        for member in &tables.members {
            stats.total += 1;
            match member.status() {
                VerificationStatus::Pending => stats.pending += 1,
                VerificationStatus::Verified => stats.verified += 1,
                VerificationStatus::Rejected => stats.rejected += 1,
            }
        }
        Ok(stats)
    }
}

#[async_trait]
impl BaseOtpStore for InMemoryStore {
    async fn replace_open_challenge(&self, challenge: &OtpChallenge) -> AppResult<()> {
        let mut tables = self.tables.lock().unwrap();
        for open in tables.challenges.iter_mut().filter(|c| {
            c.phone_number == challenge.phone_number
                && c.purpose == challenge.purpose
                && c.consumed_at.is_none()
                && c.invalidated_at.is_none()
        }) {
            open.invalidated_at = Some(challenge.issued_at);
        }
        tables.challenges.push(challenge.clone());
        Ok(())
    }

    async fn find_challenge(&self, id: ChallengeId) -> AppResult<Option<OtpChallenge>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.challenges.iter().find(|c| c.id == id).cloned())
    }

    async fn latest_challenge(
        &self,
        phone_number: &str,
        purpose: OtpPurpose,
    ) -> AppResult<Option<OtpChallenge>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .challenges
            .iter()
            .filter(|c| c.phone_number == phone_number && c.purpose == purpose)
            .max_by_key(|c| c.issued_at)
            .cloned())
    }

    async fn record_failed_attempt(&self, id: ChallengeId) -> AppResult<()> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(challenge) = tables.challenges.iter_mut().find(|c| c.id == id) {
            challenge.attempts += 1;
        }
        Ok(())
    }

    async fn consume_challenge(
        &self,
        id: ChallengeId,
        now: DateTime<Utc>,
        max_attempts: i32,
    ) -> AppResult<bool> {
        let mut tables = self.tables.lock().unwrap();
        let Some(challenge) = tables.challenges.iter_mut().find(|c| c.id == id) else {
            return Ok(false);
        };
        if !challenge.state(now, max_attempts).is_open() {
            return Ok(false);
        }
        challenge.consumed_at = Some(now);
        Ok(true)
    }
}

#[async_trait]
impl BaseReceiptStore for InMemoryStore {
    async fn insert_receipt(&self, receipt: &ReceiptUpload) -> AppResult<ReceiptUpload> {
        if self.fail_receipt_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut tables = self.tables.lock().unwrap();
        if tables.receipts.iter().any(|r| r.gate_id == receipt.gate_id) {
            return Err(AppError::Rejected);
        }
        tables.receipts.push(receipt.clone());
        Ok(receipt.clone())
    }

    async fn find_receipt(&self, id: ReceiptId) -> AppResult<Option<ReceiptUpload>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.receipts.iter().find(|r| r.id == id).cloned())
    }

    async fn receipts_for_member(&self, member_id: MemberId) -> AppResult<Vec<ReceiptUpload>> {
        let rows: Vec<ReceiptUpload> = {
            let tables = self.tables.lock().unwrap();
            tables
                .receipts
                .iter()
                .filter(|r| r.member_id == member_id)
                .cloned()
                .collect()
        };
        Ok(newest_first(rows, |r| r.created_at))
    }

    async fn receipts_by_status(
        &self,
        status: Option<VerificationStatus>,
    ) -> AppResult<Vec<ReceiptUpload>> {
        let rows: Vec<ReceiptUpload> = {
            let tables = self.tables.lock().unwrap();
            tables
                .receipts
                .iter()
                .filter(|r| status.map_or(true, |s| r.status == s))
                .cloned()
                .collect()
        };
        Ok(newest_first(rows, |r| r.created_at))
    }

    async fn gate_used(&self, gate_id: ChallengeId) -> AppResult<bool> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.receipts.iter().any(|r| r.gate_id == gate_id))
    }

    async fn update_receipt_status(
        &self,
        id: ReceiptId,
        status: VerificationStatus,
    ) -> AppResult<()> {
        let mut tables = self.tables.lock().unwrap();
        let receipt = tables
            .receipts
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(AppError::NotFound("Receipt"))?;
        receipt.status = status;
        Ok(())
    }
}

#[async_trait]
impl BaseMessageStore for InMemoryStore {
    async fn insert_message(&self, message: &MemberMessage) -> AppResult<MemberMessage> {
        if self.fail_message_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        self.tables.lock().unwrap().messages.push(message.clone());
        Ok(message.clone())
    }

    async fn messages_for_member(&self, member_id: MemberId) -> AppResult<Vec<MemberMessage>> {
        let rows: Vec<MemberMessage> = {
            let tables = self.tables.lock().unwrap();
            tables
                .messages
                .iter()
                .filter(|m| m.member_id == member_id)
                .cloned()
                .collect()
        };
        Ok(newest_first(rows, |m| m.created_at))
    }
}

#[async_trait]
impl BaseAdminStore for InMemoryStore {
    async fn find_admin(&self, id: AdminId) -> AppResult<Option<AdminUser>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.admins.iter().find(|a| a.id == id).cloned())
    }

    async fn find_admin_by_email(&self, email: &str) -> AppResult<Option<AdminUser>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.admins.iter().find(|a| a.email == email).cloned())
    }

    async fn insert_admin(&self, admin: &AdminUser) -> AppResult<AdminUser> {
        let mut tables = self.tables.lock().unwrap();
        if tables.admins.iter().any(|a| a.email == admin.email) {
            return Err(AppError::Conflict("Admin account"));
        }
        tables.admins.push(admin.clone());
        Ok(admin.clone())
    }
}

// =============================================================================
// In-memory Blob Store
// =============================================================================

#[derive(Default)]
pub struct InMemoryBlobStore {
    objects: Mutex<HashMap<(String, String), (Vec<u8>, String)>>,
    fail_removals: AtomicBool,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_removals(&self, fail: bool) {
        self.fail_removals.store(fail, Ordering::SeqCst);
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains_key(&(bucket.to_string(), key.to_string()))
    }
}

#[async_trait]
impl BaseBlobStore for InMemoryBlobStore {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<()> {
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            (bytes.to_vec(), content_type.to_string()),
        );
        Ok(())
    }

    async fn download(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| anyhow::anyhow!("object {bucket}/{key} not found"))
    }

    async fn remove(&self, bucket: &str, key: &str) -> Result<()> {
        if self.fail_removals.load(Ordering::SeqCst) {
            anyhow::bail!("blob store unavailable");
        }
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}

// =============================================================================
// Mock Messaging Service
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub phone_number: String,
    pub body: String,
}

/// Records every SMS instead of sending it.
#[derive(Default)]
pub struct MockMessagingService {
    sent: Mutex<Vec<SentMessage>>,
    failure: Mutex<Option<String>>,
}

impl MockMessagingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail with `reason`; `None` restores delivery.
    pub fn fail_with(&self, reason: Option<&str>) {
        *self.failure.lock().unwrap() = reason.map(String::from);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// The six-digit code in the most recent message to `phone_number`.
    pub fn last_code_for(&self, phone_number: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|m| m.phone_number == phone_number)
            .and_then(|m| extract_code(&m.body))
    }
}

fn extract_code(body: &str) -> Option<String> {
    body.split(|c: char| !c.is_ascii_digit())
        .find(|token| token.len() == 6)
        .map(String::from)
}

#[async_trait]
impl BaseMessagingService for MockMessagingService {
    async fn send_sms(&self, phone_number: &str, body: &str) -> Result<()> {
        if let Some(reason) = self.failure.lock().unwrap().clone() {
            anyhow::bail!(reason);
        }
        self.sent.lock().unwrap().push(SentMessage {
            phone_number: phone_number.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Bundle of in-memory collaborators. Keep this value around to inspect
/// the mocks after running activities against `server_deps()`.
pub struct TestDependencies {
    pub store: Arc<InMemoryStore>,
    pub blobs: Arc<InMemoryBlobStore>,
    pub messaging: Arc<MockMessagingService>,
    pub otp_policy: OtpPolicy,
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            blobs: Arc::new(InMemoryBlobStore::new()),
            messaging: Arc::new(MockMessagingService::new()),
            otp_policy: OtpPolicy::default(),
        }
    }

    pub fn with_otp_policy(mut self, policy: OtpPolicy) -> Self {
        self.otp_policy = policy;
        self
    }

    pub fn server_deps(&self) -> ServerDeps {
        ServerDeps::new(
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.blobs.clone(),
            self.messaging.clone(),
            Arc::new(JwtService::new(TEST_JWT_SECRET, TEST_JWT_ISSUER.to_string())),
            self.otp_policy,
        )
    }

    pub fn into_server_deps(self) -> ServerDeps {
        self.server_deps()
    }
}
