use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::common::{AppError, AppResult, ChallengeId, EventId, MemberId, ReceiptId};
use crate::domains::member::models::VerificationStatus;

/// Stored proof of payment (`receipt_uploads` table).
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct ReceiptUpload {
    pub id: ReceiptId,
    pub member_id: MemberId,
    pub event_id: Option<EventId>,
    pub bank_label: String,
    /// Object key inside the `receipts` bucket
    pub file_ref: String,
    pub content_type: String,
    pub status: VerificationStatus,
    /// OTP challenge that authorised this upload; unique per receipt
    #[serde(skip)]
    pub gate_id: ChallengeId,
    pub created_at: DateTime<Utc>,
}

impl ReceiptUpload {
    pub async fn insert(&self, pool: &PgPool) -> AppResult<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO receipt_uploads (
                id, member_id, event_id, bank_label, file_ref,
                content_type, status, gate_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.member_id)
        .bind(self.event_id)
        .bind(&self.bank_label)
        .bind(&self.file_ref)
        .bind(&self.content_type)
        .bind(self.status)
        .bind(self.gate_id)
        .bind(self.created_at)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            // gate_id already spent
            let duplicate = e.as_database_error().and_then(|d| d.code()).as_deref() == Some("23505");
            if duplicate {
                AppError::Rejected
            } else {
                AppError::Database(e)
            }
        })
    }

    pub async fn find_by_id(id: ReceiptId, pool: &PgPool) -> AppResult<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM receipt_uploads WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_for_member(member_id: MemberId, pool: &PgPool) -> AppResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM receipt_uploads WHERE member_id = $1 ORDER BY created_at DESC",
        )
        .bind(member_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_status(
        status: Option<VerificationStatus>,
        pool: &PgPool,
    ) -> AppResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM receipt_uploads
             WHERE $1::verification_status IS NULL OR status = $1
             ORDER BY created_at DESC",
        )
        .bind(status)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn gate_used(gate_id: ChallengeId, pool: &PgPool) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM receipt_uploads WHERE gate_id = $1)",
        )
        .bind(gate_id)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn update_status(
        id: ReceiptId,
        status: VerificationStatus,
        pool: &PgPool,
    ) -> AppResult<bool> {
        let result = sqlx::query("UPDATE receipt_uploads SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
