use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;

use crate::common::{AppError, AppResult, ChallengeId};

/// What a one-time code is allowed to unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "otp_purpose", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Login,
    PasswordReset,
    ReceiptUpload,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Login => "login",
            OtpPurpose::PasswordReset => "password_reset",
            OtpPurpose::ReceiptUpload => "receipt_upload",
        }
    }

    /// Text of the SMS carrying the code.
    pub fn message_body(&self, code: &str, ttl_minutes: i64) -> String {
        let action = match self {
            OtpPurpose::Login => "sign in to your member dashboard",
            OtpPurpose::PasswordReset => "reset your password",
            OtpPurpose::ReceiptUpload => "confirm your receipt upload",
        };
        format!(
            "Your Chamber verification code is {code}. Use it to {action}. It expires in {ttl_minutes} minutes."
        )
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtpPurpose {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(OtpPurpose::Login),
            "password_reset" => Ok(OtpPurpose::PasswordReset),
            "receipt_upload" => Ok(OtpPurpose::ReceiptUpload),
            other => Err(AppError::validation(format!("Unknown OTP purpose: {other}"))),
        }
    }
}

/// One issued code (`otp_challenges` table). The code itself is never stored.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct OtpChallenge {
    pub id: ChallengeId,
    pub phone_number: String,
    pub purpose: OtpPurpose,
    pub code_hash: String,
    pub attempts: i32,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub invalidated_at: Option<DateTime<Utc>>,
}

// =============================================================================
// SQL Queries
// =============================================================================

impl OtpChallenge {
    pub async fn find_by_id(id: ChallengeId, pool: &PgPool) -> AppResult<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM otp_challenges WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn latest_for(
        phone_number: &str,
        purpose: OtpPurpose,
        pool: &PgPool,
    ) -> AppResult<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM otp_challenges
             WHERE phone_number = $1 AND purpose = $2
             ORDER BY issued_at DESC
             LIMIT 1",
        )
        .bind(phone_number)
        .bind(purpose)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Invalidate every open challenge for the pair, then store `self`.
    pub async fn replace_open(&self, pool: &PgPool) -> AppResult<()> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE otp_challenges
             SET invalidated_at = $3
             WHERE phone_number = $1 AND purpose = $2
               AND consumed_at IS NULL AND invalidated_at IS NULL",
        )
        .bind(&self.phone_number)
        .bind(self.purpose)
        .bind(self.issued_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO otp_challenges (
                id, phone_number, purpose, code_hash, attempts,
                issued_at, expires_at, consumed_at, invalidated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(self.id)
        .bind(&self.phone_number)
        .bind(self.purpose)
        .bind(&self.code_hash)
        .bind(self.attempts)
        .bind(self.issued_at)
        .bind(self.expires_at)
        .bind(self.consumed_at)
        .bind(self.invalidated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn record_failed_attempt(id: ChallengeId, pool: &PgPool) -> AppResult<()> {
        sqlx::query("UPDATE otp_challenges SET attempts = attempts + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Compare-and-set consumption. Only one caller can ever get `true`.
    pub async fn consume(
        id: ChallengeId,
        now: DateTime<Utc>,
        max_attempts: i32,
        pool: &PgPool,
    ) -> AppResult<bool> {
        let consumed = sqlx::query_scalar::<_, ChallengeId>(
            "UPDATE otp_challenges
             SET consumed_at = $2
             WHERE id = $1
               AND consumed_at IS NULL
               AND invalidated_at IS NULL
               AND expires_at > $2
               AND attempts < $3
             RETURNING id",
        )
        .bind(id)
        .bind(now)
        .bind(max_attempts)
        .fetch_optional(pool)
        .await?;
        Ok(consumed.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purpose_round_trips_through_str() {
        for purpose in [
            OtpPurpose::Login,
            OtpPurpose::PasswordReset,
            OtpPurpose::ReceiptUpload,
        ] {
            assert_eq!(purpose.as_str().parse::<OtpPurpose>().unwrap(), purpose);
        }
    }

    #[test]
    fn test_message_body_contains_code() {
        let body = OtpPurpose::PasswordReset.message_body("482913", 5);
        assert!(body.contains("482913"));
        assert!(body.contains("reset your password"));
        assert!(body.contains("5 minutes"));
    }

    #[test]
    fn test_purpose_serde_is_snake_case() {
        let purpose: OtpPurpose = serde_json::from_str("\"receipt_upload\"").unwrap();
        assert_eq!(purpose, OtpPurpose::ReceiptUpload);
    }
}
