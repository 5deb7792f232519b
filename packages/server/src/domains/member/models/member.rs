use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use typed_builder::TypedBuilder;

use crate::common::{AppError, AppResult, MemberId};
use crate::domains::member::models::MemberMessage;

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "membership_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MembershipType {
    #[default]
    Basic,
    Premium,
    Corporate,
}

impl MembershipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipType::Basic => "basic",
            MembershipType::Premium => "premium",
            MembershipType::Corporate => "corporate",
        }
    }
}

impl FromStr for MembershipType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(MembershipType::Basic),
            "premium" => Ok(MembershipType::Premium),
            "corporate" => Ok(MembershipType::Corporate),
            other => Err(AppError::validation(format!(
                "Unknown membership type: {other}"
            ))),
        }
    }
}

/// Admin-controlled verification lifecycle of a member or a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "verification_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(VerificationStatus::Pending),
            "verified" => Ok(VerificationStatus::Verified),
            "rejected" => Ok(VerificationStatus::Rejected),
            other => Err(AppError::validation(format!(
                "Unknown verification status: {other}"
            ))),
        }
    }
}

// ============================================================================
// Member Model
// ============================================================================

/// One chamber registrant (`registrations` table).
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub business_name: String,
    pub email: String,
    pub username: String,
    pub phone: Option<String>,
    pub sector: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub membership_type: MembershipType,
    /// argon2id PHC string
    pub password_hash: String,
    pub password_changed_at: DateTime<Utc>,
    /// NULL for rows written before review began; read through `status()`.
    pub verification_status: Option<VerificationStatus>,
    pub verification_reason: Option<String>,
    pub receipt_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validated registration ready for insertion.
#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct NewMember {
    pub name: String,
    pub business_name: String,
    pub email: String,
    pub username: String,
    #[builder(default)]
    pub phone: Option<String>,
    #[builder(default)]
    pub sector: Option<String>,
    #[builder(default)]
    pub address: Option<String>,
    #[builder(default)]
    pub website: Option<String>,
    #[builder(default)]
    pub membership_type: MembershipType,
    pub password_hash: String,
}

/// Listing filter for the admin member table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberFilter {
    pub status: Option<VerificationStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl MemberFilter {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 200;

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Registration counts per verification status.
#[derive(sqlx::FromRow, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationStats {
    pub total: i64,
    pub pending: i64,
    pub verified: i64,
    pub rejected: i64,
}

impl Member {
    /// Effective verification status; a missing value means pending.
    pub fn status(&self) -> VerificationStatus {
        self.verification_status.unwrap_or_default()
    }

    /// Carried in member session tokens; changes with every password change.
    pub fn password_epoch(&self) -> i64 {
        self.password_changed_at.timestamp_micros()
    }

    pub fn from_new(id: MemberId, new: NewMember, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            business_name: new.business_name,
            email: new.email,
            username: new.username,
            phone: new.phone,
            sector: new.sector,
            address: new.address,
            website: new.website,
            membership_type: new.membership_type,
            password_hash: new.password_hash,
            password_changed_at: created_at,
            verification_status: Some(VerificationStatus::Pending),
            verification_reason: None,
            receipt_ref: None,
            created_at,
        }
    }
}

// =============================================================================
// SQL Queries
// =============================================================================

impl Member {
    pub async fn find_by_id(id: MemberId, pool: &PgPool) -> AppResult<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM registrations WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_all_by_email(email: &str, pool: &PgPool) -> AppResult<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM registrations WHERE email = $1")
            .bind(email)
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_all_by_username(username: &str, pool: &PgPool) -> AppResult<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM registrations WHERE username = $1")
            .bind(username)
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_all_by_phone_or_email(
        identifier: &str,
        pool: &PgPool,
    ) -> AppResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM registrations WHERE phone = $1 OR email = lower($1)",
        )
        .bind(identifier)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Insert a new registration. Unique violations surface as
    /// `AppError::Conflict` naming the clashing field.
    pub async fn insert(id: MemberId, new: &NewMember, pool: &PgPool) -> AppResult<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO registrations (
                id, name, business_name, email, username, phone,
                sector, address, website, membership_type, password_hash
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&new.name)
        .bind(&new.business_name)
        .bind(&new.email)
        .bind(&new.username)
        .bind(&new.phone)
        .bind(&new.sector)
        .bind(&new.address)
        .bind(&new.website)
        .bind(new.membership_type)
        .bind(&new.password_hash)
        .fetch_one(pool)
        .await
        .map_err(map_registration_conflict)
    }

    /// Returns false when no row matched.
    pub async fn update_password(
        id: MemberId,
        password_hash: &str,
        pool: &PgPool,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE registrations
             SET password_hash = $2, password_changed_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Status update and dashboard message share one transaction; no row
    /// updated means nothing is written.
    pub async fn record_decision(
        id: MemberId,
        status: VerificationStatus,
        reason: Option<&str>,
        message: &MemberMessage,
        pool: &PgPool,
    ) -> AppResult<bool> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            "UPDATE registrations
             SET verification_status = $2, verification_reason = $3
             WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(reason)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        message.insert(&mut *tx).await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Attach a membership receipt and put the member back into review.
    pub async fn set_receipt_ref(id: MemberId, receipt_ref: &str, pool: &PgPool) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE registrations
             SET receipt_ref = $2, verification_status = 'pending'
             WHERE id = $1",
        )
        .bind(id)
        .bind(receipt_ref)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list(filter: &MemberFilter, pool: &PgPool) -> AppResult<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM registrations
             WHERE $1::verification_status IS NULL
                OR COALESCE(verification_status, 'pending') = $1
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(filter.status)
        .bind(filter.limit())
        .bind(filter.offset())
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn stats(pool: &PgPool) -> AppResult<RegistrationStats> {
        sqlx::query_as::<_, RegistrationStats>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE COALESCE(verification_status, 'pending') = 'pending') AS pending,
                COUNT(*) FILTER (WHERE verification_status = 'verified') AS verified,
                COUNT(*) FILTER (WHERE verification_status = 'rejected') AS rejected
            FROM registrations
            "#,
        )
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }
}

/// Map a unique-constraint violation on `registrations` to `Conflict`.
pub fn map_registration_conflict(err: sqlx::Error) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.code().as_deref() == Some("23505") {
            return match db_err.constraint() {
                Some(c) if c.contains("username") => AppError::Conflict("Username"),
                Some(c) if c.contains("phone") => AppError::Conflict("Phone number"),
                _ => AppError::Conflict("Email address"),
            };
        }
    }
    AppError::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(status: Option<VerificationStatus>) -> Member {
        Member {
            id: MemberId::new(),
            name: "Abebe Kebede".to_string(),
            business_name: "Kebede Trading".to_string(),
            email: "abebe@example.com".to_string(),
            username: "abebe".to_string(),
            phone: Some("+251911000000".to_string()),
            sector: Some("Trade".to_string()),
            address: None,
            website: None,
            membership_type: MembershipType::Premium,
            password_hash: "$argon2id$placeholder".to_string(),
            password_changed_at: Utc::now(),
            verification_status: status,
            verification_reason: None,
            receipt_ref: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_missing_status_reads_as_pending() {
        assert_eq!(member(None).status(), VerificationStatus::Pending);
        assert_eq!(
            member(Some(VerificationStatus::Rejected)).status(),
            VerificationStatus::Rejected
        );
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(
            "Verified".parse::<VerificationStatus>().unwrap(),
            VerificationStatus::Verified
        );
        assert!(matches!(
            "approved".parse::<VerificationStatus>(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_membership_type_serde() {
        let json = serde_json::to_string(&MembershipType::Corporate).unwrap();
        assert_eq!(json, "\"corporate\"");
        assert_eq!("premium".parse::<MembershipType>().unwrap(), MembershipType::Premium);
    }

    #[test]
    fn test_filter_limits_are_clamped() {
        let filter = MemberFilter {
            status: None,
            limit: Some(10_000),
            offset: Some(-5),
        };
        assert_eq!(filter.limit(), MemberFilter::MAX_LIMIT);
        assert_eq!(filter.offset(), 0);
    }

    #[test]
    fn test_from_new_starts_pending() {
        let new = NewMember::builder()
            .name("A")
            .business_name("B")
            .email("a@x.com")
            .username("a1")
            .password_hash("hash")
            .build();
        let m = Member::from_new(MemberId::new(), new, Utc::now());
        assert_eq!(m.status(), VerificationStatus::Pending);
        assert_eq!(m.membership_type, MembershipType::Basic);
    }
}
