use anyhow::Result;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{AdminId, ChallengeId, MemberId};
use crate::domains::auth::types::OtpGate;

/// Who a session token was issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRole {
    Member,
    Admin,
}

/// JWT Claims - data stored in a session token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,      // Subject (member or admin id)
    pub role: SessionRole,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub jti: String,      // Unique token id, used for revocation
    /// Password epoch of a member session; stale once the password changes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pwd: Option<i64>,
}

impl Claims {
    pub fn member_id(&self) -> Option<MemberId> {
        match self.role {
            SessionRole::Member => MemberId::parse(&self.sub).ok(),
            SessionRole::Admin => None,
        }
    }

    pub fn admin_id(&self) -> Option<AdminId> {
        match self.role {
            SessionRole::Admin => AdminId::parse(&self.sub).ok(),
            SessionRole::Member => None,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

/// Claims of a receipt-upload grant, issued after a `receipt_upload` code
/// has been verified.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GrantClaims {
    pub sub: String, // member id
    pub gate: Uuid,  // consumed challenge id
    pub verified_at: i64,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

impl GrantClaims {
    pub fn into_gate(self) -> Option<OtpGate> {
        Some(OtpGate {
            challenge_id: ChallengeId::from_uuid(self.gate),
            member_id: MemberId::parse(&self.sub).ok()?,
            verified_at: DateTime::from_timestamp(self.verified_at, 0)?,
        })
    }
}

/// JWT Service - creates and verifies session and grant tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    pub fn new(secret: &str, issuer: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    /// Create a session token. Tokens expire after 24 hours.
    pub fn create_token(&self, subject: Uuid, role: SessionRole, email: String) -> Result<String> {
        self.issue(subject, role, email, None)
    }

    /// Member session bound to the member's current password epoch.
    pub fn create_member_token(
        &self,
        member_id: MemberId,
        email: String,
        password_epoch: i64,
    ) -> Result<String> {
        self.issue(
            member_id.into_uuid(),
            SessionRole::Member,
            email,
            Some(password_epoch),
        )
    }

    fn issue(
        &self,
        subject: Uuid,
        role: SessionRole,
        email: String,
        pwd: Option<i64>,
    ) -> Result<String> {
        let now = Utc::now();
        let exp = now + chrono::Duration::hours(24);

        let claims = Claims {
            sub: subject.to_string(),
            role,
            email,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
            pwd,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify and decode a session token
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation())
            .map(|data| data.claims)
            .map_err(Into::into)
    }

    pub fn create_grant(&self, gate: &OtpGate, ttl: chrono::Duration) -> Result<String> {
        let now = Utc::now();
        let claims = GrantClaims {
            sub: gate.member_id.to_string(),
            gate: gate.challenge_id.into_uuid(),
            verified_at: gate.verified_at.timestamp(),
            exp: (gate.verified_at + ttl).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    pub fn verify_grant(&self, token: &str) -> Result<GrantClaims> {
        decode::<GrantClaims>(token, &self.decoding_key, &self.validation())
            .map(|data| data.claims)
            .map_err(Into::into)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);
        validation
    }
}
