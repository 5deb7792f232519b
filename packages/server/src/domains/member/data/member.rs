use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::MemberId;
use crate::domains::member::models::{
    Member as MemberModel, MemberMessage, MembershipType, VerificationStatus,
};
use crate::domains::receipts::models::ReceiptUpload;

/// Public representation of a member. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberData {
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
    pub verification_status: VerificationStatus,
    pub verification_reason: Option<String>,
    pub receipt_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<MemberModel> for MemberData {
    fn from(member: MemberModel) -> Self {
        Self {
            verification_status: member.status(),
            id: member.id,
            name: member.name,
            business_name: member.business_name,
            email: member.email,
            username: member.username,
            phone: member.phone,
            sector: member.sector,
            address: member.address,
            website: member.website,
            membership_type: member.membership_type,
            verification_reason: member.verification_reason,
            receipt_ref: member.receipt_ref,
            created_at: member.created_at,
        }
    }
}

/// What the member sees about their review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub status: VerificationStatus,
    pub reason: Option<String>,
}

impl StatusView {
    pub fn of(member: &MemberModel) -> Self {
        Self {
            status: member.status(),
            reason: member.verification_reason.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberDashboard {
    pub member: MemberData,
    pub status: StatusView,
    pub receipts: Vec<ReceiptUpload>,
    pub messages: Vec<MemberMessage>,
}

/// Registration form as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationInput {
    pub name: String,
    pub business_name: String,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub membership_type: MembershipType,
    pub password: String,
    pub confirm_password: String,
}

/// Returned once to the admin who reset a member's password.
#[derive(Debug, Clone, Serialize)]
pub struct PasswordResetResult {
    pub member_id: MemberId,
    pub email: String,
    pub password: String,
}
