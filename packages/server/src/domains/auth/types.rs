//! Auth domain data types
//!
//! Serializable values returned by auth activities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{AdminId, ChallengeId, MemberId};
use crate::domains::auth::models::OtpPurpose;
use crate::domains::member::data::MemberData;

/// Reference to an issued challenge. Never carries the code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeHandle {
    pub challenge_id: ChallengeId,
    pub purpose: OtpPurpose,
    pub expires_at: DateTime<Utc>,
}

/// Proof that a member passed the `receipt_upload` code check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OtpGate {
    pub challenge_id: ChallengeId,
    pub member_id: MemberId,
    pub verified_at: DateTime<Utc>,
}

/// Signed form of an `OtpGate` handed to HTTP clients.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptGrant {
    pub grant: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of a successful member login (password or OTP)
#[derive(Debug, Clone, Serialize)]
pub struct MemberSession {
    pub token: String,
    pub member: MemberData,
}

/// Body of the admin authentication endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AdminAuthRequest {
    Login { email: String, password: String },
    Verify { token: String },
    Logout { token: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminUserView {
    pub id: AdminId,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminAuthResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<AdminUserView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_request_parses_by_action() {
        let login: AdminAuthRequest = serde_json::from_str(
            r#"{"action":"login","email":"admin@x.com","password":"pw123456"}"#,
        )
        .unwrap();
        assert!(matches!(login, AdminAuthRequest::Login { ref email, .. } if email == "admin@x.com"));

        let verify: AdminAuthRequest =
            serde_json::from_str(r#"{"action":"verify","token":"abc"}"#).unwrap();
        assert!(matches!(verify, AdminAuthRequest::Verify { ref token } if token == "abc"));
    }

    #[test]
    fn test_unknown_action_fails_to_parse() {
        let result: Result<AdminAuthRequest, _> =
            serde_json::from_str(r#"{"action":"delete","token":"abc"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_logout_response_omits_user_and_token() {
        let response = AdminAuthResponse {
            success: true,
            user: None,
            token: None,
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({"success": true})
        );
    }
}
