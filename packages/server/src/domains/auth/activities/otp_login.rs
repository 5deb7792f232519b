//! Passwordless login with a code sent to the member's phone

use tracing::info;

use crate::common::utils::{normalize_email, normalize_phone};
use crate::common::{AppError, AppResult, ChallengeId};
use crate::domains::auth::activities::login::member_session;
use crate::domains::auth::activities::otp::{challenge_owner, issue_challenge, verify_challenge_for};
use crate::domains::auth::models::OtpPurpose;
use crate::domains::auth::types::{ChallengeHandle, MemberSession};
use crate::kernel::ServerDeps;

/// Find the member by phone or email and text a `login` code to their phone.
pub async fn start_otp_login(identifier: &str, deps: &ServerDeps) -> AppResult<ChallengeHandle> {
    let identifier = identifier.trim();
    let lookup = if identifier.contains('@') {
        normalize_email(identifier)
    } else {
        normalize_phone(identifier)
    };

    let member = deps.members.find_by_phone_or_email(&lookup).await?;
    let phone = member.phone.ok_or_else(|| {
        AppError::validation("No phone number is registered for this account.")
    })?;

    issue_challenge(&phone, OtpPurpose::Login, deps).await
}

/// The member is resolved before the code is spent; a failed lookup leaves
/// the challenge open.
pub async fn complete_otp_login(
    challenge_id: ChallengeId,
    code: &str,
    deps: &ServerDeps,
) -> AppResult<MemberSession> {
    let (member, phone) = challenge_owner(challenge_id, OtpPurpose::Login, deps).await?;
    verify_challenge_for(challenge_id, OtpPurpose::Login, Some(&phone), code, deps).await?;

    info!(member_id = %member.id, "member logged in with OTP");
    member_session(member, deps)
}
