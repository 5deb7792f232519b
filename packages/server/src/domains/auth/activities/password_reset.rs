//! Self-service password reset gated by a code sent to the member's phone

use tracing::info;

use crate::common::utils::normalize_phone;
use crate::common::{AppResult, ChallengeId};
use crate::domains::auth::activities::otp::{challenge_owner, issue_challenge, verify_challenge_for};
use crate::domains::auth::models::OtpPurpose;
use crate::domains::auth::password::{hash_password, validate_new_password};
use crate::domains::auth::types::ChallengeHandle;
use crate::kernel::ServerDeps;

pub async fn start_password_reset(
    phone_number: &str,
    deps: &ServerDeps,
) -> AppResult<ChallengeHandle> {
    let phone = normalize_phone(phone_number);
    // NotFound when no member owns the number
    deps.members.find_by_phone_or_email(&phone).await?;

    issue_challenge(&phone, OtpPurpose::PasswordReset, deps).await
}

/// The new password is validated before the code is spent, so a typo in
/// the confirmation does not burn the code.
pub async fn complete_password_reset(
    challenge_id: ChallengeId,
    code: &str,
    new_password: &str,
    confirm_password: &str,
    deps: &ServerDeps,
) -> AppResult<()> {
    validate_new_password(new_password, confirm_password)?;
    let password_hash = hash_password(new_password).await?;

    let (member, phone) = challenge_owner(challenge_id, OtpPurpose::PasswordReset, deps).await?;
    verify_challenge_for(challenge_id, OtpPurpose::PasswordReset, Some(&phone), code, deps)
        .await?;

    deps.members.update_password(member.id, &password_hash).await?;

    info!(member_id = %member.id, "password reset with OTP");
    Ok(())
}
