//! OTP Challenge Issuer: issue, resend and verify one-time codes.

use chrono::Utc;
use tracing::{debug, error, info};

use crate::common::utils::{hash_otp_code, is_valid_phone, mask_phone, normalize_phone};
use crate::common::{AppError, AppResult, ChallengeId};
use crate::domains::auth::machines::{generate_code, is_well_formed_code, VerifyDecision};
use crate::domains::auth::models::{OtpChallenge, OtpPurpose};
use crate::domains::auth::types::ChallengeHandle;
use crate::domains::member::models::Member;
use crate::kernel::ServerDeps;

/// Send a fresh 6-digit code to `phone_number`.
///
/// Delivery happens before anything is stored: a delivery failure leaves no
/// challenge behind. On success earlier open challenges for the same phone
/// and purpose are invalidated.
pub async fn issue_challenge(
    phone_number: &str,
    purpose: OtpPurpose,
    deps: &ServerDeps,
) -> AppResult<ChallengeHandle> {
    let phone = normalize_phone(phone_number);
    if !is_valid_phone(&phone) {
        return Err(AppError::validation(
            "Phone number must be in international format, e.g. +251911000000.",
        ));
    }

    let policy = deps.otp_policy;
    let code = generate_code();
    let id = ChallengeId::new();
    let body = purpose.message_body(&code, policy.ttl.num_minutes().max(1));

    if let Err(e) = deps.messaging.send_sms(&phone, &body).await {
        error!(phone = %mask_phone(&phone), %purpose, error = %e, "OTP delivery failed");
        return Err(AppError::Delivery(e.to_string()));
    }

    let now = Utc::now();
    let challenge = OtpChallenge {
        id,
        phone_number: phone,
        purpose,
        code_hash: hash_otp_code(id.as_uuid(), &code),
        attempts: 0,
        issued_at: now,
        expires_at: now + policy.ttl,
        consumed_at: None,
        invalidated_at: None,
    };
    deps.otp_store.replace_open_challenge(&challenge).await?;

    info!(
        challenge_id = %id,
        phone = %mask_phone(&challenge.phone_number),
        %purpose,
        "OTP challenge issued"
    );

    Ok(ChallengeHandle {
        challenge_id: id,
        purpose,
        expires_at: challenge.expires_at,
    })
}

/// Replace the latest challenge for (phone, purpose) with a new one.
///
/// Only reissues: there must be an earlier challenge for the pair, and it
/// must be older than the resend cooldown.
pub async fn resend_challenge(
    phone_number: &str,
    purpose: OtpPurpose,
    deps: &ServerDeps,
) -> AppResult<ChallengeHandle> {
    let phone = normalize_phone(phone_number);
    let latest = deps
        .otp_store
        .latest_challenge(&phone, purpose)
        .await?
        .ok_or(AppError::NotFound("Verification request"))?;

    let ready_at = latest.issued_at + deps.otp_policy.resend_cooldown;
    let now = Utc::now();
    if now < ready_at {
        let wait = (ready_at - now).num_seconds().max(1);
        return Err(AppError::validation(format!(
            "Please wait {wait} seconds before requesting a new code."
        )));
    }

    issue_challenge(&phone, purpose, deps).await
}

/// Verify `code` against the challenge behind `handle`.
///
/// Success consumes the challenge; any later attempt is `Rejected`.
pub async fn verify_challenge(
    handle: &ChallengeHandle,
    code: &str,
    deps: &ServerDeps,
) -> AppResult<OtpChallenge> {
    verify_challenge_for(handle.challenge_id, handle.purpose, None, code, deps).await
}

/// Resolve the member whose phone received the challenge, without spending
/// the code. Unknown or mismatched challenges are `Rejected`.
pub(crate) async fn challenge_owner(
    challenge_id: ChallengeId,
    purpose: OtpPurpose,
    deps: &ServerDeps,
) -> AppResult<(Member, String)> {
    let challenge = deps
        .otp_store
        .find_challenge(challenge_id)
        .await?
        .filter(|c| c.purpose == purpose)
        .ok_or(AppError::Rejected)?;

    let member = deps
        .members
        .find_by_phone_or_email(&challenge.phone_number)
        .await?;
    Ok((member, challenge.phone_number))
}

/// Verify a challenge that must have been issued for `purpose` and, when
/// given, to `phone_number`. Mismatches are rejected without touching the
/// challenge.
pub(crate) async fn verify_challenge_for(
    challenge_id: ChallengeId,
    purpose: OtpPurpose,
    phone_number: Option<&str>,
    code: &str,
    deps: &ServerDeps,
) -> AppResult<OtpChallenge> {
    let code = code.trim();
    if !is_well_formed_code(code) {
        debug!(%challenge_id, "malformed verification code");
        return Err(AppError::Rejected);
    }

    let Some(mut challenge) = deps.otp_store.find_challenge(challenge_id).await? else {
        debug!(%challenge_id, "unknown challenge");
        return Err(AppError::Rejected);
    };

    if challenge.purpose != purpose
        || phone_number.is_some_and(|phone| phone != challenge.phone_number)
    {
        debug!(%challenge_id, "challenge presented for the wrong purpose or phone");
        return Err(AppError::Rejected);
    }

    let max_attempts = deps.otp_policy.max_attempts;
    let now = Utc::now();

    match challenge.decide(code, now, max_attempts) {
        VerifyDecision::Consume => {
            if !deps
                .otp_store
                .consume_challenge(challenge_id, now, max_attempts)
                .await?
            {
                debug!(%challenge_id, "challenge consumed concurrently");
                return Err(AppError::Rejected);
            }
            challenge.consumed_at = Some(now);
            info!(%challenge_id, %purpose, "OTP challenge verified");
            Ok(challenge)
        }
        VerifyDecision::WrongCode => {
            deps.otp_store.record_failed_attempt(challenge_id).await?;
            debug!(%challenge_id, attempts = challenge.attempts + 1, "wrong verification code");
            Err(AppError::Rejected)
        }
        VerifyDecision::Closed(state) => {
            debug!(%challenge_id, ?state, "challenge no longer verifiable");
            Err(AppError::Rejected)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OtpPolicy;
    use crate::kernel::TestDependencies;
    use chrono::Duration;

    const PHONE: &str = "+251911000000";

    #[tokio::test]
    async fn test_issue_never_returns_code_and_sends_sms() {
        let test = TestDependencies::new();
        let handle = issue_challenge(PHONE, OtpPurpose::Login, &test.server_deps())
            .await
            .unwrap();

        assert_eq!(handle.purpose, OtpPurpose::Login);
        let code = test.messaging.last_code_for(PHONE).unwrap();
        let stored = &test.store.challenges()[0];
        assert_ne!(stored.code_hash, code);
        assert_eq!(stored.id, handle.challenge_id);
    }

    #[tokio::test]
    async fn test_delivery_failure_stores_nothing() {
        let test = TestDependencies::new();
        test.messaging.fail_with(Some("carrier down"));

        let err = issue_challenge(PHONE, OtpPurpose::Login, &test.server_deps())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Delivery(_)));
        assert!(test.store.challenges().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_phone_rejected_before_sending() {
        let test = TestDependencies::new();
        let err = issue_challenge("0911", OtpPurpose::Login, &test.server_deps())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(test.messaging.sent().is_empty());
    }

    #[tokio::test]
    async fn test_verify_then_replay_fails() {
        let test = TestDependencies::new();
        let deps = test.server_deps();
        let handle = issue_challenge(PHONE, OtpPurpose::Login, &deps).await.unwrap();
        let code = test.messaging.last_code_for(PHONE).unwrap();

        verify_challenge(&handle, &code, &deps).await.unwrap();
        let replay = verify_challenge(&handle, &code, &deps).await.unwrap_err();
        assert!(matches!(replay, AppError::Rejected));
    }

    #[tokio::test]
    async fn test_expired_code_rejected() {
        let test = TestDependencies::new();
        let deps = test.server_deps();
        let handle = issue_challenge(PHONE, OtpPurpose::Login, &deps).await.unwrap();
        let code = test.messaging.last_code_for(PHONE).unwrap();

        let mut challenge = test.store.challenges()[0].clone();
        challenge.expires_at = Utc::now() - Duration::seconds(1);
        test.store.put_challenge(challenge);

        let err = verify_challenge(&handle, &code, &deps).await.unwrap_err();
        assert!(matches!(err, AppError::Rejected));
    }

    #[tokio::test]
    async fn test_attempts_are_capped() {
        let test = TestDependencies::new().with_otp_policy(OtpPolicy {
            max_attempts: 2,
            ..OtpPolicy::default()
        });
        let deps = test.server_deps();
        let handle = issue_challenge(PHONE, OtpPurpose::Login, &deps).await.unwrap();
        let code = test.messaging.last_code_for(PHONE).unwrap();
        let wrong = if code == "000000" { "111111" } else { "000000" };

        for _ in 0..2 {
            assert!(verify_challenge(&handle, wrong, &deps).await.is_err());
        }
        let err = verify_challenge(&handle, &code, &deps).await.unwrap_err();
        assert!(matches!(err, AppError::Rejected));
    }

    #[tokio::test]
    async fn test_wrong_purpose_does_not_consume() {
        let test = TestDependencies::new();
        let deps = test.server_deps();
        let handle = issue_challenge(PHONE, OtpPurpose::Login, &deps).await.unwrap();
        let code = test.messaging.last_code_for(PHONE).unwrap();

        let forged = ChallengeHandle {
            purpose: OtpPurpose::PasswordReset,
            ..handle.clone()
        };
        assert!(verify_challenge(&forged, &code, &deps).await.is_err());
        assert!(verify_challenge(&handle, &code, &deps).await.is_ok());
    }

    #[tokio::test]
    async fn test_resend_respects_cooldown() {
        let test = TestDependencies::new();
        let deps = test.server_deps();
        issue_challenge(PHONE, OtpPurpose::Login, &deps).await.unwrap();

        let err = resend_challenge(PHONE, OtpPurpose::Login, &deps)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_resend_invalidates_previous_code() {
        let test = TestDependencies::new().with_otp_policy(OtpPolicy {
            resend_cooldown: Duration::zero(),
            ..OtpPolicy::default()
        });
        let deps = test.server_deps();
        let first = issue_challenge(PHONE, OtpPurpose::Login, &deps).await.unwrap();
        let first_code = test.messaging.last_code_for(PHONE).unwrap();

        let second = resend_challenge(PHONE, OtpPurpose::Login, &deps).await.unwrap();
        let second_code = test.messaging.last_code_for(PHONE).unwrap();

        assert!(verify_challenge(&first, &first_code, &deps).await.is_err());
        assert!(verify_challenge(&second, &second_code, &deps).await.is_ok());
    }

    #[tokio::test]
    async fn test_resend_without_prior_challenge() {
        let test = TestDependencies::new();
        let err = resend_challenge(PHONE, OtpPurpose::Login, &test.server_deps())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
