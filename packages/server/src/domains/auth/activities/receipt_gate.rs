//! One-time gate in front of receipt uploads

use tracing::{debug, info};

use crate::common::{AppError, AppResult, ChallengeId, MemberId};
use crate::domains::auth::activities::otp::{issue_challenge, verify_challenge_for};
use crate::domains::auth::models::OtpPurpose;
use crate::domains::auth::types::{ChallengeHandle, OtpGate, ReceiptGrant};
use crate::domains::member::models::Member;
use crate::kernel::ServerDeps;

async fn member_with_phone(member_id: MemberId, deps: &ServerDeps) -> AppResult<(Member, String)> {
    let member = deps
        .members
        .find_by_id(member_id)
        .await?
        .ok_or(AppError::NotFound("Member"))?;
    let phone = member.phone.clone().ok_or_else(|| {
        AppError::validation("Add a phone number to your profile before uploading receipts.")
    })?;
    Ok((member, phone))
}

/// Text a `receipt_upload` code to the member's phone.
pub async fn start_receipt_gate(member_id: MemberId, deps: &ServerDeps) -> AppResult<ChallengeHandle> {
    let (_, phone) = member_with_phone(member_id, deps).await?;
    issue_challenge(&phone, OtpPurpose::ReceiptUpload, deps).await
}

/// Verify the code; only challenges sent to this member's phone count.
pub async fn verify_receipt_gate(
    member_id: MemberId,
    challenge_id: ChallengeId,
    code: &str,
    deps: &ServerDeps,
) -> AppResult<OtpGate> {
    let (member, phone) = member_with_phone(member_id, deps).await?;
    let challenge = verify_challenge_for(
        challenge_id,
        OtpPurpose::ReceiptUpload,
        Some(&phone),
        code,
        deps,
    )
    .await?;

    let gate = OtpGate {
        challenge_id: challenge.id,
        member_id: member.id,
        verified_at: challenge.consumed_at.unwrap_or(challenge.issued_at),
    };
    info!(%member_id, %challenge_id, "receipt upload gate opened");
    Ok(gate)
}

/// Sign a gate for clients that upload in a separate request.
pub fn issue_receipt_grant(gate: &OtpGate, deps: &ServerDeps) -> AppResult<ReceiptGrant> {
    let ttl = deps.otp_policy.gate_ttl;
    let grant = deps.jwt_service.create_grant(gate, ttl)?;
    Ok(ReceiptGrant {
        grant,
        expires_at: gate.verified_at + ttl,
    })
}

/// Decode a signed grant. Any problem with it reads as `Rejected`.
pub fn read_receipt_grant(token: &str, deps: &ServerDeps) -> AppResult<OtpGate> {
    deps.jwt_service
        .verify_grant(token)
        .ok()
        .and_then(|claims| claims.into_gate())
        .ok_or_else(|| {
            debug!("receipt grant rejected");
            AppError::Rejected
        })
}
