//! Receipt submission

use chrono::Utc;
use tracing::{info, warn};

use crate::common::{AppError, AppResult, MemberId, ReceiptId};
use crate::domains::auth::types::OtpGate;
use crate::domains::member::models::VerificationStatus;
use crate::domains::receipts::models::{ReceiptSubmission, ReceiptUpload};
use crate::kernel::{ServerDeps, RECEIPTS_BUCKET};

/// Store a receipt file and its metadata.
///
/// Order: validate the file and bank, check the gate, check the member,
/// upload the blob, insert metadata. Nothing is written until validation
/// and the gate pass. A failed insert removes the blob on a best-effort
/// basis.
pub async fn submit_receipt(
    member_id: MemberId,
    submission: ReceiptSubmission,
    gate: &OtpGate,
    deps: &ServerDeps,
) -> AppResult<ReceiptUpload> {
    let bank = submission.validate()?;

    check_gate(member_id, gate, deps).await?;

    if deps.members.find_by_id(member_id).await?.is_none() {
        return Err(AppError::NotFound("Member"));
    }

    let id = ReceiptId::new();
    let now = Utc::now();
    let scope = submission
        .event_id
        .map(|event_id| event_id.to_string())
        .unwrap_or_else(|| "membership".to_string());
    let file_ref = format!(
        "{}_{}_{}_{}.{}",
        member_id,
        scope,
        now.timestamp_millis(),
        id,
        submission.file.extension()
    );

    deps.blobs
        .upload(
            RECEIPTS_BUCKET,
            &file_ref,
            &submission.file.bytes,
            &submission.file.content_type,
        )
        .await?;

    let receipt = ReceiptUpload {
        id,
        member_id,
        event_id: submission.event_id,
        bank_label: bank.label().to_string(),
        file_ref: file_ref.clone(),
        content_type: submission.file.content_type.to_ascii_lowercase(),
        status: VerificationStatus::Pending,
        gate_id: gate.challenge_id,
        created_at: now,
    };

    let stored = match deps.receipts.insert_receipt(&receipt).await {
        Ok(stored) => stored,
        Err(e) => {
            if let Err(cleanup) = deps.blobs.remove(RECEIPTS_BUCKET, &file_ref).await {
                warn!(%file_ref, error = %cleanup, "failed to remove orphaned receipt file");
            }
            return Err(e);
        }
    };

    if stored.event_id.is_none() {
        deps.members.set_receipt_ref(member_id, &file_ref).await?;
    }

    info!(
        %member_id,
        receipt_id = %stored.id,
        bank = bank.label(),
        size = submission.file.size(),
        "receipt uploaded"
    );
    Ok(stored)
}

/// The gate must belong to this member, be fresh, and be unused.
async fn check_gate(member_id: MemberId, gate: &OtpGate, deps: &ServerDeps) -> AppResult<()> {
    if gate.member_id != member_id {
        return Err(AppError::Rejected);
    }
    if Utc::now() > gate.verified_at + deps.otp_policy.gate_ttl {
        return Err(AppError::Rejected);
    }
    if deps.receipts.gate_used(gate.challenge_id).await? {
        return Err(AppError::Rejected);
    }
    Ok(())
}
