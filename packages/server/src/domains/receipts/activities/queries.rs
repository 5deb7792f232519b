use crate::common::{Actor, AdminCapability, AppError, AppResult, MemberId, ReceiptId};
use crate::domains::member::models::VerificationStatus;
use crate::domains::receipts::models::ReceiptUpload;
use crate::kernel::{ServerDeps, RECEIPTS_BUCKET};

/// Receipt file as stored, for admin download.
#[derive(Debug, Clone)]
pub struct ReceiptFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub async fn list_member_receipts(
    member_id: MemberId,
    deps: &ServerDeps,
) -> AppResult<Vec<ReceiptUpload>> {
    deps.receipts.receipts_for_member(member_id).await
}

pub async fn list_receipts_for_review(
    actor: Actor,
    status: Option<VerificationStatus>,
    deps: &ServerDeps,
) -> AppResult<Vec<ReceiptUpload>> {
    actor
        .can(AdminCapability::ReviewReceipts)
        .check(deps)
        .await?;
    deps.receipts.receipts_by_status(status).await
}

pub async fn download_receipt(
    actor: Actor,
    receipt_id: ReceiptId,
    deps: &ServerDeps,
) -> AppResult<ReceiptFile> {
    actor
        .can(AdminCapability::ReviewReceipts)
        .check(deps)
        .await?;

    let receipt = deps
        .receipts
        .find_receipt(receipt_id)
        .await?
        .ok_or(AppError::NotFound("Receipt"))?;

    let bytes = deps.blobs.download(RECEIPTS_BUCKET, &receipt.file_ref).await?;

    Ok(ReceiptFile {
        file_name: receipt.file_ref,
        content_type: receipt.content_type,
        bytes,
    })
}
