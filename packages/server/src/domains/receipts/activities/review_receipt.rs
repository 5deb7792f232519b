use tracing::{debug, info};

use crate::common::{Actor, AdminCapability, AppError, AppResult, ReceiptId};
use crate::domains::member::models::VerificationStatus;
use crate::domains::receipts::models::ReceiptUpload;
use crate::kernel::ServerDeps;

/// Set a receipt's review status. Re-applying the current status is a no-op.
pub async fn review_receipt(
    actor: Actor,
    receipt_id: ReceiptId,
    status: VerificationStatus,
    deps: &ServerDeps,
) -> AppResult<ReceiptUpload> {
    actor
        .can(AdminCapability::ReviewReceipts)
        .check(deps)
        .await?;

    let mut receipt = deps
        .receipts
        .find_receipt(receipt_id)
        .await?
        .ok_or(AppError::NotFound("Receipt"))?;

    if receipt.status == status {
        debug!(%receipt_id, %status, "receipt review already applied");
        return Ok(receipt);
    }

    deps.receipts.update_receipt_status(receipt_id, status).await?;
    info!(%receipt_id, from = %receipt.status, to = %status, "receipt reviewed");

    receipt.status = status;
    Ok(receipt)
}
