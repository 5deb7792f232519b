//! Receipt domain activities

mod queries;
mod review_receipt;
mod submit_receipt;

pub use queries::{download_receipt, list_member_receipts, list_receipts_for_review, ReceiptFile};
pub use review_receipt::review_receipt;
pub use submit_receipt::submit_receipt;
