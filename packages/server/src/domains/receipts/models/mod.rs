pub mod bank;
pub mod receipt_upload;
pub mod upload;

pub use bank::{Bank, BANKS};
pub use receipt_upload::ReceiptUpload;
pub use upload::{ReceiptReview, ReceiptSubmission, UploadedFile, MAX_RECEIPT_BYTES};
