//! Receipts domain - proof-of-payment uploads and their admin review

pub mod activities;
pub mod models;

pub use models::{Bank, ReceiptUpload, BANKS};
