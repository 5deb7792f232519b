use serde::Deserialize;

use crate::common::{AppError, AppResult, EventId};
use crate::domains::receipts::models::Bank;

/// Largest accepted receipt file (5 MiB).
pub const MAX_RECEIPT_BYTES: usize = 5 * 1024 * 1024;

pub const ALLOWED_CONTENT_TYPES: [&str; 4] =
    ["application/pdf", "image/jpeg", "image/jpg", "image/png"];

/// A file received from the member, held in memory until stored.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Fall back to the file extension when the client sent no type.
    pub fn with_guessed_type(
        file_name: impl Into<String>,
        declared_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Self {
        let file_name = file_name.into();
        let content_type = match declared_type.map(str::trim).filter(|t| !t.is_empty()) {
            Some(declared) => declared.to_string(),
            None => mime_guess::from_path(&file_name)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
        };
        Self::new(file_name, content_type, bytes)
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Type and size checks; runs before anything is written.
    pub fn validate(&self) -> AppResult<()> {
        let content_type = self.content_type.to_ascii_lowercase();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(AppError::validation("Please upload a PDF, JPG, or PNG file."));
        }
        if self.bytes.is_empty() {
            return Err(AppError::validation("The uploaded file is empty."));
        }
        if self.size() > MAX_RECEIPT_BYTES {
            return Err(AppError::validation("File size must be less than 5MB."));
        }
        Ok(())
    }

    /// Storage extension derived from the declared type, not the client name.
    pub fn extension(&self) -> &'static str {
        match self.content_type.to_ascii_lowercase().as_str() {
            "application/pdf" => "pdf",
            "image/png" => "png",
            _ => "jpg",
        }
    }
}

/// Everything a member submits alongside the receipt file.
#[derive(Debug, Clone)]
pub struct ReceiptSubmission {
    pub event_id: Option<EventId>,
    pub bank_label: String,
    pub file: UploadedFile,
}

impl ReceiptSubmission {
    /// File checks, then the bank label. Nothing else is consulted.
    pub fn validate(&self) -> AppResult<Bank> {
        self.file.validate()?;
        Bank::from_label(&self.bank_label)
    }
}

/// Admin review decision for a single receipt.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptReview {
    pub status: crate::domains::member::models::VerificationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_type_guessed_from_name() {
        let file = UploadedFile::with_guessed_type("receipt.PDF", None, vec![1]);
        assert_eq!(file.content_type, "application/pdf");
        assert!(file.validate().is_ok());

        let unknown = UploadedFile::with_guessed_type("receipt.docx", Some(" "), vec![1]);
        assert!(unknown.validate().is_err());
    }

    #[test]
    fn test_accepts_png_under_limit() {
        let file = UploadedFile::new("r.png", "image/png", vec![1; 1024]);
        assert!(file.validate().is_ok());
        assert_eq!(file.extension(), "png");
    }

    #[test]
    fn test_rejects_six_megabytes() {
        let file = UploadedFile::new("r.png", "image/png", vec![0; 6 * 1024 * 1024]);
        assert!(matches!(file.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_exact_limit_is_allowed() {
        let file = UploadedFile::new("r.pdf", "application/pdf", vec![0; MAX_RECEIPT_BYTES]);
        assert!(file.validate().is_ok());
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let file = UploadedFile::new("r.gif", "image/gif", vec![1; 10]);
        assert!(matches!(file.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_rejects_empty_file() {
        let file = UploadedFile::new("r.pdf", "application/pdf", vec![]);
        assert!(matches!(file.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_submission_checks_file_before_bank() {
        let submission = ReceiptSubmission {
            event_id: None,
            bank_label: "Not A Bank".into(),
            file: UploadedFile::new("r.gif", "image/gif", vec![1]),
        };
        let err = submission.validate().unwrap_err();
        assert_eq!(err.to_string(), "Please upload a PDF, JPG, or PNG file.");
    }

    #[test]
    fn test_jpg_alias_maps_to_jpg() {
        let file = UploadedFile::new("r.jpeg", "image/jpg", vec![1]);
        assert!(file.validate().is_ok());
        assert_eq!(file.extension(), "jpg");
    }
}
