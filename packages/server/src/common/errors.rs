use thiserror::Error;

use super::auth::AuthError;

/// Workflow error taxonomy shared by every domain.
///
/// `InvalidCredentials` and `Rejected` carry no detail on purpose: callers
/// must not learn which half of a login or which property of a code failed.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} already exists")]
    Conflict(&'static str),

    #[error("Invalid credentials. Please check your email/username and password.")]
    InvalidCredentials,

    #[error("Failed to deliver verification code: {0}")]
    Delivery(String),

    #[error("Invalid or expired verification code")]
    Rejected,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True for failures the user caused and can fix by resubmitting.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Database(_) | Self::Internal(_) | Self::Delivery(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_message_is_fixed() {
        assert_eq!(
            AppError::InvalidCredentials.to_string(),
            "Invalid credentials. Please check your email/username and password."
        );
    }

    #[test]
    fn test_rejected_message_hides_cause() {
        assert_eq!(
            AppError::Rejected.to_string(),
            "Invalid or expired verification code"
        );
    }

    #[test]
    fn test_auth_errors_pass_through() {
        let err: AppError = AuthError::AdminRequired.into();
        assert_eq!(err.to_string(), "Admin access required");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_internal_is_not_client_error() {
        let err: AppError = anyhow::anyhow!("boom").into();
        assert!(!err.is_client_error());
    }
}
