use thiserror::Error;

use super::AdminCapability;

/// Session and capability failures. Every variant maps to 401, 403 or 500.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Please sign in to continue")]
    SignInRequired,

    /// The admin account behind the token no longer exists.
    #[error("Not allowed to {}", .0.as_str())]
    PermissionDenied(AdminCapability),

    #[error("Admin access required")]
    AdminRequired,

    /// Expired, malformed or revoked bearer token.
    #[error("Your session has ended. Please sign in again.")]
    SessionEnded,

    #[error("Admin lookup failed: {0}")]
    Lookup(#[from] anyhow::Error),
}
