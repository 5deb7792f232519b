//! Auth domain - Credential Verifier, OTP Challenge Issuer and sessions
//!
//! Responsibilities:
//! - Password and OTP login for members, password login for admins
//! - One-time codes over SMS for login, password reset and receipt uploads
//! - Session and receipt-grant tokens, per-request session context

pub mod activities;
pub mod jwt;
pub mod machines;
pub mod models;
pub mod password;
pub mod session;
pub mod types;

pub use jwt::{Claims, GrantClaims, JwtService, SessionRole};
pub use session::{RevokedTokens, SessionContext, SessionUser};
pub use types::{AdminAuthRequest, AdminAuthResponse, ChallengeHandle, MemberSession, OtpGate};
