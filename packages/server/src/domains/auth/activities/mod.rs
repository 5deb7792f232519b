//! Auth domain activities - business logic functions

pub mod admin_auth;
pub mod login;
pub mod otp;
pub mod otp_login;
pub mod password_reset;
pub mod receipt_gate;

pub use admin_auth::{admin_auth, bootstrap_admin, create_admin};
pub use login::login;
pub use otp::{issue_challenge, resend_challenge, verify_challenge};
pub use otp_login::{complete_otp_login, start_otp_login};
pub use password_reset::{complete_password_reset, start_password_reset};
pub use receipt_gate::{issue_receipt_grant, read_receipt_grant, start_receipt_gate, verify_receipt_gate};
