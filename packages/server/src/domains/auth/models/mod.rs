pub mod admin_user;
pub mod otp_challenge;

pub use admin_user::AdminUser;
pub use otp_challenge::{OtpChallenge, OtpPurpose};
