pub mod member;

pub use member::{MemberDashboard, MemberData, PasswordResetResult, RegistrationInput, StatusView};
