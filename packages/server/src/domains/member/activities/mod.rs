//! Member domain activities - business logic functions
//!
//! Called directly by HTTP handlers, the admin CLI and tests with a
//! `&ServerDeps`.

mod decide_verification;
mod queries;
mod register_member;
mod reset_password;
mod send_message;

pub use decide_verification::decide_verification;
pub use queries::{list_members, member_dashboard, registration_stats, verification_status};
pub use register_member::{register_member, validate_registration};
pub use reset_password::admin_reset_password;
pub use send_message::send_member_message;
