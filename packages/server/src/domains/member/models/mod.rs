pub mod member;
pub mod message;

pub use member::{
    Member, MemberFilter, MembershipType, NewMember, RegistrationStats, VerificationStatus,
};
pub use message::MemberMessage;
