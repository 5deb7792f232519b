//! Typed ID aliases for every persisted entity.

pub use super::id::Id;

/// Marker type for registered chamber members.
pub struct Member;

/// Marker type for administrator accounts.
pub struct Admin;

/// Marker type for issued one-time codes.
pub struct OtpChallenge;

/// Marker type for uploaded payment receipts.
pub struct Receipt;

/// Marker type for admin-to-member messages.
pub struct MemberMessage;

/// Marker type for chamber events a receipt can pay for.
pub struct Event;

pub type MemberId = Id<Member>;
pub type AdminId = Id<Admin>;
pub type ChallengeId = Id<OtpChallenge>;
pub type ReceiptId = Id<Receipt>;
pub type MessageId = Id<MemberMessage>;
pub type EventId = Id<Event>;
