/// Administrative operations on member records and receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCapability {
    /// Accept or reject payment proof and member verification
    ReviewReceipts,

    /// Read member records, statistics and receipt files
    ViewMembers,

    /// Issue a new password on a member's behalf
    ResetPasswords,

    /// Post messages to a member's dashboard
    MessageMembers,
}

impl AdminCapability {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminCapability::ReviewReceipts => "review_receipts",
            AdminCapability::ViewMembers => "view_members",
            AdminCapability::ResetPasswords => "reset_passwords",
            AdminCapability::MessageMembers => "message_members",
        }
    }
}
