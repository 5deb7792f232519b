//! Verification status transitions.
//!
//! `pending -> {verified, rejected}`; an admin may move between any of the
//! three, including back to `pending`. Re-applying the current decision is
//! a no-op.

use crate::domains::member::models::{Member, VerificationStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionOutcome {
    Unchanged,
    Changed { from: VerificationStatus },
}

/// Blank reasons count as no reason.
pub fn normalize_reason(reason: Option<&str>) -> Option<String> {
    reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from)
}

pub fn plan_decision(
    member: &Member,
    status: VerificationStatus,
    reason: Option<&str>,
) -> DecisionOutcome {
    let current = member.status();
    if current == status && member.verification_reason.as_deref() == reason {
        DecisionOutcome::Unchanged
    } else {
        DecisionOutcome::Changed { from: current }
    }
}

/// Subject and body of the note posted to the member on a decision.
pub fn decision_message(status: VerificationStatus, reason: Option<&str>) -> (String, String) {
    let (subject, mut body) = match status {
        VerificationStatus::Verified => (
            "Membership verified",
            "Your membership payment has been verified. Welcome to the Chamber.".to_string(),
        ),
        VerificationStatus::Rejected => (
            "Membership verification rejected",
            "Your membership payment could not be verified.".to_string(),
        ),
        VerificationStatus::Pending => (
            "Membership back under review",
            "Your membership is being reviewed again.".to_string(),
        ),
    };
    if let Some(reason) = reason {
        body.push_str(" Reason: ");
        body.push_str(reason);
    }
    (subject.to_string(), body)
}
