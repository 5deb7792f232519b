//! Admin verification decision

use tracing::{debug, info};

use crate::common::{Actor, AdminCapability, AppError, AppResult, MemberId};
use crate::domains::member::data::StatusView;
use crate::domains::member::machines::{decision_message, normalize_reason, plan_decision, DecisionOutcome};
use crate::domains::member::models::{MemberMessage, VerificationStatus};
use crate::kernel::ServerDeps;

/// Record an admin decision on a member's verification.
///
/// Re-applying the current status and reason writes nothing and sends no
/// message. A real change updates the member and posts one message in a
/// single store write, so a failed call can be retried safely.
pub async fn decide_verification(
    actor: Actor,
    member_id: MemberId,
    status: VerificationStatus,
    reason: Option<String>,
    deps: &ServerDeps,
) -> AppResult<StatusView> {
    actor
        .can(AdminCapability::ReviewReceipts)
        .check(deps)
        .await?;

    let member = deps
        .members
        .find_by_id(member_id)
        .await?
        .ok_or(AppError::NotFound("Member"))?;

    let reason = normalize_reason(reason.as_deref());

    match plan_decision(&member, status, reason.as_deref()) {
        DecisionOutcome::Unchanged => {
            debug!(%member_id, %status, "verification decision already applied");
        }
        DecisionOutcome::Changed { from } => {
            let (subject, body) = decision_message(status, reason.as_deref());
            deps.members
                .record_decision(
                    member_id,
                    status,
                    reason.as_deref(),
                    &MemberMessage::new(member_id, subject, body),
                )
                .await?;

            info!(%member_id, %from, to = %status, "verification status changed");
        }
    }

    Ok(StatusView { status, reason })
}
