use tracing::info;

use crate::common::{Actor, AdminCapability, AppError, AppResult, MemberId};
use crate::domains::member::models::MemberMessage;
use crate::kernel::ServerDeps;

/// Post a message to a member's dashboard.
pub async fn send_member_message(
    actor: Actor,
    member_id: MemberId,
    subject: &str,
    body: &str,
    deps: &ServerDeps,
) -> AppResult<MemberMessage> {
    actor
        .can(AdminCapability::MessageMembers)
        .check(deps)
        .await?;

    let (subject, body) = (subject.trim(), body.trim());
    if subject.is_empty() || body.is_empty() {
        return Err(AppError::validation("Subject and message are required."));
    }

    if deps.members.find_by_id(member_id).await?.is_none() {
        return Err(AppError::NotFound("Member"));
    }

    let message = deps
        .messages
        .insert_message(&MemberMessage::new(member_id, subject, body))
        .await?;

    info!(%member_id, message_id = %message.id, "message sent to member");
    Ok(message)
}
