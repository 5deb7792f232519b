//! Read-side activities for members and admins

use crate::common::{Actor, AdminCapability, AppError, AppResult, MemberId};
use crate::domains::member::data::{MemberDashboard, MemberData, StatusView};
use crate::domains::member::models::{MemberFilter, RegistrationStats};
use crate::kernel::ServerDeps;

/// Current verification status of a member.
pub async fn verification_status(member_id: MemberId, deps: &ServerDeps) -> AppResult<StatusView> {
    let member = deps
        .members
        .find_by_id(member_id)
        .await?
        .ok_or(AppError::NotFound("Member"))?;
    Ok(StatusView::of(&member))
}

/// Profile, review status, receipts and messages for the member portal.
pub async fn member_dashboard(member_id: MemberId, deps: &ServerDeps) -> AppResult<MemberDashboard> {
    let member = deps
        .members
        .find_by_id(member_id)
        .await?
        .ok_or(AppError::NotFound("Member"))?;

    let receipts = deps.receipts.receipts_for_member(member_id).await?;
    let messages = deps.messages.messages_for_member(member_id).await?;

    Ok(MemberDashboard {
        status: StatusView::of(&member),
        member: MemberData::from(member),
        receipts,
        messages,
    })
}

pub async fn list_members(
    actor: Actor,
    filter: &MemberFilter,
    deps: &ServerDeps,
) -> AppResult<Vec<MemberData>> {
    actor.can(AdminCapability::ViewMembers).check(deps).await?;

    let members = deps.members.list(filter).await?;
    Ok(members.into_iter().map(MemberData::from).collect())
}

pub async fn registration_stats(actor: Actor, deps: &ServerDeps) -> AppResult<RegistrationStats> {
    actor.can(AdminCapability::ViewMembers).check(deps).await?;
    deps.members.stats().await
}
