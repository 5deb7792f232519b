//! Admin-issued password reset

use tracing::info;

use crate::common::utils::normalize_email;
use crate::common::{Actor, AdminCapability, AppResult};
use crate::domains::auth::password::{generate_password, hash_password, validate_new_password};
use crate::domains::member::data::PasswordResetResult;
use crate::kernel::ServerDeps;

/// Set a member's password on their behalf.
///
/// Without `new_password` an 8-character alphanumeric password is
/// generated. The plaintext is returned once and never stored.
pub async fn admin_reset_password(
    actor: Actor,
    member_email: &str,
    new_password: Option<String>,
    deps: &ServerDeps,
) -> AppResult<PasswordResetResult> {
    actor
        .can(AdminCapability::ResetPasswords)
        .check(deps)
        .await?;

    let password = match new_password.filter(|p| !p.is_empty()) {
        Some(password) => password,
        None => generate_password(),
    };
    validate_new_password(&password, &password)?;

    let email = normalize_email(member_email);
    let member = deps.members.find_by_identifier(&email).await?;

    let password_hash = hash_password(&password).await?;
    deps.members.update_password(member.id, &password_hash).await?;

    info!(member_id = %member.id, "password reset by admin");

    Ok(PasswordResetResult {
        member_id: member.id,
        email: member.email,
        password,
    })
}
