//! Password login (Credential Verifier)

use tracing::{debug, info};

use crate::common::{AppError, AppResult};
use crate::domains::auth::password::{burn_verification, verify_password};
use crate::domains::auth::types::MemberSession;
use crate::domains::member::data::MemberData;
use crate::domains::member::models::Member;
use crate::kernel::ServerDeps;

/// Check an identifier (email or username) and password.
///
/// Every failure is the same `InvalidCredentials`, and an unknown
/// identifier still pays for one password verification.
pub async fn login(identifier: &str, password: &str, deps: &ServerDeps) -> AppResult<MemberSession> {
    let member = match deps.members.find_by_identifier(identifier).await {
        Ok(member) => member,
        Err(AppError::NotFound(_)) => {
            burn_verification(password).await?;
            debug!("login attempt for unknown identifier");
            return Err(AppError::InvalidCredentials);
        }
        Err(e) => return Err(e),
    };

    if !verify_password(password, &member.password_hash).await? {
        debug!(member_id = %member.id, "login attempt with wrong password");
        return Err(AppError::InvalidCredentials);
    }

    info!(member_id = %member.id, "member logged in");
    member_session(member, deps)
}

/// Issue a session token for an authenticated member.
pub(crate) fn member_session(member: Member, deps: &ServerDeps) -> AppResult<MemberSession> {
    let token = deps.jwt_service.create_member_token(
        member.id,
        member.email.clone(),
        member.password_epoch(),
    )?;

    Ok(MemberSession {
        token,
        member: MemberData::from(member),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::member::activities::register_member;
    use crate::domains::member::data::RegistrationInput;
    use crate::kernel::TestDependencies;

    async fn registered(test: &TestDependencies) {
        let input = RegistrationInput {
            name: "Abebe".into(),
            business_name: "Abebe Trading".into(),
            email: "a@x.com".into(),
            username: "a1".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
            ..Default::default()
        };
        register_member(input, &test.server_deps()).await.unwrap();
    }

    #[tokio::test]
    async fn test_login_by_email_or_username() {
        let test = TestDependencies::new();
        registered(&test).await;
        let deps = test.server_deps();

        let by_email = login("A@x.com", "secret1", &deps).await.unwrap();
        let by_username = login("a1", "secret1", &deps).await.unwrap();
        assert_eq!(by_email.member.id, by_username.member.id);

        let claims = deps.jwt_service.verify_token(&by_email.token).unwrap();
        assert_eq!(claims.member_id(), Some(by_email.member.id));
    }

    #[tokio::test]
    async fn test_failure_message_does_not_reveal_cause() {
        let test = TestDependencies::new();
        registered(&test).await;
        let deps = test.server_deps();

        let wrong_password = login("a@x.com", "wrong", &deps).await.unwrap_err();
        let unknown_user = login("nobody@x.com", "secret1", &deps).await.unwrap_err();

        assert!(matches!(wrong_password, AppError::InvalidCredentials));
        assert!(matches!(unknown_user, AppError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }
}
