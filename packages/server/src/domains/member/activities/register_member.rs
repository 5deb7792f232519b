//! Register member activity - validates the form and stores the registration

use tracing::{info, warn};

use crate::common::utils::{is_valid_email, is_valid_phone, mask_phone, normalize_email, normalize_phone};
use crate::common::{AppError, AppResult, MemberId};
use crate::domains::auth::password::{hash_password, validate_new_password};
use crate::domains::member::data::{MemberData, RegistrationInput};
use crate::domains::member::models::NewMember;
use crate::kernel::ServerDeps;

/// Register a new member.
///
/// Every validation rule runs before the store is touched. Duplicate email,
/// username or phone fails with `Conflict` and leaves the store unchanged.
pub async fn register_member(input: RegistrationInput, deps: &ServerDeps) -> AppResult<MemberData> {
    let new_member = validate_registration(input).await?;

    let member = deps
        .members
        .insert(MemberId::new(), &new_member)
        .await
        .inspect_err(|e| {
            if matches!(e, AppError::Conflict(_)) {
                warn!(username = %new_member.username, "registration rejected: {}", e);
            }
        })?;

    let masked_phone = member.phone.as_deref().map(mask_phone).unwrap_or_default();
    info!(
        member_id = %member.id,
        phone = %masked_phone,
        membership = member.membership_type.as_str(),
        "member registered"
    );

    Ok(MemberData::from(member))
}

/// Validate and normalise a registration, hashing the password last.
pub async fn validate_registration(input: RegistrationInput) -> AppResult<NewMember> {
    let name = required(&input.name, "Full name")?;
    let business_name = required(&input.business_name, "Business name")?;
    let email = normalize_email(&required(&input.email, "Email")?);
    let username = required(&input.username, "Username")?;

    if !is_valid_email(&email) {
        return Err(AppError::validation("Please enter a valid email address."));
    }
    if username.contains('@') {
        return Err(AppError::validation("Username cannot contain '@'."));
    }

    validate_new_password(&input.password, &input.confirm_password)?;

    let phone = match optional(input.phone) {
        Some(raw) => {
            let phone = normalize_phone(&raw);
            if !is_valid_phone(&phone) {
                return Err(AppError::validation(
                    "Phone number must be in international format, e.g. +251911000000.",
                ));
            }
            Some(phone)
        }
        None => None,
    };

    Ok(NewMember::builder()
        .name(name)
        .business_name(business_name)
        .email(email)
        .username(username)
        .phone(phone)
        .sector(optional(input.sector))
        .address(optional(input.address))
        .website(optional(input.website))
        .membership_type(input.membership_type)
        .password_hash(hash_password(&input.password).await?)
        .build())
}

fn required(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required.")));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::TestDependencies;

    fn input() -> RegistrationInput {
        RegistrationInput {
            name: "Abebe Kebede".into(),
            business_name: "Abebe Trading".into(),
            email: "A@X.com".into(),
            username: " a1 ".into(),
            phone: Some("+251 911 000 000".into()),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_register_normalises_fields() {
        let test = TestDependencies::new();
        let member = register_member(input(), &test.server_deps()).await.unwrap();

        assert_eq!(member.email, "a@x.com");
        assert_eq!(member.username, "a1");
        assert_eq!(member.phone.as_deref(), Some("+251911000000"));
        assert_eq!(member.verification_status.as_str(), "pending");
    }

    #[tokio::test]
    async fn test_password_mismatch_writes_nothing() {
        let test = TestDependencies::new();
        let mut bad = input();
        bad.confirm_password = "secret2".into();

        let err = register_member(bad, &test.server_deps()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(test.store.member_writes(), 0);
    }

    #[tokio::test]
    async fn test_username_with_at_sign_rejected() {
        let test = TestDependencies::new();
        let mut bad = input();
        bad.username = "a@1".into();

        let err = register_member(bad, &test.server_deps()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_bad_phone_rejected() {
        let test = TestDependencies::new();
        let mut bad = input();
        bad.phone = Some("0911000000".into());

        let err = register_member(bad, &test.server_deps()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_blank_optional_phone_is_none() {
        let test = TestDependencies::new();
        let mut form = input();
        form.phone = Some("   ".into());

        let member = register_member(form, &test.server_deps()).await.unwrap();
        assert_eq!(member.phone, None);
    }

    #[tokio::test]
    async fn test_duplicate_phone_is_conflict() {
        let test = TestDependencies::new();
        let deps = test.server_deps();
        register_member(input(), &deps).await.unwrap();

        let mut second = input();
        second.email = "b@x.com".into();
        second.username = "b1".into();
        second.phone = Some("+251911000000".into());

        let err = register_member(second, &deps).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict("Phone number")));
        assert_eq!(test.store.member_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_business_name() {
        let test = TestDependencies::new();
        let mut bad = input();
        bad.business_name = "  ".into();

        let err = register_member(bad, &test.server_deps()).await.unwrap_err();
        assert_eq!(err.to_string(), "Business name is required.");
    }
}
