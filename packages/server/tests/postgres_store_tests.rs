//! Postgres store behaviour: constraints, compare-and-set consumption and
//! NULL handling. Needs Docker; run with `cargo test -- --ignored`.

mod common;

use crate::common::*;
use chamber_core::common::{AppError, MemberId};
use chamber_core::domains::auth::activities::{
    issue_challenge, start_receipt_gate, verify_challenge, verify_receipt_gate,
};
use chamber_core::domains::auth::models::OtpPurpose;
use chamber_core::domains::member::activities::{decide_verification, register_member};
use chamber_core::domains::member::models::VerificationStatus;
use chamber_core::domains::receipts::activities::submit_receipt;
use test_context::test_context;

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn duplicate_username_reports_username_conflict(ctx: &TestHarness) {
    let deps = ctx.deps();
    let first = unique_registration();
    let username = first.username.clone();
    register_member(first, &deps).await.unwrap();

    let mut clash = unique_registration();
    clash.username = username;
    clash.phone = None;
    let result = register_member(clash, &deps).await;
    assert!(matches!(result, Err(AppError::Conflict("Username"))));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn duplicate_email_reports_email_conflict(ctx: &TestHarness) {
    let deps = ctx.deps();
    let first = unique_registration();
    let email = first.email.to_uppercase();
    register_member(first, &deps).await.unwrap();

    let mut clash = unique_registration();
    clash.email = email;
    let result = register_member(clash, &deps).await;
    assert!(matches!(result, Err(AppError::Conflict("Email address"))));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn duplicate_phone_reports_phone_conflict(ctx: &TestHarness) {
    let deps = ctx.deps();
    let first = unique_registration();
    let phone = first.phone.clone();
    register_member(first, &deps).await.unwrap();

    let mut clash = unique_registration();
    clash.phone = phone;
    let result = register_member(clash, &deps).await;
    assert!(matches!(result, Err(AppError::Conflict("Phone number"))));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn verified_challenge_cannot_be_replayed(ctx: &TestHarness) {
    let deps = ctx.deps();
    let phone = unique_registration().phone.unwrap();

    let handle = issue_challenge(&phone, OtpPurpose::Login, &deps).await.unwrap();
    let code = ctx.messaging.last_code_for(&phone).unwrap();

    let challenge = verify_challenge(&handle, &code, &deps).await.unwrap();
    assert!(challenge.consumed_at.is_some());

    let replay = verify_challenge(&handle, &code, &deps).await;
    assert!(matches!(replay, Err(AppError::Rejected)));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn null_status_reads_as_pending(ctx: &TestHarness) {
    let deps = ctx.deps();
    let member = register_member(unique_registration(), &deps).await.unwrap();

    sqlx::query("UPDATE registrations SET verification_status = NULL WHERE id = $1")
        .bind(member.id)
        .execute(&ctx.db_pool)
        .await
        .unwrap();

    let stored = deps.members.find_by_id(member.id).await.unwrap().unwrap();
    assert_eq!(stored.verification_status, None);
    assert_eq!(stored.status(), VerificationStatus::Pending);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn repeated_decision_posts_one_message(ctx: &TestHarness) {
    let deps = ctx.deps();
    let member = register_member(unique_registration(), &deps).await.unwrap();

    for _ in 0..2 {
        decide_verification(
            admin_actor(&deps).await,
            member.id,
            VerificationStatus::Rejected,
            Some("illegible receipt".to_string()),
            &deps,
        )
        .await
        .unwrap();
    }

    let messages = deps.messages.messages_for_member(member.id).await.unwrap();
    assert_eq!(messages.len(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn receipt_gate_is_single_use_in_database(ctx: &TestHarness) {
    let deps = ctx.deps();
    let input = unique_registration();
    let phone = input.phone.clone().unwrap();
    let member = register_member(input, &deps).await.unwrap();

    let handle = start_receipt_gate(member.id, &deps).await.unwrap();
    let code = ctx.messaging.last_code_for(&phone).unwrap();
    let gate = verify_receipt_gate(member.id, handle.challenge_id, &code, &deps)
        .await
        .unwrap();

    let receipt = submit_receipt(member.id, png_receipt(1024), &gate, &deps)
        .await
        .unwrap();
    assert_eq!(receipt.member_id, member.id);

    let stored = deps.members.find_by_id(member.id).await.unwrap().unwrap();
    assert_eq!(stored.receipt_ref.as_deref(), Some(receipt.file_ref.as_str()));

    let again = submit_receipt(member.id, png_receipt(1024), &gate, &deps).await;
    assert!(matches!(again, Err(AppError::Rejected)));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn missing_member_updates_report_not_found(ctx: &TestHarness) {
    let deps = ctx.deps();
    let result = deps
        .members
        .update_password(MemberId::new(), "$argon2id$placeholder")
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
