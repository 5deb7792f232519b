//! Test fixtures for members, admins and receipt files.
//!
//! Built through the activities so fixtures get the same validation and
//! hashing as real registrations.

use chamber_core::common::Actor;
use chamber_core::domains::auth::activities::create_admin;
use chamber_core::domains::member::activities::register_member;
use chamber_core::domains::member::data::{MemberData, RegistrationInput};
use chamber_core::domains::receipts::models::{ReceiptSubmission, UploadedFile};
use chamber_core::kernel::ServerDeps;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "secret1";
pub const TEST_PHONE: &str = "+251911000000";

pub fn registration(email: &str, username: &str, password: &str) -> RegistrationInput {
    RegistrationInput {
        name: "Abebe Kebede".to_string(),
        business_name: "Kebede Trading PLC".to_string(),
        email: email.to_string(),
        username: username.to_string(),
        sector: Some("Trade".to_string()),
        password: password.to_string(),
        confirm_password: password.to_string(),
        ..Default::default()
    }
}

/// Registration with unique email, username and phone.
pub fn unique_registration() -> RegistrationInput {
    let suffix = Uuid::new_v4().simple().to_string();
    let digits: String = suffix
        .chars()
        .map(|c| char::from(b'0' + (c as u8 % 10)))
        .take(9)
        .collect();
    RegistrationInput {
        phone: Some(format!("+251{digits}")),
        ..registration(
            &format!("member-{suffix}@example.com"),
            &format!("member_{}", &suffix[..12]),
            TEST_PASSWORD,
        )
    }
}

pub async fn register_with_phone(deps: &ServerDeps, phone: &str) -> MemberData {
    let input = RegistrationInput {
        phone: Some(phone.to_string()),
        ..unique_registration()
    };
    register_member(input, deps)
        .await
        .expect("Failed to register test member")
}

/// Create an admin account and return an actor for it.
pub async fn admin_actor(deps: &ServerDeps) -> Actor {
    let suffix = Uuid::new_v4().simple().to_string();
    let admin = create_admin(
        &format!("admin-{suffix}@chamber.et"),
        "Test Admin",
        "admin-pass",
        deps,
    )
    .await
    .expect("Failed to create test admin");
    Actor::new(admin.id, true)
}

pub fn png_receipt(size: usize) -> ReceiptSubmission {
    ReceiptSubmission {
        event_id: None,
        bank_label: "Commercial Bank of Ethiopia (CBE)".to_string(),
        file: UploadedFile::new("receipt.png", "image/png", vec![7; size]),
    }
}
