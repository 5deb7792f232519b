//! Member-facing endpoints: registration, login, OTP flows and the portal.

use axum::{
    extract::{Extension, Multipart},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::common::{AppError, AppResult, ChallengeId, EventId};
use crate::domains::auth::activities as auth;
use crate::domains::auth::models::OtpPurpose;
use crate::domains::auth::SessionContext;
use crate::domains::member::activities as member;
use crate::domains::member::data::RegistrationInput;
use crate::domains::receipts::activities as receipts;
use crate::domains::receipts::models::{ReceiptSubmission, UploadedFile};
use crate::domains::receipts::BANKS;
use crate::server::app::AppState;

/// Header carrying the signed receipt grant on uploads.
pub const RECEIPT_GRANT_HEADER: &str = "x-receipt-grant";

// =============================================================================
// Request bodies
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct IdentifierBody {
    pub identifier: String,
}

#[derive(Debug, Deserialize)]
pub struct PhoneBody {
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendBody {
    pub phone: String,
    pub purpose: OtpPurpose,
}

#[derive(Debug, Deserialize)]
pub struct CodeBody {
    pub challenge_id: ChallengeId,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct CompleteResetBody {
    pub challenge_id: ChallengeId,
    pub code: String,
    pub new_password: String,
    pub confirm_password: String,
}

// =============================================================================
// Registration and login
// =============================================================================

pub async fn register(
    Extension(state): Extension<AppState>,
    Json(input): Json<RegistrationInput>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let member = member::register_member(input, &state.deps).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "member": member })),
    ))
}

pub async fn login(
    Extension(state): Extension<AppState>,
    Json(body): Json<LoginBody>,
) -> AppResult<Json<Value>> {
    let session = auth::login(&body.identifier, &body.password, &state.deps).await?;
    Ok(Json(json!({
        "success": true,
        "token": session.token,
        "member": session.member,
    })))
}

pub async fn start_otp_login(
    Extension(state): Extension<AppState>,
    Json(body): Json<IdentifierBody>,
) -> AppResult<Json<Value>> {
    let challenge = auth::start_otp_login(&body.identifier, &state.deps).await?;
    Ok(Json(json!({ "success": true, "challenge": challenge })))
}

pub async fn verify_otp_login(
    Extension(state): Extension<AppState>,
    Json(body): Json<CodeBody>,
) -> AppResult<Json<Value>> {
    let session = auth::complete_otp_login(body.challenge_id, &body.code, &state.deps).await?;
    Ok(Json(json!({
        "success": true,
        "token": session.token,
        "member": session.member,
    })))
}

// =============================================================================
// Password reset and resend
// =============================================================================

pub async fn start_password_reset(
    Extension(state): Extension<AppState>,
    Json(body): Json<PhoneBody>,
) -> AppResult<Json<Value>> {
    let challenge = auth::start_password_reset(&body.phone, &state.deps).await?;
    Ok(Json(json!({ "success": true, "challenge": challenge })))
}

pub async fn complete_password_reset(
    Extension(state): Extension<AppState>,
    Json(body): Json<CompleteResetBody>,
) -> AppResult<Json<Value>> {
    auth::complete_password_reset(
        body.challenge_id,
        &body.code,
        &body.new_password,
        &body.confirm_password,
        &state.deps,
    )
    .await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn resend_code(
    Extension(state): Extension<AppState>,
    Json(body): Json<ResendBody>,
) -> AppResult<Json<Value>> {
    let challenge = auth::resend_challenge(&body.phone, body.purpose, &state.deps).await?;
    Ok(Json(json!({ "success": true, "challenge": challenge })))
}

pub async fn list_banks() -> Json<Value> {
    Json(json!({ "success": true, "banks": BANKS }))
}

// =============================================================================
// Member portal (session required)
// =============================================================================

pub async fn dashboard(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<SessionContext>,
) -> AppResult<Json<Value>> {
    let member_id = session.require_member()?;
    let dashboard = member::member_dashboard(member_id, &state.deps).await?;
    Ok(Json(json!({ "success": true, "dashboard": dashboard })))
}

pub async fn logout(
    Extension(state): Extension<AppState>,
    Extension(mut session): Extension<SessionContext>,
) -> AppResult<Json<Value>> {
    session.require_member()?;
    session.teardown(&state.deps).await;
    Ok(Json(json!({ "success": true })))
}

pub async fn start_receipt_gate(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<SessionContext>,
) -> AppResult<Json<Value>> {
    let member_id = session.require_member()?;
    let challenge = auth::start_receipt_gate(member_id, &state.deps).await?;
    Ok(Json(json!({ "success": true, "challenge": challenge })))
}

pub async fn verify_receipt_gate(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<SessionContext>,
    Json(body): Json<CodeBody>,
) -> AppResult<Json<Value>> {
    let member_id = session.require_member()?;
    let gate =
        auth::verify_receipt_gate(member_id, body.challenge_id, &body.code, &state.deps).await?;
    let grant = auth::issue_receipt_grant(&gate, &state.deps)?;
    Ok(Json(json!({
        "success": true,
        "grant": grant.grant,
        "expires_at": grant.expires_at,
    })))
}

/// Multipart receipt upload: `file`, `bank`, optional `event_id`.
///
/// The submission is validated before the grant header is read, so a bad
/// file reports the file problem even without a grant.
pub async fn upload_receipt(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<SessionContext>,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<Value>)> {
    let member_id = session.require_member()?;
    let submission = read_submission(multipart).await?;
    submission.validate()?;

    let grant = headers
        .get(RECEIPT_GRANT_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::Rejected)?;
    let gate = auth::read_receipt_grant(grant, &state.deps)?;

    let receipt = receipts::submit_receipt(member_id, submission, &gate, &state.deps).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "receipt": receipt })),
    ))
}

async fn read_submission(mut multipart: Multipart) -> AppResult<ReceiptSubmission> {
    let mut file = None;
    let mut bank_label = None;
    let mut event_id = None;

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("receipt").to_string();
                let declared_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(malformed)?;
                file = Some(UploadedFile::with_guessed_type(
                    file_name,
                    declared_type.as_deref(),
                    bytes.to_vec(),
                ));
            }
            "bank" => bank_label = Some(field.text().await.map_err(malformed)?),
            "event_id" => {
                let text = field.text().await.map_err(malformed)?;
                let text = text.trim();
                if !text.is_empty() {
                    let id = text
                        .parse::<EventId>()
                        .map_err(|_| AppError::validation("Invalid event id."))?;
                    event_id = Some(id);
                }
            }
            other => debug!(field = other, "ignoring unknown multipart field"),
        }
    }

    let file = file.ok_or_else(|| AppError::validation("Please choose a receipt file to upload."))?;
    let bank_label = bank_label.ok_or_else(|| AppError::validation("Please select your bank."))?;
    Ok(ReceiptSubmission {
        event_id,
        bank_label,
        file,
    })
}

fn malformed(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::validation(format!("Malformed upload: {}", err.body_text()))
}
