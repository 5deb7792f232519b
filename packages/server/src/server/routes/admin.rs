//! Admin endpoints. Every handler except `/api/admin/auth` needs an admin
//! session; capability checks happen inside the activities.

use axum::{
    extract::{Extension, Path, Query},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::common::{AppResult, MemberId, ReceiptId};
use crate::domains::auth::activities as auth;
use crate::domains::auth::{AdminAuthRequest, AdminAuthResponse, SessionContext};
use crate::domains::member::activities as member;
use crate::domains::member::models::{MemberFilter, VerificationStatus};
use crate::domains::receipts::activities as receipts;
use crate::domains::receipts::models::ReceiptReview;
use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
pub struct DecisionBody {
    pub status: VerificationStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordBody {
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessageBody {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReceiptQuery {
    pub status: Option<VerificationStatus>,
}

/// Action endpoint: `login`, `verify` or `logout`.
pub async fn admin_auth(
    Extension(state): Extension<AppState>,
    Json(request): Json<AdminAuthRequest>,
) -> AppResult<Json<AdminAuthResponse>> {
    Ok(Json(auth::admin_auth(request, &state.deps).await?))
}

// =============================================================================
// Members
// =============================================================================

pub async fn list_members(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<SessionContext>,
    Query(filter): Query<MemberFilter>,
) -> AppResult<Json<Value>> {
    let members = member::list_members(session.actor()?, &filter, &state.deps).await?;
    Ok(Json(json!({ "success": true, "members": members })))
}

pub async fn stats(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<SessionContext>,
) -> AppResult<Json<Value>> {
    let stats = member::registration_stats(session.actor()?, &state.deps).await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

pub async fn decide(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(member_id): Path<MemberId>,
    Json(body): Json<DecisionBody>,
) -> AppResult<Json<Value>> {
    let status = member::decide_verification(
        session.actor()?,
        member_id,
        body.status,
        body.reason,
        &state.deps,
    )
    .await?;
    Ok(Json(json!({ "success": true, "verification": status })))
}

pub async fn reset_password(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<SessionContext>,
    Json(body): Json<ResetPasswordBody>,
) -> AppResult<Json<Value>> {
    let result =
        member::admin_reset_password(session.actor()?, &body.email, body.password, &state.deps)
            .await?;
    Ok(Json(json!({ "success": true, "reset": result })))
}

pub async fn send_message(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(member_id): Path<MemberId>,
    Json(body): Json<MessageBody>,
) -> AppResult<Json<Value>> {
    let message = member::send_member_message(
        session.actor()?,
        member_id,
        &body.subject,
        &body.body,
        &state.deps,
    )
    .await?;
    Ok(Json(json!({ "success": true, "message": message })))
}

// =============================================================================
// Receipts
// =============================================================================

pub async fn list_receipts(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<SessionContext>,
    Query(query): Query<ReceiptQuery>,
) -> AppResult<Json<Value>> {
    let receipts =
        receipts::list_receipts_for_review(session.actor()?, query.status, &state.deps).await?;
    Ok(Json(json!({ "success": true, "receipts": receipts })))
}

pub async fn review_receipt(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(receipt_id): Path<ReceiptId>,
    Json(review): Json<ReceiptReview>,
) -> AppResult<Json<Value>> {
    let receipt =
        receipts::review_receipt(session.actor()?, receipt_id, review.status, &state.deps)
            .await?;
    Ok(Json(json!({ "success": true, "receipt": receipt })))
}

pub async fn download_receipt(
    Extension(state): Extension<AppState>,
    Extension(session): Extension<SessionContext>,
    Path(receipt_id): Path<ReceiptId>,
) -> AppResult<Response> {
    let file = receipts::download_receipt(session.actor()?, receipt_id, &state.deps).await?;
    let disposition = format!("attachment; filename=\"{}\"", file.file_name);

    Ok((
        [
            (header::CONTENT_TYPE, file.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response())
}
