//! Administrator authentication: login, token verification, logout

use chrono::Utc;
use tracing::{debug, info};

use crate::common::utils::{is_valid_email, normalize_email};
use crate::common::{AdminId, AppError, AppResult, AuthError};
use crate::config::AdminBootstrap;
use crate::domains::auth::jwt::SessionRole;
use crate::domains::auth::models::AdminUser;
use crate::domains::auth::password::{
    burn_verification, hash_password, validate_new_password, verify_password,
};
use crate::domains::auth::session::SessionContext;
use crate::domains::auth::types::{AdminAuthRequest, AdminAuthResponse, AdminUserView};
use crate::kernel::ServerDeps;

impl From<AdminUser> for AdminUserView {
    fn from(admin: AdminUser) -> Self {
        Self {
            id: admin.id,
            email: admin.email,
            name: admin.name,
        }
    }
}

/// Single entry point for `{action: login | verify | logout}`.
pub async fn admin_auth(request: AdminAuthRequest, deps: &ServerDeps) -> AppResult<AdminAuthResponse> {
    match request {
        AdminAuthRequest::Login { email, password } => admin_login(&email, &password, deps).await,
        AdminAuthRequest::Verify { token } => verify_admin_token(token, deps).await,
        AdminAuthRequest::Logout { token } => {
            let mut session = SessionContext::init(Some(&token), deps).await;
            session.teardown(deps).await;
            Ok(AdminAuthResponse {
                success: true,
                user: None,
                token: None,
            })
        }
    }
}

async fn admin_login(email: &str, password: &str, deps: &ServerDeps) -> AppResult<AdminAuthResponse> {
    let email = normalize_email(email);
    let Some(admin) = deps.admins.find_admin_by_email(&email).await? else {
        burn_verification(password).await?;
        debug!("admin login for unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(password, &admin.password_hash).await? {
        debug!(admin_id = %admin.id, "admin login with wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let token = deps.jwt_service.create_token(
        admin.id.into_uuid(),
        SessionRole::Admin,
        admin.email.clone(),
    )?;

    info!(admin_id = %admin.id, "admin logged in");
    Ok(AdminAuthResponse {
        success: true,
        user: Some(admin.into()),
        token: Some(token),
    })
}

/// Re-validate a stored token, e.g. when the dashboard starts.
async fn verify_admin_token(token: String, deps: &ServerDeps) -> AppResult<AdminAuthResponse> {
    let session = SessionContext::init(Some(&token), deps).await;
    let admin_id = session
        .user()
        .and_then(|user| user.admin_id())
        .ok_or(AuthError::SessionEnded)?;

    let admin = deps
        .admins
        .find_admin(admin_id)
        .await?
        .ok_or(AuthError::SessionEnded)?;

    Ok(AdminAuthResponse {
        success: true,
        user: Some(admin.into()),
        token: Some(token),
    })
}

pub async fn create_admin(
    email: &str,
    name: &str,
    password: &str,
    deps: &ServerDeps,
) -> AppResult<AdminUser> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(AppError::validation("Please enter a valid email address."));
    }
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name is required."));
    }
    validate_new_password(password, password)?;

    let admin = deps
        .admins
        .insert_admin(&AdminUser {
            id: AdminId::new(),
            email,
            name: name.to_string(),
            password_hash: hash_password(password).await?,
            created_at: Utc::now(),
        })
        .await?;

    info!(admin_id = %admin.id, "admin account created");
    Ok(admin)
}

/// Create the configured first admin unless that email already exists.
/// Returns whether an account was created.
pub async fn bootstrap_admin(bootstrap: &AdminBootstrap, deps: &ServerDeps) -> AppResult<bool> {
    let email = normalize_email(&bootstrap.email);
    if deps.admins.find_admin_by_email(&email).await?.is_some() {
        debug!("bootstrap admin already present");
        return Ok(false);
    }
    create_admin(&email, &bootstrap.name, &bootstrap.password, deps).await?;
    Ok(true)
}
