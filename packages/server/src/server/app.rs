// Axum router and shared request state

use axum::{
    extract::{DefaultBodyLimit, Extension},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::kernel::ServerDeps;
use crate::server::middleware::session_middleware;
use crate::server::routes::{admin, health_handler, members};

/// Request body cap on the upload route. Above the 5 MiB file limit so
/// oversized files reach validation and get a readable error.
pub const UPLOAD_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Shared state handed to every handler through an `Extension`.
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
    /// Only used by the health check; absent for in-memory deployments.
    pub db_pool: Option<PgPool>,
}

impl AppState {
    pub fn new(deps: ServerDeps, db_pool: Option<PgPool>) -> Self {
        Self {
            deps: Arc::new(deps),
            db_pool,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
    pub rate_limit_enabled: bool,
}

impl AppOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            allowed_origins: config.allowed_origins.clone(),
            rate_limit_enabled: config.rate_limit_enabled,
        }
    }
}

/// Build the HTTP application.
pub fn build_app(state: AppState, options: &AppOptions) -> Router {
    let deps_for_middleware = state.deps.clone();

    // Routes that send texts or check secrets; these get the per-IP limiter
    let mut guarded = Router::new()
        .route("/api/members/login", post(members::login))
        .route("/api/members/otp-login/start", post(members::start_otp_login))
        .route("/api/members/otp-login/verify", post(members::verify_otp_login))
        .route("/api/password-reset/start", post(members::start_password_reset))
        .route("/api/password-reset/complete", post(members::complete_password_reset))
        .route("/api/otp/resend", post(members::resend_code))
        .route("/api/me/receipt-gate/start", post(members::start_receipt_gate))
        .route("/api/me/receipt-gate/verify", post(members::verify_receipt_gate))
        .route("/api/admin/auth", post(admin::admin_auth));

    if options.rate_limit_enabled {
        // 10 requests per second per client IP, bursts up to 20
        let governor = GovernorConfigBuilder::default()
            .key_extractor(SmartIpKeyExtractor)
            .per_second(10)
            .burst_size(20)
            .use_headers()
            .finish();
        match governor {
            Some(config) => {
                guarded = guarded.layer(GovernorLayer {
                    config: Arc::new(config),
                });
                info!("rate limiting enabled for OTP and login routes");
            }
            None => warn!("rate limiter configuration rejected, serving without it"),
        }
    }

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/banks", get(members::list_banks))
        .route("/api/members/register", post(members::register))
        .route("/api/me/dashboard", get(members::dashboard))
        .route("/api/me/logout", post(members::logout))
        .route(
            "/api/me/receipts",
            post(members::upload_receipt).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/admin/members", get(admin::list_members))
        .route("/api/admin/stats", get(admin::stats))
        .route("/api/admin/members/reset-password", post(admin::reset_password))
        .route("/api/admin/members/:id/decision", post(admin::decide))
        .route("/api/admin/members/:id/messages", post(admin::send_message))
        .route("/api/admin/receipts", get(admin::list_receipts))
        .route("/api/admin/receipts/:id/review", post(admin::review_receipt))
        .route("/api/admin/receipts/:id/file", get(admin::download_receipt))
        .merge(guarded)
        // Layers run bottom-up: trace, CORS, state, then the session
        .layer(middleware::from_fn(move |req, next| {
            session_middleware(deps_for_middleware.clone(), req, next)
        }))
        .layer(Extension(state))
        .layer(cors_layer(&options.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static(members::RECEIPT_GRANT_HEADER),
        ]);

    if allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}
