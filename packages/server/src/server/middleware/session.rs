use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::domains::auth::SessionContext;
use crate::kernel::ServerDeps;

/// Session middleware
///
/// Builds a `SessionContext` from the Authorization header and adds it to
/// the request extensions. Missing or invalid tokens give an anonymous
/// context; handlers decide whether that is acceptable.
pub async fn session_middleware(
    deps: Arc<ServerDeps>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = bearer_token(request.headers());
    let session = SessionContext::init(token.as_deref(), &deps).await;

    if let Some(user) = session.user() {
        debug!(role = ?user.role, subject = %user.subject, "authenticated request");
    }

    request.extensions_mut().insert(session);
    next.run(request).await
}

/// Token from `Authorization: Bearer <token>` (a raw token is accepted too).
/// The scheme is case-insensitive; a bare scheme carries no token.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = match value.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        None if value.eq_ignore_ascii_case("bearer") => "",
        _ => value,
    };
    (!token.is_empty()).then(|| token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_token_with_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_extract_token_without_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("abc.def.ghi"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_no_auth_header() {
        assert!(bearer_token(&HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer"));
        assert!(bearer_token(&headers).is_none());
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer   abc.def.ghi "));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def.ghi"));
    }
}
