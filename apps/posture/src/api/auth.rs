//! # Authentication Module
//!
//! Optional bearer-token authentication for the Posture HTTP API.
//!
//! - `POSTURE_API_KEY` set: every route except `/health` needs
//!   `Authorization: Bearer <key>` (a bare `<key>` is accepted too)
//! - `POSTURE_API_KEY` unset or empty: no authentication

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "POSTURE_API_KEY";

/// Routes reachable without a key.
const PUBLIC_PATHS: [&str; 1] = ["/health"];

// =============================================================================
// API KEY AUTHENTICATION
// =============================================================================

/// The configured API key, if any.
pub fn get_api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty())
}

/// Token presented by the client, without the `Bearer ` prefix.
fn presented_token(request: &Request<Body>) -> Option<&str> {
    let value = request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    Some(value.strip_prefix("Bearer ").unwrap_or(value))
}

/// API key authentication middleware.
pub async fn api_key_auth_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    let Some(expected) = get_api_key_from_env() else {
        return Ok(next.run(request).await);
    };

    if PUBLIC_PATHS.contains(&request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let reason = match presented_token(&request).map(|token| keys_match(token, &expected)) {
        Some(true) => return Ok(next.run(request).await),
        Some(false) => "invalid_api_key",
        None => "missing_authorization_header",
    };

    tracing::warn!(
        event = "auth_failure",
        reason,
        path = request.uri().path(),
        "Authentication failed"
    );
    Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
}

/// Constant-time key comparison.
///
/// Both keys are zero-padded to a common length so `ct_eq` always scans
/// the same number of bytes; the length check happens afterwards.
fn keys_match(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();

    let max_len = provided.len().max(expected.len());
    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided.len()].copy_from_slice(provided);
    padded_expected[..expected.len()].copy_from_slice(expected);

    let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
    bytes_match && provided.len() == expected.len()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_match_exact_only() {
        assert!(keys_match("secret-key", "secret-key"));
        assert!(!keys_match("secret-kez", "secret-key"));
        assert!(!keys_match("secret", "secret-key"));
        assert!(!keys_match("secret-key-long", "secret-key"));
        assert!(!keys_match("", "secret-key"));
    }

    #[test]
    fn presented_token_strips_bearer() {
        let request = Request::builder()
            .header(header::AUTHORIZATION, "Bearer abc")
            .body(Body::empty())
            .expect("request");
        assert_eq!(presented_token(&request), Some("abc"));

        let request = Request::builder()
            .header(header::AUTHORIZATION, "abc")
            .body(Body::empty())
            .expect("request");
        assert_eq!(presented_token(&request), Some("abc"));

        let request = Request::builder().body(Body::empty()).expect("request");
        assert_eq!(presented_token(&request), None);
    }
}
