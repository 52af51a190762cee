//! Shared-password session cookie
//!
//! The token is `base64("<password>-<unix millis>")` and is accepted when it
//! decodes to a string starting with the configured password. The timestamp
//! is not checked; expiry is left to the cookie's `Max-Age`.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;

use crate::config::AuthConfig;
use crate::error::{Error, Result};

use super::state::AppState;

/// Message returned to requests without a valid session
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized. Please login first.";

/// Issue a new session token
pub fn session_token(password: &str) -> String {
    STANDARD.encode(format!("{}-{}", password, Utc::now().timestamp_millis()))
}

/// Whether `token` was issued for `password`
pub fn is_valid_token(token: &str, password: &str) -> bool {
    STANDARD
        .decode(token)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .is_some_and(|decoded| decoded.starts_with(password))
}

/// `Set-Cookie` value for a fresh session
pub fn session_cookie(config: &AuthConfig, token: &str) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        config.cookie_name, token, config.session_max_age_secs
    );
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session
pub fn expired_cookie(config: &AuthConfig) -> String {
    let mut cookie = format!(
        "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
        config.cookie_name
    );
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Value of the named cookie across all `Cookie` headers
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Whether the request carries a valid session cookie
pub fn is_authenticated(headers: &HeaderMap, config: &AuthConfig) -> bool {
    cookie_value(headers, &config.cookie_name)
        .is_some_and(|token| is_valid_token(&token, &config.password))
}

/// Middleware rejecting requests without a valid session
pub async fn require_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    if !is_authenticated(request.headers(), &state.config().auth) {
        tracing::debug!("Rejected unauthenticated request to {}", request.uri().path());
        return Err(Error::Unauthorized(UNAUTHORIZED_MESSAGE.to_string()));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_token_round_trip() {
        let token = session_token("s3cret");
        assert!(is_valid_token(&token, "s3cret"));
        assert!(!is_valid_token(&token, "other"));
        assert!(!is_valid_token("not base64!", "s3cret"));

        let decoded = String::from_utf8(STANDARD.decode(&token).unwrap()).unwrap();
        let (password, millis) = decoded.rsplit_once('-').unwrap();
        assert_eq!(password, "s3cret");
        assert!(millis.parse::<i64>().is_ok());
    }

    #[test]
    fn test_cookie_attributes() {
        let mut config = AuthConfig::default();
        let cookie = session_cookie(&config, "abc=");
        assert_eq!(
            cookie,
            "pdf_extractor_session=abc=; Path=/; Max-Age=604800; HttpOnly; SameSite=Lax"
        );

        config.secure_cookie = true;
        assert!(session_cookie(&config, "abc").ends_with("; Secure"));
        assert!(expired_cookie(&config).contains("Max-Age=0"));
    }

    #[test]
    fn test_reads_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("a=1; pdf_extractor_session=dG9rZW4=; b=2"),
        );

        assert_eq!(
            cookie_value(&headers, "pdf_extractor_session").as_deref(),
            Some("dG9rZW4=")
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }
}
