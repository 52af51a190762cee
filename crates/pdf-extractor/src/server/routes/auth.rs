//! Session login endpoints

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};
use crate::server::auth::{expired_cookie, is_authenticated, session_cookie, session_token};
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    password: Option<String>,
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    body: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse> {
    let password = body
        .and_then(|Json(req)| req.password)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Error::validation("Password is required"))?;

    let auth = &state.config().auth;
    if password != auth.password {
        tracing::warn!("Failed login attempt");
        return Err(Error::Unauthorized("Invalid password".to_string()));
    }

    let cookie = session_cookie(auth, &session_token(&auth.password));
    Ok(([(header::SET_COOKIE, cookie)], Json(json!({ "success": true }))))
}

/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = expired_cookie(&state.config().auth);
    ([(header::SET_COOKIE, cookie)], Json(json!({ "success": true })))
}

/// GET /api/auth/check
pub async fn check(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let auth = &state.config().auth;
    let authenticated = !auth.enabled || is_authenticated(&headers, auth);
    Json(json!({ "authenticated": authenticated }))
}
