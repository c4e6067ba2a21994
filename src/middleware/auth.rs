use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};

use crate::services::session::{SessionStore, SESSION_COOKIE};

/// Extract a named cookie value from request headers.
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|part| {
            let part = part.trim();
            if part.starts_with(&prefix) {
                Some(part[prefix.len()..].to_string())
            } else {
                None
            }
        })
}

/// An authenticated admin request: the session token plus the store
/// password it carries. Rejects with 401 when the session cookie is
/// missing or no longer backed by an open session.
pub struct AdminAuth {
    pub token: String,
    pub password: String,
}

impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let sessions = parts
            .extensions
            .get::<Arc<SessionStore>>()
            .cloned()
            .ok_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "session store not configured" })),
            ))?;

        let token = get_cookie(&parts.headers, SESSION_COOKIE).ok_or_else(unauthenticated)?;
        let password = sessions
            .password_for(&token)
            .await
            .ok_or_else(unauthenticated)?;

        Ok(AdminAuth { token, password })
    }
}

fn unauthenticated() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "ログインしてください" })),
    )
}
