use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    middleware::auth::AdminAuth,
    models::news::{NewsForm, NewsItem},
    services::{session::SESSION_COOKIE, store::StoreError},
    AppState,
};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// Build a JSON response, optionally opening or clearing the session cookie.
fn json_response_with_session(body: &Value, cookie: Option<String>) -> Response {
    let body_str = serde_json::to_string(body).unwrap_or_default();
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::SET_COOKIE, cookie);
    }
    builder.body(Body::from(body_str)).unwrap()
}

fn open_session_cookie(token: &str) -> String {
    // No Max-Age: the session lives only as long as the browser does.
    format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/")
}

fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

/// POST /admin/api/login — forwards the password to the store's login
/// action. Success opens a server-side session and sets the cookie.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, (StatusCode, Json<Value>)> {
    if body.password.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "パスワードを入力してください" })),
        ));
    }

    match state.store.login(&body.password).await {
        Ok(()) => {
            let token = state.sessions.open(body.password).await;
            Ok(json_response_with_session(
                &json!({ "ok": true }),
                Some(open_session_cookie(&token)),
            ))
        }
        Err(StoreError::Unauthorized) => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "パスワードが正しくありません" })),
        )),
        Err(e) => {
            tracing::error!("admin login failed: {e}");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "ログインに失敗しました" })),
            ))
        }
    }
}

/// POST /admin/api/logout — ends the session and clears the cookie.
pub async fn logout(State(state): State<AppState>, auth: AdminAuth) -> Response {
    state.sessions.close(&auth.token).await;
    json_response_with_session(&json!({ "ok": true }), Some(clear_session_cookie()))
}

/// GET /admin/api/news — full list, uncached and unfiltered, so the admin
/// sees out-of-window items too.
pub async fn list_news(
    State(state): State<AppState>,
    _auth: AdminAuth,
) -> Result<Json<Vec<NewsItem>>, (StatusCode, Json<Value>)> {
    match state.store.fetch_all().await {
        Ok(items) => {
            for item in items.iter().filter(|i| i.id.is_none()) {
                tracing::warn!(
                    title = %item.title,
                    "news row without a store id; it cannot be edited or deleted"
                );
            }
            Ok(Json(items))
        }
        Err(e) => {
            tracing::error!("admin news list failed: {e}");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "お知らせの取得に失敗しました" })),
            ))
        }
    }
}

/// POST /admin/api/news
pub async fn create_news(
    State(state): State<AppState>,
    auth: AdminAuth,
    Json(form): Json<NewsForm>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    require_title(&form)?;

    match state.store.create(&auth.password, &form).await {
        Ok(()) => {
            state.cache.invalidate().await;
            Ok(Json(json!({ "ok": true })))
        }
        Err(e) => Err(write_failure(&state, &auth, "投稿に失敗しました", e).await),
    }
}

/// PUT /admin/api/news/{id}
pub async fn update_news(
    State(state): State<AppState>,
    auth: AdminAuth,
    Path(id): Path<String>,
    Json(form): Json<NewsForm>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    require_title(&form)?;

    match state.store.update(&auth.password, &id, &form).await {
        Ok(()) => {
            state.cache.invalidate().await;
            Ok(Json(json!({ "ok": true })))
        }
        Err(e) => Err(write_failure(&state, &auth, "更新に失敗しました", e).await),
    }
}

/// DELETE /admin/api/news/{id} — the admin page confirms with the user
/// before this request is ever issued.
pub async fn delete_news(
    State(state): State<AppState>,
    auth: AdminAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.store.delete(&auth.password, &id).await {
        Ok(()) => {
            state.cache.invalidate().await;
            Ok(Json(json!({ "ok": true })))
        }
        Err(e) => Err(write_failure(&state, &auth, "削除に失敗しました", e).await),
    }
}

/// Title is the only required field; checked before any store call.
fn require_title(form: &NewsForm) -> Result<(), (StatusCode, Json<Value>)> {
    if form.title.trim().is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "タイトルを入力してください" })),
        ));
    }
    Ok(())
}

/// Unauthorized forces a logout; anything else keeps the session and
/// surfaces the generic message for the attempted operation.
async fn write_failure(
    state: &AppState,
    auth: &AdminAuth,
    fallback: &str,
    err: StoreError,
) -> (StatusCode, Json<Value>) {
    match err {
        StoreError::Unauthorized => {
            state.sessions.close(&auth.token).await;
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "セッションの有効期限が切れました。再度ログインしてください" })),
            )
        }
        e => {
            tracing::error!("news write failed: {e}");
            (StatusCode::BAD_GATEWAY, Json(json!({ "error": fallback })))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use std::time::Duration;

    use axum::routing::post;
    use axum::Router;

    use super::*;
    use crate::services::{cache::NewsCache, session::SessionStore, store::RemoteStore};

    /// State wired to a stub store that always answers Unauthorized and
    /// counts the requests it sees.
    async fn stub_state(hits: Arc<AtomicUsize>) -> AppState {
        let router = Router::new().route(
            "/",
            post(move |_body: String| {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!({ "error": "Unauthorized" }))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        AppState {
            store: Arc::new(RemoteStore::new(format!("http://{addr}"))),
            cache: Arc::new(NewsCache::new(Duration::from_secs(900))),
            sessions: Arc::new(SessionStore::new()),
        }
    }

    fn form(title: &str) -> NewsForm {
        serde_json::from_value(json!({ "date": "2024-06-01", "title": title })).unwrap()
    }

    #[tokio::test]
    async fn empty_title_never_reaches_the_store() {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = stub_state(hits.clone()).await;
        let token = state.sessions.open("pw".to_string()).await;
        let auth = AdminAuth {
            token,
            password: "pw".to_string(),
        };

        let result = create_news(State(state), auth, Json(form("   "))).await;

        let (status, _) = result.expect_err("blank title must be rejected");
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unauthorized_write_closes_the_session() {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = stub_state(hits).await;
        let token = state.sessions.open("stale-pw".to_string()).await;
        let auth = AdminAuth {
            token: token.clone(),
            password: "stale-pw".to_string(),
        };

        let result = create_news(State(state.clone()), auth, Json(form("A"))).await;

        let (status, _) = result.expect_err("store said Unauthorized");
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(state.sessions.password_for(&token).await, None);
    }

    #[tokio::test]
    async fn empty_login_password_is_rejected_locally() {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = stub_state(hits.clone()).await;

        let result = login(
            State(state),
            Json(LoginRequest {
                password: "  ".to_string(),
            }),
        )
        .await;

        let (status, _) = result.expect_err("blank password must be rejected");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn wrong_password_does_not_open_a_session() {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = stub_state(hits).await;

        let result = login(
            State(state),
            Json(LoginRequest {
                password: "wrong".to_string(),
            }),
        )
        .await;

        let (status, _) = result.expect_err("stub store rejects every password");
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
