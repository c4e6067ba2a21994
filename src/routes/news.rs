use axum::{extract::State, Json};
use chrono::Utc;

use crate::{models::news::NewsItem, services::visibility::visible_on, AppState};

/// GET /api/news — public, cached, narrowed to the items whose publish
/// window covers today. Never errors: a failed fetch degrades to the stale
/// cache or an empty list inside the cache layer.
pub async fn list_visible(State(state): State<AppState>) -> Json<Vec<NewsItem>> {
    let items = state.cache.get_or_fetch(state.store.as_ref()).await;
    // UTC calendar date, matching what the store's date strings are in.
    let today = Utc::now().date_naive();
    Json(visible_on(items, today))
}
