use reqwest::{header, Client};
use serde_json::{json, Value};

use crate::models::news::{NewsForm, NewsItem, RawNewsItem};

/// Failures talking to the announcement store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store answered `{"error": "Unauthorized"}`.
    #[error("unauthorized")]
    Unauthorized,
    #[error("malformed response from the news store: {0}")]
    Malformed(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Listing side of the store, split out so the cache can be exercised
/// against a test double.
pub trait NewsBackend: Send + Sync {
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<NewsItem>, StoreError>> + Send;
}

/// HTTP client for the spreadsheet-backed announcement store.
///
/// The store speaks a single endpoint: GET returns the full row list, POST
/// takes `{action, password, ...fields, id?}` and answers either the result
/// or `{"error": "Unauthorized"}`. There is no status-code contract; the
/// error signal lives in the body.
pub struct RemoteStore {
    client: Client,
    endpoint: String,
}

impl RemoteStore {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    /// Full, unfiltered row list. Every row must coerce into a `NewsItem`;
    /// one bad row fails the whole read.
    pub async fn fetch_all(&self) -> Result<Vec<NewsItem>, StoreError> {
        let body = self
            .client
            .get(&self.endpoint)
            .send()
            .await?
            .text()
            .await?;
        let rows: Vec<RawNewsItem> = serde_json::from_str(&body)
            .map_err(|e| StoreError::Malformed(format!("expected a JSON array: {e}")))?;
        rows.into_iter()
            .map(|raw| NewsItem::try_from(raw).map_err(StoreError::Malformed))
            .collect()
    }

    /// Validates the admin password against the store.
    pub async fn login(&self, password: &str) -> Result<(), StoreError> {
        self.post(json!({ "action": "login", "password": password }))
            .await
            .map(|_| ())
    }

    pub async fn create(&self, password: &str, form: &NewsForm) -> Result<(), StoreError> {
        let mut body = form.to_store_fields();
        body["action"] = "create".into();
        body["password"] = password.into();
        self.post(body).await.map(|_| ())
    }

    pub async fn update(&self, password: &str, id: &str, form: &NewsForm) -> Result<(), StoreError> {
        let mut body = form.to_store_fields();
        body["action"] = "update".into();
        body["id"] = id.into();
        body["password"] = password.into();
        self.post(body).await.map(|_| ())
    }

    pub async fn delete(&self, password: &str, id: &str) -> Result<(), StoreError> {
        self.post(json!({ "action": "delete", "id": id, "password": password }))
            .await
            .map(|_| ())
    }

    // The endpoint only accepts simple cross-origin requests, so the JSON
    // body is declared as plain text.
    async fn post(&self, body: Value) -> Result<Value, StoreError> {
        let text = self
            .client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "text/plain")
            .body(body.to_string())
            .send()
            .await?
            .text()
            .await?;
        let value: Value =
            serde_json::from_str(&text).map_err(|e| StoreError::Malformed(e.to_string()))?;
        if value.get("error").and_then(Value::as_str) == Some("Unauthorized") {
            return Err(StoreError::Unauthorized);
        }
        Ok(value)
    }
}

impl NewsBackend for RemoteStore {
    async fn list(&self) -> Result<Vec<NewsItem>, StoreError> {
        self.fetch_all().await
    }
}
