// Library exports for the site binary and tests
pub mod config;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use services::{cache::NewsCache, session::SessionStore, store::RemoteStore};

/// Application state shared across all handlers. Config is consumed at
/// startup; only the objects built from it ride along.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RemoteStore>,
    pub cache: Arc<NewsCache>,
    pub sessions: Arc<SessionStore>,
}
