use std::{sync::Arc, time::Duration};

use axum::{
    routing::{get, post, put},
    Extension, Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use minami_clinic_site::{
    config::Config,
    routes,
    services::{cache::NewsCache, session::SessionStore, store::RemoteStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store = Arc::new(RemoteStore::new(config.news_store_url.clone()));
    let cache = Arc::new(NewsCache::new(Duration::from_secs(config.cache_ttl_seconds)));
    let sessions = Arc::new(SessionStore::new());

    let state = AppState {
        store,
        cache,
        sessions: sessions.clone(),
    };

    let app = Router::new()
        // Public pages
        .route("/", get(routes::pages::home))
        .route("/about", get(routes::pages::about))
        .route("/treatment", get(routes::pages::treatment))
        .route("/first-visit", get(routes::pages::first_visit))
        .route("/admin", get(routes::pages::admin))
        .route("/health", get(routes::health::health_check))
        // Public news API
        .route("/api/news", get(routes::news::list_visible))
        // Admin API
        .route("/admin/api/login", post(routes::admin::login))
        .route("/admin/api/logout", post(routes::admin::logout))
        .route(
            "/admin/api/news",
            get(routes::admin::list_news).post(routes::admin::create_news),
        )
        .route(
            "/admin/api/news/{id}",
            put(routes::admin::update_news).delete(routes::admin::delete_news),
        )
        .layer(Extension(sessions))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("clinic site listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
