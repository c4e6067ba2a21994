use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// Endpoint of the spreadsheet-backed announcement store.
    pub news_store_url: String,
    pub host: String,
    pub port: u16,
    /// How long a fetched announcement list stays fresh.
    pub cache_ttl_seconds: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            news_store_url: required("NEWS_STORE_URL")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            cache_ttl_seconds: env::var("CACHE_TTL_SECONDS")
                .unwrap_or_else(|_| "900".into())
                .parse()?,
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}
