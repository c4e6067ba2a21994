use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::models::news::NewsItem;
use crate::services::store::NewsBackend;

struct CacheSlot {
    data: Vec<NewsItem>,
    fetched_at: Instant,
}

impl CacheSlot {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Single-slot, time-boxed cache in front of the announcement store.
///
/// The slot is overwritten on every successful fetch, cleared after every
/// successful mutation, and implicitly stale once the TTL has passed.
pub struct NewsCache {
    slot: RwLock<Option<CacheSlot>>,
    fetch_lock: Mutex<()>,
    ttl: Duration,
}

impl NewsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: RwLock::new(None),
            fetch_lock: Mutex::new(()),
            ttl,
        }
    }

    /// Cached read. Never fails: a fetch error falls back to the stale slot
    /// if one exists, otherwise the list is reported empty — the public site
    /// shows "no announcements" rather than an error.
    pub async fn get_or_fetch<B: NewsBackend>(&self, backend: &B) -> Vec<NewsItem> {
        if let Some(slot) = self.slot.read().await.as_ref() {
            if slot.is_fresh(self.ttl) {
                return slot.data.clone();
            }
        }

        // One authoritative fetch at a time; latecomers re-check the slot
        // once the winner has refilled it.
        let _guard = self.fetch_lock.lock().await;
        if let Some(slot) = self.slot.read().await.as_ref() {
            if slot.is_fresh(self.ttl) {
                return slot.data.clone();
            }
        }

        match backend.list().await {
            Ok(data) => {
                *self.slot.write().await = Some(CacheSlot {
                    data: data.clone(),
                    fetched_at: Instant::now(),
                });
                data
            }
            Err(e) => {
                tracing::error!("news fetch failed: {e}");
                match self.slot.read().await.as_ref() {
                    Some(slot) => slot.data.clone(),
                    None => Vec::new(),
                }
            }
        }
    }

    /// Drops the slot so the next read re-fetches. Called after every
    /// successful create/update/delete.
    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::NaiveDate;
    use tokio::sync::Notify;

    use super::*;
    use crate::services::store::StoreError;

    const TTL: Duration = Duration::from_secs(15 * 60);

    struct MockBackend {
        items: Vec<NewsItem>,
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    impl MockBackend {
        fn new(items: Vec<NewsItem>) -> Self {
            Self {
                items,
                calls: AtomicUsize::new(0),
                failing: AtomicBool::new(false),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl NewsBackend for MockBackend {
        async fn list(&self) -> Result<Vec<NewsItem>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                Err(StoreError::Malformed("stub failure".into()))
            } else {
                Ok(self.items.clone())
            }
        }
    }

    fn item(title: &str) -> NewsItem {
        NewsItem {
            id: Some(title.to_string()),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            title: title.to_string(),
            title_color: None,
            content: String::new(),
            start_date: None,
            end_date: None,
            default_expanded: false,
            created_at: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_slot_skips_the_backend() {
        let backend = MockBackend::new(vec![item("a")]);
        let cache = NewsCache::new(TTL);

        let first = cache.get_or_fetch(&backend).await;
        tokio::time::advance(Duration::from_secs(14 * 60)).await;
        let second = cache.get_or_fetch(&backend).await;

        assert_eq!(first, second);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_slot_refetches() {
        let backend = MockBackend::new(vec![item("a")]);
        let cache = NewsCache::new(TTL);

        cache.get_or_fetch(&backend).await;
        tokio::time::advance(Duration::from_secs(16 * 60)).await;
        cache.get_or_fetch(&backend).await;

        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_forces_a_refetch() {
        let backend = MockBackend::new(vec![item("a")]);
        let cache = NewsCache::new(TTL);

        cache.get_or_fetch(&backend).await;
        cache.invalidate().await;
        cache.get_or_fetch(&backend).await;

        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_serves_the_stale_slot() {
        let backend = MockBackend::new(vec![item("a")]);
        let cache = NewsCache::new(TTL);

        let first = cache.get_or_fetch(&backend).await;
        tokio::time::advance(Duration::from_secs(16 * 60)).await;
        backend.failing.store(true, Ordering::SeqCst);
        let second = cache.get_or_fetch(&backend).await;

        assert_eq!(first, second);
        assert_eq!(backend.calls(), 2);
    }

    /// Backend that parks inside `list` until the gate opens, so the test
    /// can hold a fetch in flight.
    struct GatedBackend {
        items: Vec<NewsItem>,
        calls: AtomicUsize,
        gate: Notify,
    }

    impl NewsBackend for GatedBackend {
        async fn list(&self) -> Result<Vec<NewsItem>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(self.items.clone())
        }
    }

    #[tokio::test]
    async fn concurrent_misses_coalesce_into_one_fetch() {
        let backend = Arc::new(GatedBackend {
            items: vec![item("a")],
            calls: AtomicUsize::new(0),
            gate: Notify::new(),
        });
        let cache = Arc::new(NewsCache::new(TTL));

        let first = tokio::spawn({
            let (backend, cache) = (backend.clone(), cache.clone());
            async move { cache.get_or_fetch(backend.as_ref()).await }
        });
        // First caller is inside the backend before the second one starts.
        while backend.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        let second = tokio::spawn({
            let (backend, cache) = (backend.clone(), cache.clone());
            async move { cache.get_or_fetch(backend.as_ref()).await }
        });
        // Let the second caller queue up on the fetch lock, then open the gate.
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
        backend.gate.notify_one();

        let a = first.await.unwrap();
        let b = second.await.unwrap();
        assert_eq!(a, b);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_with_no_slot_reports_empty() {
        let backend = MockBackend::new(vec![item("a")]);
        backend.failing.store(true, Ordering::SeqCst);
        let cache = NewsCache::new(TTL);

        assert!(cache.get_or_fetch(&backend).await.is_empty());
    }
}
