//! Session-scoped word resolution cache with single-flight lookups

use crate::error::GodwaError;
use crate::words::WordEntry;
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Remote source of word meanings (`GET /api/words/meaning?word=`).
pub trait WordLookup: Send + Sync + 'static {
    /// Zero or more matches for `key`, in server order.
    fn lookup(&self, key: &str) -> BoxFuture<'static, Result<Vec<WordEntry>, GodwaError>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionStatus {
    Pending,
    Found(WordEntry),
    NotFound,
}

impl ResolutionStatus {
    pub fn is_settled(&self) -> bool {
        !matches!(self, ResolutionStatus::Pending)
    }
}

#[derive(Debug, Clone)]
pub struct ResolutionEntry {
    pub key: String,
    pub status: ResolutionStatus,
    pub requested_at: DateTime<Utc>,
}

/// Cache counters, reported by `godwa lookup --stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    pub entries: usize,
    pub pending: usize,
    pub found: usize,
    pub not_found: usize,
    pub requests_issued: u64,
}

/// Handle on one resolution, returned by [`WordResolver::resolve`].
#[derive(Debug)]
pub struct Subscription {
    inner: SubscriptionInner,
}

#[derive(Debug)]
enum SubscriptionInner {
    Ready(ResolutionStatus),
    Watching(watch::Receiver<ResolutionEntry>),
}

impl Subscription {
    fn ready(status: ResolutionStatus) -> Self {
        Self {
            inner: SubscriptionInner::Ready(status),
        }
    }

    fn watching(rx: watch::Receiver<ResolutionEntry>) -> Self {
        Self {
            inner: SubscriptionInner::Watching(rx),
        }
    }

    /// Status right now, without waiting.
    pub fn current(&self) -> ResolutionStatus {
        match &self.inner {
            SubscriptionInner::Ready(status) => status.clone(),
            SubscriptionInner::Watching(rx) => rx.borrow().status.clone(),
        }
    }

    /// Wait until the lookup settles.
    ///
    /// Cancel-safe: dropping the future leaves the shared lookup running.
    pub async fn settled(&mut self) -> ResolutionStatus {
        match &mut self.inner {
            SubscriptionInner::Ready(status) => status.clone(),
            SubscriptionInner::Watching(rx) => loop {
                let status = rx.borrow_and_update().status.clone();
                if status.is_settled() {
                    return status;
                }
                if rx.changed().await.is_err() {
                    // resolver dropped mid-flight
                    return ResolutionStatus::NotFound;
                }
            },
        }
    }
}

type Slots = HashMap<String, watch::Sender<ResolutionEntry>>;

/// Resolves cleaned token keys to word entries.
///
/// Owns the per-session cache: one instance per mounted poem view, dropped
/// with it. Entries are never evicted during a session. Each key is looked
/// up at most once; callers arriving while a lookup is in flight subscribe
/// to the same result.
pub struct WordResolver<L: WordLookup> {
    lookup: Arc<L>,
    slots: Arc<Mutex<Slots>>,
    requests_issued: Arc<AtomicU64>,
}

impl<L: WordLookup> WordResolver<L> {
    pub fn new(lookup: Arc<L>) -> Self {
        Self {
            lookup,
            slots: Arc::new(Mutex::new(HashMap::new())),
            requests_issued: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start (or join) resolution of `key`.
    ///
    /// A `preloaded` entry is authoritative and returned as-is without
    /// touching the cache. Blank keys return `None` and never hit the network.
    pub fn resolve(&self, key: &str, preloaded: Option<&WordEntry>) -> Option<Subscription> {
        if let Some(entry) = preloaded {
            return Some(Subscription::ready(ResolutionStatus::Found(entry.clone())));
        }

        let key = key.trim();
        if key.is_empty() {
            return None;
        }

        let mut slots = self.slots.lock();
        if let Some(tx) = slots.get(key) {
            tracing::debug!(key, status = ?tx.borrow().status, "word cache hit");
            return Some(Subscription::watching(tx.subscribe()));
        }

        let (tx, rx) = watch::channel(ResolutionEntry {
            key: key.to_string(),
            status: ResolutionStatus::Pending,
            requested_at: Utc::now(),
        });
        slots.insert(key.to_string(), tx);
        drop(slots);

        self.spawn_lookup(key.to_string());
        Some(Subscription::watching(rx))
    }

    fn spawn_lookup(&self, key: String) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(key = %key, "no runtime for word lookup: {}", e);
                store(&self.slots, &key, ResolutionStatus::NotFound);
                return;
            }
        };

        self.requests_issued.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key = %key, "word lookup issued");

        let request = self.lookup.lookup(&key);
        let slots = Arc::clone(&self.slots);
        handle.spawn(async move {
            let status = match request.await {
                Ok(matches) => match matches.into_iter().next() {
                    Some(entry) => ResolutionStatus::Found(entry),
                    None => ResolutionStatus::NotFound,
                },
                Err(e) => {
                    tracing::warn!(key = %key, "word lookup failed: {}", e);
                    ResolutionStatus::NotFound
                }
            };
            store(&slots, &key, status);
        });
    }

    /// Snapshot of the cache entry for `key`, if one exists.
    pub fn entry(&self, key: &str) -> Option<ResolutionEntry> {
        self.slots.lock().get(key.trim()).map(|tx| tx.borrow().clone())
    }

    pub fn stats(&self) -> ResolverStats {
        let slots = self.slots.lock();
        let mut stats = ResolverStats {
            entries: slots.len(),
            requests_issued: self.requests_issued.load(Ordering::Relaxed),
            ..ResolverStats::default()
        };
        for tx in slots.values() {
            match tx.borrow().status {
                ResolutionStatus::Pending => stats.pending += 1,
                ResolutionStatus::Found(_) => stats.found += 1,
                ResolutionStatus::NotFound => stats.not_found += 1,
            }
        }
        stats
    }
}

/// Completion write. Unconditional: display state is not consulted, and the
/// last completion for a key wins.
fn store(slots: &Mutex<Slots>, key: &str, status: ResolutionStatus) {
    let slots = slots.lock();
    if let Some(tx) = slots.get(key) {
        tx.send_modify(|entry| entry.status = status);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Test double for the meaning endpoint.
    pub(crate) struct FakeLookup {
        pub calls: AtomicUsize,
        pub delay: Duration,
        pub fail: bool,
        pub words: Vec<WordEntry>,
    }

    impl FakeLookup {
        pub(crate) fn new(delay_ms: u64, words: Vec<WordEntry>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay: Duration::from_millis(delay_ms),
                fail: false,
                words,
            })
        }

        pub(crate) fn failing(delay_ms: u64) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay: Duration::from_millis(delay_ms),
                fail: true,
                words: Vec::new(),
            })
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl WordLookup for FakeLookup {
        fn lookup(&self, key: &str) -> BoxFuture<'static, Result<Vec<WordEntry>, GodwaError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = self.delay;
            let fail = self.fail;
            let key = key.to_string();
            let matches: Vec<WordEntry> = self
                .words
                .iter()
                .filter(|w| w.devnagri == key)
                .cloned()
                .collect();
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                if fail {
                    Err(GodwaError::Network("connection reset".into()))
                } else {
                    Ok(matches)
                }
            })
        }
    }

    pub(crate) fn word(id: i64, devnagri: &str, definition: &str) -> WordEntry {
        let mut entry = WordEntry::new(id, devnagri);
        entry.definition_primary = Some(definition.to_string());
        entry
    }

    #[tokio::test(start_paused = true)]
    async fn test_preloaded_short_circuits() {
        let lookup = FakeLookup::new(10, vec![]);
        let resolver = WordResolver::new(lookup.clone());
        let preloaded = word(1, "राम", "भगवान राम");

        let sub = resolver.resolve("राम", Some(&preloaded)).unwrap();
        assert_eq!(sub.current(), ResolutionStatus::Found(preloaded));
        assert_eq!(lookup.calls(), 0);
        assert!(resolver.entry("राम").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_preloaded_wins_over_cached_state() {
        let lookup = FakeLookup::new(10, vec![]);
        let resolver = WordResolver::new(lookup.clone());
        let preloaded = word(2, "मन", "चित्त");

        let mut sub = resolver.resolve("मन", None).unwrap();
        assert_eq!(sub.settled().await, ResolutionStatus::NotFound);
        assert_eq!(lookup.calls(), 1);

        let sub = resolver.resolve("मन", Some(&preloaded)).unwrap();
        assert_eq!(sub.current(), ResolutionStatus::Found(preloaded.clone()));
        assert_eq!(lookup.calls(), 1);
        assert_eq!(
            resolver.entry("मन").map(|e| e.status),
            Some(ResolutionStatus::NotFound)
        );

        // same while a lookup is still in flight
        let slow = FakeLookup::new(5000, vec![]);
        let resolver = WordResolver::new(slow.clone());
        resolver.resolve("मन", None).unwrap();
        let sub = resolver.resolve("मन", Some(&preloaded)).unwrap();
        assert_eq!(sub.current(), ResolutionStatus::Found(preloaded));
        assert_eq!(slow.calls(), 1);
        assert_eq!(
            resolver.entry("मन").map(|e| e.status),
            Some(ResolutionStatus::Pending)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_key_never_requests() {
        let lookup = FakeLookup::new(10, vec![]);
        let resolver = WordResolver::new(lookup.clone());
        assert!(resolver.resolve("   ", None).is_none());
        assert!(resolver.resolve("", None).is_none());
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_flight() {
        let lookup = FakeLookup::new(200, vec![word(7, "मन", "चित्त")]);
        let resolver = WordResolver::new(lookup.clone());

        let mut subs: Vec<Subscription> =
            (0..5).map(|_| resolver.resolve("मन", None).unwrap()).collect();
        assert!(subs.iter().all(|s| s.current() == ResolutionStatus::Pending));

        let results =
            futures_util::future::join_all(subs.iter_mut().map(|s| s.settled())).await;
        assert_eq!(lookup.calls(), 1);
        for status in results {
            assert_eq!(status, ResolutionStatus::Found(word(7, "मन", "चित्त")));
        }
        assert_eq!(resolver.stats().requests_issued, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_entries_are_served_from_cache() {
        let lookup = FakeLookup::new(500, vec![]);
        let resolver = WordResolver::new(lookup.clone());

        let mut sub = resolver.resolve("गेला", None).unwrap();
        assert_eq!(sub.settled().await, ResolutionStatus::NotFound);

        let again = resolver.resolve("गेला", None).unwrap();
        assert_eq!(again.current(), ResolutionStatus::NotFound);
        assert_eq!(lookup.calls(), 1);

        let stats = resolver.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.not_found, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_not_found() {
        let lookup = FakeLookup::failing(50);
        let resolver = WordResolver::new(lookup.clone());

        let mut sub = resolver.resolve("प्रेम", None).unwrap();
        assert_eq!(sub.settled().await, ResolutionStatus::NotFound);
        assert_eq!(
            resolver.entry("प्रेम").map(|e| e.status),
            Some(ResolutionStatus::NotFound)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_server_result_wins() {
        let lookup = FakeLookup::new(
            10,
            vec![word(1, "कर", "हात"), word(2, "कर", "कर भरणे")],
        );
        let resolver = WordResolver::new(lookup);

        let mut sub = resolver.resolve("कर", None).unwrap();
        match sub.settled().await {
            ResolutionStatus::Found(entry) => assert_eq!(entry.id, 1),
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_fills_after_subscriber_dropped() {
        let lookup = FakeLookup::new(100, vec![word(3, "फूल", "पुष्प")]);
        let resolver = WordResolver::new(lookup.clone());

        drop(resolver.resolve("फूल", None));
        tokio::time::sleep(Duration::from_millis(150)).await;

        let entry = resolver.entry("फूल").unwrap();
        assert!(matches!(entry.status, ResolutionStatus::Found(_)));
        assert_eq!(lookup.calls(), 1);
    }

    #[test]
    fn test_no_runtime_degrades_to_not_found() {
        let lookup = FakeLookup::new(10, vec![]);
        let resolver = WordResolver::new(lookup.clone());
        let sub = resolver.resolve("राम", None).unwrap();
        assert_eq!(sub.current(), ResolutionStatus::NotFound);
        assert_eq!(lookup.calls(), 0);
    }
}
