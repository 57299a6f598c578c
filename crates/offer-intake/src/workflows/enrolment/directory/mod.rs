//! Agent directory with a TTL read-through cache.

mod search;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::clock::Clock;

pub use search::{
    countries, display_info, filter_by_country, find_by_value, format_for_select, search,
    validate_selection, AgentDisplayInfo, AgentOption, SelectionCheck,
};

pub const DEFAULT_DIRECTORY_TTL: Duration = Duration::from_secs(2 * 60);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Agent {
    pub name: String,
    pub contact: String,
    pub country: String,
    pub address: String,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub websites: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectorySnapshot {
    pub items: Vec<Agent>,
    pub updated_at: DateTime<Utc>,
    pub source: String,
}

impl DirectorySnapshot {
    /// Single-record directory served when nothing better is available.
    pub fn fallback(now: DateTime<Utc>) -> Self {
        Self {
            items: vec![Agent {
                name: "Origin Institute".to_string(),
                contact: "Admissions Office".to_string(),
                country: "Australia".to_string(),
                address: "Level 4, 696 Bourke Street, Melbourne VIC 3000".to_string(),
                emails: vec!["info@origininstitute.edu.au".to_string()],
                phones: vec!["+61 3 9642 0012".to_string()],
                websites: vec!["https://origininstitute.edu.au".to_string()],
            }],
            updated_at: now,
            source: "fallback".to_string(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("directory request failed: {0}")]
    Unavailable(String),
    #[error("directory responded with status {status}")]
    Status { status: u16 },
}

#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// `force_refresh` asks the remote side to bypass its own cache too.
    async fn fetch(&self, force_refresh: bool) -> Result<DirectorySnapshot, DirectoryError>;
}

/// Result of a cache read, tagged with where the data came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryResponse {
    pub snapshot: DirectorySnapshot,
    pub cached: bool,
    pub degraded: bool,
    pub error: Option<String>,
}

impl DirectoryResponse {
    pub fn is_fallback(&self) -> bool {
        self.snapshot.source == "fallback"
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: DirectorySnapshot,
    fetched_at: DateTime<Utc>,
}

pub struct DirectoryCache {
    source: Arc<dyn DirectorySource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entry: Mutex<Option<CacheEntry>>,
}

impl DirectoryCache {
    pub fn new(source: Arc<dyn DirectorySource>, clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(source, clock, DEFAULT_DIRECTORY_TTL)
    }

    pub fn with_ttl(source: Arc<dyn DirectorySource>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl,
            entry: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<CacheEntry>> {
        self.entry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fresh_entry(&self) -> Option<DirectorySnapshot> {
        let now = self.clock.now();
        let guard = self.lock();
        let entry = guard.as_ref()?;
        let age = now.signed_duration_since(entry.fetched_at).to_std().ok()?;
        (age < self.ttl).then(|| entry.snapshot.clone())
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    /// Read through the cache. A forced refresh drops the entry first and
    /// never answers with stale data.
    pub async fn get(&self, force_refresh: bool) -> DirectoryResponse {
        if force_refresh {
            info!("force refreshing agent directory");
            self.clear();
        } else if let Some(snapshot) = self.fresh_entry() {
            debug!(items = snapshot.items.len(), "agent directory served from cache");
            return DirectoryResponse {
                snapshot,
                cached: true,
                degraded: false,
                error: None,
            };
        }

        match self.source.fetch(force_refresh).await {
            Ok(snapshot) => {
                info!(
                    items = snapshot.items.len(),
                    source = %snapshot.source,
                    "agent directory fetched"
                );
                *self.lock() = Some(CacheEntry {
                    snapshot: snapshot.clone(),
                    fetched_at: self.clock.now(),
                });
                DirectoryResponse {
                    snapshot,
                    cached: false,
                    degraded: false,
                    error: None,
                }
            }
            Err(err) => {
                let stale = if force_refresh {
                    None
                } else {
                    self.lock().as_ref().map(|entry| entry.snapshot.clone())
                };
                match stale {
                    Some(snapshot) => {
                        warn!(error = %err, "agent directory fetch failed; serving stale entry");
                        DirectoryResponse {
                            snapshot,
                            cached: true,
                            degraded: true,
                            error: Some(err.to_string()),
                        }
                    }
                    None => {
                        warn!(error = %err, "agent directory fetch failed; serving fallback record");
                        DirectoryResponse {
                            snapshot: DirectorySnapshot::fallback(self.clock.now()),
                            cached: false,
                            degraded: true,
                            error: Some(err.to_string()),
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::enrolment::clock::FixedClock;
    use chrono::TimeZone;
    use std::collections::VecDeque;

    struct ScriptedDirectory {
        replies: Mutex<VecDeque<Result<DirectorySnapshot, DirectoryError>>>,
        calls: Mutex<Vec<bool>>,
    }

    impl ScriptedDirectory {
        fn new(replies: Vec<Result<DirectorySnapshot, DirectoryError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<bool> {
            self.calls.lock().expect("calls mutex").clone()
        }
    }

    #[async_trait]
    impl DirectorySource for ScriptedDirectory {
        async fn fetch(&self, force_refresh: bool) -> Result<DirectorySnapshot, DirectoryError> {
            self.calls.lock().expect("calls mutex").push(force_refresh);
            self.replies
                .lock()
                .expect("replies mutex")
                .pop_front()
                .unwrap_or_else(|| Err(DirectoryError::Unavailable("script exhausted".into())))
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).single().expect("valid time")
    }

    fn snapshot(name: &str) -> DirectorySnapshot {
        DirectorySnapshot {
            items: vec![Agent {
                name: name.to_string(),
                country: "India".to_string(),
                ..Agent::default()
            }],
            updated_at: start(),
            source: "sharepoint".to_string(),
        }
    }

    fn cache(
        replies: Vec<Result<DirectorySnapshot, DirectoryError>>,
    ) -> (DirectoryCache, Arc<ScriptedDirectory>, Arc<FixedClock>) {
        let source = Arc::new(ScriptedDirectory::new(replies));
        let clock = Arc::new(FixedClock::new(start()));
        let cache = DirectoryCache::new(source.clone(), clock.clone());
        (cache, source, clock)
    }

    #[tokio::test]
    async fn fresh_entry_is_served_without_fetching() {
        let (cache, source, clock) = cache(vec![Ok(snapshot("Acme"))]);

        let first = cache.get(false).await;
        assert!(!first.cached);

        clock.advance(chrono::Duration::seconds(90));
        let second = cache.get(false).await;
        assert!(second.cached);
        assert!(!second.degraded);
        assert_eq!(second.snapshot, first.snapshot);
        assert_eq!(source.calls(), vec![false]);
    }

    #[tokio::test]
    async fn expired_entry_survives_a_failed_refetch_as_degraded() {
        let (cache, _source, clock) = cache(vec![
            Ok(snapshot("Acme")),
            Err(DirectoryError::Status { status: 502 }),
        ]);

        cache.get(false).await;
        clock.advance(chrono::Duration::minutes(3));
        let response = cache.get(false).await;

        assert!(response.cached);
        assert!(response.degraded);
        assert_eq!(response.snapshot.items[0].name, "Acme");
        assert_eq!(response.snapshot.updated_at, start());
    }

    #[tokio::test]
    async fn first_failure_serves_the_fallback_record() {
        let (cache, _source, _clock) = cache(vec![Err(DirectoryError::Unavailable("dns".into()))]);

        let response = cache.get(false).await;

        assert!(response.is_fallback());
        assert_eq!(response.snapshot.items[0].name, "Origin Institute");
        assert!(response.error.is_some());
    }

    #[tokio::test]
    async fn forced_refresh_never_returns_stale_data() {
        let (cache, source, _clock) = cache(vec![
            Ok(snapshot("Acme")),
            Err(DirectoryError::Status { status: 500 }),
        ]);

        cache.get(false).await;
        let response = cache.get(true).await;

        assert!(response.is_fallback());
        assert!(!response.cached);
        assert_eq!(source.calls(), vec![false, true]);
    }

    #[tokio::test]
    async fn forced_refresh_replaces_the_entry() {
        let (cache, _source, _clock) = cache(vec![Ok(snapshot("Acme")), Ok(snapshot("Borealis"))]);

        cache.get(false).await;
        let refreshed = cache.get(true).await;
        assert_eq!(refreshed.snapshot.items[0].name, "Borealis");

        let cached = cache.get(false).await;
        assert!(cached.cached);
        assert_eq!(cached.snapshot.items[0].name, "Borealis");
    }
}
