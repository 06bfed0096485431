// crates/server/src/context_cache.rs
//! In-process TTL cache of dashboard snapshots, keyed by chat session id.
//!
//! The dashboard stores what a user is looking at; the chat feature reads it
//! back to ground its answers. Entries expire `ttl` after they are written.
//! Reads never extend the lifetime.
//!
//! Expired entries are removed in three ways: lazily when read, by
//! [`SessionContextCache::sweep`], and by an optional periodic sweep started
//! with [`SessionContextCache::start`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use trial_view_types::DashboardContext;
use ts_rs::TS;

use crate::metrics::{record_cache_evictions, record_cache_size};

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-advanced clock for tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let delta = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::MAX);
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Lifetime of an entry, measured from its last write.
    pub ttl: Duration,
    /// Period of the background sweep started by [`SessionContextCache::start`].
    pub sweep_interval: Duration,
    /// `put` runs a sweep first when the cache holds more than this many entries.
    /// Not a hard limit: live entries are never evicted to make room.
    pub soft_capacity: usize,
}

impl CacheConfig {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);
    pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);
    pub const DEFAULT_SOFT_CAPACITY: usize = 1000;
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Self::DEFAULT_TTL,
            sweep_interval: Self::DEFAULT_SWEEP_INTERVAL,
            soft_capacity: Self::DEFAULT_SOFT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    /// An entry is still visible at exactly `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Counts computed by a full scan; nothing is removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    #[ts(type = "number")]
    pub total: usize,
    #[ts(type = "number")]
    pub active: usize,
    #[ts(type = "number")]
    pub expired: usize,
}

pub struct SessionContextCache<V = DashboardContext> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl<V: Clone + Send + 'static> SessionContextCache<V> {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            config,
            clock,
        }
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let ttl = chrono::Duration::from_std(self.config.ttl).unwrap_or(chrono::Duration::MAX);
        now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Store `value` for `session_id`, replacing any previous entry.
    pub fn put(&self, session_id: &str, value: V) {
        if self.len() > self.config.soft_capacity {
            let removed = self.sweep();
            tracing::debug!(removed, "Capacity sweep before insert");
        }

        let now = self.clock.now();
        let entry = CacheEntry {
            value,
            created_at: now,
            expires_at: self.expiry_from(now),
        };

        let mut entries = self.lock();
        entries.insert(session_id.to_string(), entry);
        record_cache_size(entries.len());
    }

    /// Return a copy of the live entry. An expired entry is removed and `None` returned.
    pub fn get(&self, session_id: &str) -> Option<V> {
        self.get_entry(session_id).map(|entry| entry.value)
    }

    fn get_entry(&self, session_id: &str) -> Option<CacheEntry<V>> {
        let now = self.clock.now();
        let mut entries = self.lock();
        let entry = entries.get(session_id)?;
        if !entry.is_expired(now) {
            return Some(entry.clone());
        }

        entries.remove(session_id);
        record_cache_evictions(1);
        record_cache_size(entries.len());
        None
    }

    /// Remove the entry. Returns whether anything was removed.
    pub fn delete(&self, session_id: &str) -> bool {
        let mut entries = self.lock();
        let removed = entries.remove(session_id).is_some();
        record_cache_size(entries.len());
        removed
    }

    /// Minutes since the live entry was written.
    pub fn age(&self, session_id: &str) -> Option<f64> {
        let entry = self.get_entry(session_id)?;
        let elapsed = self.clock.now() - entry.created_at;
        Some(elapsed.num_milliseconds().max(0) as f64 / 60_000.0)
    }

    /// Remove every expired entry, returning how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();

        record_cache_evictions(removed);
        record_cache_size(entries.len());
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let entries = self.lock();
        let expired = entries.values().filter(|e| e.is_expired(now)).count();
        CacheStats {
            total: entries.len(),
            active: entries.len() - expired,
            expired,
        }
    }

    /// Entries held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawn the periodic sweep on the current tokio runtime.
    ///
    /// The first sweep runs one interval after the call. The task runs until
    /// the returned handle is stopped or dropped.
    pub fn start(self: &Arc<Self>) -> SweepHandle {
        let cache = Arc::clone(self);
        let period = self.config.sweep_interval.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let removed = cache.sweep();
                if removed > 0 {
                    tracing::info!(removed, remaining = cache.len(), "Swept expired session contexts");
                }
            }
        });

        tracing::debug!(interval_secs = period.as_secs(), "Context cache sweep started");
        SweepHandle { task: Some(task) }
    }
}

/// Owns the periodic sweep task.
#[derive(Debug)]
pub struct SweepHandle {
    task: Option<JoinHandle<()>>,
}

impl SweepHandle {
    /// Stop the sweep. Calling it again is a no-op.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("Context cache sweep stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use trial_view_types::{DashboardRole, KpiSummary, MetricFilters};

    const TTL: Duration = Duration::from_secs(15 * 60);

    fn cache_with_clock(soft_capacity: usize) -> (SessionContextCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let config = CacheConfig {
            ttl: TTL,
            sweep_interval: Duration::from_secs(300),
            soft_capacity,
        };
        (SessionContextCache::with_clock(config, clock.clone()), clock)
    }

    fn snapshot(study: &str) -> DashboardContext {
        DashboardContext {
            filters: MetricFilters::all().with_study(study),
            role: DashboardRole::Cra,
            generated_at: "2026-03-01T10:00:00Z".to_string(),
            kpis: KpiSummary {
                total_subjects: 12,
                open_queries: 4,
                avg_dqi: 81.5,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_put_then_get_returns_equal_context() {
        let (cache, _clock) = cache_with_clock(1000);
        let ctx = snapshot("Study 1");

        cache.put("s1", ctx.clone());
        assert_eq!(cache.get("s1"), Some(ctx));
        assert_eq!(cache.get("other"), None);
    }

    #[test]
    fn test_put_overwrites_and_resets_lifetime() {
        let (cache, clock) = cache_with_clock(1000);

        cache.put("s1", snapshot("Study 1"));
        clock.advance(Duration::from_secs(10 * 60));
        cache.put("s1", snapshot("Study 2"));
        clock.advance(Duration::from_secs(10 * 60));

        let ctx = cache.get("s1").expect("rewritten entry is still live");
        assert_eq!(ctx.filters.study.as_deref(), Some("Study 2"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_entry_visible_until_ttl_then_expired() {
        let (cache, clock) = cache_with_clock(1000);
        cache.put("s1", snapshot("Study 1"));

        clock.advance(TTL);
        assert!(cache.get("s1").is_some(), "visible at exactly the TTL");

        clock.advance(Duration::from_secs(1));
        assert_eq!(
            cache.stats(),
            CacheStats {
                total: 1,
                active: 0,
                expired: 1
            }
        );
        assert_eq!(cache.get("s1"), None);
        assert_eq!(cache.stats(), CacheStats::default(), "lazy read removed it");
    }

    #[test]
    fn test_get_does_not_refresh_ttl() {
        let (cache, clock) = cache_with_clock(1000);
        cache.put("s1", snapshot("Study 1"));

        clock.advance(Duration::from_secs(14 * 60));
        assert!(cache.get("s1").is_some());
        clock.advance(Duration::from_secs(2 * 60));
        assert!(cache.get("s1").is_none());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (cache, _clock) = cache_with_clock(1000);
        cache.put("s1", snapshot("Study 1"));

        assert!(cache.delete("s1"));
        assert!(!cache.delete("s1"));
        assert!(!cache.delete("never-stored"));
        assert_eq!(cache.get("s1"), None);
    }

    #[test]
    fn test_age_in_minutes() {
        let (cache, clock) = cache_with_clock(1000);
        cache.put("s1", snapshot("Study 1"));

        assert_eq!(cache.age("s1"), Some(0.0));
        clock.advance(Duration::from_secs(90));
        assert_eq!(cache.age("s1"), Some(1.5));
        assert_eq!(cache.age("missing"), None);

        clock.advance(TTL);
        assert_eq!(cache.age("s1"), None, "expired entries have no age");
    }

    #[test]
    fn test_sweep_twice_removes_nothing_the_second_time() {
        let (cache, clock) = cache_with_clock(1000);
        cache.put("old-1", snapshot("Study 1"));
        cache.put("old-2", snapshot("Study 1"));
        clock.advance(Duration::from_secs(10 * 60));
        cache.put("fresh", snapshot("Study 2"));
        clock.advance(Duration::from_secs(6 * 60));

        assert_eq!(cache.sweep(), 2);
        assert_eq!(cache.sweep(), 0);
        assert_eq!(
            cache.stats(),
            CacheStats {
                total: 1,
                active: 1,
                expired: 0
            }
        );
    }

    #[test]
    fn test_put_over_capacity_sweeps_expired_first() {
        let (cache, clock) = cache_with_clock(3);
        cache.put("old-1", snapshot("Study 1"));
        cache.put("old-2", snapshot("Study 1"));
        clock.advance(TTL + Duration::from_secs(1));
        cache.put("live-1", snapshot("Study 2"));
        cache.put("live-2", snapshot("Study 2"));
        assert_eq!(
            cache.stats(),
            CacheStats {
                total: 4,
                active: 2,
                expired: 2
            }
        );

        cache.put("live-3", snapshot("Study 3"));
        assert_eq!(
            cache.stats(),
            CacheStats {
                total: 3,
                active: 3,
                expired: 0
            }
        );
        for id in ["live-1", "live-2", "live-3"] {
            assert!(cache.get(id).is_some(), "{id} survives the capacity sweep");
        }
        assert_eq!(cache.age("old-1"), None);
        assert_eq!(cache.age("old-2"), None);
    }

    #[test]
    fn test_capacity_is_soft_for_live_entries() {
        let (cache, _clock) = cache_with_clock(2);
        for id in ["a", "b", "c", "d"] {
            cache.put(id, snapshot("Study 1"));
        }
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn test_cache_is_generic_over_value() {
        let cache: SessionContextCache<String> = SessionContextCache::new(CacheConfig::default());
        cache.put("s1", "hello".to_string());
        assert_eq!(cache.get("s1").as_deref(), Some("hello"));
        assert!(!cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_sweep_runs_until_stopped() {
        let (cache, clock) = cache_with_clock(1000);
        let cache = Arc::new(cache);
        cache.put("s1", snapshot("Study 1"));
        clock.advance(TTL + Duration::from_secs(1));

        let mut handle = cache.start();
        assert!(handle.is_running());
        assert_eq!(cache.len(), 1, "no sweep before the first interval");

        tokio::time::sleep(Duration::from_secs(301)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(cache.len(), 0);

        handle.stop();
        handle.stop();
        tokio::task::yield_now().await;
        assert!(!handle.is_running());

        cache.put("s2", snapshot("Study 2"));
        clock.advance(TTL + Duration::from_secs(1));
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(cache.len(), 1, "stopped sweep leaves expired entries");
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_sweep() {
        let (cache, clock) = cache_with_clock(1000);
        let cache = Arc::new(cache);

        drop(cache.start());

        cache.put("s1", snapshot("Study 1"));
        clock.advance(TTL + Duration::from_secs(1));
        tokio::time::sleep(Duration::from_secs(900)).await;
        assert_eq!(cache.len(), 1);
    }
}
