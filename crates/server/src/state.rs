// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use trial_view_db::Database;

use crate::context_cache::{CacheConfig, SessionContextCache};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Metrics store handle.
    pub db: Database,
    /// Dashboard snapshots keyed by chat session id.
    pub context_cache: Arc<SessionContextCache>,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(db: Database) -> Arc<Self> {
        Self::with_cache(db, Arc::new(SessionContextCache::new(CacheConfig::default())))
    }

    /// Create with an externally-owned cache (the binary starts its sweep task).
    pub fn with_cache(db: Database, context_cache: Arc<SessionContextCache>) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            db,
            context_cache,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
