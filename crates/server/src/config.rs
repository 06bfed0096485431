//! Command-line and environment configuration for the server binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::context_cache::CacheConfig;

/// Default port for the server.
pub const DEFAULT_PORT: u16 = 47893;

#[derive(Debug, Clone, Parser)]
#[command(name = "trial-view")]
#[command(about = "Clinical-trial data quality dashboard API")]
#[command(version)]
pub struct Args {
    /// Port to listen on (127.0.0.1 only)
    #[arg(long, env = "TRIAL_VIEW_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Metrics store written by the import pipeline
    /// (default: <cache dir>/trial-view/edc_metrics.db)
    #[arg(long, env = "TRIAL_VIEW_DB")]
    pub db: Option<PathBuf>,

    /// Lifetime of a cached session context, in seconds
    #[arg(long, default_value_t = 900)]
    pub cache_ttl_secs: u64,

    /// Interval between background cache sweeps, in seconds
    #[arg(long, default_value_t = 300)]
    pub cache_sweep_secs: u64,

    /// Entry count above which a write sweeps expired contexts first
    #[arg(long, default_value_t = 1000)]
    pub cache_capacity: usize,

    /// Open the store writable and create any missing tables (development)
    #[arg(long)]
    pub init_schema: bool,

    /// Fill an empty writable store with demo data (implies --init-schema)
    #[arg(long)]
    pub seed_demo: bool,
}

impl Args {
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl: Duration::from_secs(self.cache_ttl_secs),
            sweep_interval: Duration::from_secs(self.cache_sweep_secs),
            soft_capacity: self.cache_capacity,
        }
    }

    pub fn writable(&self) -> bool {
        self.init_schema || self.seed_demo
    }
}
