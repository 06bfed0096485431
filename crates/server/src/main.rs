// crates/server/src/main.rs
//! Trial-view server binary.
//!
//! Opens the metrics store, starts the context cache sweep and serves the
//! dashboard API on localhost.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use trial_view_db::{fixtures, Database};
use trial_view_server::config::Args;
use trial_view_server::{create_app_with_state, init_metrics, AppState, SessionContextCache};
use trial_view_types::MetricFilters;

async fn open_store(args: &Args) -> Result<Database> {
    let path = match &args.db {
        Some(path) => path.clone(),
        None => trial_view_db::default_db_path()?,
    };

    if !args.writable() {
        return Database::open_read_only(&path)
            .await
            .with_context(|| format!("opening metrics store {}", path.display()));
    }

    let db = Database::open_writable(&path)
        .await
        .with_context(|| format!("opening writable store {}", path.display()))?;

    if args.seed_demo {
        let existing = db.kpi_summary(&MetricFilters::all()).await?.total_subjects;
        if existing == 0 {
            let inserted = fixtures::seed_demo(&db).await?;
            tracing::info!(subjects = inserted, "Seeded demo data");
        } else {
            tracing::warn!(subjects = existing, "Store not empty, skipping demo seed");
        }
    }

    Ok(db)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Quiet by default; startup UX uses eprintln
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,trial_view_server=info")),
        )
        .compact()
        .init();

    let startup_start = Instant::now();
    init_metrics();

    eprintln!("\ntrial-view v{}\n", env!("CARGO_PKG_VERSION"));

    let db = open_store(&args).await?;

    let cache: Arc<SessionContextCache> = Arc::new(SessionContextCache::new(args.cache_config()));
    let _sweep = cache.start();

    let app = create_app_with_state(AppState::with_cache(db.clone(), cache));

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    eprintln!(
        "  Ready in {}ms, store {}",
        startup_start.elapsed().as_millis(),
        db.db_path().display()
    );
    eprintln!("  -> http://localhost:{}\n", args.port);

    axum::serve(listener, app).await?;

    Ok(())
}
