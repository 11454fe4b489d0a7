// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod model;
pub mod notify;
pub mod pagination;
pub mod query;
pub mod ranking;
pub mod relationships;

// ---- Re-exports for stable public API ----
pub use crate::config::EngineConfig;
pub use crate::corpus::{Corpus, CorpusLoader, LoadPolicy, LoadReport, LoaderOptions, RawCorpus};
pub use crate::engine::{Engine, EngineOptions};
pub use crate::error::{LoadError, QueryError, ValidationIssue};
pub use crate::model::{Accuracy, Era, HistoricalEvent, Post, PostType, Profile, Relationship, RelationshipType};
pub use crate::notify::{Notification, NotificationKind, NotificationOutcome, NotificationRequest};
pub use crate::pagination::FeedSegment;
pub use crate::query::{PostFilters, SearchResults};
pub use crate::relationships::{Connection, ConnectionGroup, Direction, IncomingTypes};

use shuttle_axum::axum::Router;
use tracing::info;

/// Build the full HTTP app: config, corpus load, routes and `/metrics`.
///
/// Fails when the config cannot be parsed or the corpus cannot be loaded (missing
/// directory, malformed JSON, or any invalid record under the fail-closed policy).
pub async fn app() -> anyhow::Result<Router> {
    let cfg = EngineConfig::from_toml()?;
    let metrics = crate::metrics::Metrics::init()?;

    let dir = cfg.corpus.dir.clone();
    let load_cfg = cfg.clone();
    let engine = tokio::task::spawn_blocking(move || Engine::from_config(&load_cfg))
        .await?
        .map_err(|e| anyhow::anyhow!("Failed to load corpus from {}: {}", dir.display(), e))?;
    info!(
        version = engine.corpus().version(),
        posts = engine.corpus().posts().len(),
        strict = cfg.query.strict,
        "engine ready"
    );

    let state = api::AppState::new(engine, cfg.query);
    Ok(api::create_router(state).merge(metrics.router()))
}
