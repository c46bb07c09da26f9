//! # Easel Server Library
//!
//! Shared state and route handlers for the Easel HTTP API. The
//! library is used by both the binary and the route tests.

use std::sync::Arc;
use std::time::Instant;

use easel_core::SessionStore;
use easel_renderer::{ExportConfig, ExportPipeline};

pub mod error;
pub mod health;
pub mod routes;

pub use error::ApiError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// In-memory drawing sessions.
    pub store: SessionStore,
    /// Export pipeline with its renderer tiers.
    pub exporter: Arc<ExportPipeline>,
    /// Server start time, for uptime reporting.
    pub started_at: Instant,
}

impl AppState {
    /// Create fresh state with the given export configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self {
            store: SessionStore::new(),
            exporter: Arc::new(ExportPipeline::new(config)),
            started_at: Instant::now(),
        }
    }
}
