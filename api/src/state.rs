use code_runner::{BatchOrchestrator, ReportCache};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use util::config;
use util::execution_limits::ExecutionLimits;

/// Shared handles for every request: the database pool, the report cache
/// (which owns the highlighter and renderer) and the batch orchestrator.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    reports: Arc<ReportCache>,
    batch: Arc<BatchOrchestrator>,
}

impl AppState {
    /// Builds the cache and orchestrator from the global configuration.
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_cache(db, Arc::new(ReportCache::from_config()), config::batch_workers())
    }

    pub fn with_cache(db: DatabaseConnection, reports: Arc<ReportCache>, workers: usize) -> Self {
        let batch = Arc::new(BatchOrchestrator::new(Arc::clone(&reports), workers));
        Self { db, reports, batch }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn reports(&self) -> &ReportCache {
        &self.reports
    }

    pub fn batch(&self) -> &BatchOrchestrator {
        &self.batch
    }

    pub fn limits(&self) -> &ExecutionLimits {
        self.reports.limits()
    }
}
