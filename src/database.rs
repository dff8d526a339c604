use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgPoolOptions};
use thiserror::Error;

use crate::config::Env;

#[derive(Debug, Error)]
pub enum DataAccessError {
    #[error("invalid database configuration: {0}")]
    Config(#[source] sqlx::Error),
    #[error("database query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// DataAccess
///
/// Opaque handle to the database client. Handlers hold it through `DataAccessState` and
/// never see the concrete backend, so tests can inject a fake.
#[async_trait]
pub trait DataAccess: Send + Sync {
    /// Round-trips a trivial query to prove the backend is reachable.
    async fn ping(&self) -> Result<(), DataAccessError>;

    fn backend(&self) -> &'static str;
}

pub type DataAccessState = Arc<dyn DataAccess>;

/// PostgresDataAccess
///
/// Backed by a lazily connecting pool: building it never touches the network, the first
/// query does.
pub struct PostgresDataAccess {
    pool: PgPool,
}

impl PostgresDataAccess {
    pub fn connect_lazy(db_url: &str) -> Result<Self, DataAccessError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(db_url)
            .map_err(DataAccessError::Config)?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl DataAccess for PostgresDataAccess {
    async fn ping(&self) -> Result<(), DataAccessError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

/// DataAccessCache
///
/// Owned by the startup routine and passed by reference into every application assembly.
/// Outside production the first handle built is kept and handed back on every later
/// acquisition, so re-assembling the application (a reload) does not open a second pool.
/// In production each acquisition builds, since assembly happens exactly once.
#[derive(Default)]
pub struct DataAccessCache {
    cached: Mutex<Option<DataAccessState>>,
}

impl DataAccessCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire<F, E>(&self, env: Env, build: F) -> Result<DataAccessState, E>
    where
        F: FnOnce() -> Result<DataAccessState, E>,
    {
        let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(handle) = cached.as_ref() {
            return Ok(handle.clone());
        }

        let handle = build()?;
        if !env.is_production() {
            tracing::debug!(backend = handle.backend(), "caching data access handle");
            *cached = Some(handle.clone());
        }
        Ok(handle)
    }

    pub fn is_cached(&self) -> bool {
        self.cached
            .lock()
            .map(|c| c.is_some())
            .unwrap_or_else(|e| e.into_inner().is_some())
    }
}
