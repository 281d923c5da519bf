use std::sync::Arc;

use pawtrait_db::CatalogStore;
use pawtrait_storage::ObjectStorage;

use crate::config::ServerConfig;
use crate::services::{CatalogQueryService, IngestionService, UsageService};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Catalog persistence (Postgres in production).
    pub catalog: Arc<dyn CatalogStore>,
    /// Object storage gateway for derivatives.
    pub storage: Arc<dyn ObjectStorage>,
    pub ingestion: Arc<IngestionService>,
    pub queries: Arc<CatalogQueryService>,
    pub usage: Arc<UsageService>,
}

impl AppState {
    /// Wire the services over a catalog store and storage gateway. The
    /// access policy comes from `config`.
    pub fn new(
        config: ServerConfig,
        catalog: Arc<dyn CatalogStore>,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        let access = config.access;
        Self {
            ingestion: Arc::new(IngestionService::new(
                Arc::clone(&catalog),
                Arc::clone(&storage),
                access,
            )),
            queries: Arc::new(CatalogQueryService::new(
                Arc::clone(&catalog),
                Arc::clone(&storage),
            )),
            usage: Arc::new(UsageService::new(Arc::clone(&catalog), access)),
            config: Arc::new(config),
            catalog,
            storage,
        }
    }
}
