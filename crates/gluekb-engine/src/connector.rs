//! Service connection
//!
//! Reaching the catalog, query service and bucket needs credentials for the
//! configured role. How those are obtained is up to the connector; the
//! harvester only calls [`ServiceConnector::connect`] once the configuration
//! has been validated.

use gluekb_catalog::{CatalogSource, FetchError, QuerySource};
use gluekb_core::HarvestConfig;
use gluekb_sink::SnapshotSink;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// The three services a harvest talks to
#[derive(Clone)]
pub struct HarvestServices {
    pub queries: Arc<dyn QuerySource>,
    pub catalog: Arc<dyn CatalogSource>,
    pub sink: Arc<dyn SnapshotSink>,
}

impl HarvestServices {
    pub fn new(
        queries: Arc<dyn QuerySource>,
        catalog: Arc<dyn CatalogSource>,
        sink: Arc<dyn SnapshotSink>,
    ) -> Self {
        Self {
            queries,
            catalog,
            sink,
        }
    }
}

impl std::fmt::Debug for HarvestServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HarvestServices")
            .field("queries", &self.queries.name())
            .field("catalog", &self.catalog.name())
            .field("sink", &self.sink.name())
            .finish()
    }
}

/// Opens service clients for a validated configuration
///
/// Implementations typically assume `config.assumed_identity` and build
/// clients from the resulting credentials, with the sink bound to
/// `config.sink_location`.
#[async_trait::async_trait]
pub trait ServiceConnector: Send + Sync {
    async fn connect(&self, config: &HarvestConfig) -> Result<HarvestServices, FetchError>;
}

/// Connector that hands out prebuilt services
///
/// Counts connections so tests can assert that none were attempted.
pub struct StaticConnector {
    services: HarvestServices,
    connects: AtomicUsize,
}

impl StaticConnector {
    pub fn new(services: HarvestServices) -> Self {
        Self {
            services,
            connects: AtomicUsize::new(0),
        }
    }

    /// Number of `connect` calls so far
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ServiceConnector for StaticConnector {
    async fn connect(&self, config: &HarvestConfig) -> Result<HarvestServices, FetchError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            role = %config.assumed_identity,
            bucket = %config.sink_location,
            "using prebuilt services"
        );
        Ok(self.services.clone())
    }
}
