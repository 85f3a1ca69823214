//! gluekb core
//!
//! Typed records for harvested catalog metadata and saved queries, the
//! snapshot layout written to the sink, run configuration and the error
//! taxonomy shared by every stage of a harvest.

pub mod config;
pub mod error;
pub mod model;
pub mod result;
pub mod snapshot;

pub use config::{ConfigError, HarvestConfig, HarvestSettings};
pub use error::HarvestError;
pub use model::{
    fully_qualified_name, format_timestamp, ColumnDescriptor, MatchedQuery, SavedQuery,
    TableMetadata, TableRecord, TableType, DEFAULT_CATALOG_NAME,
};
pub use result::{InvocationResult, InvocationStatus};
pub use snapshot::{DatabaseSnapshot, GroupSnapshot, Snapshot, SAVED_QUERIES_PREFIX};
