//! Catalog and saved-query collection
//!
//! This crate talks to the two upstream services through narrow traits:
//! - [`QuerySource`] lists workgroups and the saved queries in each
//! - [`CatalogSource`] lists databases and their tables
//!
//! Both are cursor-paginated; [`Paginator`] drains them page by page. The
//! collectors turn raw responses into the typed records of `gluekb-core`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use gluekb_catalog::{InMemorySourceBuilder, QueryCollector};
//!
//! let source = Arc::new(
//!     InMemorySourceBuilder::new()
//!         .with_query("primary", "daily", "sales", "SELECT * FROM orders")
//!         .build(),
//! );
//! let collection = QueryCollector::new(source, writer).collect_all().await?;
//! ```

pub mod catalog_collector;
pub mod memory;
pub mod paginate;
pub mod query_collector;
pub mod source;

pub use catalog_collector::{normalize_table, CatalogCollector};
pub use memory::{InMemorySource, InMemorySourceBuilder, SourceCall, SourceDump};
pub use paginate::Paginator;
pub use query_collector::{QueryCollection, QueryCollector};
pub use source::{
    CatalogSource, FetchError, NamedQuery, Page, QuerySource, RawColumn, RawDatabase,
    RawStorageDescriptor, RawTable,
};
