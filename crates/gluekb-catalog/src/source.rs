//! Source traits for the query service and the data catalog
//!
//! Responses are kept close to the services' own shapes (PascalCase field
//! names, optional everything) and are only normalized by the collectors.

use chrono::{DateTime, Utc};
use gluekb_core::HarvestError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One page of a cursor-paginated listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page, in source order
    pub items: Vec<T>,

    /// Cursor for the next page; `None` on the last page
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    /// Final page of a listing
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }

    /// Page followed by more pages
    pub fn with_next(items: Vec<T>, next_token: impl Into<String>) -> Self {
        Self {
            items,
            next_token: Some(next_token.into()),
        }
    }
}

/// A saved query as returned by the query service
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NamedQuery {
    pub named_query_id: String,
    pub name: String,
    pub database: String,
    pub query_string: String,

    /// Workgroup reported by the service; informational only
    pub work_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawDatabase {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawColumn {
    pub name: String,

    #[serde(rename = "Type")]
    pub column_type: String,

    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawStorageDescriptor {
    pub location: Option<String>,
    pub columns: Vec<RawColumn>,
}

/// A table as returned by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawTable {
    pub name: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    pub table_type: Option<String>,
    pub parameters: Option<BTreeMap<String, String>>,

    /// View SQL; may be present on non-view tables and is ignored there
    pub view_original_text: Option<String>,

    pub storage_descriptor: Option<RawStorageDescriptor>,
    pub partition_keys: Vec<RawColumn>,
}

impl RawTable {
    /// Create a table with only a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_table_type(mut self, table_type: impl Into<String>) -> Self {
        self.table_type = Some(table_type.into());
        self
    }

    pub fn with_columns(mut self, columns: Vec<RawColumn>) -> Self {
        self.storage_descriptor
            .get_or_insert_with(RawStorageDescriptor::default)
            .columns = columns;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.storage_descriptor
            .get_or_insert_with(RawStorageDescriptor::default)
            .location = Some(location.into());
        self
    }

    pub fn with_partition_keys(mut self, keys: Vec<RawColumn>) -> Self {
        self.partition_keys = keys;
        self
    }

    pub fn with_view_text(mut self, sql: impl Into<String>) -> Self {
        self.view_original_text = Some(sql.into());
        self
    }
}

impl RawColumn {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Errors that can occur when calling a source
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Request throttled: {0}")]
    Throttled(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<FetchError> for HarvestError {
    fn from(err: FetchError) -> Self {
        HarvestError::SourceUnavailable(err.to_string())
    }
}

/// The query service: workgroups and the saved queries inside them
#[async_trait::async_trait]
pub trait QuerySource: Send + Sync {
    /// Source name for logging (e.g. "Athena", "InMemory")
    fn name(&self) -> &'static str;

    /// List workgroup names
    async fn list_work_groups(&self, next_token: Option<String>) -> Result<Page<String>, FetchError>;

    /// List identifiers of the saved queries in a workgroup
    async fn list_named_query_ids(
        &self,
        work_group: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>, FetchError>;

    /// Fetch one saved query by identifier
    async fn get_named_query(&self, query_id: &str) -> Result<NamedQuery, FetchError>;
}

/// The data catalog: databases and their tables
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// Source name for logging (e.g. "Glue", "InMemory")
    fn name(&self) -> &'static str;

    async fn get_databases(&self, next_token: Option<String>) -> Result<Page<RawDatabase>, FetchError>;

    async fn get_tables(
        &self,
        database: &str,
        next_token: Option<String>,
    ) -> Result<Page<RawTable>, FetchError>;
}
