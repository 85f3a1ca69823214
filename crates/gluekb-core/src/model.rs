//! Harvested record types
//!
//! These are the fully-typed shapes the rest of the pipeline works with. Raw
//! source responses are converted into them once, at the normalization
//! boundary in `gluekb-catalog`; after that nothing deals with optional or
//! loosely-typed fields.
//!
//! The serde field names are the wire format consumed downstream, so the
//! Rust names and the JSON names differ in a few places.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Catalog name used to build fully-qualified table names
pub const DEFAULT_CATALOG_NAME: &str = "AwsDataCatalog";

/// A saved query fetched from the query service
///
/// Each saved query belongs to exactly one workgroup: the one it was listed
/// under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedQuery {
    /// Query name
    #[serde(rename = "query_name")]
    pub name: String,

    /// Owning workgroup
    #[serde(rename = "workgroup")]
    pub group: String,

    /// Default database the query was saved against
    pub database: String,

    /// SQL text
    #[serde(rename = "query_sql")]
    pub sql_text: String,
}

impl SavedQuery {
    /// Create a new saved query
    pub fn new(
        name: impl Into<String>,
        group: impl Into<String>,
        database: impl Into<String>,
        sql_text: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            database: database.into(),
            sql_text: sql_text.into(),
        }
    }
}

/// The part of a saved query embedded in a table record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedQuery {
    #[serde(rename = "query_name")]
    pub name: String,

    #[serde(rename = "workgroup")]
    pub group: String,

    #[serde(rename = "query_sql")]
    pub sql_text: String,
}

impl From<&SavedQuery> for MatchedQuery {
    fn from(query: &SavedQuery) -> Self {
        Self {
            name: query.name.clone(),
            group: query.group.clone(),
            sql_text: query.sql_text.clone(),
        }
    }
}

/// A column or partition key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,

    /// Type as reported by the catalog (e.g. `bigint`, `array<string>`)
    #[serde(rename = "type")]
    pub data_type: String,

    /// Column comment, empty when the catalog has none
    pub comment: String,
}

impl ColumnDescriptor {
    /// Create a column with no comment
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            comment: String::new(),
        }
    }

    /// Set the comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// Catalog table type
///
/// Only `VirtualView` changes how a table is normalized. Unrecognized values
/// are kept verbatim so they survive into the snapshot unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TableType {
    /// Managed table
    #[default]
    Table,

    /// Table over externally-managed storage
    ExternalTable,

    /// View; the only type that carries view SQL
    VirtualView,

    /// Governed table
    Governed,

    /// Any other type reported by the catalog
    Other(String),
}

impl TableType {
    /// Catalog spelling of this type
    pub fn as_str(&self) -> &str {
        match self {
            Self::Table => "TABLE",
            Self::ExternalTable => "EXTERNAL_TABLE",
            Self::VirtualView => "VIRTUAL_VIEW",
            Self::Governed => "GOVERNED",
            Self::Other(other) => other,
        }
    }

    pub fn is_view(&self) -> bool {
        matches!(self, Self::VirtualView)
    }
}

impl From<&str> for TableType {
    fn from(value: &str) -> Self {
        match value {
            "TABLE" => Self::Table,
            "EXTERNAL_TABLE" => Self::ExternalTable,
            "VIRTUAL_VIEW" => Self::VirtualView,
            "GOVERNED" => Self::Governed,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for TableType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<TableType> for String {
    fn from(value: TableType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive table metadata
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableMetadata {
    /// Table description
    #[serde(rename = "table_comment")]
    pub comment: String,

    /// Storage location
    pub location: String,

    pub classification: String,

    pub owner: String,

    /// Creation time, rendered by [`format_timestamp`]
    pub create_time: String,

    /// Last update time, rendered by [`format_timestamp`]
    pub update_time: String,

    /// Table parameters, sorted by key
    pub parameters: BTreeMap<String, String>,

    pub table_type: TableType,

    /// View SQL; empty unless `table_type` is a view
    #[serde(rename = "view_sql")]
    pub view_definition: String,
}

/// A normalized table with its schema and the saved queries that mention it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRecord {
    #[serde(rename = "table_name")]
    pub name: String,

    /// `<catalog>.<database>."<table>"`
    pub fully_qualified_name: String,

    #[serde(rename = "table_metadata")]
    pub metadata: TableMetadata,

    /// Columns in catalog order
    pub columns: Vec<ColumnDescriptor>,

    /// Partition keys in catalog order
    #[serde(rename = "partitions")]
    pub partition_keys: Vec<ColumnDescriptor>,

    /// Saved queries whose text names this table
    #[serde(rename = "sample_sqls")]
    pub matched_queries: Vec<MatchedQuery>,
}

impl TableRecord {
    pub fn table_type(&self) -> &TableType {
        &self.metadata.table_type
    }

    pub fn view_definition(&self) -> &str {
        &self.metadata.view_definition
    }
}

/// Build the fully-qualified name of a table
///
/// The table part is always double-quoted; catalog and database are not.
pub fn fully_qualified_name(catalog: &str, database: &str, table: &str) -> String {
    format!("{}.{}.\"{}\"", catalog, database, table)
}

/// Render a catalog timestamp as `YYYY-MM-DD HH:MM:SS[.ffffff]+00:00`
///
/// Fractional seconds only appear when the microsecond part is non-zero.
/// A missing timestamp renders as an empty string.
pub fn format_timestamp(timestamp: Option<&DateTime<Utc>>) -> String {
    let Some(ts) = timestamp else {
        return String::new();
    };

    let micros = ts.timestamp_subsec_micros();
    if micros == 0 {
        format!("{}+00:00", ts.format("%Y-%m-%d %H:%M:%S"))
    } else {
        format!("{}.{:06}+00:00", ts.format("%Y-%m-%d %H:%M:%S"), micros)
    }
}
