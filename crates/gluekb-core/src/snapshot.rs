//! Snapshot payloads and their sink keys
//!
//! Keys are derived only from names, so re-running a harvest overwrites the
//! same objects:
//! - `athena_saved_queries/<workgroup>.json` for each workgroup
//! - `<catalog>/<database>.json` for each database

use crate::model::{SavedQuery, TableRecord};
use serde::{Serialize, Serializer};

/// Key prefix for per-workgroup saved query snapshots
pub const SAVED_QUERIES_PREFIX: &str = "athena_saved_queries";

/// A payload with a deterministic sink key
pub trait Snapshot: Serialize {
    fn key(&self) -> String;
}

/// Saved queries of one workgroup, serialized as a bare JSON array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSnapshot {
    pub workgroup: String,
    pub queries: Vec<SavedQuery>,
}

impl GroupSnapshot {
    pub fn new(workgroup: impl Into<String>, queries: Vec<SavedQuery>) -> Self {
        Self {
            workgroup: workgroup.into(),
            queries,
        }
    }
}

impl Snapshot for GroupSnapshot {
    fn key(&self) -> String {
        format!("{}/{}.json", SAVED_QUERIES_PREFIX, self.workgroup)
    }
}

impl Serialize for GroupSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.queries.serialize(serializer)
    }
}

/// Table records of one database, serialized as a bare JSON array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSnapshot {
    pub catalog: String,
    pub database: String,
    pub tables: Vec<TableRecord>,
}

impl DatabaseSnapshot {
    pub fn new(catalog: impl Into<String>, database: impl Into<String>, tables: Vec<TableRecord>) -> Self {
        Self {
            catalog: catalog.into(),
            database: database.into(),
            tables,
        }
    }
}

impl Snapshot for DatabaseSnapshot {
    fn key(&self) -> String {
        format!("{}/{}.json", self.catalog, self.database)
    }
}

impl Serialize for DatabaseSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.tables.serialize(serializer)
    }
}
