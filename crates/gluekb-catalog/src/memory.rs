//! In-memory query and catalog source
//!
//! This source serves predefined workgroups, saved queries, databases and
//! tables without connecting to any service. It's useful for:
//! - Unit testing collectors and the harvest pipeline
//! - Replaying a captured JSON dump offline
//! - Simulating pagination and service failures
//!
//! ## Usage
//!
//! ```rust,ignore
//! let source = InMemorySourceBuilder::new()
//!     .with_query("primary", "daily_orders", "sales", "SELECT * FROM orders")
//!     .with_table("sales", RawTable::new("orders"))
//!     .with_page_size(1)
//!     .build();
//! ```
//!
//! ## Simulating Failures
//!
//! ```rust,ignore
//! let source = source.with_error(
//!     SourceCall::GetTables("sales".to_string()),
//!     FetchError::Throttled("Rate exceeded".to_string()),
//! );
//! ```
//!
//! Every call is recorded, including failed ones, so tests can assert how
//! many requests a run made.

use crate::source::{
    CatalogSource, FetchError, NamedQuery, Page, QuerySource, RawDatabase, RawTable,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A request made against an [`InMemorySource`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceCall {
    ListWorkGroups,
    ListNamedQueries(String),
    GetNamedQuery(String),
    GetDatabases,
    GetTables(String),
}

#[derive(Debug, Clone)]
struct WorkGroupEntry {
    name: String,
    queries: Vec<NamedQuery>,
}

#[derive(Debug, Clone)]
struct DatabaseEntry {
    database: RawDatabase,
    tables: Vec<RawTable>,
}

/// Source that serves data held in memory
///
/// Clones share the call log, so a test can keep a clone to inspect calls
/// made through the one handed to a collector.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    work_groups: Arc<Vec<WorkGroupEntry>>,
    databases: Arc<Vec<DatabaseEntry>>,

    /// Errors returned for matching calls
    errors: Arc<HashMap<SourceCall, FetchError>>,

    /// Items per page; 0 means everything on one page
    page_size: usize,

    calls: Arc<RwLock<Vec<SourceCall>>>,
}

impl InMemorySource {
    /// Source with no workgroups and no databases
    pub fn new() -> Self {
        InMemorySourceBuilder::new().build()
    }

    /// Build a source from a captured dump
    pub fn from_dump(dump: SourceDump) -> Self {
        let mut builder = InMemorySourceBuilder::new();

        if let Some(page_size) = dump.page_size {
            builder = builder.with_page_size(page_size);
        }

        for group in dump.work_groups {
            builder = builder.with_work_group(&group.name);
            for query in group.named_queries {
                builder = builder.with_named_query(&group.name, query);
            }
        }

        for database in dump.databases {
            builder = builder.with_raw_database(database.as_raw());
            for table in database.table_list {
                builder = builder.with_table(&database.name, table);
            }
        }

        builder.build()
    }

    /// Return `error` for every request matching `call`
    pub fn with_error(mut self, call: SourceCall, error: FetchError) -> Self {
        Arc::make_mut(&mut self.errors).insert(call, error);
        self
    }

    /// Identifiers of the saved queries in `work_group`, in listing order
    pub fn query_ids(&self, work_group: &str) -> Vec<String> {
        self.work_groups
            .iter()
            .find(|g| g.name == work_group)
            .map(|g| g.queries.iter().map(|q| q.named_query_id.clone()).collect())
            .unwrap_or_default()
    }

    /// Every call made so far, in order
    pub async fn calls(&self) -> Vec<SourceCall> {
        self.calls.read().await.clone()
    }

    /// Number of calls made so far
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Number of calls equal to `call`
    pub async fn call_count_of(&self, call: &SourceCall) -> usize {
        self.calls.read().await.iter().filter(|c| *c == call).count()
    }

    /// Record a call and return its configured error, if any
    async fn record(&self, call: SourceCall) -> Result<(), FetchError> {
        let error = self.errors.get(&call).cloned();
        self.calls.write().await.push(call);
        error.map_or(Ok(()), Err)
    }

    fn page_of<T: Clone>(&self, items: &[T], token: Option<String>) -> Result<Page<T>, FetchError> {
        let start = match token {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .ok()
                .filter(|start| *start <= items.len())
                .ok_or_else(|| FetchError::InvalidResponse(format!("Invalid next token '{}'", token)))?,
        };

        let size = if self.page_size == 0 { items.len() } else { self.page_size };
        let end = start.saturating_add(size).min(items.len());
        let page = items[start..end].to_vec();

        if end < items.len() {
            Ok(Page::with_next(page, end.to_string()))
        } else {
            Ok(Page::last(page))
        }
    }
}

impl Default for InMemorySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl QuerySource for InMemorySource {
    fn name(&self) -> &'static str {
        "InMemory"
    }

    async fn list_work_groups(&self, next_token: Option<String>) -> Result<Page<String>, FetchError> {
        self.record(SourceCall::ListWorkGroups).await?;

        let names: Vec<String> = self.work_groups.iter().map(|g| g.name.clone()).collect();
        self.page_of(&names, next_token)
    }

    async fn list_named_query_ids(
        &self,
        work_group: &str,
        next_token: Option<String>,
    ) -> Result<Page<String>, FetchError> {
        self.record(SourceCall::ListNamedQueries(work_group.to_string())).await?;

        let group = self
            .work_groups
            .iter()
            .find(|g| g.name == work_group)
            .ok_or_else(|| FetchError::NotFound(format!("WorkGroup {}", work_group)))?;

        let ids: Vec<String> = group.queries.iter().map(|q| q.named_query_id.clone()).collect();
        self.page_of(&ids, next_token)
    }

    async fn get_named_query(&self, query_id: &str) -> Result<NamedQuery, FetchError> {
        self.record(SourceCall::GetNamedQuery(query_id.to_string())).await?;

        self.work_groups
            .iter()
            .flat_map(|g| g.queries.iter())
            .find(|q| q.named_query_id == query_id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(format!("NamedQuery {}", query_id)))
    }
}

#[async_trait::async_trait]
impl CatalogSource for InMemorySource {
    fn name(&self) -> &'static str {
        "InMemory"
    }

    async fn get_databases(&self, next_token: Option<String>) -> Result<Page<RawDatabase>, FetchError> {
        self.record(SourceCall::GetDatabases).await?;

        let databases: Vec<RawDatabase> = self.databases.iter().map(|d| d.database.clone()).collect();
        self.page_of(&databases, next_token)
    }

    async fn get_tables(
        &self,
        database: &str,
        next_token: Option<String>,
    ) -> Result<Page<RawTable>, FetchError> {
        self.record(SourceCall::GetTables(database.to_string())).await?;

        let entry = self
            .databases
            .iter()
            .find(|d| d.database.name == database)
            .ok_or_else(|| FetchError::NotFound(format!("Database {}", database)))?;

        self.page_of(&entry.tables, next_token)
    }
}

/// Builder for an [`InMemorySource`]
///
/// Workgroups and databases are listed in the order they are first
/// mentioned.
pub struct InMemorySourceBuilder {
    work_groups: Vec<WorkGroupEntry>,
    databases: Vec<DatabaseEntry>,
    errors: HashMap<SourceCall, FetchError>,
    page_size: usize,
    next_query_id: usize,
}

impl InMemorySourceBuilder {
    pub fn new() -> Self {
        Self {
            work_groups: Vec::new(),
            databases: Vec::new(),
            errors: HashMap::new(),
            page_size: 0,
            next_query_id: 1,
        }
    }

    fn work_group_mut(&mut self, name: &str) -> &mut WorkGroupEntry {
        let index = match self.work_groups.iter().position(|g| g.name == name) {
            Some(index) => index,
            None => {
                self.work_groups.push(WorkGroupEntry {
                    name: name.to_string(),
                    queries: Vec::new(),
                });
                self.work_groups.len() - 1
            }
        };
        &mut self.work_groups[index]
    }

    fn database_mut(&mut self, name: &str) -> &mut DatabaseEntry {
        let index = match self.databases.iter().position(|d| d.database.name == name) {
            Some(index) => index,
            None => {
                self.databases.push(DatabaseEntry {
                    database: RawDatabase {
                        name: name.to_string(),
                        description: None,
                    },
                    tables: Vec::new(),
                });
                self.databases.len() - 1
            }
        };
        &mut self.databases[index]
    }

    /// Add a workgroup with no queries
    pub fn with_work_group(mut self, name: &str) -> Self {
        self.work_group_mut(name);
        self
    }

    /// Add a saved query; its identifier is generated
    pub fn with_query(self, work_group: &str, name: &str, database: &str, sql: &str) -> Self {
        let query = NamedQuery {
            named_query_id: String::new(),
            name: name.to_string(),
            database: database.to_string(),
            query_string: sql.to_string(),
            work_group: Some(work_group.to_string()),
        };
        self.with_named_query(work_group, query)
    }

    /// Add a saved query as returned by the service
    ///
    /// An empty identifier is replaced with a generated one.
    pub fn with_named_query(mut self, work_group: &str, mut query: NamedQuery) -> Self {
        if query.named_query_id.is_empty() {
            query.named_query_id = format!("nq-{:04}", self.next_query_id);
        }
        self.next_query_id += 1;
        self.work_group_mut(work_group).queries.push(query);
        self
    }

    /// Add a database with no tables
    pub fn with_database(mut self, name: &str) -> Self {
        self.database_mut(name);
        self
    }

    /// Add a database, keeping its description
    pub fn with_raw_database(mut self, database: RawDatabase) -> Self {
        let description = database.description.clone();
        self.database_mut(&database.name).database.description = description;
        self
    }

    /// Add a table to a database, creating the database if needed
    pub fn with_table(mut self, database: &str, table: RawTable) -> Self {
        self.database_mut(database).tables.push(table);
        self
    }

    /// Items per page for every listing; 0 disables pagination
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Return `error` for every request matching `call`
    pub fn with_error(mut self, call: SourceCall, error: FetchError) -> Self {
        self.errors.insert(call, error);
        self
    }

    pub fn build(self) -> InMemorySource {
        InMemorySource {
            work_groups: Arc::new(self.work_groups),
            databases: Arc::new(self.databases),
            errors: Arc::new(self.errors),
            page_size: self.page_size,
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemorySourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Captured source contents, in the services' JSON shapes
///
/// ```json
/// {
///   "WorkGroups": [{"Name": "primary", "NamedQueries": [{"Name": "q", "Database": "sales", "QueryString": "SELECT 1"}]}],
///   "Databases": [{"Name": "sales", "TableList": [{"Name": "orders", "TableType": "EXTERNAL_TABLE"}]}],
///   "PageSize": 100
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SourceDump {
    pub work_groups: Vec<WorkGroupDump>,
    pub databases: Vec<DatabaseDump>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct WorkGroupDump {
    pub name: String,
    pub named_queries: Vec<NamedQuery>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DatabaseDump {
    pub name: String,
    pub description: Option<String>,
    pub table_list: Vec<RawTable>,
}

impl DatabaseDump {
    fn as_raw(&self) -> RawDatabase {
        RawDatabase {
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

impl SourceDump {
    /// Parse a dump from JSON
    pub fn from_json(json: &str) -> Result<Self, FetchError> {
        serde_json::from_str(json)
            .map_err(|e| FetchError::InvalidResponse(format!("Failed to parse source dump: {}", e)))
    }

    /// Load a dump from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, FetchError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            FetchError::ConfigError(format!("Failed to read source dump {}: {}", path.display(), e))
        })?;

        Self::from_json(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paginate::Paginator;

    #[tokio::test]
    async fn pages_listings_by_page_size() {
        let source = InMemorySourceBuilder::new()
            .with_work_group("a")
            .with_work_group("b")
            .with_work_group("c")
            .with_page_size(2)
            .build();

        let first = source.list_work_groups(None).await.unwrap();
        assert_eq!(first.items, vec!["a", "b"]);
        assert_eq!(first.next_token.as_deref(), Some("2"));

        let second = source.list_work_groups(first.next_token).await.unwrap();
        assert_eq!(second.items, vec!["c"]);
        assert_eq!(second.next_token, None);

        assert_eq!(source.call_count_of(&SourceCall::ListWorkGroups).await, 2);
    }

    #[tokio::test]
    async fn pagination_has_no_gaps_or_duplicates() {
        let mut builder = InMemorySourceBuilder::new().with_page_size(3);
        for i in 0..10 {
            builder = builder.with_table("db", RawTable::new(format!("t{i}")));
        }
        let source = builder.build();

        let all = Paginator::new(|token| source.get_tables("db", token))
            .collect_all()
            .await
            .unwrap();

        let names: Vec<_> = all.iter().map(|t| t.name.clone()).collect();
        let expected: Vec<_> = (0..10).map(|i| format!("t{i}")).collect();
        assert_eq!(names, expected);
        assert_eq!(source.call_count().await, 4);
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let source = InMemorySourceBuilder::new().with_database("db").build();
        let result = source.get_databases(Some("garbage".to_string())).await;
        assert!(matches!(result, Err(FetchError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn unknown_entities_are_not_found() {
        let source = InMemorySource::new();

        assert!(matches!(
            source.get_tables("missing", None).await,
            Err(FetchError::NotFound(_))
        ));
        assert!(matches!(
            source.list_named_query_ids("missing", None).await,
            Err(FetchError::NotFound(_))
        ));
        assert!(matches!(
            source.get_named_query("nq-9999").await,
            Err(FetchError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn configured_errors_are_returned_and_recorded() {
        let source = InMemorySourceBuilder::new()
            .with_database("db")
            .build()
            .with_error(
                SourceCall::GetDatabases,
                FetchError::AuthenticationError("expired token".to_string()),
            );

        let result = source.get_databases(None).await;
        assert!(matches!(result, Err(FetchError::AuthenticationError(_))));
        assert_eq!(source.calls().await, vec![SourceCall::GetDatabases]);
    }

    #[tokio::test]
    async fn generated_query_ids_resolve() {
        let source = InMemorySourceBuilder::new()
            .with_query("primary", "q1", "sales", "SELECT 1")
            .with_query("primary", "q2", "sales", "SELECT 2")
            .build();

        let ids = source.query_ids("primary");
        assert_eq!(ids, vec!["nq-0001", "nq-0002"]);

        let query = source.get_named_query(&ids[1]).await.unwrap();
        assert_eq!(query.name, "q2");
        assert_eq!(query.query_string, "SELECT 2");
    }

    #[tokio::test]
    async fn clones_share_call_log() {
        let source = InMemorySourceBuilder::new().with_database("db").build();
        let observer = source.clone();

        source.get_databases(None).await.unwrap();
        assert_eq!(observer.call_count().await, 1);
    }

    #[tokio::test]
    async fn loads_dump_json() {
        let dump = SourceDump::from_json(
            r#"{
                "WorkGroups": [
                    {"Name": "primary", "NamedQueries": [
                        {"NamedQueryId": "abc", "Name": "daily", "Database": "sales", "QueryString": "SELECT * FROM orders"}
                    ]},
                    {"Name": "empty"}
                ],
                "Databases": [
                    {"Name": "sales", "Description": "Sales data", "TableList": [
                        {"Name": "orders", "TableType": "EXTERNAL_TABLE"}
                    ]}
                ],
                "PageSize": 1
            }"#,
        )
        .unwrap();

        let source = InMemorySource::from_dump(dump);

        let groups = source.list_work_groups(None).await.unwrap();
        assert_eq!(groups.items, vec!["primary"]);
        assert_eq!(groups.next_token.as_deref(), Some("1"));

        assert_eq!(source.query_ids("primary"), vec!["abc"]);
        assert!(source.query_ids("empty").is_empty());

        let databases = source.get_databases(None).await.unwrap();
        assert_eq!(databases.items[0].description.as_deref(), Some("Sales data"));

        let tables = source.get_tables("sales", None).await.unwrap();
        assert_eq!(tables.items[0].table_type.as_deref(), Some("EXTERNAL_TABLE"));
    }

    #[test]
    fn malformed_dump_is_rejected() {
        assert!(matches!(
            SourceDump::from_json("{\"WorkGroups\": 3}"),
            Err(FetchError::InvalidResponse(_))
        ));
    }
}
