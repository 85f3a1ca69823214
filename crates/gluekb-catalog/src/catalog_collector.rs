//! Database and table collection from the catalog
//!
//! Raw tables are normalized into [`TableRecord`]s here and nowhere else.
//! Missing optional fields become empty strings or an empty map, and view SQL
//! is dropped for anything that is not a view.

use crate::paginate::Paginator;
use crate::source::{CatalogSource, FetchError, RawColumn, RawTable};
use gluekb_core::{
    format_timestamp, fully_qualified_name, ColumnDescriptor, TableMetadata, TableRecord, TableType,
};
use std::sync::Arc;

/// Collects databases and tables from a [`CatalogSource`]
pub struct CatalogCollector {
    source: Arc<dyn CatalogSource>,
    catalog_name: String,
}

impl CatalogCollector {
    pub fn new(source: Arc<dyn CatalogSource>, catalog_name: impl Into<String>) -> Self {
        Self {
            source,
            catalog_name: catalog_name.into(),
        }
    }

    pub fn catalog_name(&self) -> &str {
        &self.catalog_name
    }

    /// List database names in catalog order
    pub async fn list_databases(&self) -> Result<Vec<String>, FetchError> {
        let source = self.source.as_ref();
        let databases = Paginator::new(move |token| source.get_databases(token))
            .collect_all()
            .await?;

        Ok(databases.into_iter().map(|db| db.name).collect())
    }

    /// List every table in `database`, across all pages
    pub async fn list_tables(&self, database: &str) -> Result<Vec<RawTable>, FetchError> {
        let source = self.source.as_ref();
        let mut pages = Paginator::new(move |token| source.get_tables(database, token));

        let mut tables = Vec::new();
        while let Some(page) = pages.next_page().await? {
            tables.extend(page);
        }

        tracing::debug!(
            database,
            pages = pages.pages_fetched(),
            tables = tables.len(),
            "listed tables"
        );

        Ok(tables)
    }

    /// Normalize a raw table of `database` with this collector's catalog name
    pub fn normalize_table(&self, raw: &RawTable, database: &str) -> TableRecord {
        normalize_table(raw, &self.catalog_name, database)
    }
}

/// Convert a raw catalog table into a [`TableRecord`]
///
/// The returned record has no matched queries yet.
pub fn normalize_table(raw: &RawTable, catalog: &str, database: &str) -> TableRecord {
    let table_type = raw
        .table_type
        .as_deref()
        .map(TableType::from)
        .unwrap_or_default();

    let view_definition = if table_type.is_view() {
        raw.view_original_text.clone().unwrap_or_default()
    } else {
        String::new()
    };

    let storage = raw.storage_descriptor.as_ref();

    let metadata = TableMetadata {
        comment: raw.description.clone().unwrap_or_default(),
        location: storage
            .and_then(|sd| sd.location.clone())
            .unwrap_or_default(),
        classification: raw.table_type.clone().unwrap_or_default(),
        owner: raw.owner.clone().unwrap_or_default(),
        create_time: format_timestamp(raw.create_time.as_ref()),
        update_time: format_timestamp(raw.update_time.as_ref()),
        parameters: raw.parameters.clone().unwrap_or_default(),
        table_type,
        view_definition,
    };

    TableRecord {
        name: raw.name.clone(),
        fully_qualified_name: fully_qualified_name(catalog, database, &raw.name),
        metadata,
        columns: storage
            .map(|sd| sd.columns.iter().map(column_descriptor).collect())
            .unwrap_or_default(),
        partition_keys: raw.partition_keys.iter().map(column_descriptor).collect(),
        matched_queries: Vec::new(),
    }
}

fn column_descriptor(column: &RawColumn) -> ColumnDescriptor {
    ColumnDescriptor::new(&column.name, &column.column_type)
        .with_comment(column.comment.clone().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemorySourceBuilder, SourceCall};
    use chrono::{TimeZone, Utc};
    use gluekb_core::DEFAULT_CATALOG_NAME;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    #[test]
    fn normalizes_a_full_table() {
        let raw = RawTable {
            name: "orders".to_string(),
            description: Some("All orders".to_string()),
            owner: Some("etl".to_string()),
            create_time: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
            update_time: None,
            table_type: Some("EXTERNAL_TABLE".to_string()),
            parameters: Some(BTreeMap::from([
                ("classification".to_string(), "parquet".to_string()),
                ("EXTERNAL".to_string(), "TRUE".to_string()),
            ])),
            view_original_text: None,
            storage_descriptor: None,
            partition_keys: vec![RawColumn::new("dt", "string")],
        }
        .with_location("s3://lake/orders/")
        .with_columns(vec![
            RawColumn::new("id", "bigint").with_comment("order id"),
            RawColumn::new("amount", "decimal(10,2)"),
        ]);

        let record = normalize_table(&raw, DEFAULT_CATALOG_NAME, "sales");

        assert_eq!(record.name, "orders");
        assert_eq!(record.fully_qualified_name, "AwsDataCatalog.sales.\"orders\"");
        assert_eq!(record.metadata.comment, "All orders");
        assert_eq!(record.metadata.location, "s3://lake/orders/");
        assert_eq!(record.metadata.classification, "EXTERNAL_TABLE");
        assert_eq!(record.metadata.owner, "etl");
        assert_eq!(record.metadata.create_time, "2024-01-02 03:04:05+00:00");
        assert_eq!(record.metadata.update_time, "");
        assert_eq!(record.metadata.parameters.len(), 2);
        assert_eq!(*record.table_type(), TableType::ExternalTable);
        assert_eq!(
            record.columns,
            vec![
                ColumnDescriptor::new("id", "bigint").with_comment("order id"),
                ColumnDescriptor::new("amount", "decimal(10,2)"),
            ]
        );
        assert_eq!(record.partition_keys, vec![ColumnDescriptor::new("dt", "string")]);
        assert!(record.matched_queries.is_empty());
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let record = normalize_table(&RawTable::new("bare"), "cat", "db");

        assert_eq!(*record.table_type(), TableType::Table);
        assert_eq!(record.metadata.classification, "");
        assert_eq!(record.metadata.location, "");
        assert_eq!(record.metadata.owner, "");
        assert_eq!(record.metadata.create_time, "");
        assert!(record.metadata.parameters.is_empty());
        assert!(record.columns.is_empty());
        assert!(record.partition_keys.is_empty());
    }

    #[test]
    fn view_sql_kept_only_for_views() {
        let view = RawTable::new("v_orders")
            .with_table_type("VIRTUAL_VIEW")
            .with_view_text("SELECT * FROM orders");
        let record = normalize_table(&view, "cat", "db");
        assert_eq!(record.view_definition(), "SELECT * FROM orders");

        let table = RawTable::new("orders")
            .with_table_type("EXTERNAL_TABLE")
            .with_view_text("SELECT 'should be dropped'");
        let record = normalize_table(&table, "cat", "db");
        assert_eq!(record.view_definition(), "");

        let untyped = RawTable::new("orders").with_view_text("SELECT 1");
        assert_eq!(normalize_table(&untyped, "cat", "db").view_definition(), "");
    }

    #[test]
    fn column_order_is_preserved() {
        let raw = RawTable::new("t").with_columns(vec![
            RawColumn::new("z", "int"),
            RawColumn::new("a", "int"),
            RawColumn::new("z", "int"),
        ]);

        let names: Vec<_> = normalize_table(&raw, "c", "d")
            .columns
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["z", "a", "z"]);
    }

    #[tokio::test]
    async fn lists_databases_and_paginated_tables() {
        let source = InMemorySourceBuilder::new()
            .with_table("sales", RawTable::new("orders"))
            .with_table("sales", RawTable::new("customers"))
            .with_table("sales", RawTable::new("returns"))
            .with_database("empty")
            .with_page_size(2)
            .build();
        let calls = source.clone();
        let collector = CatalogCollector::new(Arc::new(source), DEFAULT_CATALOG_NAME);

        assert_eq!(collector.list_databases().await.unwrap(), vec!["sales", "empty"]);

        let tables = collector.list_tables("sales").await.unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["orders", "customers", "returns"]);
        assert_eq!(calls.call_count_of(&SourceCall::GetTables("sales".to_string())).await, 2);

        assert!(collector.list_tables("empty").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn table_listing_failure_propagates() {
        let source = InMemorySourceBuilder::new()
            .with_table("sales", RawTable::new("orders"))
            .with_error(
                SourceCall::GetTables("sales".to_string()),
                FetchError::Throttled("GetTables".to_string()),
            )
            .build();
        let collector = CatalogCollector::new(Arc::new(source), "cat");

        assert!(matches!(
            collector.list_tables("sales").await,
            Err(FetchError::Throttled(_))
        ));
    }
}
