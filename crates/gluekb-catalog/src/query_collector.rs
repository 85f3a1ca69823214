//! Saved query collection across workgroups

use crate::paginate::Paginator;
use crate::source::{FetchError, QuerySource};
use gluekb_core::{GroupSnapshot, HarvestError, SavedQuery};
use gluekb_sink::{SnapshotWriter, WriteReceipt};
use std::sync::Arc;

/// Every saved query fetched in a run
#[derive(Debug, Clone, Default)]
pub struct QueryCollection {
    /// Workgroups in listing order
    pub groups: Vec<String>,

    /// All queries, concatenated group by group; not deduplicated
    pub queries: Vec<SavedQuery>,

    /// One receipt per written workgroup snapshot
    pub receipts: Vec<WriteReceipt>,
}

impl QueryCollection {
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

/// Collects saved queries from a [`QuerySource`]
///
/// Each workgroup's queries are written to the sink as soon as that
/// workgroup is done, before the next one is listed.
pub struct QueryCollector {
    source: Arc<dyn QuerySource>,
    writer: SnapshotWriter,
}

impl QueryCollector {
    pub fn new(source: Arc<dyn QuerySource>, writer: SnapshotWriter) -> Self {
        Self { source, writer }
    }

    /// List every workgroup name, across all pages
    pub async fn list_execution_groups(&self) -> Result<Vec<String>, FetchError> {
        let source = self.source.as_ref();
        Paginator::new(move |token| source.list_work_groups(token))
            .collect_all()
            .await
    }

    /// Fetch every saved query in `group`, in listing order
    ///
    /// Identifiers are paginated first, then each query is fetched on its
    /// own. The returned queries carry `group` as their workgroup.
    pub async fn list_queries_for_group(&self, group: &str) -> Result<Vec<SavedQuery>, FetchError> {
        let source = self.source.as_ref();
        let ids = Paginator::new(move |token| source.list_named_query_ids(group, token))
            .collect_all()
            .await?;

        tracing::debug!(workgroup = group, count = ids.len(), "listed saved query ids");

        let mut queries = Vec::with_capacity(ids.len());
        for id in &ids {
            let query = self.source.get_named_query(id).await?;
            queries.push(SavedQuery::new(query.name, group, query.database, query.query_string));
        }

        Ok(queries)
    }

    /// Collect every workgroup's queries, writing one snapshot per workgroup
    pub async fn collect_all(&self) -> Result<QueryCollection, HarvestError> {
        let groups = self.list_execution_groups().await?;
        let mut collection = QueryCollection::default();

        for group in &groups {
            let queries = self.list_queries_for_group(group).await?;

            let snapshot = GroupSnapshot::new(group.clone(), queries);
            let receipt = self.writer.write_snapshot(&snapshot).await?;

            tracing::info!(
                workgroup = %group,
                queries = snapshot.queries.len(),
                "Saved {} queries for workgroup '{}' to {}/{}",
                snapshot.queries.len(),
                group,
                self.writer.location(),
                receipt.key
            );

            collection.queries.extend(snapshot.queries);
            collection.receipts.push(receipt);
        }

        collection.groups = groups;
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemorySourceBuilder, SourceCall};
    use gluekb_sink::MemorySink;
    use pretty_assertions::assert_eq;

    fn writer(sink: &MemorySink) -> SnapshotWriter {
        SnapshotWriter::new(Arc::new(sink.clone()))
    }

    #[tokio::test]
    async fn collects_queries_per_group_in_order() {
        let source = InMemorySourceBuilder::new()
            .with_query("primary", "q1", "sales", "SELECT * FROM orders")
            .with_query("primary", "q2", "sales", "SELECT * FROM customers")
            .with_query("adhoc", "q3", "ops", "SELECT 1")
            .with_page_size(1)
            .build();
        let sink = MemorySink::new("bucket");

        let collection = QueryCollector::new(Arc::new(source), writer(&sink))
            .collect_all()
            .await
            .unwrap();

        assert_eq!(collection.groups, vec!["primary", "adhoc"]);
        let names: Vec<_> = collection.queries.iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, vec!["q1", "q2", "q3"]);
        assert_eq!(collection.queries[2].group, "adhoc");
        assert_eq!(collection.receipts.len(), 2);

        assert_eq!(
            sink.keys().await,
            vec![
                "athena_saved_queries/adhoc.json".to_string(),
                "athena_saved_queries/primary.json".to_string(),
            ]
        );
        let primary = sink.get_json("athena_saved_queries/primary.json").await.unwrap();
        assert_eq!(primary.as_array().unwrap().len(), 2);
        assert_eq!(primary[1]["query_sql"], "SELECT * FROM customers");
    }

    #[tokio::test]
    async fn empty_group_still_writes_snapshot() {
        let source = InMemorySourceBuilder::new().with_work_group("empty").build();
        let sink = MemorySink::new("bucket");

        let collection = QueryCollector::new(Arc::new(source), writer(&sink))
            .collect_all()
            .await
            .unwrap();

        assert!(collection.is_empty());
        assert_eq!(
            sink.get_string("athena_saved_queries/empty.json").await.as_deref(),
            Some("[]")
        );
    }

    #[tokio::test]
    async fn duplicates_across_groups_are_kept() {
        let source = InMemorySourceBuilder::new()
            .with_query("a", "same", "db", "SELECT 1")
            .with_query("b", "same", "db", "SELECT 1")
            .build();
        let sink = MemorySink::new("bucket");

        let collection = QueryCollector::new(Arc::new(source), writer(&sink))
            .collect_all()
            .await
            .unwrap();

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.queries[0].group, "a");
        assert_eq!(collection.queries[1].group, "b");
    }

    #[tokio::test]
    async fn earlier_groups_stay_written_when_a_later_group_fails() {
        let source = InMemorySourceBuilder::new()
            .with_query("first", "q1", "db", "SELECT 1")
            .with_query("second", "q2", "db", "SELECT 2")
            .with_error(
                SourceCall::ListNamedQueries("second".to_string()),
                FetchError::PermissionDenied("second".to_string()),
            )
            .build();
        let sink = MemorySink::new("bucket");

        let err = QueryCollector::new(Arc::new(source), writer(&sink))
            .collect_all()
            .await
            .unwrap_err();

        assert!(matches!(err, HarvestError::SourceUnavailable(_)));
        assert_eq!(sink.keys().await, vec!["athena_saved_queries/first.json".to_string()]);
    }

    #[tokio::test]
    async fn detail_fetch_failure_propagates() {
        let source = InMemorySourceBuilder::new()
            .with_query("primary", "q1", "db", "SELECT 1")
            .build();
        let id = source.query_ids("primary")[0].clone();
        let source = source.with_error(
            SourceCall::GetNamedQuery(id),
            FetchError::NetworkError("reset".to_string()),
        );
        let sink = MemorySink::new("bucket");

        let collector = QueryCollector::new(Arc::new(source), writer(&sink));
        let result = collector.list_queries_for_group("primary").await;
        assert!(matches!(result, Err(FetchError::NetworkError(_))));
    }
}
