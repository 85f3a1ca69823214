//! Harvest orchestration
//!
//! A run moves through these phases:
//!
//! ```text
//! Init -> CollectingQueries -> CollectingCatalog(db)* -> Done
//!   \____________\_________________\___________________-> Failed
//! ```
//!
//! Everything happens sequentially: all saved queries are collected (and
//! each workgroup written) before the catalog is touched, then databases are
//! processed one at a time in listing order. The first error ends the run.
//! Snapshots written before the error stay in the sink.

use crate::connector::ServiceConnector;
use crate::matcher::QueryMatcher;
use gluekb_catalog::{CatalogCollector, QueryCollector, RawTable};
use gluekb_core::{
    DatabaseSnapshot, HarvestError, HarvestSettings, InvocationResult, SavedQuery, TableRecord,
};
use gluekb_sink::{SnapshotWriter, WriteReceipt};
use std::fmt;
use std::sync::Mutex;

/// Where a harvest run is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestPhase {
    /// Validating configuration
    Init,

    /// Collecting saved queries from every workgroup
    CollectingQueries,

    /// Processing the catalog; `None` while listing databases
    CollectingCatalog { database: Option<String> },

    Done,

    Failed,
}

impl fmt::Display for HarvestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::CollectingQueries => write!(f, "collecting queries"),
            Self::CollectingCatalog { database: None } => write!(f, "listing databases"),
            Self::CollectingCatalog { database: Some(db) } => {
                write!(f, "collecting catalog ({})", db)
            }
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Counts and receipts from a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    pub workgroups: usize,
    pub queries: usize,
    pub databases: usize,
    pub tables: usize,

    /// Total (table, query) matches across all databases
    pub matches: usize,

    /// Every object written, in write order
    pub receipts: Vec<WriteReceipt>,
}

impl fmt::Display for HarvestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Glue metadata uploaded successfully: {} tables in {} databases, {} saved queries from {} workgroups, {} query matches",
            self.tables, self.databases, self.queries, self.workgroups, self.matches
        )
    }
}

/// Runs harvests with one set of settings and one connector
pub struct Harvester<C> {
    settings: HarvestSettings,
    connector: C,

    /// Phases entered by the most recent run
    history: Mutex<Vec<HarvestPhase>>,
}

impl<C: ServiceConnector> Harvester<C> {
    pub fn new(settings: HarvestSettings, connector: C) -> Self {
        Self {
            settings,
            connector,
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Run a harvest and collapse the outcome into an invocation result
    pub async fn run(&self) -> InvocationResult {
        InvocationResult::from_outcome(self.try_run().await)
    }

    /// Run a harvest, returning the summary or the error that stopped it
    pub async fn try_run(&self) -> Result<HarvestSummary, HarvestError> {
        self.history_guard().clear();

        match self.execute().await {
            Ok(summary) => {
                self.enter(HarvestPhase::Done);
                tracing::info!(
                    tables = summary.tables,
                    databases = summary.databases,
                    queries = summary.queries,
                    "harvest finished"
                );
                Ok(summary)
            }
            Err(err) => {
                let during = self.phase();
                self.enter(HarvestPhase::Failed);
                tracing::error!(phase = %during, error = %err, "harvest failed");
                Err(err)
            }
        }
    }

    /// Most recent phase; `Init` before the first run
    pub fn phase(&self) -> HarvestPhase {
        self.history_guard()
            .last()
            .cloned()
            .unwrap_or(HarvestPhase::Init)
    }

    /// Phases entered by the most recent run, in order
    pub fn phases(&self) -> Vec<HarvestPhase> {
        self.history_guard().clone()
    }

    async fn execute(&self) -> Result<HarvestSummary, HarvestError> {
        self.enter(HarvestPhase::Init);
        let config = self.settings.validate()?;

        let services = self.connector.connect(&config).await?;
        let writer = SnapshotWriter::new(services.sink.clone());
        tracing::info!(
            bucket = %config.sink_location,
            catalog = %config.catalog_name,
            sink = %writer.location(),
            "connected"
        );

        self.enter(HarvestPhase::CollectingQueries);
        let collection = QueryCollector::new(services.queries.clone(), writer.clone())
            .collect_all()
            .await?;
        tracing::info!(
            "Fetched {} saved queries across {} workgroups",
            collection.len(),
            collection.groups.len()
        );

        let mut summary = HarvestSummary {
            workgroups: collection.groups.len(),
            queries: collection.len(),
            receipts: collection.receipts,
            ..HarvestSummary::default()
        };

        self.enter(HarvestPhase::CollectingCatalog { database: None });
        let catalog = CatalogCollector::new(services.catalog.clone(), &config.catalog_name);
        let databases = catalog.list_databases().await?;

        for database in &databases {
            self.enter(HarvestPhase::CollectingCatalog {
                database: Some(database.clone()),
            });
            tracing::info!(database = %database, "Processing database");

            let raw_tables = catalog.list_tables(database).await?;
            let snapshot = build_database_snapshot(&catalog, database, &raw_tables, &collection.queries)?;

            let matches: usize = snapshot.tables.iter().map(|t| t.matched_queries.len()).sum();
            let receipt = writer.write_snapshot(&snapshot).await?;
            tracing::info!(
                database = %database,
                tables = snapshot.tables.len(),
                matches,
                key = %receipt.key,
                "Saved metadata for database"
            );

            summary.databases += 1;
            summary.tables += snapshot.tables.len();
            summary.matches += matches;
            summary.receipts.push(receipt);
        }

        Ok(summary)
    }

    fn enter(&self, phase: HarvestPhase) {
        tracing::debug!(phase = %phase, "entering phase");
        self.history_guard().push(phase);
    }

    fn history_guard(&self) -> std::sync::MutexGuard<'_, Vec<HarvestPhase>> {
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Normalize and match every table of one database
///
/// Each table is matched against the full query collection on its own, so a
/// query may appear under several tables.
pub fn build_database_snapshot(
    catalog: &CatalogCollector,
    database: &str,
    raw_tables: &[RawTable],
    queries: &[SavedQuery],
) -> Result<DatabaseSnapshot, HarvestError> {
    let tables = raw_tables
        .iter()
        .map(|raw| {
            let mut record: TableRecord = catalog.normalize_table(raw, database);
            record.matched_queries = QueryMatcher::for_table(&record.name)?.matched_queries(queries);
            Ok(record)
        })
        .collect::<Result<Vec<_>, HarvestError>>()?;

    Ok(DatabaseSnapshot::new(catalog.catalog_name(), database, tables))
}
