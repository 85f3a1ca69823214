//! gluekb engine
//!
//! Ties the collectors together into a harvest run:
//! - Query matching (which saved queries mention which tables)
//! - Service connection, behind [`ServiceConnector`]
//! - The [`Harvester`] state machine that produces the snapshots

pub mod connector;
pub mod harvester;
pub mod matcher;

pub use connector::{HarvestServices, ServiceConnector, StaticConnector};
pub use harvester::{build_database_snapshot, HarvestPhase, HarvestSummary, Harvester};
pub use matcher::{match_queries, QueryMatcher};
