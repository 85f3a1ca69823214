//! Test fixtures for harvest integration tests
//!
//! Reusable sources and harvesters built on the in-memory source and sink.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use gluekb_catalog::{InMemorySource, InMemorySourceBuilder, RawColumn, RawTable};
use gluekb_core::HarvestSettings;
use gluekb_engine::{HarvestServices, Harvester, StaticConnector};
use gluekb_sink::MemorySink;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const BUCKET: &str = "kb-bucket";
pub const ROLE: &str = "arn:aws:iam::123456789012:role/glue-reader";

pub fn settings() -> HarvestSettings {
    HarvestSettings::new(BUCKET, ROLE)
}

/// Harvester over `source`, writing into `sink`
pub fn harvester_with(
    settings: HarvestSettings,
    source: &InMemorySource,
    sink: &MemorySink,
) -> Harvester<StaticConnector> {
    let source = Arc::new(source.clone());
    let services = HarvestServices::new(source.clone(), source, Arc::new(sink.clone()));
    Harvester::new(settings, StaticConnector::new(services))
}

pub fn harvester(source: &InMemorySource, sink: &MemorySink) -> Harvester<StaticConnector> {
    harvester_with(settings(), source, sink)
}

/// A typical external orders table
pub fn orders_table() -> RawTable {
    RawTable {
        description: Some("Customer orders".to_string()),
        owner: Some("etl".to_string()),
        create_time: Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()),
        update_time: Some(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()),
        parameters: Some(BTreeMap::from([
            ("classification".to_string(), "parquet".to_string()),
            ("EXTERNAL".to_string(), "TRUE".to_string()),
        ])),
        ..RawTable::new("orders")
    }
    .with_table_type("EXTERNAL_TABLE")
    .with_location("s3://lake/sales/orders/")
    .with_columns(vec![
        RawColumn::new("order_id", "bigint").with_comment("Primary key"),
        RawColumn::new("customer_id", "bigint"),
        RawColumn::new("amount", "decimal(10,2)"),
    ])
    .with_partition_keys(vec![RawColumn::new("dt", "string")])
}

/// A customers table with no optional metadata
pub fn customers_table() -> RawTable {
    RawTable::new("customers")
        .with_columns(vec![
            RawColumn::new("customer_id", "bigint"),
            RawColumn::new("email", "string"),
        ])
}

/// A view over orders whose view text must survive normalization
pub fn daily_totals_view() -> RawTable {
    RawTable::new("daily_totals")
        .with_table_type("VIRTUAL_VIEW")
        .with_view_text("SELECT dt, sum(amount) FROM orders GROUP BY dt")
        .with_columns(vec![
            RawColumn::new("dt", "string"),
            RawColumn::new("total", "decimal(20,2)"),
        ])
}

/// Two workgroups with one query each, one database with two tables.
/// Only `orders` is named (as a whole word) in exactly one query.
pub fn two_group_source() -> InMemorySource {
    InMemorySourceBuilder::new()
        .with_query(
            "primary",
            "revenue_by_day",
            "sales",
            "SELECT dt, sum(amount) FROM sales.orders GROUP BY dt",
        )
        .with_query(
            "analysts",
            "backlog",
            "sales",
            "SELECT count(*) FROM backorders",
        )
        .with_table("sales", orders_table())
        .with_table("sales", customers_table())
        .build()
}
