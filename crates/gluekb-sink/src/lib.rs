//! Snapshot sinks
//!
//! A sink is the object store every snapshot lands in. The writer renders a
//! payload to pretty JSON and puts it under a deterministic key; sinks only
//! move bytes.
//!
//! ## Example
//!
//! ```rust,ignore
//! use gluekb_sink::{MemorySink, SnapshotWriter};
//! use std::sync::Arc;
//!
//! let sink = MemorySink::new("kb-bucket");
//! let writer = SnapshotWriter::new(Arc::new(sink.clone()));
//! let receipt = writer.write("AwsDataCatalog/sales.json", &tables).await?;
//! ```

pub mod local;
pub mod memory;
pub mod sink;
pub mod writer;

pub use local::LocalDirectorySink;
pub use memory::MemorySink;
pub use sink::{SinkError, SnapshotSink};
pub use writer::{SnapshotWriter, WriteReceipt};
