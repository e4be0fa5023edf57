//! Table I/O for the BERD pipeline.
//!
//! The clipper and the reconciler never touch storage themselves. They are
//! handed a [`TableStore`], a read / write / exists capability over whole
//! tables, and treat every call as all-or-nothing.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use berd_ingest::{LocalCsvStore, TableStore};
//!
//! let store = LocalCsvStore::new("data/2023");
//! let mut frozen = store.read_table(Path::new("frozen_snapshot.csv"))?;
//! store.write_table(Path::new("copy.csv"), &mut frozen)?;
//! ```

mod csv;
mod error;
mod store;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV ===
pub use csv::{read_csv_table, write_csv_table};

// === Storage Capability ===
pub use store::{LocalCsvStore, TableStore};
