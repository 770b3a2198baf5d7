//! Capacity Core
//!
//! Decodes trust-network ledger snapshots and derives per-pair transfer
//! capacities.
//!
//! # Architecture
//!
//! - **Snapshot**: binary snapshot → trust table, balance table, organizations
//! - **Capacity**: transfer limit for any ordered pair of accounts
//! - **Graph**: utilized balances annotated with capacities, for inspection

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]
//!
//! # Invariants
//!
//! - Tables are built once and never mutated afterwards
//! - Absent pairs read as zero
//! - Capacity is never negative: a negative intermediate is a defect and panics

#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod snapshot;
pub mod capacity;
pub mod graph;
pub mod error;

// Re-exports
pub use error::{Error, Result};
pub use types::{AccountId, Address, Amount, AmountTable, BalanceTable, EdgeTable, TrustTable};
pub use snapshot::{Snapshot, SnapshotBuilder};
pub use capacity::CapacityEngine;
pub use graph::{GraphSummary, UtilizationGraph};
