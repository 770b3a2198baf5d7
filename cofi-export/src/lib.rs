//! CoFi Export
//!
//! Converts trust-network payment capacities into the debtor/creditor
//! format consumed by the set-off solver.
//!
//! # Architecture

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]
//!
//! 1. **Ingestion**: pathfinder2 edge CSV, or a binary snapshot decoded by
//!    `capacity_core`
//! 2. **Amounts**: aggregated capacities, utilized balances or derived
//!    transfer limits
//! 3. **Transformation**: capacity edges become debt edges, rescaled to
//!    netting units over a deterministic account index
//! 4. **Output**: `debtor,creditor,amount` CSV plus an optional index table
//!
//! # Example
//!
//! ```no_run
//! use cofi_export::{Config, Converter};
//!
//! fn main() -> cofi_export::Result<()> {
//!     let config = Config::from_env()?;
//!     let report = Converter::new(config)?.run()?;
//!     println!("wrote {} rows over {} accounts", report.rows_written, report.accounts);
//!     Ok(())
//! }
//! ```

#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod pathfinder;
pub mod cofi;
pub mod error;
pub mod config;
pub mod engine;

// Re-exports
pub use error::{Error, Result};
pub use config::Config;
pub use engine::{ConversionReport, Converter};
