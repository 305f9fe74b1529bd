//! Audit Graph - Normalized graph model for blueprint audits
//!
//! This crate contains the data structures shared by the audit engine:
//! the on-disk host asset format, the normalized graph snapshot produced
//! by the adapter, and findings/reports.

mod adapter;
mod finding;
mod host;
mod types;

pub use adapter::*;
pub use finding::*;
pub use host::*;
pub use types::*;
