//! Audit Orchestration
//!
//! Drives the adapter and rule engine over a scope of assets, one run at a
//! time, and stores the resulting reports.

mod orchestrator;
mod store;

pub use orchestrator::*;
pub use store::*;
