//! Audit Rules - Static-analysis rules for blueprint graphs
//!
//! This crate contains the rule trait, the ordered rule registry, the
//! engine that drives rules with fault isolation, and the built-in rules.

pub use audit_graph;

mod config;
mod registry;
mod rules;

pub use config::*;
pub use registry::*;
pub use rules::*;
