//! bpaudit - Blueprint audit engine with an editor HTTP bridge
//!
//! This crate provides the application runtime:
//! - Read-only asset index over a project's blueprint files
//! - Audit orchestrator driving the adapter and rule engine per asset
//! - Report store with per-run retention
//! - HTTP+JSON bridge for external tools

// Re-export core crates
pub use audit_graph;
pub use audit_rules;

// Asset index and file watcher
pub mod assets;

// Orchestrator and report store
pub mod audit;

// Configuration
pub mod config;

// HTTP bridge
pub mod server;
