//! HTTP Bridge
//!
//! JSON-over-HTTP command/query surface for the audit engine. The bridge is
//! a pure translation layer: it dispatches to the orchestrator and report
//! store and never performs analysis itself.

mod context;
mod error;
mod handlers;
mod marker;
mod protocol;
mod router;

pub use context::AuditContext;
pub use error::ApiError;
pub use marker::{MARKER_FILE, ServerMarker, remove_marker, write_marker};
pub use protocol::*;
pub use router::create_router;
