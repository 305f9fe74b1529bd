//! Bridge State
//!
//! Shared state handed to every handler. Created in `main` for the lifetime
//! of the server and dropped at shutdown.

use std::sync::Arc;

use crate::assets::AssetIndex;
use crate::audit::{Orchestrator, ReportStore};

/// Application state for the HTTP bridge
#[derive(Clone)]
pub struct AuditContext {
    pub index: Arc<AssetIndex>,
    pub store: Arc<ReportStore>,
    pub orchestrator: Orchestrator,
    /// Port the listener actually bound to
    pub port: u16,
}

impl AuditContext {
    pub fn new(
        index: Arc<AssetIndex>,
        store: Arc<ReportStore>,
        orchestrator: Orchestrator,
        port: u16,
    ) -> Self {
        Self {
            index,
            store,
            orchestrator,
            port,
        }
    }
}
