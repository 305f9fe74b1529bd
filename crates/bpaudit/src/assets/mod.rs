//! Asset Index
//!
//! Read-only view of the project's blueprint assets on disk, plus a file
//! watcher that re-audits assets when the editor saves them.

mod index;
mod watcher;

pub use index::*;
pub use watcher::*;
