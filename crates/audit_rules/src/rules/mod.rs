//! Built-in audit rules

mod complexity;
mod dangling;
mod naming;
mod tick_cost;
mod unreachable;

pub use complexity::ExcessiveComplexity;
pub use dangling::DanglingPins;
pub use naming::NamingConventions;
pub use tick_cost::ExpensiveInTick;
pub use unreachable::UnreachableNodes;
