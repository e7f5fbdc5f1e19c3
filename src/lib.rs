pub mod api;
pub mod config;
pub mod constants;
pub mod core;
pub mod infrastructure;

pub use crate::core::engine::{BalanceCalculator, OrphanedDebtPolicy, SettlementPlanner};
pub use crate::core::errors::GroupSplitError;
pub use crate::core::services::GroupService;
pub use infrastructure::logging::in_memory::InMemoryLogging;
pub use infrastructure::storage::in_memory::InMemoryStorage;

#[cfg(test)]
mod tests;
