//! Pure settlement engine for a single group snapshot.
//!
//! Data flows leaves-first: each expense's settlement state decides who still owes,
//! [`BalanceCalculator`] nets those debts into per-member balances, and
//! [`SettlementPlanner`] turns balances into pairwise transfers. Nothing here performs
//! I/O or keeps state between calls.

pub mod balance_calculator;
pub mod settlement_planner;
pub mod settlement_state;

pub use balance_calculator::{BalanceCalculator, OrphanedDebtPolicy, total_balance};
pub use settlement_planner::{SettlementPlanner, from_subunits, to_subunits};
