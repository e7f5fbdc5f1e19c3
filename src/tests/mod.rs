mod config_tests;
mod group_tests;

use crate::core::models::expense::Expense;
use crate::core::models::settlement::MemberBalance;
use crate::core::services::GroupService;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use chrono::{DateTime, TimeZone, Utc};

pub fn create_test_service() -> GroupService<InMemoryLogging, InMemoryStorage> {
    let _ = env_logger::try_init();
    GroupService::new(InMemoryStorage::new(), InMemoryLogging::new())
}

pub fn roster(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub fn expense(id: &str, amount: f64, paid_by: &str, participants: &[&str]) -> Expense {
    Expense {
        id: id.to_string(),
        group_id: "g1".to_string(),
        title: format!("expense {}", id),
        amount,
        paid_by: paid_by.to_string(),
        participants: roster(participants),
        settled_participants: Vec::new(),
        is_fully_settled: false,
        settled_at: None,
        created_at: at(0),
        updated_at: at(0),
    }
}

pub fn balance_of(balances: &[MemberBalance], name: &str) -> f64 {
    balances
        .iter()
        .find(|b| b.member == name)
        .map(|b| b.balance)
        .unwrap_or_else(|| panic!("no balance for {}", name))
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}
