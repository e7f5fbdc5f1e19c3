use super::balance_of;
use crate::config::Config;
use crate::core::engine::OrphanedDebtPolicy;
use crate::core::errors::GroupSplitError;
use crate::core::models::group::Member;
use crate::core::services::GroupService;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use std::collections::HashMap;

fn config_from(pairs: &[(&str, &str)]) -> Config {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn test_defaults_when_nothing_is_set() {
    let _ = env_logger::try_init();
    assert_eq!(config_from(&[]), Config::default());
}

#[test]
fn test_values_are_read() {
    let config = config_from(&[
        ("PORT", "8080"),
        ("LOG_LEVEL", "debug"),
        ("ORPHANED_DEBT_POLICY", "retain"),
        ("MAX_EXPENSE_AMOUNT", "250.5"),
        ("LOG_CAPACITY", "50"),
    ]);
    assert_eq!(config.port, 8080);
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.orphaned_debt_policy, OrphanedDebtPolicy::RetainAsUnknownMember);
    assert_eq!(config.max_expense_amount, 250.5);
    assert_eq!(config.log_capacity, 50);
}

#[test]
fn test_bad_values_fall_back_to_defaults() {
    let _ = env_logger::try_init();
    let config = config_from(&[
        ("PORT", "not-a-port"),
        ("ORPHANED_DEBT_POLICY", "forgive"),
        ("MAX_EXPENSE_AMOUNT", "-3"),
        ("LOG_CAPACITY", "0"),
    ]);
    assert_eq!(config, Config::default());
}

#[tokio::test]
async fn test_service_follows_config() {
    let _ = env_logger::try_init();
    let config = config_from(&[("ORPHANED_DEBT_POLICY", "retain"), ("MAX_EXPENSE_AMOUNT", "100")]);
    let service = GroupService::with_config(InMemoryStorage::new(), InMemoryLogging::new(), &config);
    let group = service
        .create_group(
            "Flat".to_string(),
            None,
            vec![Member::named("Alice"), Member::named("Bob")],
        )
        .await
        .unwrap();

    let result = service
        .add_expense(&group.id, "Sofa".to_string(), 150.0, "Alice".to_string(), vec![])
        .await;
    assert!(matches!(result, Err(GroupSplitError::MalformedExpense(_))));

    service
        .add_expense(&group.id, "Rent".to_string(), 100.0, "Alice".to_string(), vec![])
        .await
        .unwrap();
    service.add_member(&group.id, Member::named("Carol")).await.unwrap();
    service.remove_member(&group.id, "Bob").await.unwrap();

    let response = service.get_balances(&group.id).await.unwrap();
    assert_eq!(response.balances.len(), 3);
    assert_eq!(balance_of(&response.balances, "Bob"), -50.0);
    assert_eq!(balance_of(&response.balances, "Alice"), 50.0);
}
