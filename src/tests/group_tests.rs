use super::{assert_close, balance_of, create_test_service};
use crate::constants::{
    EXPENSE_ADDED, GROUP_CREATED, GROUP_DELETED, MAX_DESCRIPTION_LENGTH, MEMBER_REMOVED, SHARE_SETTLED,
};
use crate::core::engine::OrphanedDebtPolicy;
use crate::core::errors::{GroupSplitError, InvalidSettlementReason};
use crate::core::models::expense::{Expense, SettlementStatus, ShareSettlement};
use crate::core::models::audit::LogFilter;
use crate::core::models::group::{Group, Member};
use crate::infrastructure::storage::Storage;
use crate::core::models::settlement::Transfer;
use crate::core::services::GroupService;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use std::sync::Arc;

type TestService = GroupService<InMemoryLogging, InMemoryStorage>;

async fn trip(service: &TestService) -> Group {
    service
        .create_group(
            "Trip".to_string(),
            Some("Weekend away".to_string()),
            vec![Member::named("Alice"), Member::named("Bob"), Member::named("Carol")],
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_group() {
    let service = create_test_service();
    let group = trip(&service).await;

    assert_eq!(group.name, "Trip");
    assert_eq!(group.description, "Weekend away");
    assert_eq!(group.member_names(), vec!["Alice", "Bob", "Carol"]);
    assert!(group.balances.iter().all(|b| b.balance == 0.0));

    let fetched = service.get_group(&group.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, group.id);

    let audits = service.get_group_audits(&group.id).await.unwrap();
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].action, GROUP_CREATED);
}

#[tokio::test]
async fn test_create_group_rejects_duplicate_names() {
    let service = create_test_service();
    let result = service
        .create_group(
            "Trip".to_string(),
            None,
            vec![Member::named("Alice"), Member::named("alice")],
        )
        .await;
    assert!(matches!(result, Err(GroupSplitError::MemberAlreadyExists(_))));
}

#[tokio::test]
async fn test_create_group_rejects_empty_name() {
    let service = create_test_service();
    let result = service.create_group("  ".to_string(), None, vec![]).await;
    assert!(matches!(result, Err(GroupSplitError::InvalidInput(field, _)) if field == "name"));
}

#[tokio::test]
async fn test_expense_and_balances() {
    let service = create_test_service();
    let group = trip(&service).await;

    service
        .add_expense(&group.id, "Dinner".to_string(), 300.0, "Alice".to_string(), vec![])
        .await
        .unwrap();

    let response = service.get_balances(&group.id).await.unwrap();
    assert_close(balance_of(&response.balances, "Alice"), 200.0);
    assert_close(balance_of(&response.balances, "Bob"), -100.0);
    assert_close(balance_of(&response.balances, "Carol"), -100.0);
    assert_eq!(
        response.settlements,
        vec![
            Transfer {
                from: "Bob".to_string(),
                to: "Alice".to_string(),
                amount: 100.0
            },
            Transfer {
                from: "Carol".to_string(),
                to: "Alice".to_string(),
                amount: 100.0
            },
        ]
    );

    // stored balances are refreshed on every write
    let stored = service.get_group(&group.id).await.unwrap().unwrap();
    assert_eq!(stored.balances, response.balances);
}

#[tokio::test]
async fn test_empty_participants_snapshot_the_roster() {
    let service = create_test_service();
    let group = trip(&service).await;

    let expense = service
        .add_expense(&group.id, "Dinner".to_string(), 300.0, "Alice".to_string(), vec![])
        .await
        .unwrap();
    assert_eq!(expense.participants, vec!["Alice", "Bob", "Carol"]);

    // a later member does not join an existing expense
    service.add_member(&group.id, Member::named("Dave")).await.unwrap();
    let response = service.get_balances(&group.id).await.unwrap();
    assert_close(balance_of(&response.balances, "Alice"), 200.0);
    assert_close(balance_of(&response.balances, "Dave"), 0.0);
}

async fn add(
    service: &TestService,
    group_id: &str,
    amount: f64,
    paid_by: &str,
    participants: &[&str],
) -> Result<Expense, GroupSplitError> {
    service
        .add_expense(
            group_id,
            "Taxi".to_string(),
            amount,
            paid_by.to_string(),
            participants.iter().map(|p| p.to_string()).collect(),
        )
        .await
}

#[tokio::test]
async fn test_add_expense_validation() {
    let service = create_test_service();
    let group = trip(&service).await;
    assert!(matches!(add(&service, &group.id, 0.0, "Alice", &[]).await, Err(GroupSplitError::MalformedExpense(_))));
    assert!(matches!(add(&service, &group.id, -5.0, "Alice", &[]).await, Err(GroupSplitError::MalformedExpense(_))));
    assert!(matches!(add(&service, &group.id, f64::NAN, "Alice", &[]).await, Err(GroupSplitError::MalformedExpense(_))));
    assert!(matches!(add(&service, &group.id, 10.005, "Alice", &[]).await, Err(GroupSplitError::MalformedExpense(_))));
    assert!(matches!(
        add(&service, &group.id, 2_000_000.0, "Alice", &[]).await,
        Err(GroupSplitError::MalformedExpense(_))
    ));
    assert!(matches!(
        add(&service, &group.id, 10.0, "Mallory", &[]).await,
        Err(GroupSplitError::MemberNotFound(name)) if name == "Mallory"
    ));
    assert!(matches!(
        add(&service, &group.id, 10.0, "Alice", &["Alice", "Zed"]).await,
        Err(GroupSplitError::MemberNotFound(name)) if name == "Zed"
    ));

    let expense = add(&service, &group.id, 10.5, "Alice", &["Alice", "Bob", "Bob"]).await.unwrap();
    assert_eq!(expense.participants, vec!["Alice", "Bob"]);
    assert_eq!(service.list_expenses(&group.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_settle_share_until_fully_settled() {
    let service = create_test_service();
    let group = trip(&service).await;
    let expense = service
        .add_expense(&group.id, "Dinner".to_string(), 300.0, "Alice".to_string(), vec![])
        .await
        .unwrap();

    let (settled, outcome) = service.settle_share(&group.id, &expense.id, "Bob").await.unwrap();
    assert_eq!(outcome, ShareSettlement::Recorded);
    assert_eq!(outcome.message(), "Your share has been settled");
    assert_eq!(settled.settled_participants, vec!["Bob"]);
    assert!(!settled.is_fully_settled);

    let response = service.get_balances(&group.id).await.unwrap();
    assert_close(balance_of(&response.balances, "Alice"), 100.0);
    assert_close(balance_of(&response.balances, "Bob"), 0.0);
    assert_close(balance_of(&response.balances, "Carol"), -100.0);

    let (settled, outcome) = service.settle_share(&group.id, &expense.id, "Carol").await.unwrap();
    assert_eq!(outcome, ShareSettlement::CompletedExpense);
    assert_eq!(outcome.message(), "Expense settled successfully");
    assert!(settled.is_fully_settled);
    assert!(settled.settled_at.is_some());

    let response = service.get_balances(&group.id).await.unwrap();
    assert!(response.balances.iter().all(|b| b.balance == 0.0));
    assert!(response.settlements.is_empty());

    let audits = service.get_group_audits(&group.id).await.unwrap();
    assert_eq!(audits.iter().filter(|a| a.action == SHARE_SETTLED).count(), 2);
}

#[tokio::test]
async fn test_settle_share_twice_is_a_no_op() {
    let service = create_test_service();
    let group = trip(&service).await;
    let expense = service
        .add_expense(&group.id, "Dinner".to_string(), 300.0, "Alice".to_string(), vec![])
        .await
        .unwrap();

    let (first, _) = service.settle_share(&group.id, &expense.id, "Bob").await.unwrap();
    let audits_before = service.get_group_audits(&group.id).await.unwrap().len();

    let (second, outcome) = service.settle_share(&group.id, &expense.id, "Bob").await.unwrap();
    assert_eq!(outcome, ShareSettlement::AlreadySettled);
    assert_eq!(outcome.message(), "Your share is already settled");
    assert_eq!(first, second);
    assert_eq!(service.get_group_audits(&group.id).await.unwrap().len(), audits_before);
}

#[tokio::test]
async fn test_payer_and_outsider_cannot_settle() {
    let service = create_test_service();
    let group = trip(&service).await;
    let expense = service
        .add_expense(
            &group.id,
            "Coffee".to_string(),
            8.0,
            "Alice".to_string(),
            vec!["Alice".to_string(), "Bob".to_string()],
        )
        .await
        .unwrap();

    let result = service.settle_share(&group.id, &expense.id, "Alice").await;
    assert_eq!(
        result.unwrap_err(),
        GroupSplitError::InvalidSettlement {
            member: "Alice".to_string(),
            reason: InvalidSettlementReason::PayerCannotSettle,
        }
    );

    let result = service.settle_share(&group.id, &expense.id, "Carol").await;
    assert!(matches!(
        result,
        Err(GroupSplitError::InvalidSettlement {
            reason: InvalidSettlementReason::NotAParticipant,
            ..
        })
    ));

    let stored = service.list_expenses(&group.id).await.unwrap();
    assert_eq!(stored, vec![expense]);
}

#[tokio::test]
async fn test_expense_from_another_group_is_not_found() {
    let service = create_test_service();
    let group = trip(&service).await;
    let other = trip(&service).await;
    let expense = service
        .add_expense(&group.id, "Dinner".to_string(), 30.0, "Alice".to_string(), vec![])
        .await
        .unwrap();

    let result = service.settle_share(&other.id, &expense.id, "Bob").await;
    assert!(matches!(result, Err(GroupSplitError::ExpenseNotFound(_))));
    let result = service.delete_expense(&other.id, &expense.id).await;
    assert!(matches!(result, Err(GroupSplitError::ExpenseNotFound(_))));
}

#[tokio::test]
async fn test_bulk_settle_clears_balances() {
    let service = create_test_service();
    let group = trip(&service).await;
    let expense = service
        .add_expense(&group.id, "Dinner".to_string(), 300.0, "Alice".to_string(), vec![])
        .await
        .unwrap();
    service.settle_share(&group.id, &expense.id, "Carol").await.unwrap();

    let settled = service.settle_expense(&group.id, &expense.id).await.unwrap();
    assert!(settled.is_fully_settled);
    assert!(settled.settled_at.is_some());
    assert_eq!(settled.settled_participants, vec!["Carol", "Bob"]);

    let response = service.get_balances(&group.id).await.unwrap();
    assert!(response.balances.iter().all(|b| b.balance == 0.0));

    let (_, outcome) = service.settle_share(&group.id, &expense.id, "Bob").await.unwrap();
    assert_eq!(outcome, ShareSettlement::AlreadySettled);
}

#[tokio::test]
async fn test_editing_settled_expense_keeps_it_settled() {
    let service = create_test_service();
    let group = trip(&service).await;
    let expense = service
        .add_expense(&group.id, "Dinner".to_string(), 300.0, "Alice".to_string(), vec![])
        .await
        .unwrap();
    service.settle_expense(&group.id, &expense.id).await.unwrap();

    let updated = service
        .update_expense(&group.id, &expense.id, Some("Big dinner".to_string()), Some(600.0))
        .await
        .unwrap();
    assert_eq!(updated.title, "Big dinner");
    assert_eq!(updated.amount, 600.0);
    assert!(updated.is_fully_settled);

    let response = service.get_balances(&group.id).await.unwrap();
    assert!(response.balances.iter().all(|b| b.balance == 0.0));
}

#[tokio::test]
async fn test_update_and_delete_expense_recalculate() {
    let service = create_test_service();
    let group = trip(&service).await;
    let expense = service
        .add_expense(&group.id, "Dinner".to_string(), 300.0, "Alice".to_string(), vec![])
        .await
        .unwrap();

    service
        .update_expense(&group.id, &expense.id, None, Some(150.0))
        .await
        .unwrap();
    let stored = service.get_group(&group.id).await.unwrap().unwrap();
    assert_close(balance_of(&stored.balances, "Alice"), 100.0);

    service.delete_expense(&group.id, &expense.id).await.unwrap();
    let stored = service.get_group(&group.id).await.unwrap().unwrap();
    assert!(stored.balances.iter().all(|b| b.balance == 0.0));
    assert!(service.list_expenses(&group.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_member_is_case_insensitive_unique() {
    let service = create_test_service();
    let group = trip(&service).await;

    let result = service.add_member(&group.id, Member::named("BOB")).await;
    assert!(matches!(result, Err(GroupSplitError::MemberAlreadyExists(_))));

    let updated = service.add_member(&group.id, Member::named("Dave")).await.unwrap();
    assert_eq!(updated.members.len(), 4);
    assert_eq!(updated.balances.len(), 4);
}

#[tokio::test]
async fn test_remove_member_drops_their_debt_by_default() {
    let service = create_test_service();
    let group = trip(&service).await;
    service
        .add_expense(&group.id, "Dinner".to_string(), 300.0, "Alice".to_string(), vec![])
        .await
        .unwrap();

    let updated = service.remove_member(&group.id, "Carol").await.unwrap();
    assert_eq!(updated.member_names(), vec!["Alice", "Bob"]);

    let response = service.get_balances(&group.id).await.unwrap();
    assert_eq!(response.balances.len(), 2);
    assert_close(balance_of(&response.balances, "Alice"), 200.0);
    assert_close(balance_of(&response.balances, "Bob"), -100.0);

    let audits = service.get_group_audits(&group.id).await.unwrap();
    assert!(audits.iter().any(|a| a.action == MEMBER_REMOVED));
}

#[tokio::test]
async fn test_remove_member_can_retain_their_debt() {
    let _ = env_logger::try_init();
    let service = GroupService::new(InMemoryStorage::new(), InMemoryLogging::new())
        .with_orphaned_debt_policy(OrphanedDebtPolicy::RetainAsUnknownMember);
    let group = trip(&service).await;
    service
        .add_expense(&group.id, "Dinner".to_string(), 300.0, "Alice".to_string(), vec![])
        .await
        .unwrap();
    service.remove_member(&group.id, "Carol").await.unwrap();

    let response = service.get_balances(&group.id).await.unwrap();
    assert_eq!(response.balances.len(), 3);
    assert_close(balance_of(&response.balances, "Carol"), -100.0);
    assert_eq!(response.settlements.len(), 2);
}

#[tokio::test]
async fn test_remove_member_errors() {
    let service = create_test_service();
    let group = service
        .create_group("Solo".to_string(), None, vec![Member::named("Alice")])
        .await
        .unwrap();

    let result = service.remove_member(&group.id, "Bob").await;
    assert!(matches!(result, Err(GroupSplitError::MemberNotFound(_))));
    let result = service.remove_member(&group.id, "Alice").await;
    assert_eq!(result.unwrap_err(), GroupSplitError::CannotRemoveLastMember);
}

#[tokio::test]
async fn test_member_view() {
    let service = create_test_service();
    let group = trip(&service).await;
    let dinner = service
        .add_expense(&group.id, "Dinner".to_string(), 300.0, "Alice".to_string(), vec![])
        .await
        .unwrap();
    service.settle_share(&group.id, &dinner.id, "Bob").await.unwrap();

    let view = service.member_view(&group.id, "Carol").await.unwrap();
    assert_eq!(view.member, "Carol");
    assert_eq!(view.summary.you_pay.len(), 1);
    assert_eq!(view.summary.you_pay[0].member, "Alice");
    assert_eq!(view.summary.you_pay[0].amount, 100.0);
    assert!(view.summary.you_receive.is_empty());
    assert_eq!(view.expenses.len(), 1);
    assert!(view.expenses[0].can_settle);
    assert!(!view.expenses[0].is_member_settled);
    assert_eq!(view.expenses[0].status, SettlementStatus::PartiallySettled);

    let view = service.member_view(&group.id, "Alice").await.unwrap();
    assert_eq!(view.summary.you_receive.len(), 1);
    assert_eq!(view.summary.you_receive[0].member, "Carol");
    assert!(!view.expenses[0].can_settle);
    assert!(view.expenses[0].is_member_settled);

    let view = service.member_view(&group.id, "Bob").await.unwrap();
    assert!(view.summary.you_pay.is_empty());
    assert!(!view.expenses[0].can_settle);
    assert!(view.expenses[0].is_member_settled);

    let result = service.member_view(&group.id, "Mallory").await;
    assert!(matches!(result, Err(GroupSplitError::MemberNotFound(_))));
}

#[tokio::test]
async fn test_update_and_delete_group() {
    let service = create_test_service();
    let group = trip(&service).await;
    service
        .add_expense(&group.id, "Dinner".to_string(), 30.0, "Alice".to_string(), vec![])
        .await
        .unwrap();

    let updated = service
        .update_group(&group.id, Some("Road trip".to_string()), None)
        .await
        .unwrap();
    assert_eq!(updated.name, "Road trip");
    assert_eq!(updated.description, "Weekend away");

    service.delete_group(&group.id).await.unwrap();
    assert!(service.get_group(&group.id).await.unwrap().is_none());
    assert!(matches!(
        service.get_balances(&group.id).await,
        Err(GroupSplitError::GroupNotFound(_))
    ));
    assert!(matches!(
        service.delete_group(&group.id).await,
        Err(GroupSplitError::GroupNotFound(_))
    ));
}

#[tokio::test]
async fn test_app_logs_record_actions() {
    let service = create_test_service();
    let group = trip(&service).await;
    service
        .add_expense(&group.id, "Dinner".to_string(), 30.0, "Alice".to_string(), vec![])
        .await
        .unwrap();

    let logs = service.get_app_logs(&LogFilter::default()).await.unwrap();
    assert!(logs.iter().any(|l| l.action == GROUP_CREATED));
    let added = logs.iter().find(|l| l.action == EXPENSE_ADDED).unwrap();
    assert_eq!(added.member.as_deref(), Some("Alice"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_settles_are_serialized() {
    let service = Arc::new(create_test_service());
    let group = trip(&service).await;
    let expense = service
        .add_expense(&group.id, "Dinner".to_string(), 300.0, "Alice".to_string(), vec![])
        .await
        .unwrap();

    let mut handles = Vec::new();
    for member in ["Bob", "Bob", "Carol", "Carol"] {
        let service = Arc::clone(&service);
        let group_id = group.id.clone();
        let expense_id = expense.id.clone();
        handles.push(tokio::spawn(async move {
            service.settle_share(&group_id, &expense_id, member).await
        }));
    }

    let mut outcomes = Vec::new();
    for handle in handles {
        let (_, outcome) = handle.await.unwrap().unwrap();
        outcomes.push(outcome);
    }
    let count = |wanted: ShareSettlement| outcomes.iter().filter(|o| **o == wanted).count();
    assert_eq!(count(ShareSettlement::CompletedExpense), 1);
    assert_eq!(count(ShareSettlement::Recorded), 1);
    assert_eq!(count(ShareSettlement::AlreadySettled), 2);

    let stored = service.list_expenses(&group.id).await.unwrap();
    assert_eq!(stored[0].settled_participants.len(), 2);
    assert!(stored[0].is_fully_settled);

    let audits = service.get_group_audits(&group.id).await.unwrap();
    assert_eq!(audits.iter().filter(|a| a.action == SHARE_SETTLED).count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cached_balances_match_after_concurrent_expenses() {
    let service = Arc::new(create_test_service());
    let group = trip(&service).await;

    let mut handles = Vec::new();
    for (idx, payer) in ["Alice", "Bob", "Carol"].iter().cycle().take(16).enumerate() {
        let service = Arc::clone(&service);
        let group_id = group.id.clone();
        let payer = payer.to_string();
        handles.push(tokio::spawn(async move {
            service
                .add_expense(&group_id, format!("Round {}", idx), 10.0 + idx as f64, payer, vec![])
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = service.get_group(&group.id).await.unwrap().unwrap();
    let fresh = service.get_balances(&group.id).await.unwrap();
    assert_eq!(service.list_expenses(&group.id).await.unwrap().len(), 16);
    assert_eq!(stored.balances, fresh.balances);
}

#[tokio::test]
async fn test_update_group_rejects_long_description() {
    let service = create_test_service();
    let group = trip(&service).await;

    let result = service
        .update_group(&group.id, None, Some("x".repeat(MAX_DESCRIPTION_LENGTH + 1)))
        .await;
    assert!(matches!(result, Err(GroupSplitError::InvalidInput(field, _)) if field == "description"));

    let stored = service.get_group(&group.id).await.unwrap().unwrap();
    assert_eq!(stored.description, "Weekend away");
}

#[tokio::test]
async fn test_delete_group_removes_its_audit_trail() {
    let _ = env_logger::try_init();
    let storage = InMemoryStorage::new();
    let service = GroupService::new(storage.clone(), InMemoryLogging::new());
    let group = trip(&service).await;
    service
        .add_expense(&group.id, "Dinner".to_string(), 30.0, "Alice".to_string(), vec![])
        .await
        .unwrap();
    assert!(!storage.get_group_audits(&group.id).await.unwrap().is_empty());

    service.delete_group(&group.id).await.unwrap();

    assert!(storage.get_group_audits(&group.id).await.unwrap().is_empty());
    assert!(storage.get_group_expenses(&group.id).await.unwrap().is_empty());

    // the activity log still remembers the group
    let logs = service.get_app_logs(&LogFilter::for_group(&group.id)).await.unwrap();
    assert_eq!(logs[0].action, GROUP_DELETED);
    assert_eq!(logs.len(), 3);
}

#[tokio::test]
async fn test_app_logs_filter_by_group_and_member() {
    let service = create_test_service();
    let first = trip(&service).await;
    let second = trip(&service).await;
    let expense = service
        .add_expense(&first.id, "Dinner".to_string(), 30.0, "Alice".to_string(), vec![])
        .await
        .unwrap();
    service.settle_share(&first.id, &expense.id, "Bob").await.unwrap();

    let logs = service.get_app_logs(&LogFilter::for_group(&first.id)).await.unwrap();
    assert_eq!(logs.len(), 3);
    assert!(logs.iter().all(|l| l.group_id == first.id));
    assert_eq!(logs[0].action, SHARE_SETTLED);

    let logs = service.get_app_logs(&LogFilter::for_group(&second.id)).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, GROUP_CREATED);

    let filter = LogFilter {
        member: Some("Bob".to_string()),
        ..Default::default()
    };
    let logs = service.get_app_logs(&filter).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].details["member"], "Bob");
}
