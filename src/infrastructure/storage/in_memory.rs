use crate::core::errors::GroupSplitError;
use crate::core::models::{audit::GroupAudit, expense::Expense, group::Group};
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    groups: Arc<RwLock<HashMap<String, Group>>>,
    expenses: Arc<RwLock<HashMap<String, Expense>>>,
    group_audits: Arc<RwLock<HashMap<String, Vec<GroupAudit>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage {
            groups: Arc::new(RwLock::new(HashMap::new())),
            expenses: Arc::new(RwLock::new(HashMap::new())),
            group_audits: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn save_group(&self, group: Group) -> Result<(), GroupSplitError> {
        let mut groups = self.groups.write().await;
        groups.insert(group.id.clone(), group);
        Ok(())
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, GroupSplitError> {
        let groups = self.groups.read().await;
        Ok(groups.get(group_id).cloned())
    }

    async fn update_group<F, T>(&self, group_id: &str, update: F) -> Result<(Group, T), GroupSplitError>
    where
        F: FnOnce(&mut Group) -> Result<T, GroupSplitError> + Send,
        T: Send,
    {
        let mut groups = self.groups.write().await;
        let stored = groups
            .get_mut(group_id)
            .ok_or_else(|| GroupSplitError::GroupNotFound(group_id.to_string()))?;
        let mut draft = stored.clone();
        let outcome = update(&mut draft)?;
        *stored = draft.clone();
        Ok((draft, outcome))
    }

    async fn delete_group(&self, group_id: &str) -> Result<bool, GroupSplitError> {
        let mut groups = self.groups.write().await;
        if groups.remove(group_id).is_none() {
            return Ok(false);
        }
        let mut expenses = self.expenses.write().await;
        expenses.retain(|_, e| e.group_id != group_id);
        let mut group_audits = self.group_audits.write().await;
        group_audits.remove(group_id);
        Ok(true)
    }

    async fn save_expense(&self, expense: Expense) -> Result<(), GroupSplitError> {
        let mut expenses = self.expenses.write().await;
        expenses.insert(expense.id.clone(), expense);
        Ok(())
    }

    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, GroupSplitError> {
        let expenses = self.expenses.read().await;
        Ok(expenses.get(expense_id).cloned())
    }

    async fn update_expense<F, T>(&self, expense_id: &str, update: F) -> Result<(Expense, T), GroupSplitError>
    where
        F: FnOnce(&mut Expense) -> Result<T, GroupSplitError> + Send,
        T: Send,
    {
        let mut expenses = self.expenses.write().await;
        let stored = expenses
            .get_mut(expense_id)
            .ok_or_else(|| GroupSplitError::ExpenseNotFound(expense_id.to_string()))?;
        let mut draft = stored.clone();
        let outcome = update(&mut draft)?;
        *stored = draft.clone();
        Ok((draft, outcome))
    }

    async fn delete_expense(&self, expense_id: &str) -> Result<bool, GroupSplitError> {
        let mut expenses = self.expenses.write().await;
        Ok(expenses.remove(expense_id).is_some())
    }

    async fn get_group_expenses(&self, group_id: &str) -> Result<Vec<Expense>, GroupSplitError> {
        let expenses = self.expenses.read().await;
        let mut found: Vec<Expense> = expenses
            .values()
            .filter(|e| e.group_id == group_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn save_group_audit(&self, audit: GroupAudit) -> Result<(), GroupSplitError> {
        let mut group_audits = self.group_audits.write().await;
        group_audits
            .entry(audit.group_id.clone())
            .or_insert_with(Vec::new)
            .push(audit);
        Ok(())
    }

    async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, GroupSplitError> {
        let group_audits = self.group_audits.read().await;
        Ok(group_audits.get(group_id).cloned().unwrap_or_default())
    }
}
