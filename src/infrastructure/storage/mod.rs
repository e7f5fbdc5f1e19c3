use crate::core::errors::GroupSplitError;
use crate::core::models::{audit::GroupAudit, expense::Expense, group::Group};
use async_trait::async_trait;

/// Persistence for groups and their expenses.
///
/// The `update_*` methods are read-modify-write under a single lock: the closure sees the
/// current record and the change is committed only if it returns `Ok`.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn save_group(&self, group: Group) -> Result<(), GroupSplitError>;
    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, GroupSplitError>;
    async fn update_group<F, T>(&self, group_id: &str, update: F) -> Result<(Group, T), GroupSplitError>
    where
        F: FnOnce(&mut Group) -> Result<T, GroupSplitError> + Send,
        T: Send;
    /// Removes the group together with its expenses and audit trail. Returns whether the
    /// group existed.
    async fn delete_group(&self, group_id: &str) -> Result<bool, GroupSplitError>;
    async fn save_expense(&self, expense: Expense) -> Result<(), GroupSplitError>;
    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, GroupSplitError>;
    async fn update_expense<F, T>(&self, expense_id: &str, update: F) -> Result<(Expense, T), GroupSplitError>
    where
        F: FnOnce(&mut Expense) -> Result<T, GroupSplitError> + Send,
        T: Send;
    async fn delete_expense(&self, expense_id: &str) -> Result<bool, GroupSplitError>;
    /// Expenses of a group, newest first.
    async fn get_group_expenses(&self, group_id: &str) -> Result<Vec<Expense>, GroupSplitError>;
    async fn save_group_audit(&self, audit: GroupAudit) -> Result<(), GroupSplitError>;
    async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, GroupSplitError>;
}

pub mod in_memory;
