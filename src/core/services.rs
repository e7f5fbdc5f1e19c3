use crate::config::Config;
use crate::constants::{
    BALANCE_TOLERANCE, DEFAULT_MAX_EXPENSE_AMOUNT, EXPENSE_ADDED, EXPENSE_DELETED, EXPENSE_SETTLED, EXPENSE_UPDATED, GROUP_CREATED,
    GROUP_DELETED, GROUP_UPDATED, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH, MAX_TITLE_LENGTH, MEMBER_ADDED,
    MEMBER_REMOVED, SHARE_SETTLED,
};
use crate::core::engine::{BalanceCalculator, OrphanedDebtPolicy, SettlementPlanner, total_balance};
use crate::core::errors::{FieldError, GroupSplitError};
use crate::core::models::{
    audit::{AppLog, GroupAudit, LogFilter},
    expense::{Expense, SettlementStatus, ShareSettlement},
    group::{Group, Member},
    settlement::{MemberBalance, Transfer},
};
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::storage::Storage;
use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, ToSchema, Clone, PartialEq)]
pub struct GroupBalancesResponse {
    pub balances: Vec<MemberBalance>,
    pub settlements: Vec<Transfer>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema, Clone, PartialEq)]
pub struct PaymentLine {
    pub member: String,
    pub amount: f64,
}

/// What one member pays and receives according to the current settlement plan.
#[derive(Serialize, Deserialize, Debug, ToSchema, Clone, PartialEq, Default)]
pub struct MemberSummary {
    pub you_pay: Vec<PaymentLine>,
    pub you_receive: Vec<PaymentLine>,
}

#[derive(Serialize, Deserialize, Debug, ToSchema, Clone)]
pub struct ExpenseForMember {
    pub expense: Expense,
    pub status: SettlementStatus,
    pub can_settle: bool,
    pub is_member_settled: bool,
}

#[derive(Serialize, Deserialize, Debug, ToSchema, Clone)]
pub struct MemberView {
    pub group_id: String,
    pub group_name: String,
    pub description: String,
    pub member: String,
    pub members: Vec<String>,
    pub balances: Vec<MemberBalance>,
    pub summary: MemberSummary,
    pub expenses: Vec<ExpenseForMember>,
}

pub struct GroupService<L: LoggingService, S: Storage> {
    storage: S,
    logging: L,
    calculator: BalanceCalculator,
    planner: SettlementPlanner,
    max_expense_amount: f64,
    // held across the expense read and the group write of a recalculation
    recalc_lock: Mutex<()>,
}

impl<L: LoggingService, S: Storage> GroupService<L, S> {
    pub fn new(storage: S, logging: L) -> Self {
        info!("Initializing GroupService");
        GroupService {
            storage,
            logging,
            calculator: BalanceCalculator::default(),
            planner: SettlementPlanner::new(),
            max_expense_amount: DEFAULT_MAX_EXPENSE_AMOUNT,
            recalc_lock: Mutex::new(()),
        }
    }

    pub fn with_config(storage: S, logging: L, config: &Config) -> Self {
        let mut service = Self::new(storage, logging);
        service.calculator = BalanceCalculator::new(config.orphaned_debt_policy);
        service.max_expense_amount = config.max_expense_amount;
        service
    }

    pub fn with_orphaned_debt_policy(mut self, policy: OrphanedDebtPolicy) -> Self {
        self.calculator = BalanceCalculator::new(policy);
        self
    }

    async fn load_group(&self, group_id: &str) -> Result<Group, GroupSplitError> {
        self.storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| GroupSplitError::GroupNotFound(group_id.to_string()))
    }

    async fn load_expense(&self, group_id: &str, expense_id: &str) -> Result<Expense, GroupSplitError> {
        self.storage
            .get_expense(expense_id)
            .await?
            .filter(|e| e.group_id == group_id)
            .ok_or_else(|| GroupSplitError::ExpenseNotFound(expense_id.to_string()))
    }

    async fn log_and_audit(
        &self,
        group_id: &str,
        action: &str,
        log_details: serde_json::Value,
        member: Option<&str>,
    ) -> Result<(), GroupSplitError> {
        self.logging
            .log_action(group_id, action, log_details.clone(), member)
            .await?;
        self.storage
            .save_group_audit(GroupAudit {
                id: Uuid::new_v4().to_string(),
                group_id: group_id.to_string(),
                action: action.to_string(),
                member: member.map(String::from),
                details: serde_json::from_value(log_details).unwrap_or_default(),
                timestamp: Utc::now(),
            })
            .await?;
        Ok(())
    }

    fn validate_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), GroupSplitError> {
        if value.trim().is_empty() {
            return Err(GroupSplitError::InvalidInput(
                field.to_string(),
                FieldError::new(field, format!("Invalid {}", field), format!("{} cannot be empty", field)),
            ));
        }
        if value.chars().count() > max_length {
            return Err(GroupSplitError::InvalidInput(
                field.to_string(),
                FieldError::new(
                    field,
                    format!("{} Too Long", field),
                    format!("{} cannot exceed {} characters", field, max_length),
                ),
            ));
        }
        if value.chars().any(|c| c.is_control()) {
            return Err(GroupSplitError::InvalidInput(
                field.to_string(),
                FieldError::new(
                    field,
                    format!("Invalid {}", field),
                    format!("{} contains invalid characters", field),
                ),
            ));
        }
        Ok(())
    }

    fn validate_description(&self, description: &str) -> Result<(), GroupSplitError> {
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(GroupSplitError::InvalidInput(
                "description".to_string(),
                FieldError::new(
                    "description",
                    "description Too Long",
                    format!("description cannot exceed {} characters", MAX_DESCRIPTION_LENGTH),
                ),
            ));
        }
        Ok(())
    }

    fn validate_amount(&self, amount: f64) -> Result<(), GroupSplitError> {
        if !amount.is_finite() {
            return Err(GroupSplitError::MalformedExpense("amount must be a finite number".to_string()));
        }
        if amount <= 0.0 {
            return Err(GroupSplitError::MalformedExpense("amount must be greater than 0".to_string()));
        }
        if amount > self.max_expense_amount {
            return Err(GroupSplitError::MalformedExpense(format!(
                "amount cannot exceed {}",
                self.max_expense_amount
            )));
        }
        let subunits = amount * 100.0;
        if (subunits - subunits.round()).abs() > 1e-6 {
            return Err(GroupSplitError::MalformedExpense(
                "amount cannot have more than 2 decimal places".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_members(&self, members: &[Member]) -> Result<(), GroupSplitError> {
        for (idx, member) in members.iter().enumerate() {
            self.validate_string_input("member", &member.name, MAX_NAME_LENGTH)?;
            if members[..idx].iter().any(|m| m.same_name(&member.name)) {
                return Err(GroupSplitError::MemberAlreadyExists(member.name.clone()));
            }
        }
        Ok(())
    }

    /// Pure recomputation over a snapshot; callers persist the result if they need to.
    pub fn compute_balances(&self, group: &Group, expenses: &[Expense]) -> Vec<MemberBalance> {
        self.calculator.calculate(&group.member_names(), expenses)
    }

    pub fn plan_settlements(&self, balances: &[MemberBalance]) -> Vec<Transfer> {
        self.planner.plan(balances)
    }

    /// Recomputes a group's balances from its full expense set and stores them on the group.
    ///
    /// Recalculations run one at a time, so the last one to finish has read every expense
    /// committed before it started and the cached `Group::balances` never goes stale.
    pub async fn recalculate_balances(&self, group_id: &str) -> Result<Vec<MemberBalance>, GroupSplitError> {
        let _guard = self.recalc_lock.lock().await;
        let expenses = self.storage.get_group_expenses(group_id).await?;
        let calculator = self.calculator;
        let (_, balances) = self
            .storage
            .update_group(group_id, |group| {
                group.balances = calculator.calculate(&group.member_names(), &expenses);
                Ok(group.balances.clone())
            })
            .await?;
        debug!("Recalculated balances for group {}: {:?}", group_id, balances);
        let drift = total_balance(&balances);
        if drift.abs() > BALANCE_TOLERANCE {
            warn!(
                "Balances of group {} are off by {:.2}; shares of removed members were dropped",
                group_id, drift
            );
        }
        Ok(balances)
    }

    // GROUPS

    pub async fn create_group(
        &self,
        name: String,
        description: Option<String>,
        members: Vec<Member>,
    ) -> Result<Group, GroupSplitError> {
        info!("Creating group '{}' with {} members", name, members.len());
        self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;
        let description = description.unwrap_or_default();
        self.validate_description(&description)?;
        self.validate_members(&members)?;

        let now = Utc::now();
        let balances = members.iter().map(|m| MemberBalance::new(m.name.clone(), 0.0)).collect();
        let group = Group {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            members,
            balances,
            created_at: now,
            updated_at: now,
        };
        self.storage.save_group(group.clone()).await?;

        self.log_and_audit(
            &group.id,
            GROUP_CREATED,
            json!({
                "group_id": group.id,
                "name": group.name,
                "members": group.member_names(),
            }),
            None,
        )
        .await?;

        Ok(group)
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Option<Group>, GroupSplitError> {
        self.storage.get_group(group_id).await
    }

    pub async fn update_group(
        &self,
        group_id: &str,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Group, GroupSplitError> {
        info!("Updating group {}", group_id);
        if let Some(ref name) = name {
            self.validate_string_input("name", name, MAX_NAME_LENGTH)?;
        }
        if let Some(ref description) = description {
            self.validate_description(description)?;
        }
        let (group, _) = self
            .storage
            .update_group(group_id, |group| {
                if let Some(name) = name {
                    group.name = name;
                }
                if let Some(description) = description {
                    group.description = description;
                }
                group.updated_at = Utc::now();
                Ok(())
            })
            .await?;

        self.log_and_audit(
            group_id,
            GROUP_UPDATED,
            json!({ "group_id": group_id, "name": group.name }),
            None,
        )
        .await?;
        Ok(group)
    }

    pub async fn delete_group(&self, group_id: &str) -> Result<(), GroupSplitError> {
        info!("Deleting group {}", group_id);
        if !self.storage.delete_group(group_id).await? {
            return Err(GroupSplitError::GroupNotFound(group_id.to_string()));
        }
        // the group's audit trail is gone, only the activity log remembers the deletion
        self.logging
            .log_action(group_id, GROUP_DELETED, json!({ "group_id": group_id }), None)
            .await?;
        Ok(())
    }

    // MEMBERS

    pub async fn add_member(&self, group_id: &str, member: Member) -> Result<Group, GroupSplitError> {
        info!("Adding member {} to group {}", member.name, group_id);
        self.validate_string_input("name", &member.name, MAX_NAME_LENGTH)?;

        let name = member.name.clone();
        self.storage
            .update_group(group_id, |group| {
                if group.members.iter().any(|m| m.same_name(&member.name)) {
                    return Err(GroupSplitError::MemberAlreadyExists(member.name.clone()));
                }
                group.members.push(member);
                group.updated_at = Utc::now();
                Ok(())
            })
            .await
            .inspect_err(|e| warn!("Rejected new member for group {}: {}", group_id, e))?;

        self.recalculate_balances(group_id).await?;
        self.log_and_audit(
            group_id,
            MEMBER_ADDED,
            json!({ "group_id": group_id, "member": name }),
            None,
        )
        .await?;
        self.load_group(group_id).await
    }

    /// Removes a member from the roster. Their expense history is left untouched.
    pub async fn remove_member(&self, group_id: &str, name: &str) -> Result<Group, GroupSplitError> {
        info!("Removing member {} from group {}", name, group_id);
        self.storage
            .update_group(group_id, |group| {
                if !group.has_member(name) {
                    return Err(GroupSplitError::MemberNotFound(name.to_string()));
                }
                if group.members.len() <= 1 {
                    return Err(GroupSplitError::CannotRemoveLastMember);
                }
                group.members.retain(|m| m.name != name);
                group.updated_at = Utc::now();
                Ok(())
            })
            .await?;

        self.recalculate_balances(group_id).await?;
        self.log_and_audit(
            group_id,
            MEMBER_REMOVED,
            json!({ "group_id": group_id, "member": name }),
            None,
        )
        .await?;
        self.load_group(group_id).await
    }

    // EXPENSES

    pub async fn list_expenses(&self, group_id: &str) -> Result<Vec<Expense>, GroupSplitError> {
        self.load_group(group_id).await?;
        self.storage.get_group_expenses(group_id).await
    }

    /// Adds an expense. An empty `participants` list means the whole current roster, which
    /// is snapshotted onto the expense.
    pub async fn add_expense(
        &self,
        group_id: &str,
        title: String,
        amount: f64,
        paid_by: String,
        participants: Vec<String>,
    ) -> Result<Expense, GroupSplitError> {
        info!(
            "Adding expense '{}' of {} paid by {} in group {}",
            title, amount, paid_by, group_id
        );
        let group = self.load_group(group_id).await?;
        self.validate_string_input("title", &title, MAX_TITLE_LENGTH)?;
        self.validate_amount(amount)
            .inspect_err(|e| warn!("Rejected expense in group {}: {}", group_id, e))?;

        let mut resolved: Vec<String> = Vec::new();
        let requested = if participants.is_empty() {
            group.member_names()
        } else {
            participants
        };
        for name in requested {
            if !resolved.contains(&name) {
                resolved.push(name);
            }
        }
        if resolved.is_empty() {
            warn!("Rejected expense in group {}: no participants", group_id);
            return Err(GroupSplitError::MalformedExpense(
                "expense must have at least one participant".to_string(),
            ));
        }
        if !group.has_member(&paid_by) {
            return Err(GroupSplitError::MemberNotFound(paid_by));
        }
        if let Some(unknown) = resolved.iter().find(|name| !group.has_member(name)) {
            return Err(GroupSplitError::MemberNotFound(unknown.clone()));
        }

        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            title,
            amount,
            paid_by,
            participants: resolved,
            settled_participants: Vec::new(),
            is_fully_settled: false,
            settled_at: None,
            created_at: now,
            updated_at: now,
        };
        self.storage.save_expense(expense.clone()).await?;
        self.recalculate_balances(group_id).await?;

        self.log_and_audit(
            group_id,
            EXPENSE_ADDED,
            json!({
                "expense_id": expense.id,
                "title": expense.title,
                "amount": expense.amount,
                "paid_by": expense.paid_by,
                "participants": expense.participants,
            }),
            Some(expense.paid_by.as_str()),
        )
        .await?;

        Ok(expense)
    }

    /// Edits title and/or amount. A fully settled expense stays settled.
    pub async fn update_expense(
        &self,
        group_id: &str,
        expense_id: &str,
        title: Option<String>,
        amount: Option<f64>,
    ) -> Result<Expense, GroupSplitError> {
        info!("Updating expense {} in group {}", expense_id, group_id);
        self.load_group(group_id).await?;
        if let Some(ref title) = title {
            self.validate_string_input("title", title, MAX_TITLE_LENGTH)?;
        }
        if let Some(amount) = amount {
            self.validate_amount(amount)?;
        }

        let (expense, _) = self
            .storage
            .update_expense(expense_id, |expense| {
                if expense.group_id != group_id {
                    return Err(GroupSplitError::ExpenseNotFound(expense_id.to_string()));
                }
                if let Some(title) = title {
                    expense.title = title;
                }
                if let Some(amount) = amount {
                    expense.amount = amount;
                }
                expense.updated_at = Utc::now();
                Ok(())
            })
            .await?;
        self.recalculate_balances(group_id).await?;

        self.log_and_audit(
            group_id,
            EXPENSE_UPDATED,
            json!({ "expense_id": expense.id, "title": expense.title, "amount": expense.amount }),
            None,
        )
        .await?;
        Ok(expense)
    }

    pub async fn delete_expense(&self, group_id: &str, expense_id: &str) -> Result<(), GroupSplitError> {
        info!("Deleting expense {} from group {}", expense_id, group_id);
        let expense = self.load_expense(group_id, expense_id).await?;
        self.storage.delete_expense(&expense.id).await?;
        self.recalculate_balances(group_id).await?;

        self.log_and_audit(
            group_id,
            EXPENSE_DELETED,
            json!({ "expense_id": expense.id, "title": expense.title, "amount": expense.amount }),
            None,
        )
        .await?;
        Ok(())
    }

    // SETTLEMENT

    /// Marks `member`'s share of one expense as paid.
    pub async fn settle_share(
        &self,
        group_id: &str,
        expense_id: &str,
        member: &str,
    ) -> Result<(Expense, ShareSettlement), GroupSplitError> {
        info!("Member {} settling share of expense {}", member, expense_id);
        let roster = self.load_group(group_id).await?.member_names();
        let now = Utc::now();

        let (expense, outcome) = self
            .storage
            .update_expense(expense_id, |expense| {
                if expense.group_id != group_id {
                    return Err(GroupSplitError::ExpenseNotFound(expense_id.to_string()));
                }
                expense.mark_participant_settled(member, &roster, now)
            })
            .await
            .inspect_err(|e| warn!("Rejected settlement of expense {}: {}", expense_id, e))?;

        if outcome.changed() {
            self.recalculate_balances(group_id).await?;
            self.log_and_audit(
                group_id,
                SHARE_SETTLED,
                json!({
                    "expense_id": expense.id,
                    "member": member,
                    "fully_settled": expense.is_fully_settled,
                }),
                Some(member),
            )
            .await?;
        }
        Ok((expense, outcome))
    }

    /// Bulk settle: closes the expense regardless of individual shares.
    pub async fn settle_expense(&self, group_id: &str, expense_id: &str) -> Result<Expense, GroupSplitError> {
        info!("Settling expense {} in group {}", expense_id, group_id);
        let roster = self.load_group(group_id).await?.member_names();
        let now = Utc::now();

        let (expense, _) = self
            .storage
            .update_expense(expense_id, |expense| {
                if expense.group_id != group_id {
                    return Err(GroupSplitError::ExpenseNotFound(expense_id.to_string()));
                }
                expense.mark_fully_settled(&roster, now);
                Ok(())
            })
            .await?;
        self.recalculate_balances(group_id).await?;

        self.log_and_audit(
            group_id,
            EXPENSE_SETTLED,
            json!({ "expense_id": expense.id, "settled_at": expense.settled_at }),
            None,
        )
        .await?;
        Ok(expense)
    }

    pub async fn get_balances(&self, group_id: &str) -> Result<GroupBalancesResponse, GroupSplitError> {
        let group = self.load_group(group_id).await?;
        let expenses = self.storage.get_group_expenses(group_id).await?;
        let balances = self.compute_balances(&group, &expenses);
        let settlements = self.plan_settlements(&balances);
        Ok(GroupBalancesResponse { balances, settlements })
    }

    /// The group as seen by one member: their transfers and which expenses they can settle.
    pub async fn member_view(&self, group_id: &str, member: &str) -> Result<MemberView, GroupSplitError> {
        let group = self.load_group(group_id).await?;
        if !group.has_member(member) {
            return Err(GroupSplitError::MemberNotFound(member.to_string()));
        }
        let roster = group.member_names();
        let expenses = self.storage.get_group_expenses(group_id).await?;
        let balances = self.compute_balances(&group, &expenses);
        let settlements = self.plan_settlements(&balances);

        let mut summary = MemberSummary::default();
        for transfer in settlements {
            if transfer.from == member {
                summary.you_pay.push(PaymentLine {
                    member: transfer.to,
                    amount: transfer.amount,
                });
            } else if transfer.to == member {
                summary.you_receive.push(PaymentLine {
                    member: transfer.from,
                    amount: transfer.amount,
                });
            }
        }

        let expenses = expenses
            .into_iter()
            .map(|expense| {
                let settled = expense.settled_participants.iter().any(|n| n == member);
                let can_settle = expense.participants(&roster).iter().any(|n| n == member)
                    && expense.paid_by != member
                    && !expense.is_fully_settled
                    && !settled;
                ExpenseForMember {
                    status: expense.status(&roster),
                    can_settle,
                    is_member_settled: expense.paid_by == member || settled,
                    expense,
                }
            })
            .collect();

        Ok(MemberView {
            group_id: group.id,
            group_name: group.name,
            description: group.description,
            member: member.to_string(),
            members: roster,
            balances,
            summary,
            expenses,
        })
    }

    // AUDIT

    pub async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, GroupSplitError> {
        self.load_group(group_id).await?;
        self.storage.get_group_audits(group_id).await
    }

    pub async fn get_app_logs(&self, filter: &LogFilter) -> Result<Vec<AppLog>, GroupSplitError> {
        self.logging.get_logs(filter).await
    }
}
