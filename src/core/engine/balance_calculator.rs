use crate::core::models::expense::Expense;
use crate::core::models::settlement::MemberBalance;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use utoipa::ToSchema;

/// What happens to a share owed by (or credited to) a name that is no longer on the roster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrphanedDebtPolicy {
    /// Skip the name. The payer is still credited for the whole unsettled count, so the
    /// group total drifts away from zero by the dropped shares.
    #[default]
    Drop,
    /// Track the name as an extra balance entry after the roster members.
    RetainAsUnknownMember,
}

impl FromStr for OrphanedDebtPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "drop" => Ok(OrphanedDebtPolicy::Drop),
            "retain" | "retain-as-unknown-member" => Ok(OrphanedDebtPolicy::RetainAsUnknownMember),
            other => Err(format!("unknown orphaned debt policy: {}", other)),
        }
    }
}

/// Balances indexed by member name, preserving insertion order.
struct Ledger {
    entries: Vec<MemberBalance>,
    index: HashMap<String, usize>,
}

impl Ledger {
    fn new(roster: &[String]) -> Self {
        let mut ledger = Ledger {
            entries: Vec::with_capacity(roster.len()),
            index: HashMap::with_capacity(roster.len()),
        };
        for name in roster {
            ledger.insert(name);
        }
        ledger
    }

    fn insert(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        self.entries.push(MemberBalance::new(name, 0.0));
        self.index.insert(name.to_string(), self.entries.len() - 1);
        self.entries.len() - 1
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BalanceCalculator {
    policy: OrphanedDebtPolicy,
}

impl BalanceCalculator {
    pub fn new(policy: OrphanedDebtPolicy) -> Self {
        BalanceCalculator { policy }
    }

    /// Nets every open expense into one signed balance per roster member.
    ///
    /// Fully settled expenses are skipped outright. Each remaining expense is split evenly
    /// over its participants; every unsettled debtor is charged one share and the payer is
    /// credited one share per unsettled debtor.
    pub fn calculate(&self, roster: &[String], expenses: &[Expense]) -> Vec<MemberBalance> {
        let mut ledger = Ledger::new(roster);

        for expense in expenses.iter().filter(|e| !e.is_fully_settled) {
            let participants = expense.participants(roster);
            if participants.is_empty() {
                warn!("Expense {} has no participants, skipping", expense.id);
                continue;
            }

            let per_head = expense.amount / participants.len() as f64;
            let debtors = expense.unsettled_debtors(roster);

            for debtor in &debtors {
                self.apply(&mut ledger, debtor, -per_head);
            }
            self.apply(&mut ledger, &expense.paid_by, per_head * debtors.len() as f64);
        }

        debug!("Balances calculated: {:?}", ledger.entries);
        ledger.entries
    }

    fn apply(&self, ledger: &mut Ledger, name: &str, delta: f64) {
        let idx = match (ledger.index.get(name).copied(), self.policy) {
            (Some(idx), _) => idx,
            (None, OrphanedDebtPolicy::Drop) => {
                debug!("Dropping {:.2} for {} who is not on the roster", delta, name);
                return;
            }
            (None, OrphanedDebtPolicy::RetainAsUnknownMember) => ledger.insert(name),
        };
        ledger.entries[idx].balance += delta;
    }
}

/// Sum of all balances; zero up to rounding when no debt was dropped.
pub fn total_balance(balances: &[MemberBalance]) -> f64 {
    balances.iter().map(|b| b.balance).sum()
}
