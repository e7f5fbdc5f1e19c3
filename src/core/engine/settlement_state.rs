use crate::core::errors::{GroupSplitError, InvalidSettlementReason};
use crate::core::models::expense::{Expense, SettlementStatus, ShareSettlement};
use chrono::{DateTime, Utc};
use log::debug;

impl Expense {
    /// Members sharing this expense, falling back to `roster` when none were stored.
    pub fn participants<'a>(&'a self, roster: &'a [String]) -> &'a [String] {
        if self.participants.is_empty() {
            roster
        } else {
            &self.participants
        }
    }

    /// Participants other than the payer who have not settled their share yet.
    ///
    /// Names missing from `roster` are kept: a removed member's history still counts.
    pub fn unsettled_debtors<'a>(&'a self, roster: &'a [String]) -> Vec<&'a str> {
        self.participants(roster)
            .iter()
            .filter(|name| **name != self.paid_by && !self.settled_participants.contains(name))
            .map(String::as_str)
            .collect()
    }

    pub fn status(&self, roster: &[String]) -> SettlementStatus {
        if self.is_fully_settled {
            return SettlementStatus::FullySettled;
        }
        let participants = self.participants(roster);
        let any_settled = self
            .settled_participants
            .iter()
            .any(|name| *name != self.paid_by && participants.contains(name));
        if any_settled {
            SettlementStatus::PartiallySettled
        } else {
            SettlementStatus::Open
        }
    }

    /// Records that `member` paid their share.
    ///
    /// Fails without touching the expense when `member` is the payer or not a participant.
    /// Settling twice is a no-op. `settled_at` is stamped when the last debtor settles.
    pub fn mark_participant_settled(
        &mut self,
        member: &str,
        roster: &[String],
        now: DateTime<Utc>,
    ) -> Result<ShareSettlement, GroupSplitError> {
        if member == self.paid_by {
            return Err(GroupSplitError::invalid_settlement(
                member,
                InvalidSettlementReason::PayerCannotSettle,
            ));
        }
        if !self.participants(roster).iter().any(|name| name == member) {
            return Err(GroupSplitError::invalid_settlement(
                member,
                InvalidSettlementReason::NotAParticipant,
            ));
        }
        if self.is_fully_settled || self.settled_participants.iter().any(|name| name == member) {
            debug!("Share of {} in expense {} already settled", member, self.id);
            return Ok(ShareSettlement::AlreadySettled);
        }

        self.settled_participants.push(member.to_string());

        if self.unsettled_debtors(roster).is_empty() {
            self.is_fully_settled = true;
            self.settled_at = Some(now);
            debug!("Expense {} fully settled by {}", self.id, member);
            return Ok(ShareSettlement::CompletedExpense);
        }

        debug!("Recorded share of {} in expense {}", member, self.id);
        Ok(ShareSettlement::Recorded)
    }

    /// Bulk settle regardless of individual shares.
    ///
    /// Outstanding debtors are copied into `settled_participants` so the list always agrees
    /// with `is_fully_settled`.
    pub fn mark_fully_settled(&mut self, roster: &[String], now: DateTime<Utc>) {
        let outstanding: Vec<String> = self
            .unsettled_debtors(roster)
            .into_iter()
            .map(String::from)
            .collect();
        self.settled_participants.extend(outstanding);
        self.is_fully_settled = true;
        self.settled_at = Some(now);
    }
}
