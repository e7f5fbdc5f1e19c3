use crate::constants::{SETTLEMENT_NOISE_SUBUNITS, SUBUNITS_PER_UNIT};
use crate::core::models::settlement::{MemberBalance, Transfer};
use log::debug;

/// Converts a major-unit amount to subunits, rounding halves toward positive infinity.
pub fn to_subunits(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    (value * SUBUNITS_PER_UNIT as f64 + 0.5).floor() as i64
}

pub fn from_subunits(subunits: i64) -> f64 {
    subunits as f64 / SUBUNITS_PER_UNIT as f64
}

/// Greedy debt matcher.
///
/// Not a minimum-transfer solver: the largest debtor always pays the largest creditor
/// first, which keeps the output stable for existing callers.
#[derive(Clone, Copy, Debug, Default)]
pub struct SettlementPlanner;

impl SettlementPlanner {
    pub fn new() -> Self {
        SettlementPlanner
    }

    /// Produces transfers that zero every balance, in at most
    /// `creditors + debtors - 1` steps. All arithmetic is done in subunits.
    pub fn plan(&self, balances: &[MemberBalance]) -> Vec<Transfer> {
        let mut creditors: Vec<(&str, i64)> = Vec::new();
        let mut debtors: Vec<(&str, i64)> = Vec::new();

        for entry in balances {
            let subunits = to_subunits(entry.balance);
            if subunits.abs() <= SETTLEMENT_NOISE_SUBUNITS {
                continue;
            }
            if subunits > 0 {
                creditors.push((entry.member.as_str(), subunits));
            } else {
                debtors.push((entry.member.as_str(), -subunits));
            }
        }

        // stable: equal magnitudes keep input order
        creditors.sort_by(|a, b| b.1.cmp(&a.1));
        debtors.sort_by(|a, b| b.1.cmp(&a.1));

        let mut transfers = Vec::with_capacity(creditors.len() + debtors.len());
        let mut i = 0;
        let mut j = 0;

        while i < debtors.len() && j < creditors.len() {
            let amount = debtors[i].1.min(creditors[j].1);
            transfers.push(Transfer {
                from: debtors[i].0.to_string(),
                to: creditors[j].0.to_string(),
                amount: from_subunits(amount),
            });

            debtors[i].1 -= amount;
            creditors[j].1 -= amount;

            if debtors[i].1 == 0 {
                i += 1;
            }
            if creditors[j].1 == 0 {
                j += 1;
            }
        }

        debug!("Planned {} transfers: {:?}", transfers.len(), transfers);
        transfers
    }
}
