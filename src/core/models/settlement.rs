use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Signed net balance of one member. Positive means the group owes them.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct MemberBalance {
    pub member: String,
    pub balance: f64,
}

impl MemberBalance {
    pub fn new(member: impl Into<String>, balance: f64) -> Self {
        MemberBalance {
            member: member.into(),
            balance,
        }
    }
}

/// `from` pays `to` the given amount.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: f64,
}
