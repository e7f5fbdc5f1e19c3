use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Expense {
    pub id: String,
    pub group_id: String,
    pub title: String,
    pub amount: f64,
    pub paid_by: String,
    /// Members sharing the cost. Empty means the whole current roster.
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub settled_participants: Vec<String>,
    #[serde(default)]
    pub is_fully_settled: bool,
    #[schema(value_type = Option<String>, example = "2024-06-01T12:34:56Z")]
    pub settled_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementStatus {
    Open,
    PartiallySettled,
    FullySettled,
}

/// Outcome of a single member settling their share.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShareSettlement {
    /// Share recorded; other debtors still owe.
    Recorded,
    /// Share recorded and it was the last one outstanding.
    CompletedExpense,
    /// Nothing changed, the share was already settled.
    AlreadySettled,
}

impl ShareSettlement {
    pub fn message(&self) -> &'static str {
        match self {
            ShareSettlement::Recorded => "Your share has been settled",
            ShareSettlement::CompletedExpense => "Expense settled successfully",
            ShareSettlement::AlreadySettled => "Your share is already settled",
        }
    }

    pub fn changed(&self) -> bool {
        !matches!(self, ShareSettlement::AlreadySettled)
    }
}
