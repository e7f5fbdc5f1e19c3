use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

impl FieldError {
    pub fn new(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Why a member was not allowed to settle their share of an expense.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum InvalidSettlementReason {
    /// The payer's own share is implicitly settled.
    PayerCannotSettle,
    /// The member does not share the cost of this expense.
    NotAParticipant,
}

impl std::fmt::Display for InvalidSettlementReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InvalidSettlementReason::PayerCannotSettle => "payer cannot settle their own expense",
            InvalidSettlementReason::NotAParticipant => "member is not part of this expense",
        };
        write!(f, "{}", s)
    }
}

#[derive(Error, Debug, Serialize, Clone, PartialEq)]
pub enum GroupSplitError {
    #[error("Invalid settlement by {member}: {reason}")]
    InvalidSettlement {
        member: String,
        reason: InvalidSettlementReason,
    },
    #[error("Malformed expense: {0}")]
    MalformedExpense(String),
    #[error("Group {0} not found")]
    GroupNotFound(String),
    #[error("Expense {0} not found")]
    ExpenseNotFound(String),
    #[error("Member {0} not found")]
    MemberNotFound(String),
    #[error("Member {0} already exists")]
    MemberAlreadyExists(String),
    #[error("Cannot remove last group member")]
    CannotRemoveLastMember,
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),
    #[error("Logging error: {0}")]
    LoggingError(String),
}

impl GroupSplitError {
    pub fn invalid_settlement(member: &str, reason: InvalidSettlementReason) -> Self {
        GroupSplitError::InvalidSettlement {
            member: member.to_string(),
            reason,
        }
    }
}
