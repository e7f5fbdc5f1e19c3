use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::errors::GroupSplitError;
use crate::core::models::expense::{Expense, ShareSettlement};
use crate::core::models::group::Member;

// Request structs for JSON payloads
#[derive(Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RemoveMemberRequest {
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct AddExpenseRequest {
    pub title: String,
    pub amount: f64,
    pub paid_by: String,
    /// Leave empty to split between every current member.
    #[serde(default)]
    pub participants: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateExpenseRequest {
    pub title: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Deserialize, ToSchema)]
pub struct SettleShareRequest {
    pub member: String,
}

#[derive(Serialize, ToSchema)]
pub struct SettleShareResponse {
    pub outcome: ShareSettlement,
    pub message: String,
    pub expense: Expense,
}

impl From<(Expense, ShareSettlement)> for SettleShareResponse {
    fn from((expense, outcome): (Expense, ShareSettlement)) -> Self {
        SettleShareResponse {
            outcome,
            message: outcome.message().to_string(),
            expense,
        }
    }
}

// Error response struct
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

// Newtype wrapper for GroupSplitError to implement IntoResponse
pub struct ApiError(pub GroupSplitError);

impl From<GroupSplitError> for ApiError {
    fn from(err: GroupSplitError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            GroupSplitError::InvalidSettlement { .. }
            | GroupSplitError::MalformedExpense(_)
            | GroupSplitError::CannotRemoveLastMember
            | GroupSplitError::InvalidInput(..) => StatusCode::BAD_REQUEST,
            GroupSplitError::GroupNotFound(_)
            | GroupSplitError::ExpenseNotFound(_)
            | GroupSplitError::MemberNotFound(_) => StatusCode::NOT_FOUND,
            GroupSplitError::MemberAlreadyExists(_) => StatusCode::CONFLICT,
            GroupSplitError::LoggingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let error_message = match self.0 {
            GroupSplitError::InvalidInput(field, detail) => {
                format!("Invalid input for {}: {}", field, detail.description)
            }
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error: error_message })).into_response()
    }
}
