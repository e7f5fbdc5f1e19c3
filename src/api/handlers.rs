use crate::{
    api::models::*,
    core::{
        errors::GroupSplitError,
        models::{
            audit::{AppLog, GroupAudit, LogFilter},
            expense::Expense,
            group::{Group, Member},
        },
        services::{GroupBalancesResponse, GroupService, MemberView},
    },
    infrastructure::{logging::in_memory::InMemoryLogging, storage::in_memory::InMemoryStorage},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use std::sync::Arc;

pub type AppState = Arc<GroupService<InMemoryLogging, InMemoryStorage>>;

// Define API routes
pub fn api_routes(service: AppState) -> Router {
    Router::new()
        .route("/groups", post(create_group))
        .route(
            "/groups/{group_id}",
            get(get_group).put(update_group).delete(delete_group),
        )
        .route("/groups/{group_id}/members", post(add_member))
        .route("/groups/{group_id}/members/remove", post(remove_member))
        .route("/groups/{group_id}/members/{member}/view", get(member_view))
        .route("/groups/{group_id}/expenses", get(list_expenses).post(add_expense))
        .route(
            "/groups/{group_id}/expenses/{expense_id}",
            axum::routing::put(update_expense).delete(delete_expense),
        )
        .route("/groups/{group_id}/expenses/{expense_id}/settle", post(settle_expense))
        .route(
            "/groups/{group_id}/expenses/{expense_id}/settle_share",
            post(settle_share),
        )
        .route("/groups/{group_id}/balances", get(get_balances))
        .route("/groups/{group_id}/audits", get(get_group_audits))
        .route("/logs", get(get_app_logs))
        .with_state(service)
}

#[utoipa::path(
    post,
    path = "/api/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = Group),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 409, description = "Duplicate member name", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_group(
    State(service): State<AppState>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let group = service.create_group(req.name, req.description, req.members).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}",
    params(("group_id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group found", body = Group),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn get_group(
    State(service): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    let group = service
        .get_group(&group_id)
        .await?
        .ok_or(GroupSplitError::GroupNotFound(group_id))?;
    Ok(Json(group))
}

#[utoipa::path(
    put,
    path = "/api/groups/{group_id}",
    params(("group_id" = String, Path, description = "Group ID")),
    request_body = UpdateGroupRequest,
    responses(
        (status = 200, description = "Group updated", body = Group),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn update_group(
    State(service): State<AppState>,
    Path(group_id): Path<String>,
    Json(req): Json<UpdateGroupRequest>,
) -> Result<Json<Group>, ApiError> {
    let group = service.update_group(&group_id, req.name, req.description).await?;
    Ok(Json(group))
}

#[utoipa::path(
    delete,
    path = "/api/groups/{group_id}",
    params(("group_id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group deleted"),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn delete_group(
    State(service): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    service.delete_group(&group_id).await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/members",
    params(("group_id" = String, Path, description = "Group ID")),
    request_body = Member,
    responses(
        (status = 200, description = "Member added", body = Group),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 409, description = "Member already exists", body = ErrorResponse)
    )
)]
pub async fn add_member(
    State(service): State<AppState>,
    Path(group_id): Path<String>,
    Json(member): Json<Member>,
) -> Result<Json<Group>, ApiError> {
    let group = service.add_member(&group_id, member).await?;
    Ok(Json(group))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/members/remove",
    params(("group_id" = String, Path, description = "Group ID")),
    request_body = RemoveMemberRequest,
    responses(
        (status = 200, description = "Member removed", body = Group),
        (status = 400, description = "Cannot remove last member", body = ErrorResponse),
        (status = 404, description = "Group or member not found", body = ErrorResponse)
    )
)]
pub async fn remove_member(
    State(service): State<AppState>,
    Path(group_id): Path<String>,
    Json(req): Json<RemoveMemberRequest>,
) -> Result<Json<Group>, ApiError> {
    let group = service.remove_member(&group_id, &req.name).await?;
    Ok(Json(group))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/members/{member}/view",
    params(
        ("group_id" = String, Path, description = "Group ID"),
        ("member" = String, Path, description = "Member name")
    ),
    responses(
        (status = 200, description = "Group as seen by the member", body = MemberView),
        (status = 404, description = "Group or member not found", body = ErrorResponse)
    )
)]
pub async fn member_view(
    State(service): State<AppState>,
    Path((group_id, member)): Path<(String, String)>,
) -> Result<Json<MemberView>, ApiError> {
    let view = service.member_view(&group_id, &member).await?;
    Ok(Json(view))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/expenses",
    params(("group_id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Expenses, newest first", body = Vec<Expense>),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn list_expenses(
    State(service): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<Expense>>, ApiError> {
    let expenses = service.list_expenses(&group_id).await?;
    Ok(Json(expenses))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/expenses",
    params(("group_id" = String, Path, description = "Group ID")),
    request_body = AddExpenseRequest,
    responses(
        (status = 201, description = "Expense added", body = Expense),
        (status = 400, description = "Malformed expense", body = ErrorResponse),
        (status = 404, description = "Group or member not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn add_expense(
    State(service): State<AppState>,
    Path(group_id): Path<String>,
    Json(req): Json<AddExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    let expense = service
        .add_expense(&group_id, req.title, req.amount, req.paid_by, req.participants)
        .await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

#[utoipa::path(
    put,
    path = "/api/groups/{group_id}/expenses/{expense_id}",
    params(
        ("group_id" = String, Path, description = "Group ID"),
        ("expense_id" = String, Path, description = "Expense ID")
    ),
    request_body = UpdateExpenseRequest,
    responses(
        (status = 200, description = "Expense updated", body = Expense),
        (status = 400, description = "Malformed expense", body = ErrorResponse),
        (status = 404, description = "Group or expense not found", body = ErrorResponse)
    )
)]
pub async fn update_expense(
    State(service): State<AppState>,
    Path((group_id, expense_id)): Path<(String, String)>,
    Json(req): Json<UpdateExpenseRequest>,
) -> Result<Json<Expense>, ApiError> {
    let expense = service
        .update_expense(&group_id, &expense_id, req.title, req.amount)
        .await?;
    Ok(Json(expense))
}

#[utoipa::path(
    delete,
    path = "/api/groups/{group_id}/expenses/{expense_id}",
    params(
        ("group_id" = String, Path, description = "Group ID"),
        ("expense_id" = String, Path, description = "Expense ID")
    ),
    responses(
        (status = 200, description = "Expense deleted"),
        (status = 404, description = "Group or expense not found", body = ErrorResponse)
    )
)]
pub async fn delete_expense(
    State(service): State<AppState>,
    Path((group_id, expense_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    service.delete_expense(&group_id, &expense_id).await?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/expenses/{expense_id}/settle",
    params(
        ("group_id" = String, Path, description = "Group ID"),
        ("expense_id" = String, Path, description = "Expense ID")
    ),
    responses(
        (status = 200, description = "Expense marked fully settled", body = Expense),
        (status = 404, description = "Group or expense not found", body = ErrorResponse)
    )
)]
pub async fn settle_expense(
    State(service): State<AppState>,
    Path((group_id, expense_id)): Path<(String, String)>,
) -> Result<Json<Expense>, ApiError> {
    let expense = service.settle_expense(&group_id, &expense_id).await?;
    Ok(Json(expense))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/expenses/{expense_id}/settle_share",
    params(
        ("group_id" = String, Path, description = "Group ID"),
        ("expense_id" = String, Path, description = "Expense ID")
    ),
    request_body = SettleShareRequest,
    responses(
        (status = 200, description = "Share settled, or already settled", body = SettleShareResponse),
        (status = 400, description = "Payer or non-participant cannot settle", body = ErrorResponse),
        (status = 404, description = "Group or expense not found", body = ErrorResponse)
    )
)]
pub async fn settle_share(
    State(service): State<AppState>,
    Path((group_id, expense_id)): Path<(String, String)>,
    Json(req): Json<SettleShareRequest>,
) -> Result<Json<SettleShareResponse>, ApiError> {
    let settled = service.settle_share(&group_id, &expense_id, &req.member).await?;
    Ok(Json(settled.into()))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/balances",
    params(("group_id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Net balances and suggested transfers", body = GroupBalancesResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn get_balances(
    State(service): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupBalancesResponse>, ApiError> {
    let balances = service.get_balances(&group_id).await?;
    Ok(Json(balances))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/audits",
    params(("group_id" = String, Path, description = "Group ID")),
    responses(
        (status = 200, description = "Group audit trail", body = Vec<GroupAudit>),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn get_group_audits(
    State(service): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<GroupAudit>>, ApiError> {
    let audits = service.get_group_audits(&group_id).await?;
    Ok(Json(audits))
}

#[utoipa::path(
    get,
    path = "/api/logs",
    params(LogFilter),
    responses(
        (status = 200, description = "Activity log entries, newest first", body = Vec<AppLog>)
    )
)]
pub async fn get_app_logs(
    State(service): State<AppState>,
    Query(filter): Query<LogFilter>,
) -> Result<Json<Vec<AppLog>>, ApiError> {
    let logs = service.get_app_logs(&filter).await?;
    Ok(Json(logs))
}
