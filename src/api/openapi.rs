use utoipa::OpenApi;

use crate::{
    api::models::{
        AddExpenseRequest, CreateGroupRequest, ErrorResponse, RemoveMemberRequest, SettleShareRequest,
        SettleShareResponse, UpdateExpenseRequest, UpdateGroupRequest,
    },
    core::{
        engine::OrphanedDebtPolicy,
        models::{
            audit::{AppLog, GroupAudit},
            expense::{Expense, SettlementStatus, ShareSettlement},
            group::{Group, Member},
            settlement::{MemberBalance, Transfer},
        },
        services::{ExpenseForMember, GroupBalancesResponse, MemberSummary, MemberView, PaymentLine},
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::create_group,
        super::handlers::get_group,
        super::handlers::update_group,
        super::handlers::delete_group,
        super::handlers::add_member,
        super::handlers::remove_member,
        super::handlers::member_view,
        super::handlers::list_expenses,
        super::handlers::add_expense,
        super::handlers::update_expense,
        super::handlers::delete_expense,
        super::handlers::settle_expense,
        super::handlers::settle_share,
        super::handlers::get_balances,
        super::handlers::get_group_audits,
        super::handlers::get_app_logs
    ),
    components(schemas(
        CreateGroupRequest,
        UpdateGroupRequest,
        RemoveMemberRequest,
        AddExpenseRequest,
        UpdateExpenseRequest,
        SettleShareRequest,
        SettleShareResponse,
        ErrorResponse,
        Group,
        Member,
        Expense,
        SettlementStatus,
        ShareSettlement,
        MemberBalance,
        Transfer,
        GroupBalancesResponse,
        MemberView,
        MemberSummary,
        PaymentLine,
        ExpenseForMember,
        OrphanedDebtPolicy,
        AppLog,
        GroupAudit
    )),
    info(
        title = "GroupSplit API",
        description = "Shared group expenses, per-member settlement and debt netting",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
