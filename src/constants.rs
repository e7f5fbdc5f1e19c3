// Money
pub const SUBUNITS_PER_UNIT: i64 = 100;
/// Subunit balances at or below this magnitude are treated as zero by the planner.
pub const SETTLEMENT_NOISE_SUBUNITS: i64 = 1;
pub const BALANCE_TOLERANCE: f64 = 0.01;
pub const DEFAULT_MAX_EXPENSE_AMOUNT: f64 = 1_000_000.0;

// Activity log
pub const DEFAULT_LOG_CAPACITY: usize = 10_000;

// Input limits
pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;

// Audit actions
pub const GROUP_CREATED: &str = "GROUP_CREATED";
pub const GROUP_UPDATED: &str = "GROUP_UPDATED";
pub const GROUP_DELETED: &str = "GROUP_DELETED";
pub const MEMBER_ADDED: &str = "MEMBER_ADDED";
pub const MEMBER_REMOVED: &str = "MEMBER_REMOVED";
pub const EXPENSE_ADDED: &str = "EXPENSE_ADDED";
pub const EXPENSE_UPDATED: &str = "EXPENSE_UPDATED";
pub const EXPENSE_DELETED: &str = "EXPENSE_DELETED";
pub const SHARE_SETTLED: &str = "SHARE_SETTLED";
pub const EXPENSE_SETTLED: &str = "EXPENSE_SETTLED";
