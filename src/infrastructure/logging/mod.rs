pub mod in_memory;

use crate::core::errors::GroupSplitError;
use crate::core::models::audit::{AppLog, LogFilter};
use async_trait::async_trait;

/// Application-wide activity log of group mutations and settlements. Unlike group audits,
/// entries survive the deletion of their group.
#[async_trait]
pub trait LoggingService: Send + Sync {
    async fn log_action(
        &self,
        group_id: &str,
        action: &str,
        details: serde_json::Value,
        member: Option<&str>,
    ) -> Result<(), GroupSplitError>;
    /// Matching entries, newest first.
    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<AppLog>, GroupSplitError>;
}
