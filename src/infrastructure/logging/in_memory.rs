use crate::constants::DEFAULT_LOG_CAPACITY;
use crate::core::errors::GroupSplitError;
use crate::core::models::audit::{AppLog, LogFilter};
use crate::infrastructure::logging::LoggingService;
use async_trait::async_trait;
use chrono::Utc;
use log::info;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Bounded activity log. Once `capacity` entries are held the oldest one is evicted.
#[derive(Clone)]
pub struct InMemoryLogging {
    entries: Arc<RwLock<VecDeque<AppLog>>>,
    capacity: usize,
}

impl Default for InMemoryLogging {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLogging {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        InMemoryLogging {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity.min(1024)))),
            capacity: capacity.max(1),
        }
    }
}

#[async_trait]
impl LoggingService for InMemoryLogging {
    async fn log_action(
        &self,
        group_id: &str,
        action: &str,
        details: serde_json::Value,
        member: Option<&str>,
    ) -> Result<(), GroupSplitError> {
        let details = serde_json::from_value(details)
            .map_err(|e| GroupSplitError::LoggingError(format!("details must be a JSON object: {}", e)))?;
        info!(
            "{} group={} member={}",
            action,
            group_id,
            member.unwrap_or("-")
        );

        let mut entries = self.entries.write().await;
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(AppLog {
            id: Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            action: action.to_string(),
            member: member.map(String::from),
            details,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<AppLog>, GroupSplitError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .rev()
            .filter(|entry| filter.matches(entry))
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}
