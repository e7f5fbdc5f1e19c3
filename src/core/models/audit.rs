use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
/// One entry of the application activity log. Entries outlive their group.
pub struct AppLog {
    pub id: String,
    pub group_id: String,
    pub action: String,
    pub member: Option<String>,
    #[schema(value_type = Object)]
    pub details: HashMap<String, serde_json::Value>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupAudit {
    pub id: String,
    pub group_id: String,
    pub action: String,
    pub member: Option<String>,
    #[schema(value_type = Object)]
    pub details: HashMap<String, serde_json::Value>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub timestamp: DateTime<Utc>,
}

/// Narrows an activity log read. Unset fields match everything.
#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogFilter {
    /// Only entries recorded against this group.
    pub group_id: Option<String>,
    /// Only entries attributed to this member.
    pub member: Option<String>,
    /// Newest entries first, at most this many.
    pub limit: Option<usize>,
}

impl LogFilter {
    pub fn for_group(group_id: impl Into<String>) -> Self {
        LogFilter {
            group_id: Some(group_id.into()),
            ..Default::default()
        }
    }

    pub fn matches(&self, entry: &AppLog) -> bool {
        let group_ok = match &self.group_id {
            Some(gid) => entry.group_id == *gid,
            None => true,
        };
        let member_ok = match &self.member {
            Some(name) => entry.member.as_deref() == Some(name.as_str()),
            None => true,
        };
        group_ok && member_ok
    }
}
