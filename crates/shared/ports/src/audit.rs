use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::AuditError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditCategory {
    Trading,
    Risk,
    System,
}

impl fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditCategory::Trading => "TRADING",
            AuditCategory::Risk => "RISK",
            AuditCategory::System => "SYSTEM",
        };
        write!(f, "{}", s)
    }
}

/// One audit trail record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub user_id: String,
    pub action: String,
    pub category: AuditCategory,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        user_id: impl Into<String>,
        action: impl Into<String>,
        category: AuditCategory,
        details: serde_json::Value,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            action: action.into(),
            category,
            details,
            timestamp,
        }
    }
}

/// Port for the audit trail
///
/// Recording is fire-and-forget: callers log and drop any error.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry) -> Result<(), AuditError>;
}
