//! Dashboard domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome recorded for an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Success,
    Failed,
    Pending,
}

/// One line of the identity's access history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    pub action: String,
    pub app_name: String,
    pub timestamp: DateTime<Utc>,
    pub details: String,
    pub status: AuditStatus,
}

/// Category a data-sharing setting belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataCategory {
    Personal,
    Financial,
    Social,
    Preferences,
}

/// A toggle controlling whether one class of data may be shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSetting {
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_enabled: bool,
    pub category: DataCategory,
    pub last_updated: DateTime<Utc>,
}

/// Access granted to a third-party application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: String,
    pub app_name: String,
    pub app_icon: String,
    pub permissions: Vec<String>,
    pub granted_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
    pub is_active: bool,
}
