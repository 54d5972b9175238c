//! Dashboard repository trait.

use async_trait::async_trait;

use super::model::{AuditEntry, DataSetting, Permission};
use crate::error::Result;

/// Read side of the dashboard plus the one write it supports.
#[async_trait]
pub trait DashboardRepository: Send + Sync {
    async fn list_audit_entries(&self) -> Result<Vec<AuditEntry>>;

    async fn list_data_settings(&self) -> Result<Vec<DataSetting>>;

    async fn list_permissions(&self) -> Result<Vec<Permission>>;

    /// Sets a data setting's enabled flag and refreshes its `last_updated`.
    ///
    /// Returns `YidError::NotFound` for an unknown id.
    async fn set_data_setting_enabled(&self, id: &str, is_enabled: bool) -> Result<DataSetting>;
}
