//! Dashboard data held in process memory.
//!
//! Changes live as long as the process; nothing is written to disk.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tokio::sync::RwLock;
use yid_core::dashboard::{AuditEntry, DashboardRepository, DataSetting, Permission};
use yid_core::error::{Result, YidError};

const SEED: &str = include_str!("../data/dashboard_seed.json");

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DashboardData {
    audit_entries: Vec<AuditEntry>,
    data_settings: Vec<DataSetting>,
    permissions: Vec<Permission>,
}

#[derive(Debug, Default)]
pub struct InMemoryDashboardRepository {
    data: RwLock<DashboardData>,
}

impl InMemoryDashboardRepository {
    pub fn new(
        audit_entries: Vec<AuditEntry>,
        data_settings: Vec<DataSetting>,
        permissions: Vec<Permission>,
    ) -> Self {
        Self {
            data: RwLock::new(DashboardData {
                audit_entries,
                data_settings,
                permissions,
            }),
        }
    }

    /// Repository pre-filled with the bundled demo data.
    pub fn seeded() -> Result<Self> {
        let data: DashboardData = serde_json::from_str(SEED)?;
        Ok(Self {
            data: RwLock::new(data),
        })
    }
}

#[async_trait]
impl DashboardRepository for InMemoryDashboardRepository {
    async fn list_audit_entries(&self) -> Result<Vec<AuditEntry>> {
        Ok(self.data.read().await.audit_entries.clone())
    }

    async fn list_data_settings(&self) -> Result<Vec<DataSetting>> {
        Ok(self.data.read().await.data_settings.clone())
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>> {
        Ok(self.data.read().await.permissions.clone())
    }

    async fn set_data_setting_enabled(&self, id: &str, is_enabled: bool) -> Result<DataSetting> {
        let mut data = self.data.write().await;
        let setting = data
            .data_settings
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| YidError::not_found("data_setting", id))?;

        setting.is_enabled = is_enabled;
        setting.last_updated = Utc::now();
        tracing::info!(id, is_enabled, "Data setting updated");
        Ok(setting.clone())
    }
}
