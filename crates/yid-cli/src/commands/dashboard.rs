//! Dashboard listings backed by the bundled demo data.
//!
//! Changes made by `toggle-setting` last for the process only.

use anyhow::Result;
use yid_core::dashboard::DashboardRepository;
use yid_infrastructure::InMemoryDashboardRepository;

use super::print_json;

pub async fn audit() -> Result<()> {
    let repo = InMemoryDashboardRepository::seeded()?;
    print_json(&repo.list_audit_entries().await?)
}

pub async fn settings() -> Result<()> {
    let repo = InMemoryDashboardRepository::seeded()?;
    print_json(&repo.list_data_settings().await?)
}

pub async fn permissions() -> Result<()> {
    let repo = InMemoryDashboardRepository::seeded()?;
    print_json(&repo.list_permissions().await?)
}

pub async fn toggle_setting(id: &str, enabled: bool) -> Result<()> {
    let repo = InMemoryDashboardRepository::seeded()?;
    let setting = repo.set_data_setting_enabled(id, enabled).await?;
    print_json(&setting)
}
