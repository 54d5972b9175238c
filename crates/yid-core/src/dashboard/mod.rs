//! Dashboard domain models and repository traits.
//!
//! The dashboard shows the identity's audit trail, its data-sharing settings
//! and the permissions granted to third-party applications.

mod model;
mod repository;

pub use model::{AuditEntry, AuditStatus, DataCategory, DataSetting, Permission};
pub use repository::DashboardRepository;
