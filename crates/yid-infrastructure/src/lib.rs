//! Infrastructure adapters for YID.
//!
//! Implements the `yid-core` ports: JSON-RPC wallet and contract access,
//! in-memory dashboard data, and file/environment configuration loading.

pub mod abi;
pub mod config_service;
pub mod in_memory_dashboard_repository;
pub mod paths;
pub mod rpc;

pub use crate::config_service::ConfigService;
pub use crate::in_memory_dashboard_repository::InMemoryDashboardRepository;
pub use crate::rpc::{JsonRpcClient, RpcIdentityContracts, RpcWalletProvider};
