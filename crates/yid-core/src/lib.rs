//! Domain layer for YID.
//!
//! Holds the session state model and store, the configuration model, the
//! shared error type and the ports (traits) through which the application
//! layer reaches wallets, identity contracts and dashboard data.

pub mod address;
pub mod config;
pub mod contract;
pub mod dashboard;
pub mod error;
pub mod session;
pub mod wallet;

// Re-export common types
pub use address::{Address, TransactionHash};
pub use error::{Result, YidError};
