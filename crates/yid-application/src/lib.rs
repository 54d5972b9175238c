//! Application layer for YID.
//!
//! Coordinates the wallet provider, the identity contracts and the session
//! store through [`ContractSessionController`].

pub mod contract_session;

pub use contract_session::ContractSessionController;
