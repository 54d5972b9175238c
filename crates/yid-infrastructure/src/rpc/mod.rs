//! JSON-RPC adapters for the wallet and identity contract ports.

pub mod client;
pub mod contracts;
pub mod wallet;

pub use client::JsonRpcClient;
pub use contracts::RpcIdentityContracts;
pub use wallet::{ObservedWallet, RpcWalletProvider};
