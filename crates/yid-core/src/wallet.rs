//! Wallet provider port.
//!
//! A wallet provider holds the user's key material and exposes account
//! access and network switching. The session controller only talks to it
//! through [`WalletProvider`], so a JSON-RPC wallet bridge and an in-memory
//! test double are interchangeable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::address::Address;
use crate::config::AddChainParams;
use crate::error::Result;

/// Capability to sign and send transactions on behalf of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signer {
    pub address: Address,
}

impl Signer {
    pub fn new(address: Address) -> Self {
        Self { address }
    }
}

/// Signals emitted when the wallet's state changes outside our control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WalletEvent {
    /// The exposed accounts changed; empty means the wallet disconnected.
    AccountsChanged { accounts: Vec<Address> },
    /// The wallet switched to another chain.
    ChainChanged { chain_id: u64 },
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Asks the wallet to expose its accounts (`eth_requestAccounts`).
    ///
    /// May prompt the user. An empty list means no account was granted.
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    /// Returns the id of the chain the wallet is currently on.
    async fn chain_id(&self) -> Result<u64>;

    /// Asks the wallet to switch chains (`wallet_switchEthereumChain`).
    ///
    /// Fails with an RPC error carrying code 4902 when the chain is unknown
    /// to the wallet.
    async fn switch_chain(&self, chain_id: u64) -> Result<()>;

    /// Asks the wallet to add a chain (`wallet_addEthereumChain`).
    async fn add_chain(&self, params: &AddChainParams) -> Result<()>;

    /// Returns a signer for `account` if the wallet controls it.
    async fn get_signer(&self, account: &Address) -> Result<Signer>;

    /// Subscribes to account and chain change signals.
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;
}
