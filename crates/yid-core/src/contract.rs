//! Identity contract port.
//!
//! Two contract surfaces back an identity: the factory, a registry mapping
//! wallet accounts to per-user contracts, and the user contract holding one
//! profile. Both sit behind [`IdentityContracts`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::address::{Address, TransactionHash};
use crate::error::Result;
use crate::wallet::Signer;

/// Profile fields as returned by the user contract's `getUserInfo()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: u64,
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: TransactionHash,
    pub block_number: Option<u64>,
    pub success: bool,
}

#[async_trait]
pub trait IdentityContracts: Send + Sync {
    /// Looks up the user contract bound to `owner`.
    ///
    /// Returns [`Address::ZERO`] when the owner is not registered.
    async fn get_user_contract(&self, factory: &Address, owner: &Address) -> Result<Address>;

    /// Sends the factory transaction deploying a user contract for the signer.
    async fn deploy_user_contract(
        &self,
        factory: &Address,
        signer: &Signer,
        name: &str,
        email: &str,
    ) -> Result<TransactionHash>;

    /// Reads the profile stored in a user contract.
    async fn get_user_info(&self, contract: &Address) -> Result<UserInfo>;

    /// Sends `updateUser(name, email)` to a user contract.
    async fn update_user(
        &self,
        contract: &Address,
        signer: &Signer,
        name: &str,
        email: &str,
    ) -> Result<TransactionHash>;

    /// Sends `deactivate()` to a user contract.
    async fn deactivate(&self, contract: &Address, signer: &Signer) -> Result<TransactionHash>;

    /// Waits until the transaction is mined.
    ///
    /// Implementations return `YidError::Reverted` for a failed receipt and
    /// `YidError::Timeout` when the configured bound elapses.
    async fn wait_for_confirmation(&self, tx: &TransactionHash) -> Result<TransactionReceipt>;
}
