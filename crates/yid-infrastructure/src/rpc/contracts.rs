//! Identity contracts reached through `eth_call` / `eth_sendTransaction`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use yid_core::address::{Address, TransactionHash};
use yid_core::config::TimingConfig;
use yid_core::contract::{IdentityContracts, TransactionReceipt, UserInfo};
use yid_core::error::{Result, YidError};
use yid_core::wallet::Signer;

use super::client::{JsonRpcClient, parse_quantity};
use crate::abi::{self, Token};

const GET_USER_CONTRACT: &str = "getUserContract(address)";
const DEPLOY_USER_CONTRACT: &str = "deployUserContract(string,string)";
const GET_USER_INFO: &str = "getUserInfo()";
const UPDATE_USER: &str = "updateUser(string,string)";
const DEACTIVATE: &str = "deactivate()";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl RawReceipt {
    fn into_receipt(self, hash: TransactionHash) -> Result<TransactionReceipt> {
        let block_number = self.block_number.as_deref().map(parse_quantity).transpose()?;
        // Pre-Byzantium receipts carry no status; treat them as mined.
        let success = match self.status.as_deref() {
            Some(status) => parse_quantity(status)? == 1,
            None => true,
        };
        Ok(TransactionReceipt {
            transaction_hash: hash,
            block_number,
            success,
        })
    }
}

pub struct RpcIdentityContracts {
    client: Arc<JsonRpcClient>,
    timing: TimingConfig,
}

impl RpcIdentityContracts {
    pub fn new(client: Arc<JsonRpcClient>, timing: TimingConfig) -> Self {
        Self { client, timing }
    }

    async fn call(&self, to: &Address, data: Vec<u8>) -> Result<Vec<u8>> {
        let raw: String = self
            .client
            .request(
                "eth_call",
                json!([{ "to": to, "data": abi::to_hex(&data) }, "latest"]),
            )
            .await?;
        abi::from_hex(&raw)
    }

    async fn send(&self, from: &Signer, to: &Address, data: Vec<u8>) -> Result<TransactionHash> {
        let raw: String = self
            .client
            .request(
                "eth_sendTransaction",
                json!([{ "from": from.address, "to": to, "data": abi::to_hex(&data) }]),
            )
            .await?;
        let hash: TransactionHash = raw.parse()?;
        tracing::info!(%hash, %to, "Transaction submitted");
        Ok(hash)
    }

    async fn poll_receipt(&self, tx: &TransactionHash) -> Result<TransactionReceipt> {
        let mut ticker = tokio::time::interval(self.timing.poll_interval());
        loop {
            ticker.tick().await;
            let raw: Option<RawReceipt> = self
                .client
                .request("eth_getTransactionReceipt", json!([tx]))
                .await?;
            if let Some(raw) = raw {
                return raw.into_receipt(*tx);
            }
            tracing::debug!(%tx, "Transaction pending");
        }
    }
}

#[async_trait]
impl IdentityContracts for RpcIdentityContracts {
    async fn get_user_contract(&self, factory: &Address, owner: &Address) -> Result<Address> {
        let data = abi::encode_call(GET_USER_CONTRACT, &[Token::Address(*owner)]);
        let output = self.call(factory, data).await?;
        abi::decode_address(&output)
    }

    async fn deploy_user_contract(
        &self,
        factory: &Address,
        signer: &Signer,
        name: &str,
        email: &str,
    ) -> Result<TransactionHash> {
        let data = abi::encode_call(
            DEPLOY_USER_CONTRACT,
            &[Token::String(name), Token::String(email)],
        );
        self.send(signer, factory, data).await
    }

    async fn get_user_info(&self, contract: &Address) -> Result<UserInfo> {
        let output = self.call(contract, abi::encode_call(GET_USER_INFO, &[])).await?;
        if output.is_empty() {
            return Err(YidError::not_found("user_contract", contract.to_string()));
        }
        abi::decode_user_info(&output)
    }

    async fn update_user(
        &self,
        contract: &Address,
        signer: &Signer,
        name: &str,
        email: &str,
    ) -> Result<TransactionHash> {
        let data = abi::encode_call(UPDATE_USER, &[Token::String(name), Token::String(email)]);
        self.send(signer, contract, data).await
    }

    async fn deactivate(&self, contract: &Address, signer: &Signer) -> Result<TransactionHash> {
        self.send(signer, contract, abi::encode_call(DEACTIVATE, &[]))
            .await
    }

    async fn wait_for_confirmation(&self, tx: &TransactionHash) -> Result<TransactionReceipt> {
        let bound = self.timing.confirmation_timeout();
        let receipt = tokio::time::timeout(bound, self.poll_receipt(tx))
            .await
            .map_err(|_| YidError::Timeout {
                operation: format!("receipt of {}", tx),
                seconds: bound.as_secs(),
            })??;

        if !receipt.success {
            return Err(YidError::Reverted {
                tx_hash: tx.to_string(),
            });
        }
        tracing::info!(%tx, block = ?receipt.block_number, "Transaction confirmed");
        Ok(receipt)
    }
}
