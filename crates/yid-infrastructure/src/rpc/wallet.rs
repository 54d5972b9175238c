//! Wallet provider backed by a JSON-RPC wallet bridge.
//!
//! The bridge speaks the EIP-1193 request methods (`eth_requestAccounts`,
//! `wallet_switchEthereumChain`, ...) over HTTP. HTTP has no push channel, so
//! account and chain changes are detected by polling and re-broadcast as
//! [`WalletEvent`]s.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use yid_core::address::Address;
use yid_core::config::AddChainParams;
use yid_core::error::{Result, YidError};
use yid_core::wallet::{Signer, WalletEvent, WalletProvider};

use super::client::{JsonRpcClient, format_quantity, parse_quantity};

const EVENT_CAPACITY: usize = 32;

/// Wallet state as last observed by the poller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedWallet {
    pub accounts: Vec<Address>,
    pub chain_id: Option<u64>,
}

impl ObservedWallet {
    /// Events needed to move an observer from `self` to `next`.
    pub fn diff(&self, next: &ObservedWallet) -> Vec<WalletEvent> {
        let mut events = Vec::new();
        if self.accounts != next.accounts {
            events.push(WalletEvent::AccountsChanged {
                accounts: next.accounts.clone(),
            });
        }
        if let Some(chain_id) = next.chain_id {
            if self.chain_id != Some(chain_id) {
                events.push(WalletEvent::ChainChanged { chain_id });
            }
        }
        events
    }
}

pub struct RpcWalletProvider {
    client: Arc<JsonRpcClient>,
    events: broadcast::Sender<WalletEvent>,
}

impl RpcWalletProvider {
    pub fn new(client: Arc<JsonRpcClient>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { client, events }
    }

    /// Accounts currently exposed without prompting (`eth_accounts`).
    pub async fn accounts(&self) -> Result<Vec<Address>> {
        self.client.request("eth_accounts", json!([])).await
    }

    async fn observe(&self) -> Result<ObservedWallet> {
        let accounts = self.accounts().await?;
        let chain_id = self.chain_id().await?;
        Ok(ObservedWallet {
            accounts,
            chain_id: Some(chain_id),
        })
    }

    /// Polls the bridge every `interval` and broadcasts changes until `cancel` fires.
    ///
    /// The first successful poll only records the baseline.
    pub fn spawn_watcher(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let provider = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut last: Option<ObservedWallet> = None;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("Wallet watcher stopped");
                        break;
                    }
                    _ = ticker.tick() => {}
                }

                let observed = match provider.observe().await {
                    Ok(observed) => observed,
                    Err(e) => {
                        tracing::warn!("Wallet poll failed: {}", e);
                        continue;
                    }
                };

                if let Some(previous) = &last {
                    for event in previous.diff(&observed) {
                        tracing::info!(?event, "Wallet state changed");
                        // No subscribers is fine; nobody is listening yet.
                        let _ = provider.events.send(event);
                    }
                }
                last = Some(observed);
            }
        })
    }
}

#[async_trait]
impl WalletProvider for RpcWalletProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        self.client.request("eth_requestAccounts", json!([])).await
    }

    async fn chain_id(&self) -> Result<u64> {
        let raw: String = self.client.request("eth_chainId", json!([])).await?;
        parse_quantity(&raw)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<()> {
        let _: Value = self
            .client
            .request(
                "wallet_switchEthereumChain",
                json!([{ "chainId": format_quantity(chain_id) }]),
            )
            .await?;
        Ok(())
    }

    async fn add_chain(&self, params: &AddChainParams) -> Result<()> {
        let _: Value = self
            .client
            .request("wallet_addEthereumChain", json!([params]))
            .await?;
        Ok(())
    }

    async fn get_signer(&self, account: &Address) -> Result<Signer> {
        let accounts = self.accounts().await?;
        if accounts.contains(account) {
            Ok(Signer::new(*account))
        } else {
            Err(YidError::not_connected(format!(
                "Wallet does not expose account {}",
                account
            )))
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}
