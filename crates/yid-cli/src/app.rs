//! Wiring of configuration, adapters and the session controller.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use yid_application::ContractSessionController;
use yid_core::config::YidConfig;
use yid_core::session::SessionStore;
use yid_core::wallet::WalletProvider;
use yid_infrastructure::{ConfigService, JsonRpcClient, RpcIdentityContracts, RpcWalletProvider};

/// Resolves configuration: file, then environment, then command-line flags.
pub fn load_config(
    path: Option<PathBuf>,
    wallet_url: Option<String>,
    factory: Option<String>,
) -> Result<YidConfig> {
    let service = match path {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new(),
    };
    let mut config = service.get_config().context("Failed to load configuration")?;

    if let Some(url) = wallet_url {
        config.wallet_url = Some(url);
    }
    if let Some(factory) = factory {
        config.factory_address = Some(factory);
    }
    Ok(config)
}

pub struct App {
    pub controller: Arc<ContractSessionController>,
    /// Concrete wallet handle, kept for the change poller.
    pub wallet: Option<Arc<RpcWalletProvider>>,
}

impl App {
    /// Builds the controller for `config`.
    ///
    /// Contract traffic goes through the wallet bridge so it can sign. Without
    /// a wallet URL the controller has no provider and every session command
    /// fails at `connect_wallet`.
    pub fn build(config: YidConfig) -> Result<Self> {
        let timeout = config.timing.request_timeout();

        let wallet = match &config.wallet_url {
            Some(url) => {
                let client = Arc::new(JsonRpcClient::new(url.as_str(), timeout)?);
                Some((client.clone(), Arc::new(RpcWalletProvider::new(client))))
            }
            None => None,
        };

        let contracts_client = match &wallet {
            Some((client, _)) => client.clone(),
            None => Arc::new(JsonRpcClient::new(config.network.rpc_url.as_str(), timeout)?),
        };
        let contracts = Arc::new(RpcIdentityContracts::new(
            contracts_client,
            config.timing.clone(),
        ));

        let wallet = wallet.map(|(_, provider)| provider);
        let provider = wallet
            .clone()
            .map(|provider| provider as Arc<dyn WalletProvider>);

        tracing::debug!(
            wallet = config.wallet_url.as_deref().unwrap_or("none"),
            rpc = %config.network.rpc_url,
            "Session controller configured"
        );

        let controller = Arc::new(ContractSessionController::new(
            Arc::new(SessionStore::new()),
            provider,
            contracts,
            config,
        ));
        Ok(Self { controller, wallet })
    }
}
