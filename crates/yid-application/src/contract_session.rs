//! Contract session controller.
//!
//! This module provides the `ContractSessionController` which sits between the
//! wallet provider, the identity contracts and the `SessionStore`. It owns the
//! session lifecycle: connecting a wallet, keeping the network in check,
//! discovering an existing registration and running contract mutations.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use yid_core::address::{Address, TransactionHash};
use yid_core::config::{NetworkConfig, YidConfig};
use yid_core::contract::{IdentityContracts, TransactionReceipt, UserInfo};
use yid_core::error::{Result, YidError};
use yid_core::session::{Session, SessionStore, UserContract};
use yid_core::wallet::{Signer, WalletEvent, WalletProvider};

const MSG_NO_PROVIDER: &str = "No wallet provider detected. Please install a wallet";
const MSG_NOT_CONNECTED: &str = "Please connect your wallet first";
const MSG_REJECTED: &str = "Request rejected in wallet";
const MSG_CONNECT_FAILED: &str = "Failed to connect wallet";
const MSG_CHECK_NETWORK_FAILED: &str = "Failed to check network";
const MSG_ADD_NETWORK_FAILED: &str = "Failed to add Sepolia network";
const MSG_SWITCH_FAILED: &str = "Failed to switch to Sepolia network";
const MSG_REGISTRATION_FAILED: &str = "Failed to check user registration";
const MSG_REGISTER_FAILED: &str = "Failed to register user. Please try again.";
const MSG_UPDATE_FAILED: &str = "Failed to update user information";
const MSG_DEACTIVATE_FAILED: &str = "Failed to deactivate user";
const MSG_LOOKUP_FAILED: &str = "Failed to get user contract";
const MSG_PROFILE_FAILED: &str = "Failed to get user information";

/// Controller for wallet-bound identity sessions.
///
/// All session mutations go through the shared [`SessionStore`], so any
/// number of observers can follow progress through
/// [`SessionStore::subscribe`]. Failures of external calls are caught at the
/// operation boundary, logged, and recorded in the session's `error` field
/// before being returned to the caller.
pub struct ContractSessionController {
    /// Shared session state
    store: Arc<SessionStore>,
    /// Wallet provider; `None` when no wallet is available in this environment
    wallet: Option<Arc<dyn WalletProvider>>,
    /// Factory and user contract access
    contracts: Arc<dyn IdentityContracts>,
    /// Network, factory and timing configuration
    config: YidConfig,
    /// Signer for the connected account, refreshed on account changes
    signer: RwLock<Option<Signer>>,
}

impl ContractSessionController {
    /// Creates a new controller.
    ///
    /// # Arguments
    ///
    /// * `store` - Session store shared with observers
    /// * `wallet` - Wallet provider, or `None` if no wallet was detected
    /// * `contracts` - Identity contract access
    /// * `config` - Resolved configuration
    pub fn new(
        store: Arc<SessionStore>,
        wallet: Option<Arc<dyn WalletProvider>>,
        contracts: Arc<dyn IdentityContracts>,
        config: YidConfig,
    ) -> Self {
        Self {
            store,
            wallet,
            contracts,
            config,
            signer: RwLock::new(None),
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn config(&self) -> &YidConfig {
        &self.config
    }

    /// Current session snapshot.
    pub fn session(&self) -> Session {
        self.store.snapshot()
    }

    pub async fn signer(&self) -> Option<Signer> {
        self.signer.read().await.clone()
    }

    // ------------------------------------------------------------------
    // Wallet and network
    // ------------------------------------------------------------------

    /// Requests account access and initializes the session for the first account.
    ///
    /// Returns `Ok(None)` when the wallet granted no account; the session is
    /// left disconnected in that case. On success the network is checked and,
    /// when correct, an existing registration is loaded.
    pub async fn connect_wallet(&self) -> Result<Option<Address>> {
        let wallet = self
            .wallet()
            .map_err(|e| self.fail("connect_wallet", e, MSG_CONNECT_FAILED))?;
        let _loading = LoadingGuard::new(&self.store);

        let accounts = self
            .guarded(
                "connect_wallet",
                MSG_CONNECT_FAILED,
                self.request_timeout(),
                wallet.request_accounts(),
            )
            .await?;

        let Some(account) = accounts.first().copied() else {
            tracing::info!("[ContractSession] Wallet granted no accounts");
            return Ok(None);
        };

        self.adopt_account(account);
        self.refresh_signer(&wallet, &account).await;
        tracing::info!("[ContractSession] Wallet connected: {}", account.short());

        // A network failure is already recorded; the connection itself stands.
        if self.check_network().await.unwrap_or(false) {
            self.check_user_registration(&account).await;
        }
        Ok(Some(account))
    }

    /// Reads the wallet's chain and records whether it is the configured network.
    pub async fn check_network(&self) -> Result<bool> {
        let wallet = self
            .wallet()
            .map_err(|e| self.fail("check_network", e, MSG_CHECK_NETWORK_FAILED))?;
        let chain_id = self
            .guarded(
                "check_network",
                MSG_CHECK_NETWORK_FAILED,
                self.request_timeout(),
                wallet.chain_id(),
            )
            .await?;
        Ok(self.apply_chain(chain_id))
    }

    /// Asks the wallet to switch to the configured network, adding it first
    /// if the wallet does not know it.
    pub async fn switch_to_sepolia(&self) -> Result<()> {
        let wallet = self
            .wallet()
            .map_err(|e| self.fail("switch_network", e, MSG_SWITCH_FAILED))?;
        let network = &self.config.network;

        let switched = self
            .bounded(
                "switch_network",
                self.request_timeout(),
                wallet.switch_chain(network.chain_id),
            )
            .await;

        match switched {
            Ok(()) => {}
            Err(e) if e.is_chain_not_added() => {
                tracing::info!(
                    "[ContractSession] Chain {} unknown to wallet, adding it",
                    network.chain_id_hex()
                );
                let params = network.add_chain_params();
                self.guarded(
                    "add_network",
                    MSG_ADD_NETWORK_FAILED,
                    self.request_timeout(),
                    wallet.add_chain(&params),
                )
                .await?;
            }
            Err(e) => return Err(self.fail("switch_network", e, MSG_SWITCH_FAILED)),
        }

        if self.check_network().await? {
            if let Some(account) = self.store.snapshot().wallet_address {
                self.check_user_registration(&account).await;
            }
        }
        Ok(())
    }

    /// Forgets the signer and restores the empty session.
    pub async fn disconnect(&self) {
        *self.signer.write().await = None;
        self.store.reset();
        tracing::info!("[ContractSession] Wallet disconnected");
    }

    // ------------------------------------------------------------------
    // Registration and profile
    // ------------------------------------------------------------------

    /// Looks up `owner` in the factory and loads the profile when registered.
    ///
    /// Returns `true` only when a user contract exists and its profile was
    /// loaded into the session. Failures are recorded, never propagated.
    pub async fn check_user_registration(&self, owner: &Address) -> bool {
        if !self.store.snapshot().is_correct_network {
            tracing::debug!("[ContractSession] Skipping registration check on wrong network");
            return false;
        }

        let contract = match self.get_user_contract(owner).await {
            Ok(contract) => contract,
            Err(_) => return false,
        };
        if contract.is_zero() {
            tracing::info!("[ContractSession] {} is not registered", owner.short());
            return false;
        }

        match self.load_profile(owner, &contract).await {
            Ok(loaded) => loaded,
            Err(e) => {
                self.fail("check_user_registration", e, MSG_REGISTRATION_FAILED);
                false
            }
        }
    }

    /// Returns the user contract bound to `owner`, or the zero address.
    pub async fn get_user_contract(&self, owner: &Address) -> Result<Address> {
        let factory = self
            .config
            .factory_address()
            .map_err(|e| self.fail("get_user_contract", e, MSG_LOOKUP_FAILED))?;
        self.guarded(
            "get_user_contract",
            MSG_LOOKUP_FAILED,
            self.request_timeout(),
            self.contracts.get_user_contract(&factory, owner),
        )
        .await
    }

    /// Reads the profile stored in `contract`.
    pub async fn get_user_info(&self, contract: &Address) -> Result<UserInfo> {
        self.guarded(
            "get_user_info",
            MSG_PROFILE_FAILED,
            self.request_timeout(),
            self.contracts.get_user_info(contract),
        )
        .await
    }

    /// Re-reads the current user contract and refreshes the session profile.
    pub async fn refresh_user_info(&self) -> Result<UserInfo> {
        let session = self.store.snapshot();
        let (Some(owner), Some(contract)) = (session.wallet_address, session.user_contract_address())
        else {
            return Err(self.fail(
                "refresh_user_info",
                YidError::not_found("user_contract", "current session"),
                MSG_PROFILE_FAILED,
            ));
        };

        let info = self.get_user_info(&contract).await?;
        self.apply_profile(&owner, &contract, &info);
        Ok(info)
    }

    // ------------------------------------------------------------------
    // Contract mutations
    // ------------------------------------------------------------------

    /// Deploys a user contract for the connected account and loads its profile.
    ///
    /// Fails before any external call when the network is wrong, no signer is
    /// available, the factory address is not configured, or a field is blank.
    pub async fn deploy_user_contract(&self, name: &str, email: &str) -> Result<Address> {
        let (factory, signer) = self
            .preflight()
            .await
            .map_err(|e| self.fail("deploy_user_contract", e, MSG_REGISTER_FAILED))?;
        let (name, email) = require_fields(name, email)
            .map_err(|e| self.fail("deploy_user_contract", e, MSG_REGISTER_FAILED))?;
        let _loading = LoadingGuard::new(&self.store);

        tracing::info!(
            "[ContractSession] Deploying user contract for {}",
            signer.address.short()
        );
        let tx = self
            .guarded(
                "deploy_user_contract",
                MSG_REGISTER_FAILED,
                self.request_timeout(),
                self.contracts
                    .deploy_user_contract(&factory, &signer, name, email),
            )
            .await?;
        self.confirm("deploy_user_contract", MSG_REGISTER_FAILED, &tx)
            .await?;

        let contract = self
            .guarded(
                "deploy_user_contract",
                MSG_REGISTER_FAILED,
                self.request_timeout(),
                self.contracts.get_user_contract(&factory, &signer.address),
            )
            .await?;
        if contract.is_zero() {
            return Err(self.fail(
                "deploy_user_contract",
                YidError::not_found("user_contract", signer.address.to_string()),
                MSG_REGISTER_FAILED,
            ));
        }

        self.load_profile(&signer.address, &contract)
            .await
            .map_err(|e| self.fail("deploy_user_contract", e, MSG_REGISTER_FAILED))?;
        tracing::info!("[ContractSession] User contract deployed at {}", contract);
        Ok(contract)
    }

    /// Sends `updateUser` to `contract` and waits for it to be mined.
    ///
    /// The session profile is left as is; call
    /// [`refresh_user_info`](Self::refresh_user_info) to re-read it.
    pub async fn update_user_info(
        &self,
        contract: &Address,
        name: &str,
        email: &str,
    ) -> Result<TransactionReceipt> {
        let (_, signer) = self
            .preflight()
            .await
            .map_err(|e| self.fail("update_user_info", e, MSG_UPDATE_FAILED))?;
        let (name, email) = require_fields(name, email)
            .map_err(|e| self.fail("update_user_info", e, MSG_UPDATE_FAILED))?;

        let tx = self
            .guarded(
                "update_user_info",
                MSG_UPDATE_FAILED,
                self.request_timeout(),
                self.contracts.update_user(contract, &signer, name, email),
            )
            .await?;
        let receipt = self
            .confirm("update_user_info", MSG_UPDATE_FAILED, &tx)
            .await?;
        self.store.set_error(None);
        Ok(receipt)
    }

    /// Sends `deactivate` to `contract` and waits for it to be mined.
    pub async fn deactivate_user(&self, contract: &Address) -> Result<TransactionReceipt> {
        let (_, signer) = self
            .preflight()
            .await
            .map_err(|e| self.fail("deactivate_user", e, MSG_DEACTIVATE_FAILED))?;

        let tx = self
            .guarded(
                "deactivate_user",
                MSG_DEACTIVATE_FAILED,
                self.request_timeout(),
                self.contracts.deactivate(contract, &signer),
            )
            .await?;
        let receipt = self
            .confirm("deactivate_user", MSG_DEACTIVATE_FAILED, &tx)
            .await?;
        self.store.set_error(None);
        Ok(receipt)
    }

    // ------------------------------------------------------------------
    // Wallet events
    // ------------------------------------------------------------------

    /// Applies one wallet signal to the session.
    pub async fn handle_wallet_event(&self, event: WalletEvent) {
        match event {
            WalletEvent::AccountsChanged { accounts } => match accounts.first().copied() {
                None => self.disconnect().await,
                Some(account) => {
                    if self.store.snapshot().wallet_address == Some(account) {
                        return;
                    }
                    tracing::info!("[ContractSession] Account changed to {}", account.short());
                    self.adopt_account(account);
                    if let Ok(wallet) = self.wallet() {
                        self.refresh_signer(&wallet, &account).await;
                    }
                    if self.store.snapshot().is_correct_network {
                        self.check_user_registration(&account).await;
                    }
                }
            },
            WalletEvent::ChainChanged { chain_id } => {
                tracing::info!("[ContractSession] Chain changed to {}", chain_id);
                let correct = self.apply_chain(chain_id);
                let session = self.store.snapshot();
                if let (true, true, Some(account)) =
                    (correct, session.is_connected, session.wallet_address)
                {
                    self.check_user_registration(&account).await;
                }
            }
        }
    }

    /// Spawns a task feeding wallet signals into [`handle_wallet_event`](Self::handle_wallet_event).
    ///
    /// The subscription is taken before this returns, so no signal emitted
    /// afterwards is missed. The task ends when `cancel` fires or the wallet
    /// drops its event channel.
    pub fn spawn_event_loop(self: &Arc<Self>, cancel: CancellationToken) -> Result<JoinHandle<()>> {
        let mut events = self.wallet()?.subscribe();
        let controller = Arc::clone(self);

        Ok(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    received = events.recv() => match received {
                        Ok(event) => controller.handle_wallet_event(event).await,
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(
                                "[ContractSession] Missed {} wallet events, resynchronizing",
                                skipped
                            );
                            controller.resync().await;
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            tracing::debug!("[ContractSession] Wallet event loop stopped");
        }))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn wallet(&self) -> Result<Arc<dyn WalletProvider>> {
        self.wallet
            .clone()
            .ok_or_else(|| YidError::provider_unavailable(MSG_NO_PROVIDER))
    }

    fn request_timeout(&self) -> Duration {
        self.config.timing.request_timeout()
    }

    /// Makes `account` the active one. Profile data of a previous account is dropped.
    fn adopt_account(&self, account: Address) {
        self.store.update(|s| {
            if s.wallet_address != Some(account) {
                s.user = None;
                s.user_contract = None;
            }
            s.wallet_address = Some(account);
            s.is_connected = true;
        });
    }

    async fn refresh_signer(&self, wallet: &Arc<dyn WalletProvider>, account: &Address) {
        let signer = match self
            .bounded("get_signer", self.request_timeout(), wallet.get_signer(account))
            .await
        {
            Ok(signer) => Some(signer),
            Err(e) => {
                tracing::warn!(
                    "[ContractSession] No signer for {}: {}",
                    account.short(),
                    e
                );
                None
            }
        };
        *self.signer.write().await = signer;
    }

    /// Records whether `chain_id` is the configured network.
    fn apply_chain(&self, chain_id: u64) -> bool {
        let network = &self.config.network;
        let correct = network.is_supported(chain_id);
        let error = (!correct).then(|| wrong_network_message(network));
        self.store.update(|s| {
            s.is_correct_network = correct;
            s.error = error;
        });
        correct
    }

    async fn resync(&self) {
        if let Ok(wallet) = self.wallet() {
            if let Ok(accounts) = self
                .bounded("resync", self.request_timeout(), wallet.request_accounts())
                .await
            {
                if let Some(account) = accounts.first().copied() {
                    self.handle_wallet_event(WalletEvent::AccountsChanged {
                        accounts: vec![account],
                    })
                    .await;
                }
            }
        }
        if self.check_network().await.unwrap_or(false) {
            if let Some(account) = self.store.snapshot().wallet_address {
                self.check_user_registration(&account).await;
            }
        }
    }

    /// Checks shared by all contract mutations. Makes no external call.
    async fn preflight(&self) -> Result<(Address, Signer)> {
        if !self.store.snapshot().is_correct_network {
            return Err(YidError::WrongNetwork {
                expected: self.config.network.chain_id,
                actual: None,
            });
        }
        let signer = self
            .signer
            .read()
            .await
            .clone()
            .ok_or_else(|| YidError::not_connected("no signer for the active account"))?;
        let factory = self.config.factory_address()?;
        Ok((factory, signer))
    }

    async fn confirm(
        &self,
        operation: &'static str,
        fallback: &str,
        tx: &TransactionHash,
    ) -> Result<TransactionReceipt> {
        self.guarded(
            operation,
            fallback,
            self.config.timing.confirmation_timeout(),
            self.contracts.wait_for_confirmation(tx),
        )
        .await
    }

    /// Reads the profile of `contract` and stores it for `owner`.
    async fn load_profile(&self, owner: &Address, contract: &Address) -> Result<bool> {
        let info = self
            .bounded(
                "get_user_info",
                self.request_timeout(),
                self.contracts.get_user_info(contract),
            )
            .await?;
        Ok(self.apply_profile(owner, contract, &info))
    }

    /// Writes user and user contract together. Skipped unless `owner` is still
    /// the connected account, so a read finishing after a disconnect or an
    /// account switch leaves the session alone.
    fn apply_profile(&self, owner: &Address, contract: &Address, info: &UserInfo) -> bool {
        let (user, user_contract) = UserContract::with_user(*contract, info);
        let mut applied = false;
        self.store.update(|s| {
            if s.wallet_address != Some(*owner) {
                return;
            }
            s.user = Some(user);
            s.user_contract = Some(user_contract);
            s.error = None;
            applied = true;
        });
        if applied {
            tracing::info!(
                "[ContractSession] Loaded profile of {} from {}",
                owner.short(),
                contract.short()
            );
        } else {
            tracing::debug!(
                "[ContractSession] Discarding profile of {}; no longer the active account",
                owner.short()
            );
        }
        applied
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        limit: Duration,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(YidError::Timeout {
                operation: operation.to_string(),
                seconds: limit.as_secs(),
            }),
        }
    }

    async fn guarded<T>(
        &self,
        operation: &'static str,
        fallback: &str,
        limit: Duration,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        self.bounded(operation, limit, call)
            .await
            .map_err(|e| self.fail(operation, e, fallback))
    }

    /// Logs `err` and records a user-facing message for it.
    fn fail(&self, operation: &str, err: YidError, fallback: &str) -> YidError {
        tracing::error!("[ContractSession] {} failed: {}", operation, err);
        self.store
            .set_error(Some(user_message(&err, fallback, &self.config.network)));
        err
    }
}

/// Clears the session's loading flag when dropped.
struct LoadingGuard<'a> {
    store: &'a SessionStore,
}

impl<'a> LoadingGuard<'a> {
    fn new(store: &'a SessionStore) -> Self {
        store.set_loading(true);
        Self { store }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.store.set_loading(false);
    }
}

fn require_fields<'a>(name: &'a str, email: &'a str) -> Result<(&'a str, &'a str)> {
    let (name, email) = (name.trim(), email.trim());
    if name.is_empty() || email.is_empty() {
        return Err(YidError::invalid_input("Please fill in all fields"));
    }
    Ok((name, email))
}

pub fn wrong_network_message(network: &NetworkConfig) -> String {
    format!("Please switch to Sepolia testnet (Chain ID: {})", network.chain_id)
}

/// Maps an error to the message shown to the user.
///
/// Connection problems get an actionable message of their own; contract call
/// failures fall back to the operation's generic message.
fn user_message(err: &YidError, fallback: &str, network: &NetworkConfig) -> String {
    match err {
        YidError::ProviderUnavailable(_) => MSG_NO_PROVIDER.to_string(),
        YidError::WrongNetwork { .. } => wrong_network_message(network),
        YidError::NotConnected(_) => MSG_NOT_CONNECTED.to_string(),
        YidError::Config(message) | YidError::InvalidInput(message) => message.clone(),
        YidError::Timeout { operation, .. } => format!("Timed out waiting for {}", operation),
        YidError::Reverted { .. } => format!("{} Transaction reverted.", fallback),
        e if e.is_rejected() => MSG_REJECTED.to_string(),
        _ => fallback.to_string(),
    }
}
