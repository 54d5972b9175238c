//! In-memory wallet and contract doubles.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Notify, broadcast};
use yid_core::address::{Address, TransactionHash};
use yid_core::config::{AddChainParams, SEPOLIA_CHAIN_ID};
use yid_core::contract::{IdentityContracts, TransactionReceipt, UserInfo};
use yid_core::error::{Result, YidError};
use yid_core::wallet::{Signer, WalletEvent, WalletProvider};

pub const FACTORY: Address = Address::from_bytes([0xfa; 20]);
pub const ALICE: Address = Address::from_bytes([0xa1; 20]);
pub const BOB: Address = Address::from_bytes([0xb0; 20]);
pub const ALICE_CONTRACT: Address = Address::from_bytes([0xc1; 20]);
pub const DEPLOYED_CONTRACT: Address = Address::from_bytes([0xd0; 20]);

pub struct FakeWallet {
    pub accounts: Mutex<Vec<Address>>,
    pub chain_id: Mutex<u64>,
    pub switch_error: Mutex<Option<YidError>>,
    pub add_error: Mutex<Option<YidError>>,
    pub switch_calls: Mutex<Vec<u64>>,
    pub add_calls: Mutex<Vec<AddChainParams>>,
    events: broadcast::Sender<WalletEvent>,
}

impl FakeWallet {
    pub fn new(accounts: Vec<Address>, chain_id: u64) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            accounts: Mutex::new(accounts),
            chain_id: Mutex::new(chain_id),
            switch_error: Mutex::new(None),
            add_error: Mutex::new(None),
            switch_calls: Mutex::new(Vec::new()),
            add_calls: Mutex::new(Vec::new()),
            events,
        }
    }

    pub fn on_sepolia(accounts: Vec<Address>) -> Self {
        Self::new(accounts, SEPOLIA_CHAIN_ID)
    }

    pub fn emit(&self, event: WalletEvent) {
        let _ = self.events.send(event);
    }

    pub fn add_call_count(&self) -> usize {
        self.add_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(*self.chain_id.lock().unwrap())
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<()> {
        self.switch_calls.lock().unwrap().push(chain_id);
        if let Some(err) = self.switch_error.lock().unwrap().clone() {
            return Err(err);
        }
        *self.chain_id.lock().unwrap() = chain_id;
        Ok(())
    }

    async fn add_chain(&self, params: &AddChainParams) -> Result<()> {
        self.add_calls.lock().unwrap().push(params.clone());
        if let Some(err) = self.add_error.lock().unwrap().clone() {
            return Err(err);
        }
        let id = u64::from_str_radix(params.chain_id.trim_start_matches("0x"), 16)
            .map_err(|e| YidError::invalid_input(e.to_string()))?;
        *self.chain_id.lock().unwrap() = id;
        Ok(())
    }

    async fn get_signer(&self, account: &Address) -> Result<Signer> {
        if self.accounts.lock().unwrap().contains(account) {
            Ok(Signer::new(*account))
        } else {
            Err(YidError::not_connected(format!("{} not managed", account)))
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

pub struct FakeContracts {
    pub registry: Mutex<HashMap<Address, Address>>,
    pub profiles: Mutex<HashMap<Address, UserInfo>>,
    pub calls: Mutex<Vec<&'static str>>,
    pub send_error: Mutex<Option<YidError>>,
    pub revert: Mutex<bool>,
}

impl FakeContracts {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(HashMap::new()),
            profiles: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            send_error: Mutex::new(None),
            revert: Mutex::new(false),
        }
    }

    /// Contracts where `owner` is already registered at `contract`.
    pub fn with_registration(owner: Address, contract: Address, info: UserInfo) -> Self {
        let fake = Self::new();
        fake.registry.lock().unwrap().insert(owner, contract);
        fake.profiles.lock().unwrap().insert(contract, info);
        fake
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn send_failure(&self) -> Option<YidError> {
        self.send_error.lock().unwrap().clone()
    }
}

pub fn profile(name: &str, email: &str) -> UserInfo {
    UserInfo {
        name: name.to_string(),
        email: email.to_string(),
        is_active: true,
        created_at: 1000,
    }
}

#[async_trait]
impl IdentityContracts for FakeContracts {
    async fn get_user_contract(&self, factory: &Address, owner: &Address) -> Result<Address> {
        self.record("get_user_contract");
        assert_eq!(*factory, FACTORY);
        Ok(self
            .registry
            .lock()
            .unwrap()
            .get(owner)
            .copied()
            .unwrap_or(Address::ZERO))
    }

    async fn deploy_user_contract(
        &self,
        _factory: &Address,
        signer: &Signer,
        name: &str,
        email: &str,
    ) -> Result<TransactionHash> {
        self.record("deploy_user_contract");
        if let Some(err) = self.send_failure() {
            return Err(err);
        }
        self.registry
            .lock()
            .unwrap()
            .insert(signer.address, DEPLOYED_CONTRACT);
        self.profiles
            .lock()
            .unwrap()
            .insert(DEPLOYED_CONTRACT, profile(name, email));
        Ok(TransactionHash::from_bytes([0x01; 32]))
    }

    async fn get_user_info(&self, contract: &Address) -> Result<UserInfo> {
        self.record("get_user_info");
        self.profiles
            .lock()
            .unwrap()
            .get(contract)
            .cloned()
            .ok_or_else(|| YidError::not_found("user_contract", contract.to_string()))
    }

    async fn update_user(
        &self,
        contract: &Address,
        _signer: &Signer,
        name: &str,
        email: &str,
    ) -> Result<TransactionHash> {
        self.record("update_user");
        if let Some(err) = self.send_failure() {
            return Err(err);
        }
        if let Some(info) = self.profiles.lock().unwrap().get_mut(contract) {
            info.name = name.to_string();
            info.email = email.to_string();
        }
        Ok(TransactionHash::from_bytes([0x02; 32]))
    }

    async fn deactivate(&self, contract: &Address, _signer: &Signer) -> Result<TransactionHash> {
        self.record("deactivate");
        if let Some(err) = self.send_failure() {
            return Err(err);
        }
        if let Some(info) = self.profiles.lock().unwrap().get_mut(contract) {
            info.is_active = false;
        }
        Ok(TransactionHash::from_bytes([0x03; 32]))
    }

    async fn wait_for_confirmation(&self, tx: &TransactionHash) -> Result<TransactionReceipt> {
        self.record("wait_for_confirmation");
        if *self.revert.lock().unwrap() {
            return Err(YidError::Reverted {
                tx_hash: tx.to_string(),
            });
        }
        Ok(TransactionReceipt {
            transaction_hash: *tx,
            block_number: Some(1),
            success: true,
        })
    }
}

/// Contracts whose next profile read blocks until released.
pub struct GatedContracts {
    pub inner: FakeContracts,
    armed: AtomicBool,
    /// Signalled when the blocked read has started.
    pub entered: Notify,
    pub release: Notify,
}

impl GatedContracts {
    pub fn new(inner: FakeContracts) -> Self {
        Self {
            inner,
            armed: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Blocks the next `get_user_info` call.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityContracts for GatedContracts {
    async fn get_user_contract(&self, factory: &Address, owner: &Address) -> Result<Address> {
        self.inner.get_user_contract(factory, owner).await
    }

    async fn deploy_user_contract(
        &self,
        factory: &Address,
        signer: &Signer,
        name: &str,
        email: &str,
    ) -> Result<TransactionHash> {
        self.inner
            .deploy_user_contract(factory, signer, name, email)
            .await
    }

    async fn get_user_info(&self, contract: &Address) -> Result<UserInfo> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.get_user_info(contract).await
    }

    async fn update_user(
        &self,
        contract: &Address,
        signer: &Signer,
        name: &str,
        email: &str,
    ) -> Result<TransactionHash> {
        self.inner.update_user(contract, signer, name, email).await
    }

    async fn deactivate(&self, contract: &Address, signer: &Signer) -> Result<TransactionHash> {
        self.inner.deactivate(contract, signer).await
    }

    async fn wait_for_confirmation(&self, tx: &TransactionHash) -> Result<TransactionReceipt> {
        self.inner.wait_for_confirmation(tx).await
    }
}
