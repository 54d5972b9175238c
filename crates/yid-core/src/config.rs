//! Configuration model.
//!
//! The model is plain serde data; loading and environment overrides live in
//! `yid-infrastructure::config_service`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::{Result, YidError};

/// Chain id of the Sepolia test network, the only supported network.
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

/// RPC URL used when none is supplied.
pub const DEFAULT_RPC_URL: &str = "https://sepolia.infura.io/v3/YOUR_INFURA_KEY";

/// Placeholder value shipped in sample environment files.
pub const FACTORY_ADDRESS_PLACEHOLDER: &str = "0x...";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// The single network the session accepts.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub chain_name: String,
    pub rpc_url: String,
    pub block_explorer_url: String,
    pub native_currency: NativeCurrency,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: SEPOLIA_CHAIN_ID,
            chain_name: "Sepolia Test Network".to_string(),
            native_currency: NativeCurrency {
                name: "SepoliaETH".to_string(),
                symbol: "ETH".to_string(),
                decimals: 18,
            },
            rpc_url: DEFAULT_RPC_URL.to_string(),
            block_explorer_url: "https://sepolia.etherscan.io".to_string(),
        }
    }
}

impl NetworkConfig {
    /// Chain id in the `0x`-prefixed hex form wallets expect.
    pub fn chain_id_hex(&self) -> String {
        format!("0x{:x}", self.chain_id)
    }

    pub fn is_supported(&self, chain_id: u64) -> bool {
        self.chain_id == chain_id
    }

    /// Parameters for a `wallet_addEthereumChain` request.
    pub fn add_chain_params(&self) -> AddChainParams {
        AddChainParams {
            chain_id: self.chain_id_hex(),
            chain_name: self.chain_name.clone(),
            native_currency: self.native_currency.clone(),
            rpc_urls: vec![self.rpc_url.clone()],
            block_explorer_urls: vec![self.block_explorer_url.clone()],
        }
    }
}

/// Wire shape of the add-network request.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TimingConfig {
    /// Upper bound for a single wallet or node request.
    pub request_timeout_secs: u64,
    /// Upper bound for waiting on a transaction receipt.
    pub confirmation_timeout_secs: u64,
    /// Receipt and wallet-state polling interval.
    pub poll_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            confirmation_timeout_secs: 300,
            poll_interval_ms: 2_000,
        }
    }
}

impl TimingConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Rejects zero durations; timers and polling loops need a positive period.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("request_timeout_secs", self.request_timeout_secs),
            ("confirmation_timeout_secs", self.confirmation_timeout_secs),
            ("poll_interval_ms", self.poll_interval_ms),
        ];
        match fields.iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(YidError::config(format!(
                "timing.{} must be greater than 0",
                name
            ))),
            None => Ok(()),
        }
    }
}

/// Root configuration.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct YidConfig {
    /// Raw factory address as supplied; validated on use.
    pub factory_address: Option<String>,
    /// JSON-RPC endpoint of the wallet bridge. Absent means no wallet provider.
    pub wallet_url: Option<String>,
    pub network: NetworkConfig,
    pub timing: TimingConfig,
}

impl YidConfig {
    /// Returns the factory address, or a configuration error when it is
    /// unset, the `0x...` placeholder, malformed, or the zero address.
    pub fn factory_address(&self) -> Result<Address> {
        validate_factory_address(self.factory_address.as_deref())
    }
}

pub fn validate_factory_address(raw: Option<&str>) -> Result<Address> {
    let not_configured = || {
        YidError::config(
            "YID factory contract address not configured. Deploy the contracts and set YID_FACTORY_ADDRESS",
        )
    };

    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(not_configured)?;
    if raw == FACTORY_ADDRESS_PLACEHOLDER {
        return Err(not_configured());
    }
    let address: Address = raw.parse().map_err(|_| not_configured())?;
    if address.is_zero() {
        return Err(not_configured());
    }
    Ok(address)
}
