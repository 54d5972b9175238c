//! Error types for the YID session core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON-RPC error code a wallet returns when the requested chain has not been added.
pub const CHAIN_NOT_ADDED_CODE: i64 = 4902;

/// JSON-RPC error code a wallet returns when the user declines a request.
pub const USER_REJECTED_CODE: i64 = 4001;

/// A shared error type for the entire YID workspace.
///
/// Variants follow the failure classes the session controller has to tell
/// apart: provider and network problems on one side, contract-call problems
/// on the other.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum YidError {
    /// No wallet provider is available to the process
    #[error("Wallet provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The wallet is on a chain other than the supported one
    #[error("Wrong network: expected chain {expected}, connected to {actual:?}")]
    WrongNetwork { expected: u64, actual: Option<u64> },

    /// No account or signer is connected
    #[error("Not connected: {0}")]
    NotConnected(String),

    /// Configuration error (missing or placeholder values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A wallet or node answered a request with a JSON-RPC error object
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// A transaction was mined but reverted
    #[error("Transaction reverted: {tx_hash}")]
    Reverted { tx_hash: String },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound { entity_type: String, id: String },

    /// Input rejected before any external call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transport failure talking to the wallet or node
    #[error("Transport error: {0}")]
    Transport(String),

    /// An external call did not answer in time
    #[error("Timed out after {seconds}s waiting for {operation}")]
    Timeout { operation: String, seconds: u64 },

    /// ABI encoding or decoding failure
    #[error("ABI error: {0}")]
    Abi(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl YidError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Creates a ProviderUnavailable error
    pub fn provider_unavailable(message: impl Into<String>) -> Self {
        Self::ProviderUnavailable(message.into())
    }

    /// Creates a NotConnected error
    pub fn not_connected(message: impl Into<String>) -> Self {
        Self::NotConnected(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Rpc error
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
        }
    }

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates an Abi error
    pub fn abi(message: impl Into<String>) -> Self {
        Self::Abi(message.into())
    }

    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is a wrong-network error
    pub fn is_wrong_network(&self) -> bool {
        matches!(self, Self::WrongNetwork { .. })
    }

    /// Check if the wallet reported that the requested chain is unknown to it.
    pub fn is_chain_not_added(&self) -> bool {
        matches!(self, Self::Rpc { code, .. } if *code == CHAIN_NOT_ADDED_CODE)
    }

    /// Check if the user declined a wallet prompt or the transaction reverted.
    pub fn is_rejected(&self) -> bool {
        match self {
            Self::Rpc { code, .. } => *code == USER_REJECTED_CODE,
            Self::Reverted { .. } => true,
            _ => false,
        }
    }

    /// Errors about reaching the wallet or being on the right account/chain.
    ///
    /// Returns true for:
    /// - `ProviderUnavailable`
    /// - `WrongNetwork`
    /// - `NotConnected`
    /// - `Transport` and `Timeout`
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_)
                | Self::WrongNetwork { .. }
                | Self::NotConnected(_)
                | Self::Transport(_)
                | Self::Timeout { .. }
        )
    }

    /// Errors raised by the contract surface itself: missing configuration,
    /// declined or reverted calls, undecodable answers, unknown records.
    pub fn is_contract_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::Rpc { .. }
                | Self::Reverted { .. }
                | Self::NotFound { .. }
                | Self::Abi(_)
        )
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for YidError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for YidError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for YidError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for YidError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<hex::FromHexError> for YidError {
    fn from(err: hex::FromHexError) -> Self {
        Self::InvalidInput(format!("invalid hex: {}", err))
    }
}

/// Conversion from anyhow::Error (binaries still speak anyhow at the top level)
impl From<anyhow::Error> for YidError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, YidError>`.
pub type Result<T> = std::result::Result<T, YidError>;
