//! Session domain model.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::contract::UserInfo;

/// Profile of a registered user, as shown by front ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: String,
    pub email: String,
    pub is_active: bool,
    /// Unix timestamp (seconds) of the user contract's creation
    pub created_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<Address>,
}

/// The same profile keyed by its user contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContract {
    pub address: Address,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: u64,
}

impl UserContract {
    /// Builds both records from a single profile read so they cannot diverge.
    pub fn with_user(address: Address, info: &UserInfo) -> (User, UserContract) {
        let user = User {
            name: info.name.clone(),
            email: info.email.clone(),
            is_active: info.is_active,
            created_at: info.created_at,
            contract_address: Some(address),
        };
        let contract = UserContract {
            address,
            name: info.name.clone(),
            email: info.email.clone(),
            is_active: info.is_active,
            created_at: info.created_at,
        };
        (user, contract)
    }
}

/// Connection and registration state of the current application session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub wallet_address: Option<Address>,
    pub is_connected: bool,
    pub is_correct_network: bool,
    pub user: Option<User>,
    pub user_contract: Option<UserContract>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self) -> bool {
        self.user.is_some()
    }

    /// Address of the user contract, from whichever record carries it.
    pub fn user_contract_address(&self) -> Option<Address> {
        self.user_contract
            .as_ref()
            .map(|c| c.address)
            .or_else(|| self.user.as_ref().and_then(|u| u.contract_address))
    }
}
