use anyhow::Result;
use serde::Serialize;
use yid_core::config::YidConfig;

use super::print_json;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Status<'a> {
    chain_id: u64,
    chain_id_hex: String,
    chain_name: &'a str,
    rpc_url: &'a str,
    block_explorer_url: &'a str,
    wallet_url: Option<&'a str>,
    factory_address: Option<String>,
    factory_error: Option<String>,
}

pub fn show(config: &YidConfig) -> Result<()> {
    let network = &config.network;
    let (factory_address, factory_error) = match config.factory_address() {
        Ok(address) => (Some(address.to_string()), None),
        Err(e) => (None, Some(e.to_string())),
    };

    print_json(&Status {
        chain_id: network.chain_id,
        chain_id_hex: network.chain_id_hex(),
        chain_name: &network.chain_name,
        rpc_url: &network.rpc_url,
        block_explorer_url: &network.block_explorer_url,
        wallet_url: config.wallet_url.as_deref(),
        factory_address,
        factory_error,
    })
}
