use anyhow::{Context, Result};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use yid_core::address::Address;

use super::print_json;
use crate::app::App;

pub async fn connect(app: &App) -> Result<()> {
    app.controller.connect_wallet().await?;
    print_json(&app.controller.session())
}

pub async fn switch_network(app: &App) -> Result<()> {
    app.controller.connect_wallet().await?;
    app.controller.switch_to_sepolia().await?;
    print_json(&app.controller.session())
}

pub async fn register(app: &App, name: &str, email: &str) -> Result<()> {
    app.controller.connect_wallet().await?;
    let contract = app.controller.deploy_user_contract(name, email).await?;
    print_json(&json!({
        "contract": contract,
        "session": app.controller.session(),
    }))
}

pub async fn update(app: &App, name: &str, email: &str) -> Result<()> {
    let contract = registered_contract(app).await?;
    let receipt = app
        .controller
        .update_user_info(&contract, name, email)
        .await?;
    let info = app.controller.refresh_user_info().await?;
    print_json(&json!({ "receipt": receipt, "user": info }))
}

pub async fn deactivate(app: &App) -> Result<()> {
    let contract = registered_contract(app).await?;
    let receipt = app.controller.deactivate_user(&contract).await?;
    let info = app.controller.refresh_user_info().await?;
    print_json(&json!({ "receipt": receipt, "user": info }))
}

pub async fn refresh(app: &App) -> Result<()> {
    app.controller.connect_wallet().await?;
    let info = app.controller.refresh_user_info().await?;
    print_json(&info)
}

/// Prints the session on every change until Ctrl-C.
pub async fn watch(app: &App) -> Result<()> {
    let wallet = app
        .wallet
        .as_ref()
        .context("Watching requires a wallet bridge (--wallet-url or YID_WALLET_URL)")?;
    let controller = &app.controller;
    controller.connect_wallet().await?;

    let cancel = CancellationToken::new();
    let events = controller.spawn_event_loop(cancel.clone())?;
    let poller = wallet.spawn_watcher(controller.config().timing.poll_interval(), cancel.clone());

    let mut rx = controller.store().subscribe();
    let initial = rx.borrow_and_update().clone();
    print_json(&initial)?;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let session = rx.borrow_and_update().clone();
                print_json(&session)?;
            }
        }
    }

    tracing::info!("Stopping watch");
    cancel.cancel();
    let (events, poller) = tokio::join!(events, poller);
    events?;
    poller?;
    Ok(())
}

async fn registered_contract(app: &App) -> Result<Address> {
    app.controller.connect_wallet().await?;
    app.controller
        .session()
        .user_contract_address()
        .context("No user contract registered for this account. Run `yid register` first")
}
