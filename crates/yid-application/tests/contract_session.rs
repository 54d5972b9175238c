mod support;

use std::sync::Arc;
use std::time::Duration;

use support::*;
use tokio_util::sync::CancellationToken;
use yid_application::ContractSessionController;
use yid_core::config::{SEPOLIA_CHAIN_ID, YidConfig};
use yid_core::error::{USER_REJECTED_CODE, YidError};
use yid_core::session::{Session, SessionStore};
use yid_core::wallet::WalletEvent;

const MAINNET: u64 = 1;

fn config() -> YidConfig {
    YidConfig {
        factory_address: Some(FACTORY.to_string()),
        ..YidConfig::default()
    }
}

fn controller(
    wallet: Option<Arc<FakeWallet>>,
    contracts: Arc<FakeContracts>,
    config: YidConfig,
) -> Arc<ContractSessionController> {
    let wallet = wallet.map(|w| w as Arc<dyn yid_core::wallet::WalletProvider>);
    Arc::new(ContractSessionController::new(
        Arc::new(SessionStore::new()),
        wallet,
        contracts,
        config,
    ))
}

fn gated_controller(
    wallet: Arc<FakeWallet>,
    contracts: Arc<GatedContracts>,
) -> Arc<ContractSessionController> {
    Arc::new(ContractSessionController::new(
        Arc::new(SessionStore::new()),
        Some(wallet),
        contracts,
        config(),
    ))
}

async fn wait_for(
    controller: &ContractSessionController,
    predicate: impl FnMut(&Session) -> bool,
) -> Session {
    let mut rx = controller.store().subscribe();
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate))
        .await
        .expect("session did not reach expected state")
        .expect("store dropped")
        .clone()
}

#[tokio::test]
async fn connect_with_no_accounts_stays_disconnected() {
    let wallet = Arc::new(FakeWallet::on_sepolia(Vec::new()));
    let contracts = Arc::new(FakeContracts::new());
    let controller = controller(Some(wallet), contracts.clone(), config());

    let connected = controller.connect_wallet().await.unwrap();

    assert_eq!(connected, None);
    let session = controller.session();
    assert!(!session.is_connected);
    assert_eq!(session.wallet_address, None);
    assert!(!session.is_loading);
    assert_eq!(contracts.call_count(), 0);
}

#[tokio::test]
async fn connect_without_provider_records_error() {
    let controller = controller(None, Arc::new(FakeContracts::new()), config());

    let err = controller.connect_wallet().await.unwrap_err();

    assert!(matches!(err, YidError::ProviderUnavailable(_)));
    let session = controller.session();
    assert!(!session.is_connected);
    assert!(session.error.unwrap().contains("No wallet provider"));
}

#[tokio::test]
async fn connect_loads_existing_registration() {
    let wallet = Arc::new(FakeWallet::on_sepolia(vec![ALICE]));
    let contracts = Arc::new(FakeContracts::with_registration(
        ALICE,
        ALICE_CONTRACT,
        profile("A", "a@x.com"),
    ));
    let controller = controller(Some(wallet), contracts, config());

    let connected = controller.connect_wallet().await.unwrap();

    assert_eq!(connected, Some(ALICE));
    let session = controller.session();
    assert!(session.is_connected);
    assert!(session.is_correct_network);
    assert!(session.is_registered());
    assert_eq!(session.error, None);
    assert!(!session.is_loading);
    assert_eq!(controller.signer().await.unwrap().address, ALICE);
}

#[tokio::test]
async fn connect_on_wrong_network_skips_registration_lookup() {
    let wallet = Arc::new(FakeWallet::new(vec![ALICE], MAINNET));
    let contracts = Arc::new(FakeContracts::with_registration(
        ALICE,
        ALICE_CONTRACT,
        profile("A", "a@x.com"),
    ));
    let controller = controller(Some(wallet), contracts.clone(), config());

    controller.connect_wallet().await.unwrap();

    let session = controller.session();
    assert!(session.is_connected);
    assert!(!session.is_correct_network);
    assert_eq!(
        session.error.as_deref(),
        Some("Please switch to Sepolia testnet (Chain ID: 11155111)")
    );
    assert!(session.user.is_none());
    assert_eq!(contracts.call_count(), 0);
}

#[tokio::test]
async fn unregistered_owner_leaves_profile_empty() {
    let wallet = Arc::new(FakeWallet::on_sepolia(vec![ALICE]));
    let contracts = Arc::new(FakeContracts::new());
    let controller = controller(Some(wallet), contracts.clone(), config());
    controller.connect_wallet().await.unwrap();

    assert!(!controller.check_user_registration(&ALICE).await);

    let session = controller.session();
    assert!(session.user.is_none());
    assert!(session.user_contract.is_none());
    assert_eq!(session.error, None);
    assert_eq!(contracts.calls(), vec!["get_user_contract", "get_user_contract"]);
}

#[tokio::test]
async fn registration_populates_user_and_contract_together() {
    let wallet = Arc::new(FakeWallet::on_sepolia(vec![ALICE]));
    let contracts = Arc::new(FakeContracts::new());
    let controller = controller(Some(wallet), contracts.clone(), config());
    controller.connect_wallet().await.unwrap();

    contracts
        .registry
        .lock()
        .unwrap()
        .insert(ALICE, ALICE_CONTRACT);
    contracts
        .profiles
        .lock()
        .unwrap()
        .insert(ALICE_CONTRACT, profile("A", "a@x.com"));

    assert!(controller.check_user_registration(&ALICE).await);

    let session = controller.session();
    let user = session.user.unwrap();
    let user_contract = session.user_contract.unwrap();
    assert_eq!(user.name, "A");
    assert_eq!(user.email, "a@x.com");
    assert!(user.is_active);
    assert_eq!(user.created_at, 1000);
    assert_eq!(user.contract_address, Some(ALICE_CONTRACT));
    assert_eq!(user_contract.address, ALICE_CONTRACT);
    assert_eq!(user_contract.name, "A");
    assert_eq!(user_contract.created_at, 1000);
}

#[tokio::test]
async fn lookup_failure_is_recorded_not_raised() {
    let wallet = Arc::new(FakeWallet::on_sepolia(vec![ALICE]));
    let contracts = Arc::new(FakeContracts::new());
    // registered, but the profile read fails
    contracts
        .registry
        .lock()
        .unwrap()
        .insert(ALICE, ALICE_CONTRACT);
    let controller = controller(Some(wallet), contracts, config());

    controller.connect_wallet().await.unwrap();

    let session = controller.session();
    assert!(session.is_connected);
    assert!(session.user.is_none());
    assert_eq!(
        session.error.as_deref(),
        Some("Failed to check user registration")
    );
}

#[tokio::test]
async fn deploy_on_wrong_network_makes_no_external_call() {
    let wallet = Arc::new(FakeWallet::new(vec![ALICE], MAINNET));
    let contracts = Arc::new(FakeContracts::new());
    let controller = controller(Some(wallet), contracts.clone(), config());
    controller.connect_wallet().await.unwrap();

    let err = controller
        .deploy_user_contract("A", "a@x.com")
        .await
        .unwrap_err();

    assert!(err.is_wrong_network());
    assert_eq!(contracts.call_count(), 0);
    assert!(controller.session().user.is_none());
}

#[tokio::test]
async fn deploy_without_factory_fails_before_sending() {
    let wallet = Arc::new(FakeWallet::on_sepolia(vec![ALICE]));
    let contracts = Arc::new(FakeContracts::new());
    let unconfigured = YidConfig {
        factory_address: Some("0x...".to_string()),
        ..YidConfig::default()
    };
    let controller = controller(Some(wallet), contracts.clone(), unconfigured);
    controller.connect_wallet().await.unwrap();
    let calls_after_connect = contracts.call_count();

    let err = controller
        .deploy_user_contract("A", "a@x.com")
        .await
        .unwrap_err();

    assert!(err.is_config());
    assert_eq!(contracts.call_count(), calls_after_connect);
    assert!(
        controller
            .session()
            .error
            .unwrap()
            .contains("factory contract address not configured")
    );
}

#[tokio::test]
async fn deploy_rejects_blank_fields() {
    let wallet = Arc::new(FakeWallet::on_sepolia(vec![ALICE]));
    let contracts = Arc::new(FakeContracts::new());
    let controller = controller(Some(wallet), contracts.clone(), config());
    controller.connect_wallet().await.unwrap();

    let err = controller.deploy_user_contract("A", "  ").await.unwrap_err();

    assert!(matches!(err, YidError::InvalidInput(_)));
    assert!(!contracts.calls().contains(&"deploy_user_contract"));
}

#[tokio::test]
async fn deploy_registers_and_loads_profile() {
    let wallet = Arc::new(FakeWallet::on_sepolia(vec![ALICE]));
    let contracts = Arc::new(FakeContracts::new());
    let controller = controller(Some(wallet), contracts.clone(), config());
    controller.connect_wallet().await.unwrap();

    let address = controller
        .deploy_user_contract("Alice", "alice@example.com")
        .await
        .unwrap();

    assert_eq!(address, DEPLOYED_CONTRACT);
    let session = controller.session();
    assert!(session.is_registered());
    assert_eq!(session.user_contract_address(), Some(DEPLOYED_CONTRACT));
    assert_eq!(session.user.unwrap().name, "Alice");
    assert!(!session.is_loading);
    assert_eq!(session.error, None);
    assert_eq!(
        &contracts.calls()[1..],
        &[
            "deploy_user_contract",
            "wait_for_confirmation",
            "get_user_contract",
            "get_user_info"
        ]
    );
}

#[tokio::test]
async fn rejected_deploy_surfaces_wallet_message() {
    let wallet = Arc::new(FakeWallet::on_sepolia(vec![ALICE]));
    let contracts = Arc::new(FakeContracts::new());
    *contracts.send_error.lock().unwrap() =
        Some(YidError::rpc(USER_REJECTED_CODE, "User denied transaction"));
    let controller = controller(Some(wallet), contracts, config());
    controller.connect_wallet().await.unwrap();

    let err = controller
        .deploy_user_contract("A", "a@x.com")
        .await
        .unwrap_err();

    assert!(err.is_rejected());
    let session = controller.session();
    assert_eq!(session.error.as_deref(), Some("Request rejected in wallet"));
    assert!(!session.is_loading);
    assert!(session.user.is_none());
}

#[tokio::test]
async fn reverted_deploy_leaves_session_unregistered() {
    let wallet = Arc::new(FakeWallet::on_sepolia(vec![ALICE]));
    let contracts = Arc::new(FakeContracts::new());
    *contracts.revert.lock().unwrap() = true;
    let controller = controller(Some(wallet), contracts, config());
    controller.connect_wallet().await.unwrap();

    let err = controller
        .deploy_user_contract("A", "a@x.com")
        .await
        .unwrap_err();

    assert!(matches!(err, YidError::Reverted { .. }));
    assert!(!controller.session().is_registered());
}

#[tokio::test]
async fn unknown_chain_is_added_exactly_once() {
    let wallet = Arc::new(FakeWallet::new(vec![ALICE], MAINNET));
    *wallet.switch_error.lock().unwrap() = Some(YidError::rpc(4902, "Unrecognized chain ID"));
    *wallet.add_error.lock().unwrap() = Some(YidError::rpc(-32603, "internal error"));
    let controller = controller(Some(wallet.clone()), Arc::new(FakeContracts::new()), config());
    controller.connect_wallet().await.unwrap();

    let err = controller.switch_to_sepolia().await.unwrap_err();

    assert!(matches!(err, YidError::Rpc { code: -32603, .. }));
    assert_eq!(wallet.add_call_count(), 1);
    assert_eq!(wallet.add_calls.lock().unwrap()[0].chain_id, "0xaa36a7");
    let session = controller.session();
    assert!(!session.is_correct_network);
    assert_eq!(session.error.as_deref(), Some("Failed to add Sepolia network"));
}

#[tokio::test]
async fn adding_unknown_chain_then_rechecks_network() {
    let wallet = Arc::new(FakeWallet::new(vec![ALICE], MAINNET));
    *wallet.switch_error.lock().unwrap() = Some(YidError::rpc(4902, "Unrecognized chain ID"));
    let contracts = Arc::new(FakeContracts::with_registration(
        ALICE,
        ALICE_CONTRACT,
        profile("A", "a@x.com"),
    ));
    let controller = controller(Some(wallet.clone()), contracts, config());
    controller.connect_wallet().await.unwrap();

    controller.switch_to_sepolia().await.unwrap();

    let session = controller.session();
    assert!(session.is_correct_network);
    assert_eq!(session.error, None);
    assert!(session.is_registered());
    assert_eq!(wallet.add_call_count(), 1);
}

#[tokio::test]
async fn other_switch_failures_do_not_add_chain() {
    let wallet = Arc::new(FakeWallet::new(vec![ALICE], MAINNET));
    *wallet.switch_error.lock().unwrap() = Some(YidError::rpc(-32002, "Request pending"));
    let controller = controller(Some(wallet.clone()), Arc::new(FakeContracts::new()), config());
    controller.connect_wallet().await.unwrap();

    controller.switch_to_sepolia().await.unwrap_err();

    assert_eq!(wallet.add_call_count(), 0);
    assert_eq!(*wallet.switch_calls.lock().unwrap(), vec![SEPOLIA_CHAIN_ID]);
    assert_eq!(
        controller.session().error.as_deref(),
        Some("Failed to switch to Sepolia network")
    );
}

#[tokio::test]
async fn update_and_deactivate_leave_session_until_refresh() {
    let wallet = Arc::new(FakeWallet::on_sepolia(vec![ALICE]));
    let contracts = Arc::new(FakeContracts::with_registration(
        ALICE,
        ALICE_CONTRACT,
        profile("A", "a@x.com"),
    ));
    let controller = controller(Some(wallet), contracts, config());
    controller.connect_wallet().await.unwrap();
    let before = controller.session();

    controller
        .update_user_info(&ALICE_CONTRACT, "B", "b@x.com")
        .await
        .unwrap();
    let receipt = controller.deactivate_user(&ALICE_CONTRACT).await.unwrap();
    assert!(receipt.success);
    assert_eq!(controller.session(), before);

    let info = controller.refresh_user_info().await.unwrap();
    assert_eq!(info.name, "B");
    assert!(!info.is_active);
    let session = controller.session();
    assert!(!session.user.unwrap().is_active);
    assert_eq!(session.user_contract.unwrap().email, "b@x.com");
}

#[tokio::test]
async fn refresh_without_contract_is_not_found() {
    let wallet = Arc::new(FakeWallet::on_sepolia(vec![ALICE]));
    let controller = controller(Some(wallet), Arc::new(FakeContracts::new()), config());
    controller.connect_wallet().await.unwrap();

    let err = controller.refresh_user_info().await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn disconnect_resets_session() {
    let wallet = Arc::new(FakeWallet::on_sepolia(vec![ALICE]));
    let contracts = Arc::new(FakeContracts::with_registration(
        ALICE,
        ALICE_CONTRACT,
        profile("A", "a@x.com"),
    ));
    let controller = controller(Some(wallet), contracts, config());
    controller.connect_wallet().await.unwrap();

    controller.disconnect().await;

    assert_eq!(controller.session(), Session::default());
    assert!(controller.signer().await.is_none());
}

#[tokio::test]
async fn chain_change_to_sepolia_loads_registration() {
    let wallet = Arc::new(FakeWallet::new(vec![ALICE], MAINNET));
    let contracts = Arc::new(FakeContracts::with_registration(
        ALICE,
        ALICE_CONTRACT,
        profile("A", "a@x.com"),
    ));
    let controller = controller(Some(wallet.clone()), contracts, config());
    controller.connect_wallet().await.unwrap();
    let cancel = CancellationToken::new();
    let handle = controller.spawn_event_loop(cancel.clone()).unwrap();

    wallet.emit(WalletEvent::ChainChanged {
        chain_id: SEPOLIA_CHAIN_ID,
    });
    let session = wait_for(&controller, |s| s.user.is_some()).await;
    assert!(session.is_correct_network);
    assert_eq!(session.error, None);

    wallet.emit(WalletEvent::ChainChanged { chain_id: MAINNET });
    let session = wait_for(&controller, |s| !s.is_correct_network).await;
    assert!(session.error.is_some());

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn account_change_drops_previous_profile() {
    let wallet = Arc::new(FakeWallet::on_sepolia(vec![ALICE, BOB]));
    let contracts = Arc::new(FakeContracts::with_registration(
        ALICE,
        ALICE_CONTRACT,
        profile("A", "a@x.com"),
    ));
    let controller = controller(Some(wallet.clone()), contracts, config());
    controller.connect_wallet().await.unwrap();
    assert!(controller.session().is_registered());
    let cancel = CancellationToken::new();
    let handle = controller.spawn_event_loop(cancel.clone()).unwrap();

    wallet.emit(WalletEvent::AccountsChanged {
        accounts: vec![BOB],
    });
    let session = wait_for(&controller, |s| s.wallet_address == Some(BOB)).await;
    assert!(session.user.is_none());
    assert!(session.user_contract.is_none());
    tokio::time::timeout(Duration::from_secs(2), async {
        while controller.signer().await.map(|s| s.address) != Some(BOB) {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("signer was not refreshed");

    wallet.emit(WalletEvent::AccountsChanged {
        accounts: Vec::new(),
    });
    let session = wait_for(&controller, |s| !s.is_connected).await;
    assert_eq!(session, Session::default());

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn event_loop_requires_provider() {
    let controller = controller(None, Arc::new(FakeContracts::new()), config());
    let err = controller
        .spawn_event_loop(CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, YidError::ProviderUnavailable(_)));
}

#[tokio::test]
async fn disconnect_during_profile_read_keeps_session_empty() {
    let wallet = Arc::new(FakeWallet::on_sepolia(vec![ALICE]));
    let contracts = Arc::new(GatedContracts::new(FakeContracts::with_registration(
        ALICE,
        ALICE_CONTRACT,
        profile("A", "a@x.com"),
    )));
    contracts.arm();
    let controller = gated_controller(wallet, contracts.clone());

    let connecting = tokio::spawn({
        let controller = controller.clone();
        async move { controller.connect_wallet().await }
    });
    contracts.entered.notified().await;
    controller.disconnect().await;
    contracts.release.notify_one();

    assert_eq!(connecting.await.unwrap().unwrap(), Some(ALICE));
    assert_eq!(controller.session(), Session::default());
}

#[tokio::test]
async fn account_switch_during_deploy_discards_profile() {
    let wallet = Arc::new(FakeWallet::on_sepolia(vec![ALICE, BOB]));
    let contracts = Arc::new(GatedContracts::new(FakeContracts::new()));
    let controller = gated_controller(wallet, contracts.clone());
    controller.connect_wallet().await.unwrap();
    contracts.arm();

    let deploying = tokio::spawn({
        let controller = controller.clone();
        async move { controller.deploy_user_contract("A", "a@x.com").await }
    });
    contracts.entered.notified().await;
    controller
        .handle_wallet_event(WalletEvent::AccountsChanged {
            accounts: vec![BOB],
        })
        .await;
    contracts.release.notify_one();

    assert_eq!(deploying.await.unwrap().unwrap(), DEPLOYED_CONTRACT);
    let session = controller.session();
    assert_eq!(session.wallet_address, Some(BOB));
    assert!(session.user.is_none());
    assert!(session.user_contract.is_none());
}
