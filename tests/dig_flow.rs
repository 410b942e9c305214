#![allow(non_snake_case)]

use ethers::types::H256;
use treasure_grid::{
    client::{
        AppController,
        CellId,
        DigBlocked,
        DigFailure,
        DigState,
    },
    provider::{
        DigReceipt,
        WalletError,
    },
    test_helpers::{
        FakeContract,
        FakeWallet,
        test_account,
    },
};

fn cell(id: u8) -> CellId {
    CellId::new(id).unwrap()
}

#[tokio::test]
async fn dig_flow__detect_select_dig_and_acknowledge() {
    // given a wallet authorized in an earlier session
    let wallet = FakeWallet::with_accounts(vec![test_account()]);
    let contract = FakeContract::confirming();
    let mut controller = AppController::new(&wallet, &contract);

    // when the session starts
    controller.detect_existing_account().await;

    // then the account is adopted without prompting
    assert_eq!(controller.account(), Some(test_account()));
    assert_eq!(wallet.request_calls(), 0);

    // when a cell is selected and dug
    controller.select_cell(cell(5));
    controller.dig_for_treasure().await.unwrap();

    // then the dig is confirmed and acknowledged
    let snap = controller.snapshot();
    assert_eq!(snap.state, DigState::Succeeded);
    assert_eq!(snap.status, "Treasure found!");
    assert_eq!(snap.ack.as_deref(), Some("Treasure dug up!"));
    assert_eq!(contract.last_cell(), Some(5));
    assert_eq!(contract.last_from(), Some(test_account()));

    // when the acknowledgement is dismissed
    controller.dismiss_ack();

    // then everything else stays put
    let snap = controller.snapshot();
    assert_eq!(snap.ack, None);
    assert_eq!(snap.status, "Treasure found!");
    assert_eq!(snap.selection, Some(cell(5)));
}

#[tokio::test]
async fn dig_flow__fresh_wallet_connects_interactively_then_digs() {
    // given no prior authorization
    let wallet = FakeWallet::empty();
    let contract = FakeContract::confirming();
    let mut controller = AppController::new(&wallet, &contract);
    controller.detect_existing_account().await;
    assert_eq!(controller.account(), None);

    // when digging before connecting
    controller.select_cell(cell(1));
    let blocked = controller.dig_for_treasure().await;

    // then the dig is blocked locally
    assert_eq!(blocked, Err(DigBlocked::WalletNotConnected));
    assert_eq!(contract.dig_calls(), 0);

    // when the user connects and the wallet authorizes an account
    wallet.set_request_result(Ok(vec![test_account()]));
    controller.request_connection().await.unwrap();

    // then the dig goes through
    controller.dig_for_treasure().await.unwrap();
    assert_eq!(controller.dig_state(), DigState::Succeeded);
    assert_eq!(contract.last_from(), Some(test_account()));
}

#[tokio::test]
async fn dig_flow__cancelled_dig_can_be_retried() {
    // given a connected session whose wallet rejects the first dig
    let wallet = FakeWallet::with_accounts(vec![test_account()]);
    let contract = FakeContract::rejecting(4001, "User denied transaction signature.");
    let mut controller = AppController::new(&wallet, &contract);
    controller.detect_existing_account().await;
    controller.select_cell(cell(7));

    // when the first dig is cancelled in the wallet
    controller.dig_for_treasure().await.unwrap();

    // then the cancellation is reported and the session stays usable
    let snap = controller.snapshot();
    assert_eq!(snap.state, DigState::Failed(DigFailure::UserCancelled));
    assert_eq!(snap.status, "Transaction was cancelled by user.");
    assert!(!snap.busy);
    assert!(snap.can_dig);

    // when the user approves the retry
    contract.set_result(Ok(DigReceipt {
        tx_hash: H256::repeat_byte(0x33),
    }));
    controller.dig_for_treasure().await.unwrap();

    // then the retry is confirmed
    assert_eq!(controller.dig_state(), DigState::Succeeded);
    assert_eq!(contract.dig_calls(), 2);
}

#[tokio::test]
async fn dig_flow__reverted_dig_reports_and_allows_reselection() {
    // given a connected session over a contract that reverts
    let wallet = FakeWallet::with_accounts(vec![test_account()]);
    let contract = FakeContract::failing("execution reverted");
    let mut controller = AppController::new(&wallet, &contract);
    controller.detect_existing_account().await;
    controller.select_cell(cell(9));

    // when the dig reverts
    controller.dig_for_treasure().await.unwrap();

    // then the revert is reported
    let snap = controller.snapshot();
    assert_eq!(snap.state, DigState::Failed(DigFailure::ContractReverted));
    assert_eq!(
        snap.status,
        "Transaction was reverted. Check smart contract or gas limits."
    );

    // when another cell is picked afterwards
    controller.select_cell(cell(2));

    // then the selection moves while the last outcome stands
    let snap = controller.snapshot();
    assert_eq!(snap.selection, Some(cell(2)));
    assert_eq!(snap.state, DigState::Failed(DigFailure::ContractReverted));
    assert!(snap.can_dig);
}

#[tokio::test]
async fn dig_flow__missing_wallet_provider_does_not_break_startup() {
    // given no wallet endpoint listening
    let wallet = FakeWallet::unavailable();
    let contract = FakeContract::confirming();
    let mut controller = AppController::new(&wallet, &contract);

    // when the session starts
    controller.detect_existing_account().await;

    // then the session is usable without an account
    let snap = controller.snapshot();
    assert_eq!(snap.account, None);
    assert_eq!(snap.status, "Ready");
    assert!(snap.errors.is_empty());

    // when the user tries to connect anyway
    let outcome = controller.request_connection().await;

    // then the failure surfaces instead of being swallowed
    assert!(matches!(outcome, Err(WalletError::Unavailable)));
    assert_eq!(controller.account(), None);
}
