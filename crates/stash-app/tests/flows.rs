//! Modal flow scenarios across the public API

use assert_matches::assert_matches;
use stash_app::flows::deposit::{DepositPayload, DepositView};
use stash_app::flows::withdraw::WithdrawRail;
use stash_app::flows::{
    DepositModal, FlowKind, FlowSet, FlowState, Navigation, SendModal, WalletConnection,
    WalletConnectionStatus, WithdrawModal,
};

#[test]
fn all_registries_validate() {
    let flows = FlowSet::new().unwrap();
    assert!(!flows.any_open());
    for kind in FlowKind::ALL {
        assert_eq!(kind.to_string().parse::<FlowKind>().unwrap(), kind);
    }
    assert_eq!("card-deposit".parse::<FlowKind>().unwrap(), FlowKind::CardDeposit);
}

#[test]
fn deposit_bank_transfer_back_chain() {
    let flows = FlowSet::new().unwrap();
    let deposit = &flows.deposit;
    let ctx = WalletConnection::default();

    let opened = deposit.handle_open_change(true, &ctx);
    assert_matches!(opened, Navigation::Moved(t) if t.current == DepositModal::OpenOptions);
    assert!(!deposit.show_back_button());

    for state in [
        DepositModal::OpenBuyCryptoOptions,
        DepositModal::OpenBankTransferAmount,
        DepositModal::OpenBankTransferKyc,
    ] {
        let t = deposit.navigate(state);
        assert!(t.is_forward());
        assert!(t.should_animate());
    }
    assert_eq!(deposit.view(), DepositView::BankTransferKyc);
    assert_eq!(deposit.title(), "Verify your identity");

    let mut visited = Vec::new();
    while deposit.is_open() {
        match deposit.handle_back_press(&ctx) {
            Navigation::Moved(t) => {
                assert!(!t.is_forward());
                visited.push(t.current);
            }
            Navigation::Closed => break,
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(
        visited,
        vec![
            DepositModal::OpenBankTransferAmount,
            DepositModal::OpenBuyCryptoOptions,
            DepositModal::OpenOptions,
        ]
    );
    assert_eq!(deposit.current(), DepositModal::Close);
    assert_eq!(deposit.payload(), DepositPayload::default());
}

#[test]
fn deposit_close_waits_for_wallet_popup() {
    let flows = FlowSet::new().unwrap();
    let deposit = &flows.deposit;
    deposit.handle_open_change(true, &WalletConnection::default());
    deposit.choose_network("base");

    let connecting = WalletConnection::new(WalletConnectionStatus::Connecting);
    assert_matches!(
        deposit.handle_open_change(false, &connecting),
        Navigation::Blocked { .. }
    );
    assert_eq!(deposit.current(), DepositModal::OpenForm);
    assert_eq!(deposit.payload().source_network.as_deref(), Some("base"));

    let connected = WalletConnection::new(WalletConnectionStatus::Connected);
    assert_eq!(deposit.handle_open_change(false, &connected), Navigation::Closed);
    assert!(deposit.payload().source_network.is_none());
}

#[test]
fn send_close_with_input_asks_to_discard() {
    let flows = FlowSet::new().unwrap();
    let send = &flows.send;

    send.handle_open_change(true, &());
    assert_eq!(send.current(), SendModal::OpenSendSearch);
    send.select_recipient("0xabc", "alice");
    send.set_amount("12.5");

    assert_matches!(
        send.handle_open_change(false, &()),
        Navigation::Redirected(t) if t.current == SendModal::OpenDiscardConfirm
    );

    // Back from the confirmation returns to wherever it was raised from.
    assert_matches!(
        send.handle_back_press(&()),
        Navigation::Moved(t) if t.current == SendModal::OpenForm
    );
    assert_eq!(send.payload().amount, "12.5");

    send.handle_open_change(false, &());
    assert_eq!(send.confirm_discard(), Navigation::Closed);
    assert!(!send.payload().has_unsaved_send_data());
}

#[test]
fn send_closes_directly_without_input() {
    let flows = FlowSet::new().unwrap();
    flows.send.handle_open_change(true, &());
    assert_eq!(flows.send.handle_open_change(false, &()), Navigation::Closed);
    assert_eq!(flows.send.handle_back_press(&()), Navigation::Unchanged);
}

#[test]
fn withdraw_bank_rail_routes_through_account_picker() {
    let flows = FlowSet::new().unwrap();
    let withdraw = &flows.withdraw;
    withdraw.handle_open_change(true, &());
    withdraw.choose_rail(WithdrawRail::Bank);
    withdraw.set_amount("40");

    assert_eq!(withdraw.next_from_form(), WithdrawModal::OpenBankAccount);
    withdraw.select_bank_account("acct_1");
    assert_eq!(withdraw.current(), WithdrawModal::OpenReview);
    assert_eq!(withdraw.back_target(), WithdrawModal::OpenForm);

    withdraw.submitted("0xhash");
    assert_eq!(withdraw.back_target(), WithdrawModal::Close);
    assert_eq!(withdraw.handle_back_press(&()), Navigation::Closed);
}

#[test]
fn close_all_resets_every_flow() {
    let flows = FlowSet::new().unwrap();
    flows.deposit.handle_open_change(true, &WalletConnection::default());
    flows.send.handle_open_change(true, &());
    flows.send.set_search_query("bob");
    assert!(flows.any_open());

    flows.close_all();
    assert!(!flows.any_open());
    assert!(flows.send.payload().search_query.is_empty());
    assert!(flows.card_deposit.current().is_closed());
}

#[tokio::test]
async fn subscribers_see_transitions() {
    let flows = FlowSet::new().unwrap();
    let mut rx = flows.deposit.store().subscribe();

    flows.deposit.navigate(DepositModal::OpenPublicAddress);
    rx.changed().await.unwrap();
    let t = *rx.borrow_and_update();
    assert_eq!(t.current, DepositModal::OpenPublicAddress);
    assert_eq!(t.previous, DepositModal::Close);
    assert!(!t.should_animate());
}
