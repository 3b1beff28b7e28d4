mod common;

use alloy::sol_types::{SolCall, SolEvent};
use alloy_primitives::{Address, TxHash, U256};
use common::*;
use std::collections::HashMap;
use std::time::Duration;
use wallet_store::config::SEPOLIA_CHAIN_ID;
use wallet_store::events::{Approval, Transfer, mintCall, transferCall};
use wallet_store::store::{
    ApproveFieldsUpdate, EventStatus, TokenEvent, TransactionState, TransferFieldsUpdate, TxKind,
};

const ONE_DAI: u128 = 1_000_000_000_000_000_000;

fn funded_chain() -> MockChain {
    let mut token_balances = HashMap::new();
    token_balances.insert((token("DAI"), OWNER), U256::from(ONE_DAI));
    token_balances.insert((token("USDC"), OWNER), U256::from(2_500_000u64));
    MockChain {
        chain_id: SEPOLIA_CHAIN_ID,
        token_balances,
        ..Default::default()
    }
}

#[tokio::test]
async fn fetch_balances_without_address_resets_every_token() {
    let (store, _) = store_with(funded_chain());
    assert!(store.snapshot().balances.tokens.values().all(|b| b.loading));

    store.fetch_token_balances(None).await;

    let balances = store.snapshot().balances;
    assert_eq!(balances.tokens.len(), 2);
    for balance in balances.tokens.values() {
        assert_eq!(balance.balance, None);
        assert_eq!(balance.optimistic_balance, None);
        assert!(!balance.loading);
        assert_eq!(balance.error, None);
    }
}

#[tokio::test]
async fn fetched_balances_are_formatted_and_mirrored() {
    let (store, _) = store_with(funded_chain());

    store.fetch_token_balances(Some(OWNER)).await;

    let balances = store.snapshot().balances;
    let dai = &balances.tokens["DAI"];
    assert_eq!(dai.balance.as_deref(), Some("1"));
    assert_eq!(dai.optimistic_balance, dai.balance);
    assert!(!dai.loading);

    let usdc = &balances.tokens["USDC"];
    assert_eq!(usdc.balance.as_deref(), Some("2.5"));
    assert_eq!(usdc.optimistic_balance, usdc.balance);
    assert_eq!(store.snapshot().error.message, None);
}

#[tokio::test]
async fn one_failing_token_fails_the_whole_fetch() {
    let mut chain = funded_chain();
    chain.failing_tokens.insert(token("USDC"));
    let (store, _) = store_with(chain);

    store.fetch_token_balances(Some(OWNER)).await;

    let state = store.snapshot();
    for balance in state.balances.tokens.values() {
        assert_eq!(balance.error.as_deref(), Some("Failed"));
        assert!(!balance.loading);
    }
    assert_eq!(
        state.error.message.as_deref(),
        Some("Failed to fetch token balances: execution reverted")
    );
    assert!(state.error.is_modal_open);
}

#[tokio::test]
async fn stale_balance_response_is_discarded() {
    let mut chain = funded_chain();
    chain
        .token_balances
        .insert((token("DAI"), OTHER), U256::from(3 * ONE_DAI));
    chain
        .balance_delays
        .insert(OWNER, Duration::from_millis(200));
    let (store, _) = store_with(chain);

    tokio::join!(store.fetch_token_balances(Some(OWNER)), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.fetch_token_balances(Some(OTHER)).await;
    });

    let balances = store.snapshot().balances;
    assert_eq!(balances.tokens["DAI"].balance.as_deref(), Some("3"));
    assert_eq!(balances.tokens["USDC"].balance.as_deref(), Some("0"));
}

#[tokio::test]
async fn stale_profile_response_is_discarded() {
    let mut chain = funded_chain();
    chain
        .balance_delays
        .insert(OWNER, Duration::from_millis(200));
    let (store, _) = store_with(chain);

    tokio::join!(store.fetch_profile(Some(OWNER)), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.fetch_profile(Some(OTHER)).await;
    });

    let profile = store.snapshot().profile;
    assert_eq!(profile.details.address, Some(OTHER));
    assert!(!profile.is_loading);
}

#[tokio::test]
async fn optimistic_balance_follows_pending_writes() {
    let (store, _) = store_with(funded_chain());
    store.fetch_token_balances(Some(OWNER)).await;

    store.set_selected_token("DAI");
    store.set_optimistic_balance("0.5", TxKind::Mint);
    assert_eq!(
        store.snapshot().balances.tokens["DAI"].optimistic_balance.as_deref(),
        Some("1.5")
    );

    store.set_selected_token("USDC");
    store.set_optimistic_balance("1", TxKind::Transfer);
    assert_eq!(
        store.selected_token_balance().unwrap().optimistic_balance.as_deref(),
        Some("1.5")
    );

    store.set_optimistic_balance("100", TxKind::Approve);
    assert_eq!(
        store.selected_token_balance().unwrap().optimistic_balance.as_deref(),
        Some("2.5")
    );

    store.set_optimistic_balance("1", TxKind::Transfer);
    store.reset_optimistic_balance();
    let balances = store.snapshot().balances;
    assert_eq!(balances.tokens["USDC"].optimistic_balance.as_deref(), Some("2.5"));
    // only the selected token is reset
    assert_eq!(balances.tokens["DAI"].optimistic_balance.as_deref(), Some("1.5"));
}

#[tokio::test]
async fn unknown_token_selection_is_ignored() {
    let (store, _) = store_with(funded_chain());
    store.set_selected_token("USDC");
    store.set_selected_token("WETH");
    assert_eq!(store.snapshot().balances.selected_token, "USDC");

    store.set_token_pending("USDC", false);
    assert!(!store.snapshot().balances.tokens["USDC"].loading);
    assert!(store.snapshot().balances.tokens["DAI"].loading);

    store.reset_transaction_state();
    assert_eq!(
        store.snapshot().balances.transaction_state,
        TransactionState::Idle
    );
}

#[tokio::test]
async fn mint_amount_is_sanitized_for_selected_token() {
    let (store, _) = store_with(funded_chain());
    store.set_selected_token("USDC");

    store.set_mint_amount("000.5001");
    assert_eq!(store.snapshot().mint.form.amount, "0.5001");

    store.set_mint_amount("1.1234567");
    assert_eq!(store.snapshot().mint.form.amount, "1.123456");

    store.set_mint_amount("");
    assert!(!store.validate_mint_form());
    assert_eq!(
        store.snapshot().mint.form.validation_errors.amount,
        "Amount is required"
    );
}

fn history_chain() -> MockChain {
    let dai = token("DAI");
    let usdc = token("USDC");
    let mut logs = HashMap::new();
    logs.insert(
        (dai, Transfer::SIGNATURE_HASH),
        vec![
            transfer_log(Address::ZERO, OWNER, U256::from(ONE_DAI), 19_950, 1),
            transfer_log(OTHER, Address::repeat_byte(0xcc), U256::from(ONE_DAI), 19_960, 2),
        ],
    );
    logs.insert(
        (dai, Approval::SIGNATURE_HASH),
        vec![approval_log(OWNER, OTHER, U256::from(2 * ONE_DAI), 19_990, 3)],
    );
    logs.insert(
        (usdc, Transfer::SIGNATURE_HASH),
        vec![transfer_log(OWNER, OTHER, U256::from(500_000u64), 19_970, 4)],
    );
    MockChain {
        chain_id: SEPOLIA_CHAIN_ID,
        latest_block: Some(20_000),
        logs,
        ..Default::default()
    }
}

#[tokio::test]
async fn events_are_reconstructed_in_chronological_order() {
    let (store, _) = store_with(history_chain());

    store.fetch_events(Some(OWNER), true).await;

    let history = store.snapshot().history;
    assert!(!history.is_loading);
    assert!(!history.fetch_error);
    let events = history.events.unwrap();
    let summary: Vec<_> = events
        .iter()
        .map(|e| (e.kind, e.token.as_str(), e.amount.as_str()))
        .collect();
    assert_eq!(
        summary,
        [
            (TxKind::Mint, "DAI", "1"),
            (TxKind::Transfer, "USDC", "0.5"),
            (TxKind::Approve, "DAI", "2"),
        ]
    );
    assert_eq!(events[2].to, OTHER);
    assert_eq!(history.optimistic_events, Some(events));
}

#[tokio::test]
async fn event_scan_uses_separate_windows() {
    let (store, chain) = store_with(history_chain());

    store.fetch_events(Some(OWNER), false).await;

    let queries = chain.log_queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 4);
    for (from, to, _, topic0) in queries {
        assert_eq!(to, 20_000);
        if topic0 == Transfer::SIGNATURE_HASH {
            assert_eq!(from, 10_000);
        } else {
            assert_eq!(topic0, Approval::SIGNATURE_HASH);
            assert_eq!(from, 19_901);
        }
    }
}

#[tokio::test]
async fn stale_event_response_is_discarded() {
    let chain = history_chain();
    *chain.first_block_delay.lock().unwrap() = Some(Duration::from_millis(200));
    let (store, _) = store_with(chain);

    tokio::join!(store.fetch_events(Some(OWNER), true), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.fetch_events(Some(OTHER), true).await;
    });

    let events = store.snapshot().history.events.unwrap();
    assert!(events.iter().all(|e| e.kind != TxKind::Mint));
    assert_eq!(events[0].from, OTHER);
    assert_eq!(events.len(), 3);
}

#[tokio::test]
async fn block_height_failure_clears_history() {
    let mut chain = history_chain();
    chain.latest_block = None;
    let (store, chain) = store_with(chain);

    store.fetch_events(Some(OWNER), true).await;

    let history = store.snapshot().history;
    assert_eq!(history.events, None);
    assert_eq!(history.optimistic_events, None);
    assert!(history.fetch_error);
    assert!(!history.is_loading);
    assert_eq!(
        history.error_message.as_deref(),
        Some("Failed to fetch transaction history. Failed to get current block number.")
    );
    assert!(chain.log_queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn log_failure_fails_the_whole_scan() {
    let mut chain = history_chain();
    chain.fail_logs = true;
    let (store, _) = store_with(chain);

    store.fetch_events(Some(OWNER), true).await;

    let history = store.snapshot().history;
    assert_eq!(history.events, None);
    assert_eq!(
        history.error_message.as_deref(),
        Some("Failed to fetch transaction history. log query failed")
    );
}

#[tokio::test]
async fn optimistic_events_reset_to_confirmed() {
    let (store, _) = store_with(history_chain());
    store.fetch_events(Some(OWNER), true).await;

    let pending = TokenEvent::pending(
        "DAI",
        TxKind::Transfer,
        OWNER,
        OTHER,
        "0.25",
        TxHash::repeat_byte(9),
    );
    store.set_optimistic_events(pending.clone());

    let history = store.snapshot().history;
    let optimistic = history.optimistic_events.unwrap();
    assert_eq!(optimistic.len(), 4);
    assert_eq!(optimistic.last(), Some(&pending));
    assert_eq!(pending.status, EventStatus::Pending);
    assert_eq!(history.events.as_ref().map(Vec::len), Some(3));

    store.reset_optimistic_events();
    let history = store.snapshot().history;
    assert_eq!(history.optimistic_events, history.events);

    store.fetch_events(None, true).await;
    let history = store.snapshot().history;
    assert_eq!(history.events, None);
    assert!(!history.is_loading);
}

#[tokio::test]
async fn mint_requires_connected_wallet() {
    let (store, chain) = store_with(funded_chain());

    let result = store.mint_token("DAI", "1").await;

    assert_eq!(result, None);
    let state = store.snapshot();
    let message = "Wallet address not found. Please connect your wallet.";
    assert_eq!(state.error.message.as_deref(), Some(message));
    assert_eq!(
        state.mint.transaction_state,
        TransactionState::Failed(message.to_string())
    );
    assert!(chain.writes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn mint_submits_to_connected_wallet() {
    let (store, chain) = store_with(funded_chain());
    store.fetch_profile(Some(OWNER)).await;

    let result = store.mint_token("DAI", "1.5").await;

    assert_eq!(result, Some(TxHash::repeat_byte(1)));
    assert_eq!(
        store.snapshot().mint.transaction_state,
        TransactionState::Succeeded(TxHash::repeat_byte(1))
    );

    let writes = chain.writes.lock().unwrap();
    let (contract, calldata, chain_id) = &writes[0];
    assert_eq!(*contract, token("DAI"));
    assert_eq!(*chain_id, SEPOLIA_CHAIN_ID);
    let expected = mintCall {
        to: OWNER,
        amount: U256::from(3 * ONE_DAI / 2),
    }
    .abi_encode();
    assert_eq!(calldata.to_vec(), expected);
}

#[tokio::test]
async fn failed_transfer_reports_token_specific_message() {
    let mut chain = funded_chain();
    chain.write_error = Some("insufficient funds for gas".to_string());
    let (store, _) = store_with(chain);

    let result = store.transfer_token("USDC", OTHER, "1").await;

    assert_eq!(result, None);
    let state = store.snapshot();
    let message = "Failed to transfer USDC. Please check details and balance.";
    assert_eq!(state.error.message.as_deref(), Some(message));
    assert_eq!(state.transfer.transaction_state.error(), Some(message));
}

#[tokio::test]
async fn rejected_approval_reports_rejection() {
    let mut chain = funded_chain();
    chain.write_error = Some("User rejected the request.".to_string());
    let (store, _) = store_with(chain);

    assert_eq!(store.approve_token("DAI", OTHER, "5").await, None);

    let state = store.snapshot();
    assert_eq!(
        state.error.message.as_deref(),
        Some("Approve transaction was rejected.")
    );
    assert!(!state.approve.transaction_state.loading());
}

#[tokio::test]
async fn transfer_encodes_recipient_and_amount() {
    let (store, chain) = store_with(funded_chain());

    let result = store.transfer_token("USDC", OTHER, "0.75").await;

    assert_eq!(result, Some(TxHash::repeat_byte(1)));
    let writes = chain.writes.lock().unwrap();
    assert_eq!(writes[0].0, token("USDC"));
    let expected = transferCall {
        to: OTHER,
        amount: U256::from(750_000u64),
    }
    .abi_encode();
    assert_eq!(writes[0].1.to_vec(), expected);
}

#[tokio::test]
async fn transfer_form_validates_against_optimistic_balance() {
    let (store, _) = store_with(funded_chain());
    store.fetch_profile(Some(OWNER)).await;
    store.fetch_token_balances(Some(OWNER)).await;
    store.set_selected_token("USDC");

    store.set_transfer_form_values(TransferFieldsUpdate {
        amount: Some("3".to_string()),
        recipient_address: Some(OWNER.to_string()),
    });
    assert!(!store.validate_transfer_form());
    let errors = store.snapshot().transfer.form.validation_errors;
    assert_eq!(errors.amount, "Insufficient balance");
    assert_eq!(errors.recipient_address, "Address cannot be your own address");

    store.set_transfer_form_values(TransferFieldsUpdate {
        amount: Some("2.5".to_string()),
        recipient_address: None,
    });
    store.set_transfer_form_values(TransferFieldsUpdate {
        amount: None,
        recipient_address: Some(OTHER.to_string()),
    });
    assert!(store.validate_transfer_form());
    let form = store.snapshot().transfer.form;
    assert_eq!(form.amount, "2.5");
    assert_eq!(form.validation_errors.amount, "");
    assert_eq!(form.validation_errors.recipient_address, "");
}

#[tokio::test]
async fn excess_decimals_are_rejected_not_truncated() {
    let (store, chain) = store_with(funded_chain());
    store.fetch_profile(Some(OWNER)).await;
    store.fetch_token_balances(Some(OWNER)).await;
    store.set_selected_token("USDC");

    store.set_transfer_form_values(TransferFieldsUpdate {
        amount: Some("1.1234567".to_string()),
        recipient_address: Some(OTHER.to_string()),
    });
    assert!(!store.validate_transfer_form());
    assert_eq!(
        store.snapshot().transfer.form.validation_errors.amount,
        "Enter a valid amount with at most 6 decimals"
    );

    assert_eq!(store.transfer_token("USDC", OTHER, "1.1234567").await, None);
    assert!(chain.writes.lock().unwrap().is_empty());
    assert_eq!(
        store.snapshot().transfer.transaction_state.error(),
        Some("Failed to transfer USDC. Please check details and balance.")
    );
}

#[tokio::test]
async fn editing_a_form_settles_finished_transaction() {
    let (store, _) = store_with(funded_chain());
    store.set_approve_transaction_state(TransactionState::Succeeded(TxHash::repeat_byte(7)));

    store.set_approve_form_values(ApproveFieldsUpdate {
        amount: Some("10".to_string()),
        spender_address: None,
    });
    assert_eq!(store.snapshot().approve.transaction_state, TransactionState::Idle);

    store.set_approve_transaction_state(TransactionState::Submitting);
    store.set_approve_form_values(ApproveFieldsUpdate::default());
    assert_eq!(
        store.snapshot().approve.transaction_state,
        TransactionState::Submitting
    );

    store.reset_approve_form();
    let approve = store.snapshot().approve;
    assert_eq!(approve.form.amount, "");
    assert_eq!(approve.transaction_state, TransactionState::Idle);
}

#[tokio::test]
async fn profile_fetch_loads_and_resets() {
    let mut chain = funded_chain();
    chain.native_balance = U256::from(123_456_789_000_000_000u64);
    chain.ens_name = Some("owner.eth".to_string());
    let (store, _) = store_with(chain);

    store.fetch_profile(Some(OWNER)).await;
    let profile = store.snapshot().profile;
    assert!(!profile.is_loading);
    assert_eq!(profile.error, None);
    assert_eq!(profile.details.address, Some(OWNER));
    assert_eq!(profile.details.chain, "Sepolia");
    assert_eq!(profile.details.balance, "0.1235 ETH");
    assert_eq!(profile.details.ens_name, "owner.eth");

    store.fetch_profile(None).await;
    let profile = store.snapshot().profile;
    assert_eq!(profile.details.address, None);
    assert_eq!(profile.details.balance, "");
}

#[tokio::test]
async fn profile_failure_is_recorded_on_the_slice() {
    let mut chain = funded_chain();
    chain.fail_native_balance = true;
    let (store, _) = store_with(chain);

    store.fetch_profile(Some(OWNER)).await;

    let profile = store.snapshot().profile;
    assert!(!profile.is_loading);
    assert_eq!(profile.error.as_deref(), Some("rpc unavailable"));
    assert_eq!(profile.details.address, None);
}

#[tokio::test]
async fn network_sync_flags_unexpected_chain() {
    let (store, _) = store_with(funded_chain());
    store.sync_network().await;
    assert!(!store.snapshot().network.is_wrong_network);

    let (store, _) = store_with(MockChain {
        chain_id: 1,
        ..Default::default()
    });
    store.sync_network().await;
    let network = store.snapshot().network;
    assert!(network.is_wrong_network);
    assert_eq!(network.network, "Sepolia");
}

#[tokio::test]
async fn allowance_is_read_for_connected_wallet() {
    let mut chain = funded_chain();
    chain
        .allowances
        .insert((token("USDC"), OWNER, OTHER), U256::from(12_340_000u64));
    let (store, _) = store_with(chain);

    assert_eq!(store.fetch_allowance("USDC", OTHER).await, None);
    assert_eq!(
        store.snapshot().error.message.as_deref(),
        Some("Wallet address not found. Please connect your wallet.")
    );

    store.clear_error();
    store.fetch_profile(Some(OWNER)).await;
    assert_eq!(
        store.fetch_allowance("USDC", OTHER).await.as_deref(),
        Some("12.34")
    );
    let state = store.snapshot();
    assert_eq!(state.approve.allowance, "12.34");
    assert_eq!(state.error.message, None);
}

#[tokio::test]
async fn error_slot_keeps_latest_message() {
    let (store, _) = store_with(funded_chain());
    let mut changes = store.subscribe();

    store.set_error("first");
    store.set_error("second");
    assert!(changes.has_changed().unwrap());
    assert_eq!(
        changes.borrow_and_update().error.message.as_deref(),
        Some("second")
    );

    store.clear_error();
    let error = store.snapshot().error;
    assert_eq!(error.message, None);
    assert!(!error.is_modal_open);
}
