use crate::cli::formatters::{
    OutputFormat, format_allowance, format_balances, format_events, format_network,
    format_profile, format_transaction,
};
use crate::client::ChainClient;
use crate::store::{
    ApproveFieldsUpdate, Store, TokenEvent, TransferFieldsUpdate, TxKind,
};
use alloy_primitives::Address;
use anyhow::Result;
use std::str::FromStr;

pub fn parse_address(address: &str) -> Result<Address> {
    Address::from_str(address.trim())
        .map_err(|_| anyhow::anyhow!("Invalid address format: {}", address))
}

/// Message left in the error slot by the last failing operation.
fn last_error<C: ChainClient>(store: &Store<C>, fallback: &str) -> anyhow::Error {
    let message = store.snapshot().error.message;
    anyhow::anyhow!("{}", message.unwrap_or_else(|| fallback.to_string()))
}

pub async fn cmd_profile<C: ChainClient>(
    store: &Store<C>,
    address: Address,
    format: &OutputFormat,
) -> Result<()> {
    store.fetch_profile(Some(address)).await;
    let profile = store.snapshot().profile;
    if let Some(error) = &profile.error {
        anyhow::bail!("Failed to fetch profile: {}", error);
    }
    println!("{}", format_profile(&profile, format));
    Ok(())
}

pub async fn cmd_network<C: ChainClient>(store: &Store<C>, format: &OutputFormat) -> Result<()> {
    store.sync_network().await;
    let state = store.snapshot();
    if let Some(error) = state.error.message {
        anyhow::bail!(error);
    }
    println!(
        "{}",
        format_network(&state.network, store.config().expected_chain_id, format)
    );
    Ok(())
}

pub async fn cmd_balances<C: ChainClient>(
    store: &Store<C>,
    address: Address,
    format: &OutputFormat,
) -> Result<()> {
    store.fetch_token_balances(Some(address)).await;
    let state = store.snapshot();
    if let Some(error) = state.error.message {
        anyhow::bail!(error);
    }
    println!(
        "{}",
        format_balances(&state.balances, &store.config().tokens, format)
    );
    Ok(())
}

pub async fn cmd_history<C: ChainClient>(
    store: &Store<C>,
    address: Address,
    token: Option<&str>,
    format: &OutputFormat,
) -> Result<()> {
    store.fetch_events(Some(address), true).await;
    let history = store.snapshot().history;
    if let Some(error) = history.error_message {
        anyhow::bail!(error);
    }

    let events: Vec<TokenEvent> = history
        .events
        .unwrap_or_default()
        .into_iter()
        .filter(|e| token.is_none_or(|t| e.token == t))
        .collect();
    println!("{}", format_events(&events, format));
    Ok(())
}

pub async fn cmd_allowance<C: ChainClient>(
    store: &Store<C>,
    owner: Address,
    token: &str,
    spender: &str,
    format: &OutputFormat,
) -> Result<()> {
    let spender_address = parse_address(spender)?;
    store.fetch_profile(Some(owner)).await;
    let allowance = store
        .fetch_allowance(token, spender_address)
        .await
        .ok_or_else(|| last_error(store, "Failed to fetch allowance"))?;
    println!("{}", format_allowance(token, spender, &allowance, format));
    Ok(())
}

/// Load what the write forms validate against.
async fn prepare_write<C: ChainClient>(store: &Store<C>, owner: Address, token: &str) -> Result<()> {
    if store.config().tokens.get(token).is_none() {
        anyhow::bail!("Unknown token: {}", token);
    }
    store.set_selected_token(token);
    store.fetch_profile(Some(owner)).await;
    store.fetch_token_balances(Some(owner)).await;
    Ok(())
}

fn print_write_result<C: ChainClient>(
    store: &Store<C>,
    kind: TxKind,
    token: &str,
    format: &OutputFormat,
) {
    let state = store.snapshot();
    let transaction = match kind {
        TxKind::Mint => &state.mint.transaction_state,
        TxKind::Transfer => &state.transfer.transaction_state,
        TxKind::Approve => &state.approve.transaction_state,
    };
    let projected = state
        .balances
        .selected()
        .and_then(|b| b.optimistic_balance.clone());
    println!(
        "{}",
        format_transaction(
            &format!("{kind:?}"),
            token,
            transaction,
            projected.as_deref(),
            format
        )
    );
}

pub async fn cmd_mint<C: ChainClient>(
    store: &Store<C>,
    owner: Address,
    token: &str,
    amount: &str,
    format: &OutputFormat,
) -> Result<()> {
    prepare_write(store, owner, token).await?;

    store.set_mint_amount(amount);
    if !store.validate_mint_form() {
        let errors = store.snapshot().mint.form.validation_errors;
        anyhow::bail!("Invalid amount: {}", errors.amount);
    }
    let amount = store.snapshot().mint.form.amount;

    let tx_hash = store
        .mint_token(token, &amount)
        .await
        .ok_or_else(|| last_error(store, "Mint failed"))?;

    store.set_optimistic_balance(&amount, TxKind::Mint);
    store.set_optimistic_events(TokenEvent::pending(
        token,
        TxKind::Mint,
        Address::ZERO,
        owner,
        &amount,
        tx_hash,
    ));
    print_write_result(store, TxKind::Mint, token, format);
    Ok(())
}

pub async fn cmd_transfer<C: ChainClient>(
    store: &Store<C>,
    owner: Address,
    token: &str,
    recipient: &str,
    amount: &str,
    format: &OutputFormat,
) -> Result<()> {
    prepare_write(store, owner, token).await?;

    store.set_transfer_form_values(TransferFieldsUpdate {
        amount: Some(amount.to_string()),
        recipient_address: Some(recipient.to_string()),
    });
    if !store.validate_transfer_form() {
        let errors = store.snapshot().transfer.form.validation_errors;
        let messages: Vec<_> = [errors.amount, errors.recipient_address]
            .into_iter()
            .filter(|m| !m.is_empty())
            .collect();
        anyhow::bail!("Invalid transfer: {}", messages.join("; "));
    }
    let recipient = parse_address(recipient)?;

    let tx_hash = store
        .transfer_token(token, recipient, amount)
        .await
        .ok_or_else(|| last_error(store, "Transfer failed"))?;

    store.set_optimistic_balance(amount, TxKind::Transfer);
    store.set_optimistic_events(TokenEvent::pending(
        token,
        TxKind::Transfer,
        owner,
        recipient,
        amount,
        tx_hash,
    ));
    print_write_result(store, TxKind::Transfer, token, format);
    Ok(())
}

pub async fn cmd_approve<C: ChainClient>(
    store: &Store<C>,
    owner: Address,
    token: &str,
    spender: &str,
    amount: &str,
    format: &OutputFormat,
) -> Result<()> {
    prepare_write(store, owner, token).await?;

    store.set_approve_form_values(ApproveFieldsUpdate {
        amount: Some(amount.to_string()),
        spender_address: Some(spender.to_string()),
    });
    if !store.validate_approve_form() {
        let errors = store.snapshot().approve.form.validation_errors;
        let messages: Vec<_> = [errors.amount, errors.spender_address]
            .into_iter()
            .filter(|m| !m.is_empty())
            .collect();
        anyhow::bail!("Invalid approval: {}", messages.join("; "));
    }
    let spender = parse_address(spender)?;

    let tx_hash = store
        .approve_token(token, spender, amount)
        .await
        .ok_or_else(|| last_error(store, "Approve failed"))?;

    store.set_optimistic_balance(amount, TxKind::Approve);
    store.set_optimistic_events(TokenEvent::pending(
        token,
        TxKind::Approve,
        owner,
        spender,
        amount,
        tx_hash,
    ));
    print_write_result(store, TxKind::Approve, token, format);
    Ok(())
}
