use alloy_primitives::utils::{ParseUnits, format_units, parse_units};
use alloy_primitives::{I256, U256};
use anyhow::{Context, Result};

/// Render a raw token amount with `decimals`, dropping trailing zeros
/// (`1000000000000000000` at 18 decimals is `"1"`).
pub fn format_token_amount(raw: U256, decimals: u8) -> String {
    let formatted = format_units(raw, decimals).unwrap_or_else(|_| raw.to_string());
    trim_fraction(formatted)
}

fn trim_fraction(formatted: String) -> String {
    if !formatted.contains('.') {
        return formatted;
    }
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Convert a human amount into the token's smallest unit. Fractions longer
/// than `decimals` are rejected rather than truncated.
pub fn parse_token_amount(amount: &str, decimals: u8) -> Result<U256> {
    let amount = amount.trim();
    if let Some((_, fraction)) = amount.split_once('.') {
        if fraction.len() > decimals as usize {
            anyhow::bail!("Amount {amount} has more than {decimals} decimals");
        }
    }
    match parse_units(amount, decimals).with_context(|| format!("Invalid amount: {amount}"))? {
        ParseUnits::U256(value) => Ok(value),
        ParseUnits::I256(_) => anyhow::bail!("Amount must not be negative: {amount}"),
    }
}

fn parse_signed_amount(amount: &str, decimals: u8) -> Result<I256> {
    let amount = amount.trim();
    let (negative, magnitude) = match amount.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, amount),
    };
    let value = I256::try_from(parse_token_amount(magnitude, decimals)?)
        .map_err(|_| anyhow::anyhow!("Amount out of range: {amount}"))?;
    Ok(if negative { -value } else { value })
}

fn format_signed_amount(value: I256, decimals: u8) -> String {
    let formatted = format_token_amount(value.unsigned_abs(), decimals);
    if value.is_negative() {
        format!("-{formatted}")
    } else {
        formatted
    }
}

/// Fixed-point `base + delta` (or `base - delta`) at the token's precision.
/// A missing base counts as zero.
pub fn offset_amount(base: Option<&str>, delta: &str, decimals: u8, subtract: bool) -> Result<String> {
    let base = parse_signed_amount(base.unwrap_or("0"), decimals)?;
    let delta = parse_signed_amount(delta, decimals)?;
    let result = if subtract {
        base.checked_sub(delta)
    } else {
        base.checked_add(delta)
    }
    .context("Amount overflow")?;
    Ok(format_signed_amount(result, decimals))
}

/// Sanitize a decimal amount typed into a form field.
///
/// Keeps digits and the first decimal point, caps the fractional part at
/// `decimals` digits and strips extraneous leading zeros (`"05"` becomes
/// `"5"`, `"000.5"` becomes `"0.5"`).
pub fn format_value_on_input_change(value: &str, decimals: u8) -> String {
    let first_dot = value.find('.');
    let mut processed: String = value
        .char_indices()
        .filter(|&(i, c)| c.is_ascii_digit() || (c == '.' && Some(i) == first_dot))
        .map(|(_, c)| c)
        .collect();

    if let Some(dot) = processed.find('.') {
        let max_len = dot + 1 + decimals as usize;
        if processed.len() > max_len {
            processed.truncate(max_len);
        }
    }

    while processed.len() > 1 && processed.starts_with('0') && !processed.starts_with("0.") {
        processed.remove(0);
    }

    processed
}

/// `0x1234...cdef` style shortening of hex strings.
pub fn middle_ellipsis(value: &str, len: usize) -> String {
    if value.is_empty() {
        return String::new();
    }
    if !value.is_ascii() || value.len() <= 2 + len * 2 {
        return value.to_string();
    }
    format!("0x{}...{}", &value[2..len + 2], &value[value.len() - len..])
}
