use crate::format::{offset_amount, parse_token_amount};
use alloy_primitives::{Address, U256};
use std::str::FromStr;

/// Validate an amount field. Returns the message to show, or an empty string
/// when the field is valid.
pub fn validate_amount(amount: &str, decimals: u8, available: Option<&str>) -> String {
    if amount.trim().is_empty() {
        return "Amount is required".to_string();
    }
    let parsed = match parse_token_amount(amount, decimals) {
        Ok(parsed) => parsed,
        Err(_) => return format!("Enter a valid amount with at most {decimals} decimals"),
    };
    if parsed == U256::ZERO {
        return "Amount must be greater than zero".to_string();
    }
    if let Some(available) = available {
        let exceeds = offset_amount(Some(available), amount, decimals, true)
            .map(|rest| rest.starts_with('-'))
            .unwrap_or(false);
        if exceeds {
            return "Insufficient balance".to_string();
        }
    }
    String::new()
}

/// Validate a recipient/spender address field.
pub fn validate_address(address: &str, own_address: Option<Address>) -> String {
    let address = address.trim();
    if address.is_empty() {
        return "Address is required".to_string();
    }
    match Address::from_str(address) {
        Ok(parsed) if parsed == Address::ZERO => "Address cannot be the zero address".to_string(),
        Ok(parsed) if Some(parsed) == own_address => {
            "Address cannot be your own address".to_string()
        }
        Ok(_) => String::new(),
        Err(_) => "Invalid address".to_string(),
    }
}
