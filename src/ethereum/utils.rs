use alloy::primitives::{Address, U256};
use anyhow::{anyhow, Result};
use serde_json::Value;
use std::str::FromStr;

use super::error::ProviderError;

/// Validates and normalizes an Ethereum address. The `0x` prefix is optional;
/// mixed-case input must carry a valid EIP-55 checksum.
pub fn validate_address(address: &str) -> Result<Address> {
    let address = address.trim();

    if address.is_empty() {
        return Err(anyhow!("Address cannot be empty"));
    }

    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);

    if hex_part.len() != 40 {
        return Err(anyhow!(
            "Invalid address length: '{}'. Ethereum addresses must have exactly 40 hex characters",
            address
        ));
    }

    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(anyhow!(
            "Invalid address format: '{}'. Contains non-hexadecimal characters",
            address
        ));
    }

    let prefixed = format!("0x{}", hex_part);
    let mixed_case = hex_part.chars().any(|c| c.is_ascii_lowercase())
        && hex_part.chars().any(|c| c.is_ascii_uppercase());

    if mixed_case {
        Address::parse_checksummed(&prefixed, None)
            .map_err(|e| anyhow!("Invalid address checksum: '{}'. Error: {}", address, e))
    } else {
        Address::from_str(&prefixed)
            .map_err(|e| anyhow!("Invalid Ethereum address: '{}'. Error: {}", address, e))
    }
}

/// Validates network name
pub fn validate_network(network: &str, available_networks: &[String]) -> Result<()> {
    if network.is_empty() {
        return Err(anyhow!("Network name cannot be empty"));
    }

    if !available_networks.iter().any(|n| n == network) {
        return Err(anyhow!(
            "Unknown network: '{}'. Available networks: {}",
            network,
            available_networks.join(", ")
        ));
    }

    Ok(())
}

/// Validates a method name given on the command line
pub fn validate_function_name(function_name: &str) -> Result<()> {
    let first = function_name
        .chars()
        .next()
        .ok_or_else(|| anyhow!("Function name cannot be empty"))?;

    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(anyhow!(
            "Invalid function name: '{}'. Function names must start with a letter or underscore",
            function_name
        ));
    }

    if !function_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(anyhow!(
            "Invalid function name: '{}'. Function names can only contain letters, numbers, and underscores",
            function_name
        ));
    }

    Ok(())
}

/// Splits a signed integer literal into `(negative, digits, radix)`: optional
/// sign, then decimal digits or `0x` prefixed hex. The digits are not parsed.
pub fn split_integer_literal(value: &str) -> Option<(bool, &str, u64)> {
    let value = value.trim();
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };

    if let Some(hex_digits) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        if hex_digits.is_empty() || !hex_digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some((negative, hex_digits, 16))
    } else {
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some((negative, digits, 10))
    }
}

/// Parses a signed integer literal into `(negative, magnitude)`. `None` for
/// anything that is not a literal or does not fit in 256 bits.
pub fn parse_integer(value: &str) -> Option<(bool, U256)> {
    let (negative, digits, radix) = split_integer_literal(value)?;
    let magnitude = U256::from_str_radix(digits, radix).ok()?;
    Some((negative && !magnitude.is_zero(), magnitude))
}

/// Integer view of a JSON value, for numbers and numeric strings.
fn integer_of(value: &Value) -> Option<(bool, U256)> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Some((false, U256::from(u)))
            } else if let Some(i) = n.as_i64() {
                Some((i < 0, U256::from(i.unsigned_abs())))
            } else {
                None
            }
        }
        Value::String(s) => parse_integer(s),
        _ => None,
    }
}

fn signed_to_string(negative: bool, magnitude: U256, radix_hex: bool) -> String {
    let sign = if negative { "-" } else { "" };
    if radix_hex {
        format!("{}0x{:x}", sign, magnitude)
    } else {
        format!("{}{}", sign, magnitude)
    }
}

/// Hex-encodes a native value the way web3 clients traditionally do:
/// `0x` strings are kept, numbers and numeric strings become hex quantities,
/// other strings and structured values are encoded as UTF-8 bytes.
pub fn to_hex(value: &Value) -> Result<String, ProviderError> {
    match value {
        Value::String(s) if s.starts_with("0x") || s.starts_with("0X") => Ok(s.clone()),
        Value::String(s) => match parse_integer(s) {
            Some((negative, magnitude)) => Ok(signed_to_string(negative, magnitude, true)),
            None => Ok(format!("0x{}", hex::encode(s.as_bytes()))),
        },
        Value::Number(_) => integer_of(value)
            .map(|(negative, magnitude)| signed_to_string(negative, magnitude, true))
            .ok_or_else(|| ProviderError::new(format!("Cannot hex-encode non-integer {}", value))),
        Value::Bool(b) => Ok(if *b { "0x1" } else { "0x0" }.to_string()),
        Value::Null => Err(ProviderError::new("Cannot hex-encode null")),
        Value::Array(_) | Value::Object(_) => {
            Ok(format!("0x{}", hex::encode(value.to_string().as_bytes())))
        }
    }
}

/// Decimal places of the named denomination.
fn unit_decimals(unit: &str) -> Option<u32> {
    let decimals = match unit.to_ascii_lowercase().as_str() {
        "wei" => 0,
        "kwei" | "babbage" => 3,
        "mwei" | "lovelace" => 6,
        "gwei" | "shannon" => 9,
        "szabo" | "microether" => 12,
        "finney" | "milliether" => 15,
        "ether" => 18,
        "kether" | "grand" => 21,
        "mether" => 24,
        _ => return None,
    };
    Some(decimals)
}

/// Scales an integer amount expressed in wei into `unit`, truncating to a
/// whole number.
pub fn from_base_unit(value: &Value, unit: &str) -> Result<String, ProviderError> {
    let decimals =
        unit_decimals(unit).ok_or_else(|| ProviderError::new(format!("Unknown unit '{}'", unit)))?;
    let (negative, magnitude) = integer_of(value)
        .ok_or_else(|| ProviderError::new(format!("Cannot convert {} from {}", value, unit)))?;

    let mut scale = U256::from(1u64);
    for _ in 0..decimals {
        scale *= U256::from(10u64);
    }
    let scaled = magnitude / scale;

    Ok(signed_to_string(negative && !scaled.is_zero(), scaled, false))
}

/// Creates user-friendly error messages for common RPC errors
pub fn interpret_rpc_error(error: &str) -> String {
    if error.contains("execution reverted") {
        format!(
            "Transaction failed: The contract function reverted execution. {}",
            if error.contains("revert") {
                "This usually means the function's requirements were not met or an assertion failed."
            } else {
                "Check your parameters and try again."
            }
        )
    } else if error.contains("insufficient funds") {
        "Transaction failed: Insufficient funds to cover gas costs. Make sure your account has enough ETH for gas fees.".to_string()
    } else if error.contains("gas required exceeds allowance") {
        "Transaction failed: Gas limit too low. Try increasing the gas limit for this transaction."
            .to_string()
    } else if error.contains("nonce too low") {
        "Transaction failed: Nonce too low. This usually means another transaction was already mined with this nonce.".to_string()
    } else if error.contains("unknown account") {
        "Transaction failed: The sending account is not managed by this node. Unlock it or use an account the node can sign for.".to_string()
    } else if error.contains("connection refused") || error.contains("network unreachable") {
        "Network error: Cannot connect to RPC endpoint. Check your internet connection and RPC URL configuration.".to_string()
    } else if error.contains("timeout") {
        "Network error: Request timed out. The RPC endpoint may be overloaded or unreachable."
            .to_string()
    } else if error.contains("rate limit") {
        "Rate limit error: Too many requests to the RPC endpoint. Try again in a few moments or use a different endpoint.".to_string()
    } else if error.contains("method not found") {
        "RPC error: The requested method is not supported by this RPC endpoint. Try using a different endpoint.".to_string()
    } else {
        format!("RPC error: {}", error)
    }
}
