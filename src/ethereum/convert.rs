//! Conversion between native JSON values and ABI wire values.
//!
//! Inputs are bounds-checked and normalized before anything is sent to the
//! provider. Return values only get integer normalization; every other type
//! passes through.

use alloy::primitives::{Sign, I256, U256};
use serde_json::Value;

use super::error::ConversionError;
use super::provider::ContractProvider;
use super::utils;

/// A value ready to be handed to the provider for a specific ABI type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    Int(I256),
    Uint(U256),
    Bool(bool),
    String(String),
    Address(String),
    /// `0x` prefixed hex.
    Bytes(String),
    /// Types without a conversion rule are forwarded untouched.
    Raw(Value),
}

/// The ABI types that have conversion rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiKind {
    Int(usize),
    Uint(usize),
    Bool,
    String,
    Address,
    Bytes,
    Other,
}

impl AbiKind {
    pub fn parse(abi_type: &str) -> Result<Self, ConversionError> {
        if let Some(suffix) = abi_type.strip_prefix("uint") {
            return integer_width(suffix, abi_type).map(|w| w.map_or(AbiKind::Other, AbiKind::Uint));
        }
        if let Some(suffix) = abi_type.strip_prefix("int") {
            return integer_width(suffix, abi_type).map(|w| w.map_or(AbiKind::Other, AbiKind::Int));
        }

        let kind = match abi_type {
            "bool" => AbiKind::Bool,
            "string" => AbiKind::String,
            "address" => AbiKind::Address,
            "byte" | "bytes" => AbiKind::Bytes,
            ty if ty
                .strip_prefix("bytes")
                .is_some_and(|n| n.chars().all(|c| c.is_ascii_digit())) =>
            {
                AbiKind::Bytes
            }
            _ => AbiKind::Other,
        };
        Ok(kind)
    }

    fn is_integer(self) -> bool {
        matches!(self, AbiKind::Int(_) | AbiKind::Uint(_))
    }
}

/// Width of `intN`/`uintN`; a bare `int`/`uint` is 256. `None` when the
/// suffix is not a plain width (e.g. `uint256[]`).
fn integer_width(suffix: &str, abi_type: &str) -> Result<Option<usize>, ConversionError> {
    if suffix.is_empty() {
        return Ok(Some(256));
    }
    if !suffix.chars().all(|c| c.is_ascii_digit()) {
        return Ok(None);
    }
    match suffix.parse::<usize>() {
        Ok(bits) if (1..=256).contains(&bits) => Ok(Some(bits)),
        _ => Err(ConversionError::UnsupportedWidth(abi_type.to_string())),
    }
}

/// Largest magnitude accepted for `intN`. Both bounds use it, so the most
/// negative two's complement value is rejected.
fn int_bound(bits: usize) -> U256 {
    (U256::from(1u64) << (bits - 1)) - U256::from(1u64)
}

fn uint_max(bits: usize) -> U256 {
    if bits == 256 {
        U256::MAX
    } else {
        (U256::from(1u64) << bits) - U256::from(1u64)
    }
}

/// Renders a value the way a JavaScript `String(value)` would, except that
/// objects become JSON text.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 => format!("{:.0}", f),
            _ => n.to_string(),
        },
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Reads an integer out of a native value as `(negative, magnitude)`.
/// `Ok(None)` means the value is numeric but its magnitude needs more than
/// 256 bits.
fn coerce_integer(value: &Value) -> Result<Option<(bool, U256)>, ConversionError> {
    match value {
        Value::Bool(b) => Ok(Some((false, U256::from(u64::from(*b))))),
        Value::String(s) if s.trim().is_empty() => Ok(Some((false, U256::ZERO))),
        Value::String(s) => coerce_literal(s),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                return Ok(Some((false, U256::from(u))));
            }
            if let Some(i) = n.as_i64() {
                return Ok(Some((i < 0, U256::from(i.unsigned_abs()))));
            }
            // Integral floats such as 1e30 keep their exact binary value.
            match n.as_f64() {
                Some(f) if f.is_finite() && f.fract() == 0.0 => coerce_literal(&format!("{:.0}", f)),
                _ => Err(ConversionError::NotANumber),
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => Err(ConversionError::NotANumber),
    }
}

fn coerce_literal(text: &str) -> Result<Option<(bool, U256)>, ConversionError> {
    let (negative, digits, radix) =
        utils::split_integer_literal(text).ok_or(ConversionError::NotANumber)?;
    // The digits are already validated, so parsing only fails on overflow.
    Ok(U256::from_str_radix(digits, radix)
        .ok()
        .map(|magnitude| (negative && !magnitude.is_zero(), magnitude)))
}

fn to_int(value: &Value, bits: usize) -> Result<WireValue, ConversionError> {
    let bound = int_bound(bits);
    let (negative, magnitude) = match coerce_integer(value)? {
        Some((negative, magnitude)) if magnitude <= bound => (negative, magnitude),
        _ => {
            return Err(ConversionError::OutOfBounds {
                min: format!("-{}", bound),
                max: bound.to_string(),
            })
        }
    };

    let sign = if negative { Sign::Negative } else { Sign::Positive };
    I256::checked_from_sign_and_abs(sign, magnitude)
        .map(WireValue::Int)
        .ok_or(ConversionError::NotANumber)
}

fn to_uint(value: &Value, bits: usize) -> Result<WireValue, ConversionError> {
    let max = uint_max(bits);
    match coerce_integer(value)? {
        Some((false, magnitude)) if magnitude <= max => Ok(WireValue::Uint(magnitude)),
        _ => Err(ConversionError::OutOfBounds {
            min: "0".to_string(),
            max: max.to_string(),
        }),
    }
}

/// Numbers are rendered as hex and left-padded, keeping the low 40 digits.
/// Everything else is stringified.
fn to_address(value: &Value, provider: &dyn ContractProvider) -> Result<WireValue, ConversionError> {
    let numeric = match value {
        Value::Number(_) => coerce_integer(value).ok().flatten(),
        _ => None,
    };
    let address = match numeric {
        Some((false, magnitude)) => {
            let digits = format!("{:x}", magnitude);
            let low = &digits[digits.len().saturating_sub(40)..];
            format!("0x{:0>40}", low)
        }
        _ => stringify(value),
    };

    if !provider.is_valid_address(&address) {
        return Err(ConversionError::InvalidAddress(address));
    }
    Ok(WireValue::Address(address))
}

/// Converts a native argument into the wire value for `abi_type`.
pub fn to_wire_value(
    value: &Value,
    abi_type: &str,
    provider: &dyn ContractProvider,
) -> Result<WireValue, ConversionError> {
    match AbiKind::parse(abi_type)? {
        AbiKind::Int(bits) => to_int(value, bits),
        AbiKind::Uint(bits) => to_uint(value, bits),
        AbiKind::Bool => {
            let text = stringify(value);
            Ok(WireValue::Bool(!matches!(text.as_str(), "" | "0" | "false")))
        }
        AbiKind::String => Ok(WireValue::String(stringify(value))),
        AbiKind::Address => to_address(value, provider),
        AbiKind::Bytes => Ok(WireValue::Bytes(provider.to_hex(value)?)),
        AbiKind::Other => Ok(WireValue::Raw(value.clone())),
    }
}

/// `parseInt(text, 10)`: optional sign, then as many decimal digits as lead
/// the string. Values outside the JSON integer range come back as strings.
fn parse_leading_integer(text: &str) -> Result<Value, ConversionError> {
    let text = text.trim_start();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(ConversionError::NotANumber);
    }
    let magnitude = U256::from_str_radix(&digits, 10).map_err(|_| ConversionError::NotANumber)?;

    if magnitude.is_zero() {
        return Ok(Value::from(0u64));
    }
    if !negative && magnitude <= U256::from(u64::MAX) {
        return Ok(Value::from(magnitude.to::<u64>()));
    }
    if negative && magnitude <= U256::from(i64::MAX as u64) {
        return Ok(Value::from(-(magnitude.to::<u64>() as i64)));
    }

    let sign = if negative { "-" } else { "" };
    Ok(Value::String(format!("{}{}", sign, magnitude)))
}

/// Converts a raw return value into its native form for `abi_type`.
pub fn from_wire_value(
    value: &Value,
    abi_type: &str,
    provider: &dyn ContractProvider,
) -> Result<Value, ConversionError> {
    if AbiKind::parse(abi_type)?.is_integer() {
        let whole = provider.convert_from_base_unit(value, "wei")?;
        return parse_leading_integer(&whole);
    }
    Ok(value.clone())
}
