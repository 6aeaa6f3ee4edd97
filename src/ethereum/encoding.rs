//! ABI encoding of marshalled wire values for the JSON-RPC provider.
//!
//! The marshalling core produces [`WireValue`]s; this module turns them into
//! calldata with `alloy::dyn_abi` and decodes call results back into JSON.

use alloy::{
    dyn_abi::{DynSolType, DynSolValue, Word},
    primitives::{keccak256, Address, Sign, I256},
};
use serde_json::Value;
use std::str::FromStr;

use super::abi::{AbiEntry, AbiParam};
use super::convert::WireValue;
use super::error::ProviderError;
use super::utils;

fn parse_types(params: &[AbiParam]) -> Result<Vec<DynSolType>, ProviderError> {
    params
        .iter()
        .map(|param| {
            DynSolType::parse(&param.ty).map_err(|e| {
                ProviderError::new(format!(
                    "Unsupported ABI type '{}' for '{}': {}",
                    param.ty, param.name, e
                ))
            })
        })
        .collect()
}

/// Canonical signature, e.g. `transfer(address,uint256)`.
pub fn signature(method: &AbiEntry) -> Result<String, ProviderError> {
    let types = parse_types(&method.inputs)?;
    let types: Vec<String> = types.iter().map(|ty| ty.sol_type_name().into_owned()).collect();
    Ok(format!("{}({})", method.name, types.join(",")))
}

/// ABI-encodes `args` as the parameter list described by `inputs`.
pub fn encode_arguments(inputs: &[AbiParam], args: &[WireValue]) -> Result<Vec<u8>, ProviderError> {
    let types = parse_types(inputs)?;
    if types.len() != args.len() {
        return Err(ProviderError::new(format!(
            "Parameter count mismatch: expected {} parameters, got {}",
            types.len(),
            args.len()
        )));
    }

    let values = args
        .iter()
        .zip(types.iter())
        .zip(inputs.iter())
        .map(|((arg, ty), input)| {
            to_sol_value(arg, ty).map_err(|e| {
                ProviderError::new(format!(
                    "Invalid parameter '{}' of type '{}': {}",
                    input.name, input.ty, e
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DynSolValue::Tuple(values).abi_encode_params())
}

/// Selector followed by the encoded arguments.
pub fn encode_call(method: &AbiEntry, args: &[WireValue]) -> Result<Vec<u8>, ProviderError> {
    let selector = keccak256(signature(method)?.as_bytes());
    let mut calldata = selector[..4].to_vec();
    calldata.extend(encode_arguments(&method.inputs, args)?);
    Ok(calldata)
}

/// Decodes return data. A single output comes back as a scalar, several as an
/// array, and empty data as `null`.
pub fn decode_outputs(outputs: &[AbiParam], data: &[u8]) -> Result<Value, ProviderError> {
    if data.is_empty() {
        return Ok(Value::Null);
    }

    let decoded = DynSolType::Tuple(parse_types(outputs)?)
        .abi_decode_params(data)
        .map_err(|e| ProviderError::new(format!("Failed to decode output: {}", e)))?;

    match decoded {
        DynSolValue::Tuple(values) => sol_values_to_json(&values),
        other => sol_value_to_json(&other),
    }
}

fn to_sol_value(wire: &WireValue, ty: &DynSolType) -> Result<DynSolValue, String> {
    match (wire, ty) {
        (WireValue::Uint(value), DynSolType::Uint(size)) => Ok(DynSolValue::Uint(*value, *size)),
        (WireValue::Int(value), DynSolType::Int(size)) => Ok(DynSolValue::Int(*value, *size)),
        (WireValue::Bool(b), DynSolType::Bool) => Ok(DynSolValue::Bool(*b)),
        (WireValue::String(s), DynSolType::String) => Ok(DynSolValue::String(s.clone())),
        (WireValue::Address(s), DynSolType::Address) => utils::validate_address(s)
            .map(DynSolValue::Address)
            .map_err(|e| e.to_string()),
        (WireValue::Bytes(hex_str), DynSolType::Bytes) => decode_hex(hex_str).map(DynSolValue::Bytes),
        (WireValue::Bytes(hex_str), DynSolType::FixedBytes(size)) => {
            fixed_bytes(&decode_hex(hex_str)?, *size)
        }
        (WireValue::Raw(value), ty) => json_to_sol_value(value, ty),
        (wire, ty) => Err(format!("Cannot encode {:?} as {}", wire, ty.sol_type_name())),
    }
}

fn decode_hex(hex_str: &str) -> Result<Vec<u8>, String> {
    let digits = hex_str.trim_start_matches("0x");
    // Quantities like 0x1 have an odd digit count.
    let digits = if digits.len() % 2 == 1 {
        format!("0{}", digits)
    } else {
        digits.to_string()
    };
    hex::decode(&digits).map_err(|_| format!("Invalid hex string: {}", hex_str))
}

fn fixed_bytes(bytes: &[u8], size: usize) -> Result<DynSolValue, String> {
    if bytes.len() > size {
        return Err(format!("{} bytes do not fit in bytes{}", bytes.len(), size));
    }
    let mut word_bytes = [0u8; 32];
    word_bytes[..bytes.len()].copy_from_slice(bytes);
    Ok(DynSolValue::FixedBytes(Word::from(word_bytes), size))
}

/// Encodes a value the marshalling layer passed through untouched.
fn json_to_sol_value(value: &Value, ty: &DynSolType) -> Result<DynSolValue, String> {
    match ty {
        DynSolType::Address => {
            let addr_str = value.as_str().ok_or("Address must be a string")?;
            Ok(DynSolValue::Address(
                Address::from_str(addr_str).map_err(|e| e.to_string())?,
            ))
        }
        DynSolType::Uint(size) => {
            let (negative, magnitude) = integer_of(value)?;
            if negative {
                return Err("Uint must not be negative".to_string());
            }
            Ok(DynSolValue::Uint(magnitude, *size))
        }
        DynSolType::Int(size) => {
            let (negative, magnitude) = integer_of(value)?;
            let sign = if negative { Sign::Negative } else { Sign::Positive };
            let signed = I256::checked_from_sign_and_abs(sign, magnitude)
                .ok_or("Int value does not fit in 256 bits")?;
            Ok(DynSolValue::Int(signed, *size))
        }
        DynSolType::String => Ok(DynSolValue::String(
            value.as_str().ok_or("String parameter must be a string")?.to_string(),
        )),
        DynSolType::Bool => Ok(DynSolValue::Bool(
            value.as_bool().ok_or("Bool parameter must be a boolean")?,
        )),
        DynSolType::FixedBytes(size) => {
            let hex_str = value.as_str().ok_or("Bytes must be a hex string")?;
            fixed_bytes(&decode_hex(hex_str)?, *size)
        }
        DynSolType::Bytes => {
            let hex_str = value.as_str().ok_or("Bytes must be a hex string")?;
            Ok(DynSolValue::Bytes(decode_hex(hex_str)?))
        }
        DynSolType::Array(element) => {
            let items = value.as_array().ok_or("Array parameter must be an array")?;
            Ok(DynSolValue::Array(
                items
                    .iter()
                    .map(|item| json_to_sol_value(item, element))
                    .collect::<Result<_, _>>()?,
            ))
        }
        DynSolType::FixedArray(element, len) => {
            let items = value.as_array().ok_or("Array parameter must be an array")?;
            if items.len() != *len {
                return Err(format!("Expected {} array elements, got {}", len, items.len()));
            }
            Ok(DynSolValue::FixedArray(
                items
                    .iter()
                    .map(|item| json_to_sol_value(item, element))
                    .collect::<Result<_, _>>()?,
            ))
        }
        DynSolType::Tuple(types) => {
            let items = value.as_array().ok_or("Tuple parameter must be an array")?;
            if items.len() != types.len() {
                return Err(format!("Expected {} tuple fields, got {}", types.len(), items.len()));
            }
            Ok(DynSolValue::Tuple(
                items
                    .iter()
                    .zip(types.iter())
                    .map(|(item, ty)| json_to_sol_value(item, ty))
                    .collect::<Result<_, _>>()?,
            ))
        }
        other => Err(format!("Unsupported Solidity type: {}", other.sol_type_name())),
    }
}

fn integer_of(value: &Value) -> Result<(bool, alloy::primitives::U256), String> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => return Err("Integer must be a number or string".to_string()),
    };
    utils::parse_integer(&text).ok_or_else(|| format!("Invalid integer: {}", text))
}

fn sol_values_to_json(values: &[DynSolValue]) -> Result<Value, ProviderError> {
    if values.len() == 1 {
        sol_value_to_json(&values[0])
    } else {
        values
            .iter()
            .map(sol_value_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }
}

fn sol_value_to_json(value: &DynSolValue) -> Result<Value, ProviderError> {
    match value {
        DynSolValue::Address(addr) => Ok(Value::String(addr.to_string())),
        DynSolValue::Uint(num, _) => Ok(Value::String(num.to_string())),
        DynSolValue::Int(num, _) => Ok(Value::String(num.to_string())),
        DynSolValue::Bool(b) => Ok(Value::Bool(*b)),
        DynSolValue::String(s) => Ok(Value::String(s.clone())),
        DynSolValue::Bytes(bytes) => Ok(Value::String(format!("0x{}", hex::encode(bytes)))),
        DynSolValue::FixedBytes(bytes, size) => Ok(Value::String(format!(
            "0x{}",
            hex::encode(&bytes[..*size])
        ))),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            items
                .iter()
                .map(sol_value_to_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        _ => Err(ProviderError::new(format!(
            "Unsupported decoded value: {:?}",
            value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;
    use serde_json::json;

    fn param(name: &str, ty: &str) -> AbiParam {
        AbiParam {
            name: name.to_string(),
            ty: ty.to_string(),
        }
    }

    fn transfer() -> AbiEntry {
        AbiEntry {
            name: "transfer".to_string(),
            entry_type: "function".to_string(),
            inputs: vec![param("to", "address"), param("amount", "uint256")],
            outputs: vec![param("", "bool")],
        }
    }

    #[test]
    fn test_signature_and_selector() {
        assert_eq!(signature(&transfer()).unwrap(), "transfer(address,uint256)");

        let calldata = encode_call(
            &transfer(),
            &[
                WireValue::Address("0x742d35cc6435c9c1c72c5e7b18bab7e1db7a5d6e".to_string()),
                WireValue::Uint(U256::from(5u64)),
            ],
        )
        .unwrap();

        // keccak256("transfer(address,uint256)")[..4]
        assert_eq!(hex::encode(&calldata[..4]), "a9059cbb");
        assert_eq!(calldata.len(), 4 + 64);
        assert_eq!(calldata[calldata.len() - 1], 5);
    }

    #[test]
    fn test_encode_arguments_rejects_count_mismatch() {
        let err = encode_arguments(&transfer().inputs, &[WireValue::Bool(true)]).unwrap_err();
        assert!(err.message.contains("Parameter count mismatch"));
    }

    #[test]
    fn test_raw_values_use_json_encoding() {
        let inputs = vec![param("ids", "uint256[]")];
        let encoded = encode_arguments(&inputs, &[WireValue::Raw(json!([1, "2"]))]).unwrap();
        // offset, length, two elements
        assert_eq!(encoded.len(), 32 * 4);
    }

    #[test]
    fn test_decode_outputs_single_and_multiple() {
        let single = DynSolValue::Tuple(vec![DynSolValue::Uint(U256::from(42u64), 256)]);
        let value = decode_outputs(&[param("", "uint256")], &single.abi_encode_params()).unwrap();
        assert_eq!(value, json!("42"));

        let pair = DynSolValue::Tuple(vec![
            DynSolValue::Bool(true),
            DynSolValue::String("hi".to_string()),
        ]);
        let outputs = vec![param("ok", "bool"), param("msg", "string")];
        let value = decode_outputs(&outputs, &pair.abi_encode_params()).unwrap();
        assert_eq!(value, json!([true, "hi"]));

        assert_eq!(decode_outputs(&outputs, &[]).unwrap(), Value::Null);
    }
}
