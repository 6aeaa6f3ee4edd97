use thiserror::Error;

/// Failure reported by the underlying RPC provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Provider error: {message}")]
pub struct ProviderError {
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors raised while converting a single value to or from its ABI type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("Value is not a number")]
    NotANumber,
    #[error("Value out of bounds (min={min}, max={max})")]
    OutOfBounds { min: String, max: String },
    #[error("Value is not a valid address: {0}")]
    InvalidAddress(String),
    #[error("Unsupported integer width in type '{0}'")]
    UnsupportedWidth(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Errors surfaced by contracts, instances and pending transactions.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("Invalid ABI JSON: {0}")]
    InvalidAbi(#[source] serde_json::Error),
    #[error("Invalid contract artifact: {0}")]
    InvalidArtifact(String),
    #[error("Method not found: {0}")]
    MethodNotFound(String),
    #[error("Method '{method}' is ambiguous: {count} ABI entries match")]
    AmbiguousMethod { method: String, count: usize },
    #[error("Missing argument {argument} for method {method}")]
    MissingArgument { method: String, argument: String },
    #[error("Unexpected argument {argument} for method {method}")]
    UnexpectedArgument { method: String, argument: String },
    #[error("Error converting value for argument {argument} of method {method}: {source}")]
    ArgumentConversion {
        method: String,
        argument: String,
        #[source]
        source: ConversionError,
    },
    #[error("Error converting return value {output} for method {method}: {source}")]
    ReturnConversion {
        method: String,
        output: String,
        #[source]
        source: ConversionError,
    },
    #[error("Error fetching receipt for transaction {hash}: {source}")]
    ReceiptPoll {
        hash: String,
        #[source]
        source: ProviderError,
    },
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ContractError {
    /// The conversion failure behind an argument or return value error, if any.
    pub fn conversion(&self) -> Option<&ConversionError> {
        match self {
            ContractError::ArgumentConversion { source, .. }
            | ContractError::ReturnConversion { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Hash of the transaction whose receipt could not be fetched. It may
    /// still be mined later.
    pub fn transaction_hash(&self) -> Option<&str> {
        match self {
            ContractError::ReceiptPoll { hash, .. } => Some(hash),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_conversion_message_keeps_cause() {
        let err = ContractError::ArgumentConversion {
            method: "transfer".to_string(),
            argument: "amount".to_string(),
            source: ConversionError::NotANumber,
        };

        assert_eq!(
            err.to_string(),
            "Error converting value for argument amount of method transfer: Value is not a number"
        );
        assert_eq!(err.conversion(), Some(&ConversionError::NotANumber));
    }

    #[test]
    fn test_provider_error_passes_through_unwrapped() {
        let err: ContractError = ProviderError::new("nonce too low").into();
        assert_eq!(err.to_string(), "Provider error: nonce too low");
        assert!(err.conversion().is_none());
        assert!(err.transaction_hash().is_none());
    }

    #[test]
    fn test_receipt_poll_error_names_transaction() {
        let err = ContractError::ReceiptPoll {
            hash: "0xAA".to_string(),
            source: ProviderError::new("timeout"),
        };
        assert_eq!(
            err.to_string(),
            "Error fetching receipt for transaction 0xAA: Provider error: timeout"
        );
        assert_eq!(err.transaction_hash(), Some("0xAA"));
    }
}
