pub mod abi;
pub mod contract;
pub mod convert;
pub mod encoding;
pub mod error;
pub mod factory;
pub mod instance;
pub mod logger;
pub mod provider;
pub mod transaction;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

use serde::{Deserialize, Serialize};

/// Named call arguments, matched against the ABI input names.
pub type ArgumentMap = serde_json::Map<String, serde_json::Value>;

/// Mined transaction receipt as returned by the provider. Not interpreted.
pub type Receipt = serde_json::Value;

/// Per-call overrides of the contract's sending account and gas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOptions {
    pub account: Option<String>,
    pub gas: Option<u64>,
}

impl TransactionOptions {
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }
}
