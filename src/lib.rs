//! Deploy and call Ethereum smart contracts from their ABI and bytecode.
//!
//! Named arguments are checked and converted against the ABI before anything
//! reaches the RPC provider; state-changing calls resolve once their receipt
//! is available.

pub mod config;
pub mod ethereum;

pub use ethereum::{
    abi::{AbiEntry, AbiParam, ContractDefinition},
    contract::Contract,
    convert::WireValue,
    error::{ContractError, ConversionError, ProviderError},
    factory::ContractFactory,
    instance::ContractInstance,
    logger::{ContractLogger, NoopLogger, TracingLogger},
    provider::{AlloyProvider, ContractProvider, DeployEvent},
    transaction::{Transaction, TransactionState},
    ArgumentMap, Receipt, TransactionOptions,
};
