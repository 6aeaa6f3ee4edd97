use crate::config::{Config, NetworkConfig};
use alloy::{
    network::TransactionBuilder,
    primitives::{Address, TxHash},
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::types::TransactionRequest,
    transports::http::{Client, Http},
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::mpsc;

use super::abi::{AbiEntry, AbiParam};
use super::convert::WireValue;
use super::error::ProviderError;
use super::{encoding, utils, Receipt};

/// Progress of a contract creation as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployEvent {
    /// The creation transaction was accepted; no address yet.
    TransactionSubmitted { hash: String },
    /// The creation transaction was mined.
    ContractCreated { address: String },
}

/// Stream of deployment events; it ends after the last event.
pub type DeployEvents = mpsc::Receiver<Result<DeployEvent, ProviderError>>;

#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub constructor_inputs: Vec<AbiParam>,
    pub args: Vec<WireValue>,
    pub bytecode: String,
    pub gas: u64,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct CallRequest {
    pub to: String,
    pub from: String,
    pub method: AbiEntry,
    pub args: Vec<WireValue>,
}

#[derive(Debug, Clone)]
pub struct SendRequest {
    pub to: String,
    pub from: String,
    pub gas: u64,
    pub method: AbiEntry,
    pub args: Vec<WireValue>,
}

/// RPC layer that contracts are deployed and invoked through.
///
/// Implementations must be safe to share between concurrent calls; the
/// contract layer never serializes access.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait ContractProvider: Send + Sync {
    async fn deploy_contract(&self, request: DeployRequest) -> Result<DeployEvents, ProviderError>;

    /// Read-only call. Returns a scalar for one output, an array for several.
    async fn call(&self, request: CallRequest) -> Result<Value, ProviderError>;

    /// Submits a transaction and returns its hash.
    async fn send_transaction(&self, request: SendRequest) -> Result<String, ProviderError>;

    /// `Ok(None)` while the transaction is not mined yet.
    async fn get_transaction_receipt(&self, hash: &str) -> Result<Option<Receipt>, ProviderError>;

    fn is_valid_address(&self, value: &str) -> bool {
        utils::validate_address(value).is_ok()
    }

    fn to_hex(&self, value: &Value) -> Result<String, ProviderError> {
        utils::to_hex(value)
    }

    fn convert_from_base_unit(&self, value: &Value, unit: &str) -> Result<String, ProviderError> {
        utils::from_base_unit(value, unit)
    }
}

fn rpc_error(error: impl std::fmt::Display) -> ProviderError {
    ProviderError::new(utils::interpret_rpc_error(&error.to_string()))
}

fn parse_address(address: &str) -> Result<Address, ProviderError> {
    utils::validate_address(address).map_err(|e| ProviderError::new(e.to_string()))
}

fn parse_bytecode(bytecode: &str) -> Result<Vec<u8>, ProviderError> {
    hex::decode(bytecode.trim().trim_start_matches("0x"))
        .map_err(|e| ProviderError::new(format!("Invalid bytecode: {}", e)))
}

/// JSON-RPC provider over HTTP. Transactions are sent with
/// `eth_sendTransaction`, so the node must manage the sending account.
#[derive(Debug, Clone)]
pub struct AlloyProvider {
    provider: RootProvider<Http<Client>>,
    network: String,
    poll_interval: Duration,
}

impl AlloyProvider {
    pub fn new(config: &Config, network: Option<&str>) -> Result<Self> {
        let network_name = network.unwrap_or(&config.default_network);
        utils::validate_network(network_name, &config.network_names())?;

        let network_config = config
            .networks
            .get(network_name)
            .ok_or_else(|| anyhow!("Network '{}' not configured", network_name))?;

        Ok(Self {
            provider: Self::create_provider(network_config)?,
            network: network_name.to_string(),
            poll_interval: config.transactions.receipt_poll_interval(),
        })
    }

    fn create_provider(network_config: &NetworkConfig) -> Result<RootProvider<Http<Client>>> {
        let provider = ProviderBuilder::new().on_http(network_config.rpc_url.parse()?);

        Ok(provider)
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    /// Validates network connectivity with detailed error information
    pub async fn validate_connection(&self) -> Result<()> {
        match self.provider.get_block_number().await {
            Ok(block) => {
                tracing::debug!("Connected to {} at block {}", self.network, block);
                Ok(())
            }
            Err(e) => Err(anyhow!(
                "Cannot connect to network '{}': {}. Please check your RPC endpoint configuration and network connectivity.",
                self.network,
                utils::interpret_rpc_error(&e.to_string())
            )),
        }
    }
}

#[async_trait]
impl ContractProvider for AlloyProvider {
    async fn deploy_contract(&self, request: DeployRequest) -> Result<DeployEvents, ProviderError> {
        let from = parse_address(&request.from)?;
        let mut data = parse_bytecode(&request.bytecode)?;
        data.extend(encoding::encode_arguments(
            &request.constructor_inputs,
            &request.args,
        )?);

        let tx_request = TransactionRequest::default()
            .from(from)
            .with_gas_limit(request.gas)
            .with_deploy_code(data);

        let pending = self
            .provider
            .send_transaction(tx_request)
            .await
            .map_err(rpc_error)?;
        let tx_hash = *pending.tx_hash();
        tracing::info!("Contract creation transaction sent with hash: {:?}", tx_hash);

        let (sender, receiver) = mpsc::channel(2);
        let provider = self.provider.clone();
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            let submitted = DeployEvent::TransactionSubmitted {
                hash: format!("0x{:x}", tx_hash),
            };
            if sender.send(Ok(submitted)).await.is_err() {
                return;
            }

            // Stop once nobody is waiting for the address any more.
            while !sender.is_closed() {
                match provider.get_transaction_receipt(tx_hash).await {
                    Ok(Some(receipt)) => {
                        let event = match receipt.contract_address {
                            Some(address) => Ok(DeployEvent::ContractCreated {
                                address: address.to_string(),
                            }),
                            None => Err(ProviderError::new(format!(
                                "Creation transaction 0x{:x} was mined without a contract address",
                                tx_hash
                            ))),
                        };
                        let _ = sender.send(event).await;
                        return;
                    }
                    Ok(None) => tokio::time::sleep(poll_interval).await,
                    Err(e) => {
                        let _ = sender.send(Err(rpc_error(e))).await;
                        return;
                    }
                }
            }
        });

        Ok(receiver)
    }

    async fn call(&self, request: CallRequest) -> Result<Value, ProviderError> {
        let to = parse_address(&request.to)?;
        let from = parse_address(&request.from)?;
        let calldata = encoding::encode_call(&request.method, &request.args)?;

        let call_request = TransactionRequest::default()
            .from(from)
            .to(to)
            .input(alloy::primitives::Bytes::from(calldata).into());

        tracing::debug!("eth_call {} on {:?}", request.method.name, to);
        let result_bytes = self.provider.call(&call_request).await.map_err(rpc_error)?;

        encoding::decode_outputs(&request.method.outputs, &result_bytes)
    }

    async fn send_transaction(&self, request: SendRequest) -> Result<String, ProviderError> {
        let to = parse_address(&request.to)?;
        let from = parse_address(&request.from)?;
        let calldata = encoding::encode_call(&request.method, &request.args)?;

        let tx_request = TransactionRequest::default()
            .from(from)
            .to(to)
            .input(alloy::primitives::Bytes::from(calldata).into())
            .with_gas_limit(request.gas);

        let pending = self
            .provider
            .send_transaction(tx_request)
            .await
            .map_err(rpc_error)?;
        let tx_hash = *pending.tx_hash();
        tracing::info!("Transaction sent with hash: {:?}", tx_hash);

        Ok(format!("0x{:x}", tx_hash))
    }

    async fn get_transaction_receipt(&self, hash: &str) -> Result<Option<Receipt>, ProviderError> {
        let tx_hash = TxHash::from_str(hash)
            .map_err(|e| ProviderError::new(format!("Invalid transaction hash '{}': {}", hash, e)))?;

        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(rpc_error)?;

        receipt
            .map(|receipt| {
                serde_json::to_value(&receipt)
                    .map_err(|e| ProviderError::new(format!("Failed to serialize receipt: {}", e)))
            })
            .transpose()
    }
}
