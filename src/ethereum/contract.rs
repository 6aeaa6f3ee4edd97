use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use super::abi::{AbiEntry, ContractDefinition};
use super::convert::{self, WireValue};
use super::error::{ContractError, ProviderError};
use super::instance::ContractInstance;
use super::logger::{ContractLogger, NoopLogger};
use super::provider::{ContractProvider, DeployEvent, DeployRequest};
use super::transaction::DEFAULT_POLL_INTERVAL;
use super::{ArgumentMap, TransactionOptions};

/// A compiled contract bound to a provider, with default sending options.
///
/// Deploys new instances and marshals arguments and return values for every
/// instance created from it.
pub struct Contract {
    definition: ContractDefinition,
    provider: Arc<dyn ContractProvider>,
    account: String,
    gas: u64,
    poll_interval: Duration,
    logger: Arc<dyn ContractLogger>,
}

impl Contract {
    pub fn new(
        definition: ContractDefinition,
        provider: Arc<dyn ContractProvider>,
        account: impl Into<String>,
        gas: u64,
    ) -> Self {
        Self {
            definition,
            provider,
            account: account.into(),
            gas,
            poll_interval: DEFAULT_POLL_INTERVAL,
            logger: Arc::new(NoopLogger),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn ContractLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn definition(&self) -> &ContractDefinition {
        &self.definition
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn gas(&self) -> u64 {
        self.gas
    }

    pub(crate) fn provider(&self) -> &Arc<dyn ContractProvider> {
        &self.provider
    }

    pub(crate) fn logger(&self) -> &Arc<dyn ContractLogger> {
        &self.logger
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Sending account and gas, with per-call overrides applied.
    pub(crate) fn resolve_options(&self, options: &TransactionOptions) -> (String, u64) {
        (
            options.account.clone().unwrap_or_else(|| self.account.clone()),
            options.gas.unwrap_or(self.gas),
        )
    }

    fn method_descriptor(&self, method: &str) -> Result<Option<&AbiEntry>, ContractError> {
        self.logger
            .debug(&format!("Get descriptor for method: {} ...", method));
        self.definition.resolve_method(method)
    }

    pub(crate) fn require_method(&self, method: &str) -> Result<&AbiEntry, ContractError> {
        self.method_descriptor(method)?
            .ok_or_else(|| ContractError::MethodNotFound(method.to_string()))
    }

    /// Orders and converts named arguments following the method's ABI inputs.
    ///
    /// A `"constructor"` without an ABI entry is the implicit constructor and
    /// takes no arguments.
    pub fn sanitize_arguments(
        &self,
        method: &str,
        args: &ArgumentMap,
    ) -> Result<Vec<WireValue>, ContractError> {
        self.logger.debug(&format!(
            "Sanitize {} arguments for method: {} ...",
            args.len(),
            method
        ));

        let entry = match self.method_descriptor(method)? {
            Some(entry) => entry,
            None if method == "constructor" => {
                self.logger
                    .debug("Built-in constructor, so no default arguments.");
                return Ok(Vec::new());
            }
            None => return Err(ContractError::MethodNotFound(method.to_string())),
        };

        let mut wire_args = Vec::with_capacity(entry.inputs.len());
        for input in &entry.inputs {
            let value = args
                .get(&input.name)
                .ok_or_else(|| ContractError::MissingArgument {
                    method: method.to_string(),
                    argument: input.name.clone(),
                })?;

            self.logger.debug(&format!(
                "Convert input value {} to type {} ...",
                value, input.ty
            ));
            let wire = convert::to_wire_value(value, &input.ty, self.provider.as_ref()).map_err(
                |source| ContractError::ArgumentConversion {
                    method: method.to_string(),
                    argument: input.name.clone(),
                    source,
                },
            )?;
            wire_args.push(wire);
        }

        if let Some(unexpected) = args
            .keys()
            .find(|key| !entry.inputs.iter().any(|input| &input.name == *key))
        {
            return Err(ContractError::UnexpectedArgument {
                method: method.to_string(),
                argument: unexpected.clone(),
            });
        }

        Ok(wire_args)
    }

    /// Converts raw return data following the method's ABI outputs.
    ///
    /// Raw values are consumed in output order. Missing ones become `null`,
    /// surplus ones are dropped. A scalar input yields a scalar result.
    pub fn sanitize_return_values(&self, method: &str, raw: Value) -> Result<Value, ContractError> {
        let is_sequence = raw.is_array();
        let mut cursor: VecDeque<Value> = match raw {
            Value::Array(values) => values.into(),
            scalar => VecDeque::from([scalar]),
        };

        self.logger.debug(&format!(
            "Sanitize {} return values from method: {} ...",
            cursor.len(),
            method
        ));

        let entry = self.require_method(method)?;

        let mut converted = Vec::with_capacity(entry.outputs.len());
        for output in &entry.outputs {
            let value = match cursor.pop_front() {
                Some(value) => convert::from_wire_value(&value, &output.ty, self.provider.as_ref())
                    .map_err(|source| ContractError::ReturnConversion {
                        method: method.to_string(),
                        output: if output.name.is_empty() {
                            output.ty.clone()
                        } else {
                            output.name.clone()
                        },
                        source,
                    })?,
                None => Value::Null,
            };
            converted.push(value);
        }

        if is_sequence {
            Ok(Value::Array(converted))
        } else {
            Ok(converted.into_iter().next().unwrap_or(Value::Null))
        }
    }

    /// Deploys a new instance and waits until its address is known.
    ///
    /// Argument errors surface before anything is sent. The provider first
    /// reports the creation transaction hash, then the address; only the
    /// address completes the deployment.
    pub async fn deploy(
        self: &Arc<Self>,
        args: &ArgumentMap,
        options: TransactionOptions,
    ) -> Result<ContractInstance, ContractError> {
        let (account, gas) = self.resolve_options(&options);
        self.logger
            .info(&format!("Deploy contract from account {}...", account));

        let wire_args = self.sanitize_arguments("constructor", args)?;
        let constructor_inputs = self
            .method_descriptor("constructor")?
            .map(|entry| entry.inputs.clone())
            .unwrap_or_default();

        self.logger.debug("Deploy contract ...");
        let request = DeployRequest {
            constructor_inputs,
            args: wire_args,
            bytecode: self.definition.bytecode().to_string(),
            gas,
            from: account,
        };

        let mut events = self.provider.deploy_contract(request).await.map_err(|e| {
            self.logger.error(&format!("Contract creation error: {}", e));
            e
        })?;

        while let Some(event) = events.recv().await {
            match event {
                Err(e) => {
                    self.logger.error(&format!("Contract creation error: {}", e));
                    return Err(e.into());
                }
                Ok(DeployEvent::TransactionSubmitted { hash }) => {
                    self.logger
                        .debug(&format!("New contract transaction: {}", hash));
                }
                Ok(DeployEvent::ContractCreated { address }) if address.is_empty() => {
                    self.logger
                        .debug("Contract creation reported without an address yet");
                }
                Ok(DeployEvent::ContractCreated { address }) => {
                    self.logger
                        .info(&format!("New contract address: {}", address));
                    return Ok(self.at(address));
                }
            }
        }

        Err(ProviderError::new("Deployment finished without reporting a contract address").into())
    }

    /// Binds an instance to a contract that is already deployed.
    pub fn at(self: &Arc<Self>, address: impl Into<String>) -> ContractInstance {
        ContractInstance::new(Arc::clone(self), address)
    }
}

impl std::fmt::Debug for Contract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contract")
            .field("account", &self.account)
            .field("gas", &self.gas)
            .field("poll_interval", &self.poll_interval)
            .field("abi_entries", &self.definition.abi().len())
            .finish()
    }
}
