use serde_json::Value;
use std::sync::Arc;

use super::contract::Contract;
use super::error::ContractError;
use super::logger::{ContractLogger, PrefixedLogger};
use super::provider::{CallRequest, SendRequest};
use super::transaction::Transaction;
use super::{ArgumentMap, Receipt, TransactionOptions};

/// A deployed contract at a fixed address.
#[derive(Clone)]
pub struct ContractInstance {
    contract: Arc<Contract>,
    address: String,
    logger: Arc<dyn ContractLogger>,
}

impl ContractInstance {
    pub fn new(contract: Arc<Contract>, address: impl Into<String>) -> Self {
        let address = address.into();
        let logger = Arc::new(PrefixedLogger::new(contract.logger().clone(), &address));
        Self {
            contract,
            address,
            logger,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn contract(&self) -> &Arc<Contract> {
        &self.contract
    }

    /// Calls a method without submitting a transaction and returns its
    /// converted result.
    pub async fn local_call(&self, method: &str, args: &ArgumentMap) -> Result<Value, ContractError> {
        self.logger.info(&format!("Local call {} ...", method));

        let wire_args = self.contract.sanitize_arguments(method, args)?;
        let entry = self.contract.require_method(method)?;

        let raw = self
            .contract
            .provider()
            .call(CallRequest {
                to: self.address.clone(),
                from: self.contract.account().to_string(),
                method: entry.clone(),
                args: wire_args,
            })
            .await
            .map_err(|e| {
                self.logger.error(&format!("Local call error: {}", e));
                e
            })?;

        self.contract.sanitize_return_values(method, raw)
    }

    /// Submits a state-changing call and returns the pending transaction
    /// without waiting for it to be mined.
    pub async fn submit_call(
        &self,
        method: &str,
        args: &ArgumentMap,
        options: TransactionOptions,
    ) -> Result<Transaction, ContractError> {
        let (account, gas) = self.contract.resolve_options(&options);
        self.logger.info(&format!(
            "Call method {} from account {}...",
            method, account
        ));

        let wire_args = self.contract.sanitize_arguments(method, args)?;
        let entry = self.contract.require_method(method)?;

        self.logger.debug(&format!("Execute method {} ...", method));
        let hash = self
            .contract
            .provider()
            .send_transaction(SendRequest {
                to: self.address.clone(),
                from: account,
                gas,
                method: entry.clone(),
                args: wire_args,
            })
            .await
            .map_err(|e| {
                self.logger.error(&format!("Method call error: {}", e));
                e
            })?;

        Ok(Transaction::new(
            hash,
            self.contract.provider().clone(),
            self.logger.clone(),
            self.contract.poll_interval(),
        ))
    }

    /// Submits a state-changing call and waits for its receipt.
    ///
    /// If the receipt poll fails, the transaction may still be mined; the
    /// returned [`ContractError::ReceiptPoll`] carries the hash so the caller
    /// can follow up.
    pub async fn send_call(
        &self,
        method: &str,
        args: &ArgumentMap,
        options: TransactionOptions,
    ) -> Result<Receipt, ContractError> {
        let mut transaction = self.submit_call(method, args, options).await?;
        transaction.wait_for_receipt().await
    }
}

impl std::fmt::Debug for ContractInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractInstance")
            .field("address", &self.address)
            .field("contract", &self.contract)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ethereum::abi::ContractDefinition;
    use crate::ethereum::convert::WireValue;
    use crate::ethereum::error::ProviderError;
    use crate::ethereum::logger::tests::RecordingLogger;
    use crate::ethereum::provider::MockContractProvider;
    use crate::ethereum::testing::{expect_receipts, mock_provider, OWNER, RECIPIENT, TOKEN_ABI};
    use crate::ethereum::transaction::TransactionState;
    use alloy::primitives::U256;
    use serde_json::json;
    use std::time::Duration;

    const TOKEN: &str = "0x2222222222222222222222222222222222222222";

    fn instance_with(provider: MockContractProvider) -> ContractInstance {
        let definition = ContractDefinition::new(TOKEN_ABI, "0x6080").unwrap();
        let contract = Arc::new(
            Contract::new(definition, Arc::new(provider), OWNER, 300_000)
                .with_poll_interval(Duration::from_millis(10)),
        );
        contract.at(TOKEN)
    }

    fn args(value: Value) -> ArgumentMap {
        value.as_object().cloned().unwrap()
    }

    fn expect_transfer_sent(provider: &mut MockContractProvider, hash: &'static str) {
        provider
            .expect_send_transaction()
            .withf(|request| {
                request.to == TOKEN
                    && request.from == OWNER
                    && request.gas == 300_000
                    && request.args
                        == vec![
                            WireValue::Address(RECIPIENT.to_string()),
                            WireValue::Uint(U256::from(5u64)),
                        ]
            })
            .times(1)
            .returning(move |_| Box::pin(async move { Ok(hash.to_string()) }));
    }

    #[tokio::test]
    async fn test_local_call_converts_result() {
        let mut provider = mock_provider();
        provider
            .expect_call()
            .withf(|request| {
                request.to == TOKEN
                    && request.from == OWNER
                    && request.method.name == "balanceOf"
                    && request.args == vec![WireValue::Address(RECIPIENT.to_string())]
            })
            .times(1)
            .returning(|_| Box::pin(async { Ok(json!("42")) }));

        let balance = instance_with(provider)
            .local_call("balanceOf", &args(json!({"owner": RECIPIENT})))
            .await
            .unwrap();
        assert_eq!(balance, json!(42));
    }

    #[tokio::test]
    async fn test_local_call_provider_error_is_unwrapped() {
        let mut provider = mock_provider();
        provider
            .expect_call()
            .times(1)
            .returning(|_| Box::pin(async { Err(ProviderError::new("execution reverted")) }));

        let err = instance_with(provider)
            .local_call("stats", &ArgumentMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::Provider(e) if e.message == "execution reverted"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_call_polls_once_then_resolves() {
        let receipt = json!({"transactionHash": "0xAA", "blockNumber": "0x10", "status": "0x1"});
        let mut provider = mock_provider();
        expect_transfer_sent(&mut provider, "0xAA");
        expect_receipts(&mut provider, vec![Ok(None), Ok(Some(receipt.clone()))]);

        let result = instance_with(provider)
            .send_call(
                "transfer",
                &args(json!({"to": RECIPIENT, "amount": 5})),
                TransactionOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(result, receipt);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_call_receipt_error_carries_hash() {
        let mut provider = mock_provider();
        expect_transfer_sent(&mut provider, "0xAA");
        expect_receipts(&mut provider, vec![Err(ProviderError::new("timeout"))]);

        let err = instance_with(provider)
            .send_call(
                "transfer",
                &args(json!({"to": RECIPIENT, "amount": 5})),
                TransactionOptions::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.transaction_hash(), Some("0xAA"));
        assert!(err.to_string().contains("0xAA"));
        assert!(matches!(
            err,
            ContractError::ReceiptPoll { source, .. } if source.message == "timeout"
        ));
    }

    #[tokio::test]
    async fn test_submit_call_uses_overrides() {
        let mut provider = mock_provider();
        provider
            .expect_send_transaction()
            .withf(|request| request.from == RECIPIENT && request.gas == 21_000)
            .times(1)
            .returning(|_| Box::pin(async { Ok("0xBB".to_string()) }));
        provider.expect_get_transaction_receipt().never();

        let tx = instance_with(provider)
            .submit_call(
                "transfer",
                &args(json!({"to": RECIPIENT, "amount": "0x10"})),
                TransactionOptions::default()
                    .with_account(RECIPIENT)
                    .with_gas(21_000),
            )
            .await
            .unwrap();

        assert_eq!(tx.hash(), "0xBB");
        assert_eq!(tx.state(), TransactionState::Pending);
    }

    #[tokio::test]
    async fn test_send_call_marshalling_fails_before_network() {
        let mut provider = mock_provider();
        provider.expect_send_transaction().never();
        provider.expect_get_transaction_receipt().never();
        let instance = instance_with(provider);

        let err = instance
            .send_call(
                "transfer",
                &args(json!({"to": "nowhere", "amount": 1})),
                TransactionOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::ArgumentConversion { .. }));

        let err = instance
            .send_call("mint", &ArgumentMap::new(), TransactionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::MethodNotFound(_)));
    }

    #[tokio::test]
    async fn test_send_error_is_reported() {
        let mut provider = mock_provider();
        provider
            .expect_send_transaction()
            .times(1)
            .returning(|_| Box::pin(async { Err(ProviderError::new("insufficient funds")) }));
        provider.expect_get_transaction_receipt().never();

        let err = instance_with(provider)
            .send_call(
                "transfer",
                &args(json!({"to": RECIPIENT, "amount": 1})),
                TransactionOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::Provider(_)));
    }

    #[tokio::test]
    async fn test_instance_logs_with_address_prefix() {
        let recorder = Arc::new(RecordingLogger::default());
        let definition = ContractDefinition::new(TOKEN_ABI, "0x").unwrap();
        let mut provider = mock_provider();
        provider
            .expect_call()
            .returning(|_| Box::pin(async { Ok(json!(["1", false])) }));
        let contract = Arc::new(
            Contract::new(definition, Arc::new(provider), OWNER, 1).with_logger(recorder.clone()),
        );

        let stats = contract
            .at(TOKEN)
            .local_call("stats", &ArgumentMap::new())
            .await
            .unwrap();
        assert_eq!(stats, json!([1, false]));

        let lines = recorder.lines.lock().unwrap();
        assert_eq!(
            lines.first(),
            Some(&("info", format!("[{}]: Local call stats ...", TOKEN)))
        );
    }
}
