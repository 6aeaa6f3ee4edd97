use std::sync::Arc;
use std::time::Duration;

use super::error::{ContractError, ProviderError};
use super::logger::ContractLogger;
use super::provider::ContractProvider;
use super::Receipt;

/// Delay between receipt fetches while a transaction is not yet mined.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Pending,
    Mined,
    Failed,
}

/// A submitted transaction whose receipt has not been observed yet.
///
/// [`Transaction::wait_for_receipt`] polls at a fixed interval with no upper
/// bound until the receipt appears or the provider fails. Dropping the future
/// stops polling, but the transaction itself may still be mined later.
///
/// `Mined` and `Failed` are final: once reached, waiting again replays the
/// recorded outcome without contacting the provider.
pub struct Transaction {
    hash: String,
    outcome: Option<Result<Receipt, ProviderError>>,
    provider: Arc<dyn ContractProvider>,
    logger: Arc<dyn ContractLogger>,
    poll_interval: Duration,
}

impl Transaction {
    pub fn new(
        hash: String,
        provider: Arc<dyn ContractProvider>,
        logger: Arc<dyn ContractLogger>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            hash,
            outcome: None,
            provider,
            logger,
            poll_interval,
        }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn state(&self) -> TransactionState {
        match &self.outcome {
            None => TransactionState::Pending,
            Some(Ok(_)) => TransactionState::Mined,
            Some(Err(_)) => TransactionState::Failed,
        }
    }

    pub async fn wait_for_receipt(&mut self) -> Result<Receipt, ContractError> {
        loop {
            match &self.outcome {
                Some(Ok(receipt)) => return Ok(receipt.clone()),
                Some(Err(e)) => {
                    return Err(ContractError::ReceiptPoll {
                        hash: self.hash.clone(),
                        source: e.clone(),
                    })
                }
                None => {}
            }

            self.logger
                .debug(&format!("Fetch receipt for tx {} ...", self.hash));

            match self.provider.get_transaction_receipt(&self.hash).await {
                Ok(Some(receipt)) => self.outcome = Some(Ok(receipt)),
                Ok(None) => tokio::time::sleep(self.poll_interval).await,
                Err(e) => {
                    self.logger.error(&format!(
                        "Transaction receipt error for tx {}: {}",
                        self.hash, e
                    ));
                    self.outcome = Some(Err(e));
                }
            }
        }
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("hash", &self.hash)
            .field("state", &self.state())
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ethereum::logger::NoopLogger;
    use crate::ethereum::provider::MockContractProvider;
    use crate::ethereum::testing::{expect_receipts, mock_provider};
    use serde_json::json;
    use tokio::time::Instant;

    fn transaction(provider: MockContractProvider) -> Transaction {
        Transaction::new(
            "0xAA".to_string(),
            Arc::new(provider),
            Arc::new(NoopLogger),
            DEFAULT_POLL_INTERVAL,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_mined() {
        let receipt = json!({"transactionHash": "0xAA", "status": "0x1"});
        let mut provider = mock_provider();
        expect_receipts(
            &mut provider,
            vec![Ok(None), Ok(None), Ok(Some(receipt.clone()))],
        );
        let mut tx = transaction(provider);
        assert_eq!(tx.state(), TransactionState::Pending);

        let started = Instant::now();
        let result = tx.wait_for_receipt().await.unwrap();

        assert_eq!(result, receipt);
        assert_eq!(tx.state(), TransactionState::Mined);
        assert!(started.elapsed() >= 2 * DEFAULT_POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_fetch_is_immediate() {
        let mut provider = mock_provider();
        expect_receipts(&mut provider, vec![Ok(Some(json!({"status": "0x1"})))]);
        let mut tx = transaction(provider);

        let started = Instant::now();
        tx.wait_for_receipt().await.unwrap();
        assert!(started.elapsed() < DEFAULT_POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_is_terminal_and_names_transaction() {
        let mut provider = mock_provider();
        expect_receipts(&mut provider, vec![Err(ProviderError::new("timeout"))]);
        let mut tx = transaction(provider);

        let err = tx.wait_for_receipt().await.unwrap_err();
        assert_eq!(err.transaction_hash(), Some("0xAA"));
        assert!(err.to_string().contains("0xAA"));
        assert!(err.to_string().contains("timeout"));
        assert_eq!(tx.state(), TransactionState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_transaction_is_not_polled_again() {
        // exactly one fetch is expected
        let mut provider = mock_provider();
        expect_receipts(&mut provider, vec![Err(ProviderError::new("timeout"))]);
        let mut tx = transaction(provider);

        assert!(tx.wait_for_receipt().await.is_err());
        let err = tx.wait_for_receipt().await.unwrap_err();

        assert!(matches!(err, ContractError::ReceiptPoll { .. }));
        assert_eq!(tx.state(), TransactionState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mined_transaction_replays_receipt() {
        let receipt = json!({"status": "0x1"});
        let mut provider = mock_provider();
        expect_receipts(&mut provider, vec![Ok(Some(receipt.clone()))]);
        let mut tx = transaction(provider);

        assert_eq!(tx.wait_for_receipt().await.unwrap(), receipt);
        assert_eq!(tx.wait_for_receipt().await.unwrap(), receipt);
        assert_eq!(tx.state(), TransactionState::Mined);
    }
}
