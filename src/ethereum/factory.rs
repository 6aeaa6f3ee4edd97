use std::sync::Arc;
use std::time::Duration;

use super::abi::ContractDefinition;
use super::contract::Contract;
use super::logger::{ContractLogger, NoopLogger};
use super::provider::ContractProvider;
use super::transaction::DEFAULT_POLL_INTERVAL;

/// Builds contracts that share a provider and default sending options.
#[derive(Clone)]
pub struct ContractFactory {
    provider: Arc<dyn ContractProvider>,
    account: String,
    gas: u64,
    poll_interval: Duration,
    logger: Arc<dyn ContractLogger>,
}

impl ContractFactory {
    pub fn new(provider: Arc<dyn ContractProvider>, account: impl Into<String>, gas: u64) -> Self {
        Self {
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

    pub fn make(&self, definition: ContractDefinition) -> Arc<Contract> {
        Arc::new(
            Contract::new(
                definition,
                self.provider.clone(),
                self.account.clone(),
                self.gas,
            )
            .with_poll_interval(self.poll_interval)
            .with_logger(self.logger.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ethereum::provider::DeployEvent;
    use crate::ethereum::testing::{deploy_stream, mock_provider, OWNER, RECIPIENT, TOKEN_ABI};
    use crate::ethereum::{ArgumentMap, TransactionOptions};
    use serde_json::json;

    #[test]
    fn test_make_applies_defaults() {
        let factory = ContractFactory::new(Arc::new(mock_provider()), OWNER, 4_000_000)
            .with_poll_interval(Duration::from_millis(250));

        let contract = factory.make(ContractDefinition::new(TOKEN_ABI, "0x6080").unwrap());

        assert_eq!(contract.account(), OWNER);
        assert_eq!(contract.gas(), 4_000_000);
        assert_eq!(contract.poll_interval(), Duration::from_millis(250));
        assert_eq!(contract.definition().bytecode(), "0x6080");
    }

    #[tokio::test]
    async fn test_deploy_then_call() {
        let mut provider = mock_provider();
        provider
            .expect_deploy_contract()
            .withf(|request| request.gas == 4_000_000)
            .times(1)
            .returning(|_| {
                let events = deploy_stream(vec![
                    Ok(DeployEvent::TransactionSubmitted {
                        hash: "0xCC".to_string(),
                    }),
                    Ok(DeployEvent::ContractCreated {
                        address: RECIPIENT.to_string(),
                    }),
                ]);
                Box::pin(async move { Ok(events) })
            });
        provider
            .expect_call()
            .withf(|request| request.to == RECIPIENT)
            .times(1)
            .returning(|_| Box::pin(async { Ok(json!("1000")) }));

        let factory = ContractFactory::new(Arc::new(provider), OWNER, 4_000_000);
        let contract = factory.make(ContractDefinition::new(TOKEN_ABI, "0x6080").unwrap());

        let mut args = ArgumentMap::new();
        args.insert("supply".to_string(), json!(1000));
        let instance = contract
            .deploy(&args, TransactionOptions::default())
            .await
            .unwrap();

        let mut args = ArgumentMap::new();
        args.insert("owner".to_string(), json!(OWNER));
        let balance = instance.local_call("balanceOf", &args).await.unwrap();

        assert_eq!(balance, json!(1000));
    }
}
