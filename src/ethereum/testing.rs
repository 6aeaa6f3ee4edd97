//! Fixtures shared by the unit tests: a token ABI and a mocked provider.

use tokio::sync::mpsc;

use super::error::ProviderError;
use super::provider::{DeployEvent, DeployEvents, MockContractProvider};
use super::{utils, Receipt};

pub(crate) const OWNER: &str = "0x1111111111111111111111111111111111111111";
pub(crate) const RECIPIENT: &str = "0x742D35cc6435C9c1c72C5e7b18bAb7E1DB7A5D6E";

pub(crate) const TOKEN_ABI: &str = r#"[
    {"type": "constructor", "inputs": [{"name": "supply", "type": "uint256"}]},
    {"name": "transfer", "type": "function",
     "inputs": [{"name": "to", "type": "address"}, {"name": "amount", "type": "uint256"}],
     "outputs": [{"name": "", "type": "bool"}]},
    {"name": "balanceOf", "type": "function",
     "inputs": [{"name": "owner", "type": "address"}],
     "outputs": [{"name": "balance", "type": "uint256"}]},
    {"name": "stats", "type": "function", "inputs": [],
     "outputs": [{"name": "count", "type": "uint64"}, {"name": "active", "type": "bool"}]},
    {"name": "Transfer", "type": "event",
     "inputs": [{"name": "from", "type": "address"}, {"name": "to", "type": "address"}]}
]"#;

/// Mocked provider whose address, hex and unit helpers behave like the real
/// one. RPC methods carry no expectations, so any request fails the test.
pub(crate) fn mock_provider() -> MockContractProvider {
    let mut provider = MockContractProvider::new();
    provider
        .expect_is_valid_address()
        .returning(|value| utils::validate_address(value).is_ok());
    provider.expect_to_hex().returning(|value| utils::to_hex(value));
    provider
        .expect_convert_from_base_unit()
        .returning(|value, unit| utils::from_base_unit(value, unit));
    provider
}

/// Deployment stream that yields `events` and then ends.
pub(crate) fn deploy_stream(events: Vec<Result<DeployEvent, ProviderError>>) -> DeployEvents {
    let (sender, receiver) = mpsc::channel(events.len().max(1));
    for event in events {
        sender.try_send(event).unwrap();
    }
    receiver
}

/// Expects exactly one receipt fetch per reply, answered in order.
pub(crate) fn expect_receipts(
    provider: &mut MockContractProvider,
    replies: Vec<Result<Option<Receipt>, ProviderError>>,
) {
    let count = replies.len();
    let mut replies = replies.into_iter();
    provider
        .expect_get_transaction_receipt()
        .times(count)
        .returning(move |_| {
            let reply = replies.next().unwrap();
            Box::pin(async move { reply })
        });
}
