use std::sync::Arc;

/// Logging capability injected into contracts.
///
/// Every method defaults to a no-op, so an implementation only overrides the
/// levels it cares about.
pub trait ContractLogger: Send + Sync {
    fn debug(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

/// Discards everything. The default for contracts built without a logger.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl ContractLogger for NoopLogger {}

/// Forwards to the `tracing` macros under the `eth_contracts` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl ContractLogger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "eth_contracts", "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "eth_contracts", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "eth_contracts", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "eth_contracts", "{}", message);
    }
}

/// Prepends `[<prefix>]: ` to every message before handing it to `inner`.
///
/// Contract instances use this so their output carries the bound address.
#[derive(Clone)]
pub struct PrefixedLogger {
    inner: Arc<dyn ContractLogger>,
    prefix: String,
}

impl PrefixedLogger {
    pub fn new(inner: Arc<dyn ContractLogger>, prefix: &str) -> Self {
        Self {
            inner,
            prefix: format!("[{}]: ", prefix),
        }
    }
}

impl ContractLogger for PrefixedLogger {
    fn debug(&self, message: &str) {
        self.inner.debug(&format!("{}{}", self.prefix, message));
    }

    fn info(&self, message: &str) {
        self.inner.info(&format!("{}{}", self.prefix, message));
    }

    fn warn(&self, message: &str) {
        self.inner.warn(&format!("{}{}", self.prefix, message));
    }

    fn error(&self, message: &str) {
        self.inner.error(&format!("{}{}", self.prefix, message));
    }
}
