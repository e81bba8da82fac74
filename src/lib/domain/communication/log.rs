//! Delivery diagnostics

#[cfg(test)]
use mockall::mock;
use tracing::{error, info, warn};

/// Category attached to every delivery diagnostic
pub const LOG_CATEGORY: &str = "mandrill";

/// Sink for delivery diagnostics.
///
/// Implementations must not fail or panic; a diagnostic that cannot be
/// written is dropped.
pub trait DeliveryLog: Send + Sync + 'static {
    /// Records an informational event
    fn info(&self, category: &str, message: &str);

    /// Records a warning
    fn warning(&self, category: &str, message: &str);

    /// Records an error
    fn error(&self, category: &str, message: &str);
}

#[cfg(test)]
mock! {
    pub DeliveryLog {}

    impl DeliveryLog for DeliveryLog {
        fn info(&self, category: &str, message: &str);
        fn warning(&self, category: &str, message: &str);
        fn error(&self, category: &str, message: &str);
    }
}

/// Writes delivery diagnostics as `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDeliveryLog;

impl DeliveryLog for TracingDeliveryLog {
    fn info(&self, category: &str, message: &str) {
        info!(category, "{}", message);
    }

    fn warning(&self, category: &str, message: &str) {
        warn!(category, "{}", message);
    }

    fn error(&self, category: &str, message: &str) {
        error!(category, "{}", message);
    }
}
