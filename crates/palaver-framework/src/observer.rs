//! Diagnostics hooks for dispatch.
//!
//! The chain and the entry point report what happens to a request through a
//! [`DispatchObserver`] instead of logging directly. [`TracingObserver`] is
//! the default and forwards everything to `tracing`.

use std::fmt;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{DispatchError, HandlerError};

/// Identifies one handler attempt within a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt<'a> {
    /// 1-based position of the handler in its chain.
    pub ordinal: usize,
    /// Route name, if one was given.
    pub name: Option<&'a str>,
}

impl fmt::Display for Attempt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "#{} ({})", self.ordinal, name),
            None => write!(f, "#{}", self.ordinal),
        }
    }
}

/// Receives dispatch diagnostics.
///
/// Every method has an empty default body.
pub trait DispatchObserver: Send + Sync {
    /// Called with the raw payload before anything else happens.
    ///
    /// A body that is not valid JSON arrives as a JSON string holding its
    /// lossy UTF-8 rendering.
    fn request_received(&self, _payload: &Value) {}

    /// Called for every handler that declined or failed.
    fn handler_failed(&self, _attempt: &Attempt<'_>, _error: &HandlerError) {}

    /// Called once for the handler whose response is used.
    fn handler_succeeded(&self, _attempt: &Attempt<'_>) {}

    /// Called when the request ends in a server error.
    fn dispatch_failed(&self, _error: &DispatchError) {}
}

/// Forwards dispatch diagnostics to `tracing`.
///
/// Declines are logged at `debug`, handler failures at `warn` and
/// exhausted dispatches at `error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl DispatchObserver for TracingObserver {
    fn request_received(&self, payload: &Value) {
        let pretty = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
        info!(payload = %pretty, "New request received");
    }

    fn handler_failed(&self, attempt: &Attempt<'_>, error: &HandlerError) {
        if error.is_declined() {
            debug!(handler = %attempt, reason = %error, "Handler declined request");
        } else {
            warn!(handler = %attempt, error = %error, "Handler failed");
        }
    }

    fn handler_succeeded(&self, attempt: &Attempt<'_>) {
        debug!(handler = %attempt, "Handler produced response");
    }

    fn dispatch_failed(&self, error: &DispatchError) {
        error!(error = %error, "Dispatch failed");
    }
}

/// Discards all diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl DispatchObserver for NoopObserver {}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;

    /// Records diagnostics as strings for assertions.
    #[derive(Default)]
    pub(crate) struct RecordingObserver {
        pub(crate) payloads: Mutex<Vec<Value>>,
        pub(crate) failures: Mutex<Vec<(usize, String)>>,
        pub(crate) successes: Mutex<Vec<usize>>,
        pub(crate) dispatch_errors: Mutex<Vec<String>>,
    }

    impl DispatchObserver for RecordingObserver {
        fn request_received(&self, payload: &Value) {
            self.payloads.lock().push(payload.clone());
        }

        fn handler_failed(&self, attempt: &Attempt<'_>, error: &HandlerError) {
            self.failures
                .lock()
                .push((attempt.ordinal, error.to_string()));
        }

        fn handler_succeeded(&self, attempt: &Attempt<'_>) {
            self.successes.lock().push(attempt.ordinal);
        }

        fn dispatch_failed(&self, error: &DispatchError) {
            self.dispatch_errors.lock().push(error.to_string());
        }
    }
}
