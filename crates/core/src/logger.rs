//! Logging abstraction for active-context.
//!
//! Provides a [`Logger`] trait that can be implemented to route resolver
//! diagnostics elsewhere, along with a default [`TracingLogger`] that
//! delegates to the [`tracing`] crate.

use std::fmt;
use std::sync::Arc;

/// Sink for resolver diagnostics.
///
/// Swallowed lookup failures are reported through `warn`, so a logger that
/// records warnings is enough to observe degraded resolution:
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use active_context_core::config::ContextConfig;
/// use active_context_core::logger::Logger;
///
/// #[derive(Default)]
/// struct Collect(Mutex<Vec<String>>);
///
/// impl Logger for Collect {
///     fn info(&self, _: &str) {}
///     fn warn(&self, message: &str) {
///         self.0.lock().unwrap().push(message.to_string());
///     }
///     fn error(&self, _: &str) {}
///     fn debug(&self, _: &str) {}
/// }
///
/// let config = ContextConfig::new().logger(Arc::new(Collect::default()));
/// config.logger.warn("organization lookup failed");
/// ```
pub trait Logger: Send + Sync {
    fn info(&self, message: &str);

    fn warn(&self, message: &str);

    fn error(&self, message: &str);

    fn debug(&self, message: &str);
}

impl fmt::Debug for dyn Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Logger")
    }
}

/// Forwards to `tracing` under the `active_context` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(target: "active_context", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "active_context", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "active_context", "{}", message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!(target: "active_context", "{}", message);
    }
}

pub fn default_logger() -> Arc<dyn Logger> {
    Arc::new(TracingLogger)
}
