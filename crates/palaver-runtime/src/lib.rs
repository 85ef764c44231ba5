//! Palaver Runtime - Orchestration layer for Palaver webhook services.
//!
//! This crate provides:
//! - Layered configuration (`PalaverConfig`, `ConfigLoader`)
//! - Logging setup (`LoggingBuilder`, `init_from_config`)
//! - Runtime orchestration (`PalaverRuntime`): route registration, HTTP
//!   serving and graceful shutdown
//!
//! ```ignore
//! use palaver_runtime::PalaverRuntime;
//! use palaver_framework::{HandlerChain, on_intent};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = PalaverRuntime::new();
//!
//!     runtime.register("/greet", HandlerChain::new().with(on_intent("greet", greet)))?;
//!
//!     // Run until Ctrl+C
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{
    ConfigError, ConfigLoader, ConfigResult, LoggingConfig, PalaverConfig, ServerConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, LoggingError, SpanEvents, init_from_config};
pub use runtime::{PalaverRuntime, RuntimeBuilder, join_path, shutdown_signal};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
