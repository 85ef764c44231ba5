//! # Palaver
//!
//! Intent-routed webhooks for conversational NLU payloads.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────┐     ┌────────────────────────────────────┐
//! │   Runtime   │────▶│ Endpoint │────▶│ Route #1 (intent + entities) ──▶ ✗ │
//! │ (HTTP POST) │     │          │────▶│ Route #2 (intent + entities) ──▶ ✓ │──▶ Response
//! └─────────────┘     └──────────┘     │ Route #3 (not tried)               │
//!                                      └────────────────────────────────────┘
//! ```
//!
//! - **Runtime**: configuration, logging, HTTP serving, graceful shutdown
//! - **Endpoint**: parses the payload and walks one handler chain
//! - **Routes**: requirements plus an async handler (Axum-style extractors);
//!   a route that declines or fails hands over to the next one
//! - **Response**: finalized with an emoji-free `speakText` before it is sent
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use palaver::prelude::*;
//!
//! async fn greet() -> Response {
//!     Response::text("Hello! 👋")
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = PalaverRuntime::new();
//!     runtime.register("/greet", HandlerChain::new().with(on_intent("greet", greet)))?;
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use palaver_core as core;
pub use palaver_framework as framework;
pub use palaver_runtime as runtime;
pub use palaver_transport as transport;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use palaver::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use palaver_runtime::{PalaverConfig, PalaverRuntime};

    // Request and response types
    pub use palaver_core::{
        EntityMap, InboundRequest, RequestView, Response, ResponseKind, WitEntity,
    };

    // Chains and routes
    pub use palaver_framework::{
        EntityRequirement, HandlerChain, Requirements, Route, on_intent, route,
    };

    // Extractors - for handler parameters
    pub use palaver_framework::{Entities, FromRequest, Intents, Payload};

    // Errors handlers may return or inspect
    pub use palaver_framework::{BoxError, HandlerError, MatchFailure};

    // Diagnostics
    pub use palaver_framework::{DispatchObserver, Endpoint, Reply, TracingObserver};
}
