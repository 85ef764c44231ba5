//! # Palaver Framework
//!
//! Request dispatch for conversational webhooks.
//!
//! This layer provides:
//! - Entity matching against handler requirements ([`Requirements`], [`EntityRequirement`])
//! - Axum-style handler functions with parameter extraction ([`Handler`], [`FromRequest`])
//! - The ordered fallback chain ([`HandlerChain`], [`Route`])
//! - Response finalization ([`finalize`])
//! - The transport-agnostic entry point ([`Endpoint`], [`Reply`])
//! - Pluggable diagnostics ([`DispatchObserver`])
//!
//! ```rust,ignore
//! use palaver_framework::{Endpoint, HandlerChain, on_intent};
//! use palaver_core::Response;
//!
//! async fn greet() -> Response {
//!     Response::text("Hi! 👋")
//! }
//!
//! let endpoint = Endpoint::new(HandlerChain::new().with(on_intent("greet", greet)));
//! let reply = endpoint.handle(body).await;
//! ```

pub mod chain;
pub mod endpoint;
pub mod error;
pub mod extractor;
pub mod finalize;
pub mod handler;
pub mod matcher;
pub mod observer;
pub mod requirement;

pub use chain::{HandlerChain, Route, on_intent, route};
pub use endpoint::{Endpoint, Reply};
pub use error::{BoxError, DispatchError, DispatchResult, HandlerError, MatchFailure};
pub use extractor::{Entities, FromRequest, Intents, Payload};
pub use finalize::finalize;
pub use handler::{
    BoxFuture, BoxedHandler, ErasedHandler, Handler, HandlerFn, HandlerResult, IntoHandlerResult,
    into_handler,
};
pub use matcher::Requirements;
pub use observer::{Attempt, DispatchObserver, NoopObserver, TracingObserver};
pub use requirement::EntityRequirement;
