//! Dispatch entry point.
//!
//! An [`Endpoint`] owns one [`HandlerChain`] and turns raw request bodies
//! into a transport-level [`Reply`]:
//!
//! ```text
//! body ──parse──▶ payload ──extract──▶ InboundRequest ──chain──▶ Response ──finalize──▶ Reply::Success
//!        │                   │                          │
//!        └───────────────────┴──────────────────────────┴──────────────────────────────▶ Reply::ServerError
//! ```
//!
//! Every failure collapses into the same detail-free [`Reply::ServerError`];
//! the cause only goes to the [`DispatchObserver`].
//!
//! `Endpoint` also implements `tower::Service<Value>`, so tower middleware
//! can be layered on top of it.

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};

use serde_json::Value;
use tower::Service;

use crate::chain::HandlerChain;
use crate::error::{DispatchError, DispatchResult};
use crate::finalize::finalize;
use crate::handler::BoxFuture;
use crate::observer::{DispatchObserver, TracingObserver};
use palaver_core::{ExtractError, InboundRequest, Response};

/// Transport-level outcome of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A finalized response to serialize as the body.
    Success(Response),
    /// A generic server failure with no body.
    ServerError,
}

impl Reply {
    /// HTTP status code for this reply.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Success(_) => 200,
            Self::ServerError => 500,
        }
    }

    /// Returns `true` for [`Reply::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the response, if any.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Success(response) => Some(response),
            Self::ServerError => None,
        }
    }
}

/// The externally invokable entry point for one handler chain.
///
/// Cheap to clone: the chain and the observer are shared.
#[derive(Clone)]
pub struct Endpoint {
    chain: Arc<HandlerChain>,
    observer: Arc<dyn DispatchObserver>,
}

impl Endpoint {
    /// Creates an endpoint that reports through [`TracingObserver`].
    pub fn new(chain: HandlerChain) -> Self {
        Self {
            chain: Arc::new(chain),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replaces the observer.
    pub fn with_observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the handler chain.
    pub fn chain(&self) -> &HandlerChain {
        &self.chain
    }

    /// Handles a raw request body.
    pub async fn handle(&self, body: &[u8]) -> Reply {
        match serde_json::from_slice::<Value>(body) {
            Ok(payload) => self.handle_value(payload).await,
            Err(err) => {
                let raw = String::from_utf8_lossy(body).into_owned();
                self.observer.request_received(&Value::String(raw));
                self.fail(DispatchError::Extract(ExtractError::from(err)))
            }
        }
    }

    /// Handles an already-parsed payload.
    pub async fn handle_value(&self, payload: Value) -> Reply {
        self.observer.request_received(&payload);

        match self.dispatch(payload).await {
            Ok(response) => Reply::Success(response),
            Err(err) => self.fail(err),
        }
    }

    /// Extracts, dispatches and finalizes, keeping the error detail.
    pub async fn dispatch(&self, payload: Value) -> DispatchResult<Response> {
        let request = InboundRequest::from_value(payload)?;
        let response = self.chain.dispatch(&request, self.observer.as_ref()).await?;
        Ok(finalize(response))
    }

    fn fail(&self, err: DispatchError) -> Reply {
        self.observer.dispatch_failed(&err);
        Reply::ServerError
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

impl Service<Value> for Endpoint {
    type Response = Reply;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Reply, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, payload: Value) -> Self::Future {
        let endpoint = self.clone();

        Box::pin(async move { Ok(endpoint.handle_value(payload).await) })
    }
}
