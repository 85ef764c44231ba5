//! Handler system for the Palaver framework.
//!
//! Handlers are plain async functions. Their parameters are pulled out of
//! the request through [`FromRequest`] extractors and their return value is
//! turned into a [`HandlerResult`] through [`IntoHandlerResult`], much like
//! Axum handlers.
//!
//! # Example
//!
//! ```rust,ignore
//! use palaver_framework::{Entities, Intents, Payload};
//!
//! // No parameters, infallible
//! async fn hello() -> Response {
//!     Response::text("Hello!")
//! }
//!
//! // Extractors, fallible
//! async fn weather(entities: Entities) -> Result<Response, BoxError> {
//!     let city = entities.first("location").ok_or("no location")?;
//!     Ok(Response::text(format!("Sunny in {}", city.value)))
//! }
//!
//! // Untyped JSON output is validated before it is accepted
//! async fn legacy(_: Payload, _: Intents, _: Entities) -> serde_json::Value {
//!     serde_json::json!({ "text": "Hi", "type": 1 })
//! }
//! ```
//!
//! Stateful handlers can implement [`ErasedHandler`] directly.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{BoxError, HandlerError};
use crate::extractor::FromRequest;
use palaver_core::{InboundRequest, Response};

/// A type alias for a boxed, pinned future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The outcome of running one handler.
pub type HandlerResult = Result<Response, HandlerError>;

// ============================================================================
// IntoHandlerResult - Normalize handler output
// ============================================================================

/// Conversion from a handler's return value into a [`HandlerResult`].
pub trait IntoHandlerResult {
    /// Performs the conversion.
    fn into_handler_result(self) -> HandlerResult;
}

impl IntoHandlerResult for Response {
    fn into_handler_result(self) -> HandlerResult {
        Ok(self)
    }
}

/// JSON output must have the response shape.
impl IntoHandlerResult for Value {
    fn into_handler_result(self) -> HandlerResult {
        serde_json::from_value(self).map_err(|e| HandlerError::MalformedOutput(e.to_string()))
    }
}

/// `None` means the handler produced nothing.
impl<T: IntoHandlerResult> IntoHandlerResult for Option<T> {
    fn into_handler_result(self) -> HandlerResult {
        match self {
            Some(output) => output.into_handler_result(),
            None => Err(HandlerError::MalformedOutput(
                "handler returned no response".to_string(),
            )),
        }
    }
}

/// Errors are wrapped as execution failures, except a [`HandlerError`]
/// which is kept as is.
impl<T, E> IntoHandlerResult for Result<T, E>
where
    T: IntoHandlerResult,
    E: Into<BoxError>,
{
    fn into_handler_result(self) -> HandlerResult {
        match self {
            Ok(output) => output.into_handler_result(),
            Err(err) => Err(match err.into().downcast::<HandlerError>() {
                Ok(handler_err) => *handler_err,
                Err(other) => HandlerError::Failed(other),
            }),
        }
    }
}

// ============================================================================
// Handler Trait
// ============================================================================

/// The core trait for request handlers.
///
/// Automatically implemented for async functions that take up to four
/// [`FromRequest`] parameters and return an [`IntoHandlerResult`] value.
pub trait Handler<T>: Clone + Send + Sync + 'static {
    /// The type of future calling this handler returns.
    type Future: Future<Output = HandlerResult> + Send + 'static;

    /// Calls the handler with the given request.
    fn call(self, req: InboundRequest) -> Self::Future;
}

impl<F, Fut, R> Handler<()> for F
where
    F: FnOnce() -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHandlerResult,
{
    type Future = BoxFuture<'static, HandlerResult>;

    fn call(self, _req: InboundRequest) -> Self::Future {
        Box::pin(async move { (self)().await.into_handler_result() })
    }
}

macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case)]
        impl<F, Fut, R, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            R: IntoHandlerResult,
            $( $ty: FromRequest + Send + 'static, )*
        {
            type Future = BoxFuture<'static, HandlerResult>;

            fn call(self, req: InboundRequest) -> Self::Future {
                Box::pin(async move {
                    $(
                        let $ty = $ty::from_request(&req)?;
                    )*

                    (self)($($ty,)*).await.into_handler_result()
                })
            }
        }
    };
}

impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);

// ============================================================================
// Type erasure
// ============================================================================

/// A wrapper that stores a handler function together with its parameter
/// marker.
pub struct HandlerFn<F, T> {
    f: F,
    _marker: PhantomData<fn() -> T>,
}

impl<F, T> HandlerFn<F, T> {
    /// Creates a new handler function wrapper.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<F: Clone, T> Clone for HandlerFn<F, T> {
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            _marker: PhantomData,
        }
    }
}

/// Type-erased handler trait for dynamic dispatch.
#[async_trait]
pub trait ErasedHandler: Send + Sync {
    /// Runs the handler against the given request.
    async fn run(&self, req: InboundRequest) -> HandlerResult;
}

#[async_trait]
impl<F, T> ErasedHandler for HandlerFn<F, T>
where
    F: Handler<T>,
    T: 'static,
{
    async fn run(&self, req: InboundRequest) -> HandlerResult {
        self.f.clone().call(req).await
    }
}

/// A type-erased handler that can be stored in collections.
pub type BoxedHandler = Arc<dyn ErasedHandler>;

/// Converts a handler function into a boxed handler.
pub fn into_handler<F, T>(f: F) -> BoxedHandler
where
    F: Handler<T>,
    T: 'static,
{
    Arc::new(HandlerFn::new(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatchFailure;
    use crate::extractor::{Entities, Intents, Payload};
    use palaver_core::{EntityMap, RequestView, WitEntity};
    use serde_json::json;

    fn request() -> InboundRequest {
        let intents = vec![WitEntity::new("greet")];
        let entities = EntityMap::new()
            .with("intent", intents.clone())
            .with("name", vec![WitEntity::new("Ana")]);
        InboundRequest::from_parts(json!({ "id": 7 }), RequestView::new(intents, entities))
    }

    #[tokio::test]
    async fn test_handler_without_params() {
        let handler = into_handler(|| async { Response::text("Hi") });

        let response = handler.run(request()).await.unwrap();
        assert_eq!(response, Response::text("Hi"));
    }

    #[tokio::test]
    async fn test_handler_receives_extractors() {
        let handler = into_handler(
            |payload: Payload, intents: Intents, entities: Entities| async move {
                let name = entities.first("name").and_then(WitEntity::value_str);
                Response::text(format!(
                    "{} {} #{}",
                    intents[0].value_str().unwrap_or_default(),
                    name.unwrap_or_default(),
                    payload["id"]
                ))
            },
        );

        let response = handler.run(request()).await.unwrap();
        assert_eq!(response.text, "greet Ana #7");
    }

    #[tokio::test]
    async fn test_error_output_becomes_failure() {
        let handler = into_handler(|| async { Err::<Response, _>("upstream down") });

        let err = handler.run(request()).await.unwrap_err();
        assert!(matches!(err, HandlerError::Failed(e) if e.to_string() == "upstream down"));
    }

    #[tokio::test]
    async fn test_handler_error_passes_through() {
        let handler = into_handler(|| async {
            Err::<Response, _>(HandlerError::Declined(MatchFailure::EntityAbsent {
                name: "date".into(),
            }))
        });

        let err = handler.run(request()).await.unwrap_err();
        assert!(err.is_declined());
    }

    #[test]
    fn test_json_output_is_validated() {
        let ok = json!({ "text": "Hi", "type": 2 }).into_handler_result().unwrap();
        assert_eq!(ok, Response::new("Hi", 2));

        let err = json!("Hi").into_handler_result().unwrap_err();
        assert!(matches!(err, HandlerError::MalformedOutput(_)));

        let err = None::<Response>.into_handler_result().unwrap_err();
        assert!(matches!(err, HandlerError::MalformedOutput(_)));
    }

    #[test]
    fn test_call_outside_async_test() {
        let handler = into_handler(|view: RequestView| async move {
            Response::text(format!("{} intent(s)", view.intents.len()))
        });

        let response = tokio_test::block_on(handler.run(request())).unwrap();
        assert_eq!(response.text, "1 intent(s)");
    }
}
