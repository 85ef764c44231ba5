//! Handler chain for the Palaver framework.
//!
//! A [`HandlerChain`] is an ordered list of [`Route`]s. Each route pairs a
//! handler with the [`Requirements`] guarding it. Dispatch is a
//! chain of responsibility:
//!
//! 1. Routes are tried in registration order, one at a time
//! 2. A route whose requirements do not match is skipped
//! 3. A matching route's handler is run and awaited
//! 4. The first handler that returns a response ends the dispatch
//! 5. Handler errors, panics and malformed output are reported and skipped
//! 6. If no route is left, dispatch fails with
//!    [`DispatchError::NoHandlerMatched`]
//!
//! ```rust,ignore
//! use palaver_framework::{HandlerChain, Route, on_intent};
//!
//! let chain = HandlerChain::new()
//!     .with(on_intent("weather", weather).entity("location"))
//!     .with(on_intent("greet", greet))
//!     .with(Route::new(fallback).name("fallback"));
//! ```

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{Instrument, debug_span, trace};

use crate::error::{DispatchError, DispatchResult, HandlerError};
use crate::handler::{BoxedHandler, Handler, HandlerResult, into_handler};
use crate::matcher::Requirements;
use crate::observer::{Attempt, DispatchObserver};
use crate::requirement::EntityRequirement;
use palaver_core::{InboundRequest, Response};

/// A handler together with the requirements guarding it.
#[derive(Clone)]
pub struct Route {
    name: Option<String>,
    requirements: Requirements,
    handler: BoxedHandler,
}

impl Route {
    /// Creates a route that accepts every request.
    pub fn new<F, T>(handler: F) -> Self
    where
        F: Handler<T>,
        T: 'static,
    {
        Self::boxed(into_handler(handler))
    }

    /// Creates a route from a pre-built boxed handler.
    pub fn boxed(handler: BoxedHandler) -> Self {
        Self {
            name: None,
            requirements: Requirements::new(),
            handler,
        }
    }

    /// Sets a name used in diagnostics.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Requires the given intent.
    pub fn intent(mut self, intent: impl Into<String>) -> Self {
        self.requirements = self.requirements.intent(intent);
        self
    }

    /// Adds an entity requirement.
    pub fn entity(mut self, requirement: impl Into<EntityRequirement>) -> Self {
        self.requirements = self.requirements.entity(requirement);
        self
    }

    /// Requires an instance of `name` with exactly `value`.
    pub fn entity_value(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.entity(EntityRequirement::value(name, value))
    }

    /// Replaces all requirements at once.
    pub fn requirements(mut self, requirements: Requirements) -> Self {
        self.requirements = requirements;
        self
    }

    /// Returns the name of this route, if set.
    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the requirements of this route.
    pub fn get_requirements(&self) -> &Requirements {
        &self.requirements
    }

    /// Runs one attempt: checks the requirements, then runs the handler.
    ///
    /// A panic inside the handler is caught and reported as
    /// [`HandlerError::Panicked`].
    pub async fn attempt(&self, req: &InboundRequest) -> HandlerResult {
        self.requirements.check(req.view())?;

        match AssertUnwindSafe(self.handler.run(req.clone()))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => Err(HandlerError::Panicked(panic_message(panic.as_ref()))),
        }
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("requirements", &self.requirements)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Creates a route that accepts every request.
pub fn route<F, T>(handler: F) -> Route
where
    F: Handler<T>,
    T: 'static,
{
    Route::new(handler)
}

/// Creates a route that requires `intent`, named after it.
///
/// ```rust,ignore
/// let route = on_intent("weather", weather).entity("location");
/// ```
pub fn on_intent<F, T>(intent: impl Into<String>, handler: F) -> Route
where
    F: Handler<T>,
    T: 'static,
{
    let intent = intent.into();
    Route::new(handler).name(intent.clone()).intent(intent)
}

/// An ordered list of routes tried until one produces a response.
///
/// The chain is assembled once at startup and then shared read-only between
/// concurrent requests.
#[derive(Default, Clone)]
pub struct HandlerChain {
    routes: Vec<Route>,
}

impl HandlerChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Appends a route. Routes are tried in the order they are added.
    pub fn add(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Appends a route (builder pattern).
    pub fn with(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Returns the number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if the chain has no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterates over the routes in order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Dispatches a request to the first route that produces a response.
    ///
    /// Handlers run strictly one after another; a later handler is only
    /// considered once the previous attempt has finished.
    pub async fn dispatch(
        &self,
        req: &InboundRequest,
        observer: &dyn DispatchObserver,
    ) -> DispatchResult<Response> {
        let span = debug_span!("dispatch", routes = self.routes.len());

        async move {
            for (index, route) in self.routes.iter().enumerate() {
                let attempt = Attempt {
                    ordinal: index + 1,
                    name: route.get_name(),
                };
                trace!(handler = %attempt, "Trying handler");

                match route.attempt(req).await {
                    Ok(response) => {
                        observer.handler_succeeded(&attempt);
                        return Ok(response);
                    }
                    Err(err) => observer.handler_failed(&attempt, &err),
                }
            }

            Err(DispatchError::NoHandlerMatched {
                attempts: self.routes.len(),
            })
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerChain")
            .field("route_count", &self.routes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Entities;
    use crate::observer::NoopObserver;
    use crate::observer::testing::RecordingObserver;
    use palaver_core::{EntityMap, INTENT_KEY, RequestView, WitEntity};
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request(intents: &[&str], entities: EntityMap) -> InboundRequest {
        let intents: Vec<WitEntity> = intents.iter().map(|i| WitEntity::new(*i)).collect();
        let entities = entities.with(INTENT_KEY, intents.clone());
        InboundRequest::from_parts(json!({}), RequestView::new(intents, entities))
    }

    fn counting(counter: &Arc<AtomicUsize>, text: &'static str) -> Route {
        let counter = Arc::clone(counter);
        Route::new(move || {
            let c = Arc::clone(&counter);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Response::text(text)
            }
        })
    }

    #[tokio::test]
    async fn test_empty_chain_is_exhausted() {
        let chain = HandlerChain::new();

        let err = chain
            .dispatch(&request(&["greet"], EntityMap::new()), &NoopObserver)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::NoHandlerMatched { attempts: 0 }));
    }

    #[tokio::test]
    async fn test_no_matching_route_is_exhausted() {
        let counter = Arc::new(AtomicUsize::new(0));
        let chain = HandlerChain::new()
            .with(counting(&counter, "weather").intent("weather"))
            .with(counting(&counter, "city").entity("location"))
            .with(counting(&counter, "vigo").entity_value("location", "Vigo"));

        let observer = RecordingObserver::default();
        let err = chain
            .dispatch(&request(&["greet"], EntityMap::new()), &observer)
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::NoHandlerMatched { attempts: 3 }));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        let ordinals: Vec<usize> = observer.failures.lock().iter().map(|(i, _)| *i).collect();
        assert_eq!(ordinals, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_failing_handler_falls_through() {
        let chain = HandlerChain::new()
            .with(Route::new(|| async {
                Err::<Response, _>(std::io::Error::other("scrape failed"))
            }))
            .with(Route::new(|| async { Response::text("second") }));

        let observer = RecordingObserver::default();
        let response = chain
            .dispatch(&request(&[], EntityMap::new()), &observer)
            .await
            .unwrap();

        assert_eq!(response.text, "second");
        let failures = observer.failures.lock();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, 1);
        assert!(failures[0].1.contains("scrape failed"));
        assert_eq!(*observer.successes.lock(), vec![2]);
    }

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let chain = HandlerChain::new()
            .with(counting(&first, "first"))
            .with(counting(&second, "second"));

        let response = chain
            .dispatch(&request(&[], EntityMap::new()), &NoopObserver)
            .await
            .unwrap();

        assert_eq!(response.text, "first");
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_panicking_handler_is_skipped() {
        let chain = HandlerChain::new()
            .with(Route::new(|| async {
                if true {
                    panic!("boom");
                }
                Response::text("unreachable")
            }))
            .with(Route::new(|| async { Response::text("recovered") }));

        let observer = RecordingObserver::default();
        let response = chain
            .dispatch(&request(&[], EntityMap::new()), &observer)
            .await
            .unwrap();

        assert_eq!(response.text, "recovered");
        assert!(observer.failures.lock()[0].1.contains("boom"));
    }

    #[tokio::test]
    async fn test_malformed_output_is_skipped() {
        let chain = HandlerChain::new()
            .with(Route::new(|| async { json!("just a string") }))
            .with(Route::new(|| async { json!({ "text": "ok", "type": 1 }) }));

        let response = chain
            .dispatch(&request(&[], EntityMap::new()), &NoopObserver)
            .await
            .unwrap();

        assert_eq!(response, Response::text("ok"));
    }

    #[tokio::test]
    async fn test_requirements_are_checked_per_route() {
        let chain = HandlerChain::new()
            .with(
                on_intent("weather", |entities: Entities| async move {
                    let city = entities
                        .first("location")
                        .and_then(WitEntity::value_str)
                        .unwrap_or_default()
                        .to_string();
                    Response::text(format!("Sunny in {city}"))
                })
                .entity("location"),
            )
            .with(on_intent("weather", || async { Response::text("Where?") }));

        let with_city = EntityMap::new().with("location", vec![WitEntity::new("Ourense")]);
        let response = chain
            .dispatch(&request(&["weather"], with_city), &NoopObserver)
            .await
            .unwrap();
        assert_eq!(response.text, "Sunny in Ourense");

        let response = chain
            .dispatch(&request(&["weather"], EntityMap::new()), &NoopObserver)
            .await
            .unwrap();
        assert_eq!(response.text, "Where?");
    }

    #[test]
    fn test_route_builders() {
        let news = on_intent("news", || async { Response::text("") })
            .entity("section")
            .entity_value("city", "Ourense");

        assert_eq!(news.get_name(), Some("news"));
        assert_eq!(
            news.get_requirements(),
            &Requirements::new()
                .intent("news")
                .entity("section")
                .entity(("city", "Ourense"))
        );
        assert!(route(|| async { Response::text("") }).get_requirements().is_empty());
    }
}
