//! axum server wiring.

use std::collections::HashSet;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response as HttpResponse},
    routing::post,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{TransportError, TransportResult};
use palaver_framework::{Endpoint, Reply};

/// Normalizes a route path to start with exactly one `/` and have no
/// trailing slash.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn validate_path(path: &str) -> TransportResult<()> {
    if path.contains(['{', '}', '*', ':']) {
        return Err(TransportError::InvalidPath {
            path: path.to_string(),
            reason: "route captures are not supported",
        });
    }
    if path.chars().any(char::is_whitespace) {
        return Err(TransportError::InvalidPath {
            path: path.to_string(),
            reason: "whitespace is not allowed",
        });
    }
    Ok(())
}

/// Builds a router that mounts every endpoint as `POST <path>`.
pub fn router<I, P>(routes: I) -> TransportResult<Router>
where
    I: IntoIterator<Item = (P, Endpoint)>,
    P: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut router = Router::new();

    for (path, endpoint) in routes {
        let path = normalize_path(path.as_ref());
        validate_path(&path)?;
        if !seen.insert(path.clone()) {
            return Err(TransportError::DuplicatePath(path));
        }

        debug!(path = %path, handlers = endpoint.chain().len(), "Mounting endpoint");
        router = router.route(&path, post(webhook).with_state(endpoint));
    }

    Ok(router)
}

/// Serves `router` on `listener` until `shutdown` is cancelled.
///
/// In-flight requests are allowed to finish before this returns.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> TransportResult<()> {
    let addr = listener.local_addr()?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!(addr = %addr, "HTTP server shut down");
    Ok(())
}

/// HTTP POST handler.
async fn webhook(State(endpoint): State<Endpoint>, body: Bytes) -> HttpResponse {
    match endpoint.handle(&body).await {
        Reply::Success(response) => (StatusCode::OK, Json(response)).into_response(),
        Reply::ServerError => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use palaver_core::Response;
    use palaver_framework::{HandlerChain, on_intent};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn greeter() -> Endpoint {
        Endpoint::new(HandlerChain::new().with(on_intent("greet", || async {
            Response::text("Hi 👋")
        })))
    }

    fn body(intent: &str) -> Body {
        let payload = json!({
            "conversation": {
                "messages": [{
                    "messageValidation": {
                        "data": { "entities": { "intent": [{ "value": intent }] } }
                    }
                }]
            }
        });
        Body::from(payload.to_string())
    }

    async fn post_to(router: Router, uri: &str, body: Body) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("greet"), "/greet");
        assert_eq!(normalize_path("/greet/"), "/greet");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("//"), "/");
    }

    #[test]
    fn test_router_rejects_duplicates_and_captures() {
        let err = router([("greet", greeter()), ("/greet/", greeter())]).unwrap_err();
        assert!(matches!(err, TransportError::DuplicatePath(p) if p == "/greet"));

        let err = router([("/news/{city}", greeter())]).unwrap_err();
        assert!(matches!(err, TransportError::InvalidPath { .. }));
    }

    #[tokio::test]
    async fn test_success_reply() {
        let app = router([("/greet", greeter())]).unwrap();

        let (status, bytes) = post_to(app, "/greet", body("greet")).await;

        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            value,
            json!({ "text": "Hi 👋", "type": 1, "speakText": "Hi " })
        );
    }

    #[tokio::test]
    async fn test_failure_reply_has_no_body() {
        let app = router([("/greet", greeter())]).unwrap();

        let (status, bytes) = post_to(app.clone(), "/greet", body("other")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(bytes.is_empty());

        let (status, bytes) = post_to(app, "/greet", Body::from("garbage")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_serve_stops_on_cancel() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let app = router([("/greet", greeter())]).unwrap();
        let token = CancellationToken::new();

        let server = tokio::spawn(serve(listener, app, token.clone()));
        token.cancel();

        server.await.unwrap().unwrap();
    }
}
