//! HTTP front for the router.
//!
//! `GET /health` answers `Healthy`; `GET /{prefix}` resolves `"/" + prefix`
//! and answers with the chosen route or the reason there is none.

use std::{convert::Infallible, sync::Arc};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Method, Request, Response, StatusCode,
    body::Incoming,
    header::{CONTENT_TYPE, HeaderValue},
    server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use log::debug;
use percent_encoding::percent_decode_str;
use serde_json::json;
use steer_lb::{Resolution, Router};
use tokio::net::TcpListener;

pub const NO_HEALTHY_UPSTREAM: &str = "no healthy upstream found";

fn text(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}

fn json(status: StatusCode, body: serde_json::Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn not_found() -> Response<Full<Bytes>> {
    json(StatusCode::NOT_FOUND, json!({ "detail": "not found" }))
}

/// Builds the response for one request. Pure apart from the random draw.
pub fn respond(method: &Method, path: &str, router: &Router) -> Response<Full<Bytes>> {
    if *method != Method::GET {
        return json(
            StatusCode::METHOD_NOT_ALLOWED,
            json!({ "detail": "method not allowed" }),
        );
    }

    if path == "/health" {
        return text(StatusCode::OK, "Healthy");
    }

    // exactly one non-empty path segment
    let segment = match path.strip_prefix('/') {
        Some(segment) if !segment.is_empty() && !segment.contains('/') => segment,
        _ => return not_found(),
    };
    // routing keys are stored decoded
    let segment = match percent_decode_str(segment).decode_utf8() {
        Ok(segment) => segment,
        Err(_) => return not_found(),
    };
    let prefix = format!("/{segment}");

    match router.resolve(&prefix) {
        Resolution::Selected(route) => json(StatusCode::OK, json!({ "route": route })),
        Resolution::PrefixNotFound => json(
            StatusCode::NOT_FOUND,
            json!({ "detail": format!("{prefix} does not exist in the routing rules") }),
        ),
        Resolution::NoEligibleUpstream => json(
            StatusCode::BAD_REQUEST,
            json!({ "detail": NO_HEALTHY_UPSTREAM }),
        ),
    }
}

pub async fn handle_request(
    req: Request<Incoming>,
    router: Arc<Router>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let response = respond(req.method(), req.uri().path(), &router);
    debug!(
        "{} {} -> {}",
        req.method(),
        req.uri().path(),
        response.status()
    );
    Ok(response)
}

/// Accepts connections until the listener fails.
pub async fn serve(listener: TcpListener, router: Arc<Router>) -> std::io::Result<()> {
    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let router = router.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| handle_request(req, router.clone()));
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Connection error: {}", e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use http_body_util::BodyExt;
    use steer_lb::{RoutingRule, RoutingTable, Upstream};

    use super::*;

    fn router(health_filter: bool) -> Arc<Router> {
        let mut rules = HashMap::new();
        let healthy = Upstream::new(
            "http://10.20.10.10",
            1,
            Some("http://10.20.10.10/health".to_string()),
        );
        healthy.set_healthy(true);
        rules.insert(
            "/test1".to_string(),
            RoutingRule::new(vec![
                healthy,
                Upstream::new(
                    "https://test.example.site",
                    1,
                    Some("https://test.example.site/health".to_string()),
                ),
            ]),
        );
        rules.insert(
            "/café".to_string(),
            RoutingRule::new(vec![Upstream::new("http://cafe", 1, None)]),
        );
        rules.insert(
            "/a b".to_string(),
            RoutingRule::new(vec![Upstream::new("http://spaced", 1, None)]),
        );
        rules.insert(
            "/test2".to_string(),
            RoutingRule::new(vec![Upstream::new(
                "https://test.example.site",
                20,
                Some("https://test.example.site/health".to_string()),
            )]),
        );
        Arc::new(Router::new(Arc::new(RoutingTable::new(rules)), health_filter))
    }

    async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let response = respond(&Method::GET, "/health", &router(false));
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"Healthy");
    }

    #[tokio::test]
    async fn routing_with_health_check() {
        let router = router(true);

        let response = respond(&Method::GET, "/test1", &router);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "route": "http://10.20.10.10" })
        );

        let response = respond(&Method::GET, "/test2", &router);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "detail": "no healthy upstream found" })
        );
    }

    #[tokio::test]
    async fn unknown_prefix_is_404() {
        let response = respond(&Method::GET, "/not-found", &router(false));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({ "detail": "/not-found does not exist in the routing rules" })
        );
    }

    #[tokio::test]
    async fn encoded_prefix_is_decoded() {
        let router = router(false);

        let response = respond(&Method::GET, "/caf%C3%A9", &router);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "route": "http://cafe" }));

        let response = respond(&Method::GET, "/a%20b", &router);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "route": "http://spaced" }));

        let response = respond(&Method::GET, "/caf%C3", &router);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({ "detail": "not found" }));

        let response = respond(&Method::GET, "/th%C3%A9", &router);
        assert_eq!(
            body_json(response).await,
            json!({ "detail": "/thé does not exist in the routing rules" })
        );
    }

    #[tokio::test]
    async fn malformed_paths_and_methods() {
        let router = router(false);

        for path in ["/", "/test1/extra", "/test1/"] {
            let response = respond(&Method::GET, path, &router);
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "path {path}");
        }

        let response = respond(&Method::POST, "/test1", &router);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn serves_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(serve(listener, router(false)));

        let response = reqwest::get(format!("http://{addr}/test2")).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let body: serde_json::Value =
            serde_json::from_str(&response.text().await.unwrap()).unwrap();
        assert_eq!(body, json!({ "route": "https://test.example.site" }));

        let response = reqwest::get(format!("http://{addr}/missing")).await.unwrap();
        assert_eq!(response.status().as_u16(), 404);

        handle.abort();
    }
}
