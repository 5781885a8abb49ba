//! Prometheus metrics HTTP server.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::{Encoder, Registry, TextEncoder};
use std::convert::Infallible;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Encode everything in `registry` in the Prometheus text format.
///
/// Returns the body and its content type.
pub fn render(registry: &Registry) -> Result<(Vec<u8>, String), prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;
    Ok((buffer, encoder.format_type().to_string()))
}

fn respond(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
}

/// Handle incoming HTTP requests.
async fn handle_request<B>(
    registry: Registry,
    req: Request<B>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match req.uri().path() {
        "/metrics" => match render(&registry) {
            Ok((buffer, content_type)) => {
                let mut response = respond(StatusCode::OK, buffer);
                if let Ok(value) = HeaderValue::from_str(&content_type) {
                    response.headers_mut().insert(CONTENT_TYPE, value);
                }
                Ok(response)
            }
            Err(e) => {
                error!("Failed to encode metrics: {}", e);
                Ok(respond(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to encode metrics",
                ))
            }
        },
        "/health" => Ok(respond(StatusCode::OK, "OK")),
        _ => Ok(respond(StatusCode::NOT_FOUND, "Not Found")),
    }
}

/// Serve `registry` on an already bound listener until the task is cancelled.
pub async fn serve(
    listener: TcpListener,
    registry: Registry,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!(
        "Metrics server listening on http://{}/metrics",
        listener.local_addr()?
    );

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                continue;
            }
        };
        debug!(%peer, "Metrics scrape connection");
        let io = TokioIo::new(stream);
        let registry = registry.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| handle_request(registry.clone(), req));
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                error!("Error serving metrics connection: {}", e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MetricCatalog, ResourceKind};
    use http_body_util::BodyExt;
    use std::time::Duration;

    async fn body_string(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get(path: &str) -> Request<()> {
        Request::builder().uri(path).body(()).unwrap()
    }

    #[test]
    fn test_render_contains_series() {
        let registry = Registry::new();
        let catalog = MetricCatalog::register(&registry).unwrap();
        catalog.record_push_time(&ResourceKind::Route, Duration::from_millis(20));

        let (body, content_type) = render(&registry).unwrap();
        let text = String::from_utf8(body).unwrap();

        assert!(content_type.starts_with("text/plain"));
        assert!(text.contains("config_push_attempts{kind=\"rds\"} 1"));
        assert!(text.contains("config_push_duration_seconds_bucket{kind=\"rds\",le=\"0.1\"} 1"));
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let registry = Registry::new();
        let catalog = MetricCatalog::register(&registry).unwrap();
        catalog.record_client_change("1.20", 1.0);

        let response = handle_request(registry, get("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(CONTENT_TYPE));

        let body = body_string(response).await;
        assert!(body.contains("config_clients_connected{version=\"1.20\"} 1"));
    }

    #[tokio::test]
    async fn test_health_and_not_found() {
        let registry = Registry::new();

        let health = handle_request(registry.clone(), get("/health"))
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);
        assert_eq!(body_string(health).await, "OK");

        let missing = handle_request(registry, get("/nope")).await.unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serve_over_tcp() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let registry = Registry::new();
        let catalog = MetricCatalog::register(&registry).unwrap();
        catalog.record_write_timeout();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve(listener, registry));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("config_write_timeouts_total 1"));

        server.abort();
    }
}
