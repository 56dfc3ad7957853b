use crate::tracing::RequestId;
use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

/// Header name for the request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Caller-supplied ids longer than this are replaced with a fresh one.
const MAX_REQUEST_ID_LEN: usize = 128;

fn incoming_request_id(request: &Request) -> Option<RequestId> {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map(RequestId::new)
}

/// Middleware to add request ID to every request
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = incoming_request_id(&request).unwrap_or_default();
    let header_value = HeaderValue::from_str(request_id.as_str()).ok();

    if let Some(value) = header_value.clone() {
        request
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    // Make request id available to handlers
    request.extensions_mut().insert(request_id.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id.as_str(),
        method = %request.method(),
        uri = %request.uri(),
    );

    let mut response = crate::tracing::scope_request_id(
        request_id.clone(),
        async move { next.run(request).await },
    )
    .instrument(span)
    .await;

    if let Some(value) = header_value {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        extract::Extension,
        http::{Request as HttpRequest, StatusCode},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn extension_handler(
        Extension(request_id): Extension<RequestId>,
    ) -> (StatusCode, String) {
        (
            StatusCode::OK,
            format!("request-id:{}", request_id.as_str()),
        )
    }

    fn app() -> Router {
        Router::new()
            .route("/", get(extension_handler))
            .layer(axum::middleware::from_fn(request_id_middleware))
    }

    #[tokio::test]
    async fn middleware_adds_request_id_header_and_extension() {
        let response = app()
            .oneshot(
                HttpRequest::builder()
                    .uri("/")
                    .method("GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let header = response.headers().get(REQUEST_ID_HEADER).cloned();
        assert!(header.is_some());

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body_str = String::from_utf8(body.to_vec()).unwrap();
        assert!(body_str.starts_with("request-id:"));
    }

    #[tokio::test]
    async fn middleware_echoes_caller_request_id() {
        let response = app()
            .oneshot(
                HttpRequest::builder()
                    .uri("/")
                    .header(REQUEST_ID_HEADER, "ward-7-intake")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER).unwrap(),
            "ward-7-intake"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"request-id:ward-7-intake");
    }
}
