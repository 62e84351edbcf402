//! Gateway HTTP service implementing the hyper `Service` trait.
//!
//! Health-check endpoints (`/health`, `/_health`) are answered before
//! authentication. Every other request goes through the [`Dispatcher`].

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use keygate_model::GatewayError;
use tracing::debug;

use crate::body::GatewayResponseBody;
use crate::dispatch::Dispatcher;
use crate::request::RequestContext;
use crate::response::{
    CONTENT_TYPE, REQUEST_ID_HEADER, error_to_response, health_check_response, json_response,
};

/// Hyper `Service` for the gateway.
#[derive(Debug)]
pub struct GatewayService {
    dispatcher: Arc<Dispatcher>,
}

impl GatewayService {
    /// Create a new `GatewayService`.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Handle a request whose body has already been collected.
    #[must_use]
    pub fn handle(&self, req: http::Request<Bytes>) -> http::Response<GatewayResponseBody> {
        let request_id = uuid::Uuid::new_v4().to_string();
        if is_health_check(req.method(), req.uri().path()) {
            return add_common_headers(health_check_response(), &request_id);
        }
        let (parts, body) = req.into_parts();
        let response = self.respond(parts, body, &request_id);
        add_common_headers(response, &request_id)
    }

    fn respond(
        &self,
        parts: http::request::Parts,
        body: Bytes,
        request_id: &str,
    ) -> http::Response<GatewayResponseBody> {
        debug!(request_id, method = %parts.method, uri = %parts.uri, "handling request");
        let responded = self.dispatcher.handle(RequestContext::new(parts, body));
        json_response(responded.status, &responded.body, request_id)
    }
}

impl Clone for GatewayService {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl hyper::service::Service<http::Request<Incoming>> for GatewayService {
    type Response = http::Response<GatewayResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move {
            let (parts, incoming) = req.into_parts();
            let response = match collect_body(incoming).await {
                Ok(body) => service.handle(http::Request::from_parts(parts, body)),
                Err(err) => {
                    let request_id = uuid::Uuid::new_v4().to_string();
                    add_common_headers(error_to_response(&err, &request_id), &request_id)
                }
            };
            Ok(response)
        })
    }
}

/// Collect the incoming body into a single `Bytes` buffer.
async fn collect_body(incoming: Incoming) -> Result<Bytes, GatewayError> {
    incoming
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| GatewayError::internal_error("Failed to read request body").with_source(e))
}

/// Check if the request is a health check probe.
fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && (path == "/health" || path == "/_health")
}

/// Add common response headers to every gateway response.
fn add_common_headers(
    mut response: http::Response<GatewayResponseBody>,
    request_id: &str,
) -> http::Response<GatewayResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.entry(REQUEST_ID_HEADER).or_insert(hv);
    }
    headers
        .entry(http::header::CONTENT_TYPE)
        .or_insert(http::HeaderValue::from_static(CONTENT_TYPE));
    headers.insert("server", http::HeaderValue::from_static("KeyGate"));

    response
}
