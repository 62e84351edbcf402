//! Per-request context and payload hydration.

use std::collections::HashMap;

use bytes::Bytes;
use keygate_auth::signature::content_type_essence;
use keygate_auth::validator::request_uri;
use serde_json::Value;
use tracing::debug;

/// Everything the gateway knows about one request.
///
/// Created once per request. `parsed_body` is only filled by
/// [`RequestContext::hydrate`].
#[derive(Debug)]
pub struct RequestContext {
    parts: http::request::Parts,
    content_type: String,
    raw_body: Bytes,
    uri: String,
    query_params: HashMap<String, String>,
    parsed_body: Option<Value>,
}

impl RequestContext {
    /// Build a context from request parts and the collected body.
    ///
    /// When a query parameter repeats, the first occurrence wins.
    #[must_use]
    pub fn new(parts: http::request::Parts, raw_body: Bytes) -> Self {
        let content_type = parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(content_type_essence)
            .unwrap_or_default();
        let mut query_params = HashMap::new();
        if let Some(query) = parts.uri.query() {
            for (name, value) in form_urlencoded::parse(query.as_bytes()) {
                query_params
                    .entry(name.into_owned())
                    .or_insert_with(|| value.into_owned());
            }
        }
        let uri = request_uri(&parts);

        Self {
            parts,
            content_type,
            raw_body,
            uri,
            query_params,
            parsed_body: None,
        }
    }

    /// Parse a JSON body for write methods.
    ///
    /// Applies to PUT, POST and DELETE with an `application/json` content
    /// type. A body that fails to parse leaves `parsed_body` empty.
    pub fn hydrate(&mut self) {
        let writes = matches!(
            self.parts.method,
            http::Method::PUT | http::Method::POST | http::Method::DELETE
        );
        if !writes || self.content_type != mime::APPLICATION_JSON.essence_str() {
            return;
        }
        match serde_json::from_slice(&self.raw_body) {
            Ok(value) => self.parsed_body = Some(value),
            Err(e) => debug!(error = %e, method = %self.parts.method, "request body is not valid JSON"),
        }
    }

    /// Request head, as needed by signature validation.
    #[must_use]
    pub fn parts(&self) -> &http::request::Parts {
        &self.parts
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &http::Method {
        &self.parts.method
    }

    /// Request path without the query.
    #[must_use]
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Path and query as received.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Media type essence of the body, empty when absent.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Raw request body.
    #[must_use]
    pub fn raw_body(&self) -> &Bytes {
        &self.raw_body
    }

    /// Hydrated JSON payload.
    #[must_use]
    pub fn parsed_body(&self) -> Option<&Value> {
        self.parsed_body.as_ref()
    }

    /// A query parameter value.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    /// Whether a flag parameter is set to a non-empty value other than
    /// `0` or `false`.
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.query_param(name).is_some_and(|v| {
            !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false")
        })
    }
}
