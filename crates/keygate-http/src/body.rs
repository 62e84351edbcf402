//! Response body: one buffered JSON document.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use http_body_util::Full;

/// Body of every gateway response. The gateway never streams, so the whole
/// JSON document is held in memory and yielded as a single frame.
#[derive(Debug)]
pub struct GatewayResponseBody(Full<Bytes>);

impl GatewayResponseBody {
    /// Wrap a serialized JSON document.
    #[must_use]
    pub fn from_json(json: Vec<u8>) -> Self {
        Self(Full::new(Bytes::from(json)))
    }

    /// Wrap a static JSON document.
    #[must_use]
    pub fn from_static(json: &'static str) -> Self {
        Self(Full::new(Bytes::from_static(json.as_bytes())))
    }
}

impl Body for GatewayResponseBody {
    type Data = Bytes;
    type Error = std::convert::Infallible;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Pin::new(&mut self.0).poll_frame(cx)
    }

    fn is_end_stream(&self) -> bool {
        self.0.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.0.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    #[tokio::test]
    async fn test_should_yield_whole_document_once() {
        let body = GatewayResponseBody::from_static(r#"{"status":"running"}"#);
        assert_eq!(body.size_hint().exact(), Some(20));
        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], br#"{"status":"running"}"#);
    }
}
