//! Response capture
//!
//! Wraps an outgoing response so the middleware that produced it can observe
//! the final status code and the number of body bytes actually streamed.
//! The wrapper is pass-through: it never alters status, headers, or body
//! content.

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::Response;
use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};
use std::task::{Context, Poll};

/// Shared view of one response's observed status and body size.
///
/// Cheap to clone; all clones observe the same response. The status starts
/// at 200 and each `record_status` overwrites it, so the last write wins
/// and reflects what the client actually receives.
#[derive(Clone)]
pub struct ResponseCapture {
    inner: Arc<CaptureState>,
}

struct CaptureState {
    status: AtomicU16,
    bytes_written: AtomicU64,
}

impl ResponseCapture {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CaptureState {
                status: AtomicU16::new(StatusCode::OK.as_u16()),
                bytes_written: AtomicU64::new(0),
            }),
        }
    }

    /// Record an observed status code. Later writes overwrite earlier ones.
    pub fn record_status(&self, status: StatusCode) {
        self.inner.status.store(status.as_u16(), Ordering::SeqCst);
    }

    /// The last recorded status, 200 if none was recorded.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.inner.status.load(Ordering::SeqCst))
            .unwrap_or(StatusCode::OK)
    }

    /// Body bytes streamed to the client so far.
    pub fn bytes_written(&self) -> u64 {
        self.inner.bytes_written.load(Ordering::SeqCst)
    }

    fn add_bytes(&self, n: usize) {
        self.inner.bytes_written.fetch_add(n as u64, Ordering::SeqCst);
    }

    /// Record the response status and wrap its body for byte counting.
    pub fn wrap(&self, response: Response) -> Response {
        self.record_status(response.status());
        let (parts, body) = response.into_parts();
        Response::from_parts(
            parts,
            Body::new(CaptureBody {
                inner: body,
                capture: self.clone(),
            }),
        )
    }
}

impl Default for ResponseCapture {
    fn default() -> Self {
        Self::new()
    }
}

/// Body wrapper that counts data bytes as frames are polled through.
struct CaptureBody {
    inner: Body,
    capture: ResponseCapture,
}

impl HttpBody for CaptureBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.capture.add_bytes(data.len());
                }
                Poll::Ready(Some(Ok(frame)))
            }
            other => other,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::header;

    #[tokio::test]
    async fn test_status_defaults_to_200() {
        let capture = ResponseCapture::new();
        assert_eq!(capture.status(), StatusCode::OK);
        assert_eq!(capture.bytes_written(), 0);
    }

    #[tokio::test]
    async fn test_last_status_write_wins() {
        let capture = ResponseCapture::new();
        capture.record_status(StatusCode::INTERNAL_SERVER_ERROR);
        capture.record_status(StatusCode::CREATED);
        assert_eq!(capture.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_wrap_records_response_status() {
        let capture = ResponseCapture::new();
        let response = Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::empty())
            .unwrap();
        let _wrapped = capture.wrap(response);
        assert_eq!(capture.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_body_passes_through_unchanged() {
        let capture = ResponseCapture::new();
        let response = Response::builder()
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("Hello, World!"))
            .unwrap();

        let wrapped = capture.wrap(response);
        assert_eq!(
            wrapped.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain"
        );

        let bytes = to_bytes(wrapped.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Hello, World!");
        assert_eq!(capture.bytes_written(), 13);
    }

    #[tokio::test]
    async fn test_counts_accumulate_across_chunks() {
        let capture = ResponseCapture::new();
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"alpha")),
            Ok(Bytes::from_static(b"beta")),
        ];
        let stream = futures::stream::iter(chunks);
        let response = Response::new(Body::from_stream(stream));

        let wrapped = capture.wrap(response);
        let bytes = to_bytes(wrapped.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"alphabeta");
        assert_eq!(capture.bytes_written(), 9);
    }

    #[tokio::test]
    async fn test_empty_body_counts_zero() {
        let capture = ResponseCapture::new();
        let wrapped = capture.wrap(Response::new(Body::empty()));
        let bytes = to_bytes(wrapped.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
        assert_eq!(capture.bytes_written(), 0);
    }
}
