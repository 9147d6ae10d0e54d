//! Hand-off of event-stream responses.

use futures_util::{Stream, StreamExt};
use reqwest::Response;
use reqwest::header::HeaderMap;
use weknora_core::{ApiResult, RequestId};

use crate::normalize::transport_failure;

/// A successful event-stream response, not yet read.
///
/// The pipeline only guarantees the request went out with the right headers
/// and came back 200/201; framing and parsing of events belong to the caller.
#[derive(Debug)]
pub struct EventStream {
    response: Response,
    request_id: RequestId,
}

impl EventStream {
    pub(crate) fn new(response: Response, request_id: RequestId) -> Self {
        Self {
            response,
            request_id,
        }
    }

    pub fn status(&self) -> u16 {
        self.response.status().as_u16()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    /// Correlation id the request was sent with.
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Raw body chunks as they arrive. A dropped connection surfaces as the
    /// network error envelope.
    pub fn chunks(self) -> impl Stream<Item = ApiResult<Vec<u8>>> {
        self.response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(|e| transport_failure(&e)))
    }
}
