//! Streaming request body.

use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, Stream, StreamExt};
use parking_lot::Mutex;
use std::fmt;
use std::io;
use std::pin::Pin;

/// Boxed stream of body chunks.
pub type BodyStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// The payload of an inbound request.
///
/// The body is a stream of chunks that can be consumed exactly once, either
/// by buffering it with [`read_to_end`](Self::read_to_end) or by taking the
/// raw stream with [`take_stream`](Self::take_stream). An aborted connection
/// surfaces as an [`io::Error`] from the stream.
///
/// # Example
///
/// ```
/// use modelbind_core::RequestBody;
///
/// # tokio_test::block_on(async {
/// let body = RequestBody::from_bytes("name=alice");
/// let bytes = body.read_to_end().await.unwrap();
/// assert_eq!(&bytes[..], b"name=alice");
/// assert!(body.is_consumed());
/// # });
/// ```
pub struct RequestBody {
    stream: Mutex<Option<BodyStream>>,
}

impl RequestBody {
    /// Creates a body with no content.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_stream(stream::empty())
    }

    /// Creates a body from a single buffer.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self::from_stream(stream::once(async move { Ok(bytes) }))
    }

    /// Creates a body from a stream of chunks.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            stream: Mutex::new(Some(Box::pin(stream))),
        }
    }

    /// Takes the underlying stream, leaving the body consumed.
    ///
    /// Returns `None` if the body was already read.
    pub fn take_stream(&self) -> Option<BodyStream> {
        self.stream.lock().take()
    }

    /// Returns `true` once the body has been read or its stream taken.
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.stream.lock().is_none()
    }

    /// Buffers the remaining body into a single [`Bytes`].
    ///
    /// # Errors
    ///
    /// Fails if the body was already consumed or if the stream yields an
    /// I/O error part-way through.
    pub async fn read_to_end(&self) -> io::Result<Bytes> {
        let Some(mut stream) = self.take_stream() else {
            return Err(io::Error::other("request body has already been consumed"));
        };

        let mut buffer = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(buffer.freeze())
    }
}

impl Default for RequestBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBody")
            .field("consumed", &self.is_consumed())
            .finish()
    }
}
