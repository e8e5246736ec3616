//! Streaming JSON message parser shared by every MCP transport variant.
//!
//! Reads from an `AsyncRead` source (a subprocess's stdout, an HTTP
//! newline-delimited response body, ...) and yields individual JSON
//! values as soon as they are complete, handling split packets and
//! multiple messages per line.

use crate::error::TransportError;
use futures::Stream;
use pin_project_lite::pin_project;
use serde_json::Value;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, BufReader};

const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

pin_project! {
    /// A stream that parses one JSON value at a time from an `AsyncRead`.
    ///
    /// Transport-agnostic: used by the stdio transport over a child
    /// process's stdout and, conceptually, by any other byte-stream
    /// framing that delimits messages as consecutive JSON values.
    pub struct MessageReader<R> {
        #[pin]
        reader: BufReader<R>,
        buffer: String,
        max_buffer_size: usize,
    }
}

impl<R: AsyncRead> MessageReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_capacity(inner, DEFAULT_BUFFER_SIZE)
    }

    pub fn with_capacity(inner: R, max_size: usize) -> Self {
        Self { reader: BufReader::new(inner), buffer: String::new(), max_buffer_size: max_size }
    }
}

impl<R: AsyncRead + Unpin> Stream for MessageReader<R> {
    type Item = Result<Value, TransportError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            {
                let mut stream = serde_json::Deserializer::from_str(this.buffer).into_iter::<Value>();
                match stream.next() {
                    Some(Ok(val)) => {
                        let offset = stream.byte_offset();
                        this.buffer.drain(..offset);
                        return Poll::Ready(Some(Ok(val)));
                    }
                    Some(Err(ref e)) if e.is_eof() => {
                        // Incomplete JSON: fall through and read more bytes.
                    }
                    Some(Err(e)) => {
                        let preview = this.buffer.chars().take(100).collect::<String>();
                        return Poll::Ready(Some(Err(TransportError::ProtocolViolation(format!(
                            "parse error: {e}. buffer preview: {preview}"
                        )))));
                    }
                    None => this.buffer.clear(),
                }
            }

            let mut buf = [0u8; 4096];
            let mut read_buf = tokio::io::ReadBuf::new(&mut buf);

            match this.reader.as_mut().poll_read(cx, &mut read_buf) {
                Poll::Ready(Ok(())) => {
                    let n = read_buf.filled().len();
                    if n == 0 {
                        if !this.buffer.trim().is_empty() {
                            return match serde_json::from_str(this.buffer) {
                                Ok(val) => {
                                    this.buffer.clear();
                                    Poll::Ready(Some(Ok(val)))
                                }
                                Err(e) => Poll::Ready(Some(Err(TransportError::ProtocolViolation(
                                    format!("eof with invalid json: {e}"),
                                )))),
                            };
                        }
                        return Poll::Ready(None);
                    }

                    let chunk = String::from_utf8_lossy(read_buf.filled());
                    this.buffer.push_str(&chunk);

                    if this.buffer.len() > *this.max_buffer_size {
                        return Poll::Ready(Some(Err(TransportError::ProtocolViolation(
                            "buffer overflow".to_string(),
                        ))));
                    }
                }
                Poll::Ready(Err(e)) => return Poll::Ready(Some(Err(TransportError::Io(e.to_string())))),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::io::Cursor;

    #[tokio::test]
    async fn parses_single_message() {
        let data = Cursor::new(br#"{"id":1,"result":42}"#.to_vec());
        let mut reader = Box::pin(MessageReader::new(data));
        let msg = reader.next().await.unwrap().unwrap();
        assert_eq!(msg, serde_json::json!({"id": 1, "result": 42}));
        assert!(reader.next().await.is_none());
    }

    #[tokio::test]
    async fn parses_consecutive_messages_without_separators() {
        let data = Cursor::new(br#"{"id":1}{"id":2}"#.to_vec());
        let mut reader = Box::pin(MessageReader::new(data));
        assert_eq!(reader.next().await.unwrap().unwrap(), serde_json::json!({"id": 1}));
        assert_eq!(reader.next().await.unwrap().unwrap(), serde_json::json!({"id": 2}));
    }

    #[tokio::test]
    async fn buffer_overflow_is_reported() {
        let huge = "x".repeat(100);
        let data = Cursor::new(format!(r#"{{"id":"{huge}""#).into_bytes());
        let mut reader = Box::pin(MessageReader::with_capacity(data, 16));
        let err = reader.next().await.unwrap().unwrap_err();
        assert!(matches!(err, TransportError::ProtocolViolation(_)));
    }
}
