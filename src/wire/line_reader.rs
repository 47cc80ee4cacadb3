//! Newline-framed reads shared by the server and the client.
//!
//! Bytes are decoded lossily, so a line that is not valid UTF-8 still comes
//! back as a line and fails in the message decoder instead of the transport.
//! Lines are capped at [`MAX_LINE_BYTES`]; the excess up to the next newline
//! is discarded.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Longest kept line. Positions need under a hundred bytes, moves five.
pub const MAX_LINE_BYTES: usize = 256;

#[derive(Debug)]
pub struct LineReader<R> {
    inner: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: BufReader::new(reader),
            buf: Vec::with_capacity(MAX_LINE_BYTES),
        }
    }

    /// Next line without its `\n` or `\r\n`, or `None` at end of stream.
    ///
    /// A trailing line without a newline is still returned before `None`.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.buf.clear();
        let mut saw_bytes = false;

        loop {
            let available = self.inner.fill_buf().await?;
            if available.is_empty() {
                if !saw_bytes {
                    return Ok(None);
                }
                break;
            }
            saw_bytes = true;

            let (chunk, complete) = match available.iter().position(|&byte| byte == b'\n') {
                Some(end) => (&available[..end], true),
                None => (available, false),
            };
            let room = MAX_LINE_BYTES - self.buf.len();
            self.buf.extend_from_slice(&chunk[..chunk.len().min(room)]);

            let used = chunk.len() + usize::from(complete);
            self.inner.consume(used);
            if complete {
                break;
            }
        }

        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}
