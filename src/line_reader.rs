use std::io;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Provides a facility to read LF-terminated lines from a stream, such as the
/// standard error pipe of a child process.
pub struct LineReader<T: AsyncRead + Unpin> {
    /// Stores data that's been read in but lacks a LF.
    buf: BytesMut,
    /// Index in buf from which a LF may appear (before which none has been
    /// seen).
    maybe_lf_from: usize,
    /// Data source
    reader: T,
    /// On a reading error, this field is set and its value returned once the
    /// buffer is drained of pending lines.
    pending_error: Option<io::Error>,
    /// Set once the reader has reported end-of-stream.
    eof: bool,
}

impl<T: AsyncRead + Unpin> LineReader<T> {
    /// Reads a line from the internal buffer and/or reader, without its
    /// terminating LF (or CRLF).
    ///
    /// Unlike a network protocol, a process is free to exit half way through
    /// a line, so at end-of-stream any unterminated remainder is returned as a
    /// final line before `None`.
    ///
    /// This function is cancel-safe: its only async operation is a `read_buf`
    /// against the internal `reader`.
    ///
    /// On a read error, the error value is returned after processing all
    /// pending lines in the internal buffer.
    pub async fn read_line(&mut self) -> io::Result<Option<Bytes>> {
        loop {
            // Only scan the bytes that arrived since the last read: anything
            // before maybe_lf_from is known to be LF-free.
            if let Some(eol) = self.buf[self.maybe_lf_from..]
                .iter()
                .position(|&c| c == b'\n')
            {
                let line =
                    self.buf.split_to(self.maybe_lf_from + eol + 1).freeze();
                self.maybe_lf_from = 0;

                return Ok(Some(trim_eol(line)));
            }

            if self.eof {
                if self.buf.is_empty() {
                    return match self.pending_error.take() {
                        Some(e) => Err(e),
                        None => Ok(None),
                    };
                }

                let rest = self.buf.split().freeze();
                self.maybe_lf_from = 0;
                return Ok(Some(trim_eol(rest)));
            }

            let n_bytes_read = match self.reader.read_buf(&mut self.buf).await
            {
                Ok(n) => n,
                Err(e) => {
                    self.pending_error = Some(e);
                    0
                },
            };

            self.maybe_lf_from = self.buf.len() - n_bytes_read;

            // Zero bytes means the writer hung up (or the read failed): drain
            // what's buffered, then report.
            if n_bytes_read == 0 {
                self.eof = true;
            }
        }
    }
}

/// Drops a trailing `\n` and/or `\r`.
fn trim_eol(mut line: Bytes) -> Bytes {
    if line.last() == Some(&b'\n') {
        line.truncate(line.len() - 1);
    }
    if line.last() == Some(&b'\r') {
        line.truncate(line.len() - 1);
    }
    line
}

impl<T: AsyncRead + Unpin> From<T> for LineReader<T> {
    fn from(value: T) -> Self {
        Self {
            buf: BytesMut::new(),
            maybe_lf_from: 0,
            reader: value,
            pending_error: None,
            eof: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{self, AsyncWriteExt};
    use tokio::task::yield_now;

    #[tokio::test]
    async fn test() {
        // When properly read, each nth line should read b"test:{n}".
        let tests: &[&[u8]] = &[
            // Simple reassembly
            b"test:",
            b"1\n",
            // CRLF endings are tolerated
            b"test:2\r\n",
            // Split CRLF
            b"test:",
            b"3",
            b"\r",
            b"\n",
            // Several lines in one write
            b"test:4\ntest:5\n",
            b"test:6\ntest:",
            b"7\n",
            // Unterminated last line
            b"test:8",
        ];

        let (mut client, server) = io::duplex(4096);

        tokio::spawn(async move {
            for buf in tests {
                client.write_all(buf).await.unwrap();
                yield_now().await;
            }
        });

        let mut lr: LineReader<_> = server.into();

        for n in 1..=8 {
            assert_eq!(
                lr.read_line().await.unwrap().unwrap(),
                format!("test:{n}")
            );
        }

        assert!(lr.read_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_lines_survive() {
        let (mut client, server) = io::duplex(64);
        client.write_all(b"a\n\nb\n").await.unwrap();
        drop(client);

        let mut lr: LineReader<_> = server.into();
        assert_eq!(lr.read_line().await.unwrap().unwrap(), "a");
        assert_eq!(lr.read_line().await.unwrap().unwrap(), "");
        assert_eq!(lr.read_line().await.unwrap().unwrap(), "b");
        assert!(lr.read_line().await.unwrap().is_none());
    }
}
