//! Length-prefixed LSP framing, shared by every pipe endpoint.
//!
//! Grounded on `lsp/bridge/connection.rs` in the teacher crate (async
//! Content-Length framing over child stdio), adapted to blocking
//! `Read`/`Write` streams per the proxy's thread-per-pump concurrency model.

use std::io::{self, BufRead, Write};

/// Reads exactly one framed LSP message body from `reader`.
///
/// Tolerates stray blank lines between messages and header blocks missing
/// `content-length` by discarding them and trying again, rather than
/// raising — this matches hosts/backends that occasionally emit extra
/// newlines between messages. Returns `Ok(None)` on a clean EOF (stream
/// closed with no partial message in flight).
pub fn read_message<R: BufRead>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    loop {
        let mut content_length: Option<usize> = None;
        loop {
            let mut line = String::new();
            let n = reader.read_line(&mut line)?;
            if n == 0 {
                // EOF while reading headers.
                return Ok(None);
            }
            let trimmed = line.trim_end_matches(['\r', '\n']);
            if trimmed.is_empty() {
                break;
            }
            if let Some((key, value)) = trimmed.split_once(':') {
                if key.trim().eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse::<usize>().ok();
                }
            }
        }

        let Some(len) = content_length else {
            // No Content-Length header in this block: discard and retry.
            continue;
        };

        let mut body = vec![0u8; len];
        if len > 0 {
            reader.read_exact(&mut body)?;
        }
        return Ok(Some(body));
    }
}

/// Writes one framed LSP message to `writer`, emitting the header, the raw
/// body bytes, then flushing. Body is written verbatim (never re-encoded),
/// so malformed-but-forwardable bytes pass through untouched.
pub fn write_message<W: Write>(writer: &mut W, body: &[u8]) -> io::Result<()> {
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer.write_all(header.as_bytes())?;
    writer.write_all(body)?;
    writer.flush()
}
