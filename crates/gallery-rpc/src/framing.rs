//! Content-Length message framing

use crate::constants::{CONTENT_LENGTH_HEADER, MAX_HEADER_LINE_BYTES};
use crate::{Error, Result, RpcMessage};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Encode one message as a complete frame
pub fn encode_frame(message: &RpcMessage, max_frame_bytes: usize) -> Result<Vec<u8>> {
    let json = serde_json::to_string(message)?;
    if json.len() > max_frame_bytes {
        return Err(Error::FrameTooLarge {
            size: json.len(),
            limit: max_frame_bytes,
        });
    }
    let mut frame = format!("{} {}\r\n\r\n", CONTENT_LENGTH_HEADER, json.len()).into_bytes();
    frame.extend_from_slice(json.as_bytes());
    Ok(frame)
}

/// Write one framed message and flush
pub async fn write_frame<W>(
    writer: &mut W,
    message: &RpcMessage,
    max_frame_bytes: usize,
) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let frame = encode_frame(message, max_frame_bytes)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    trace!(id = message.id(), bytes = frame.len(), "Sent frame");
    Ok(())
}

/// Read one framed message
///
/// Returns `Ok(None)` on a clean EOF between frames. Unknown headers are
/// ignored; a missing or oversized `Content-Length` is a protocol error.
/// Header lines are read through a bounded reader, so a peer that never
/// sends a line break costs at most `MAX_HEADER_LINE_BYTES + 1` bytes.
pub async fn read_frame<R>(reader: &mut R, max_frame_bytes: usize) -> Result<Option<RpcMessage>>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;
    let mut line: Vec<u8> = Vec::with_capacity(64);
    let mut saw_header = false;

    loop {
        line.clear();
        let bytes_read = (&mut *reader)
            .take(MAX_HEADER_LINE_BYTES as u64 + 1)
            .read_until(b'\n', &mut line)
            .await?;

        if bytes_read == 0 {
            if saw_header {
                return Err(Error::Protocol("EOF inside frame headers".to_string()));
            }
            return Ok(None);
        }
        if line.len() > MAX_HEADER_LINE_BYTES {
            return Err(Error::Protocol(format!(
                "Header line exceeds {} bytes",
                MAX_HEADER_LINE_BYTES
            )));
        }

        let header = std::str::from_utf8(&line)
            .map_err(|_| Error::Protocol("Header line is not valid UTF-8".to_string()))?
            .trim();
        if header.is_empty() {
            if saw_header {
                break;
            }
            // Tolerate blank lines between frames
            continue;
        }
        saw_header = true;

        if let Some(value) = header.strip_prefix(CONTENT_LENGTH_HEADER) {
            let value = value.trim();
            content_length = Some(
                value
                    .parse()
                    .map_err(|_| Error::Protocol(format!("Invalid Content-Length: {}", value)))?,
            );
        }
    }

    let length = content_length
        .ok_or_else(|| Error::Protocol("Missing Content-Length header".to_string()))?;
    if length > max_frame_bytes {
        return Err(Error::FrameTooLarge {
            size: length,
            limit: max_frame_bytes,
        });
    }

    let mut buffer = vec![0u8; length];
    reader.read_exact(&mut buffer).await?;
    let content = String::from_utf8(buffer)?;
    trace!(bytes = length, "Received frame");

    let message: RpcMessage = serde_json::from_str(&content)?;
    Ok(Some(message))
}
