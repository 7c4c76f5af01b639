//! Server-sent event decoding for provider streams.
//!
//! Vendors stream completions as `data: <json>` lines. Network reads do not
//! respect line boundaries, so bytes are buffered until a full line arrives.

use docchat_core::{AppError, AppResult};
use futures::stream::{Stream, StreamExt};
use std::fmt::Display;

/// Marker OpenAI sends as its last data line.
pub const DONE_MARKER: &str = "[DONE]";

/// Convert a byte stream into a stream of complete lines (without terminators).
pub fn lines<S, B, E>(byte_stream: S) -> impl Stream<Item = AppResult<String>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    futures::stream::unfold(
        (Box::pin(byte_stream), Vec::<u8>::new(), false),
        |(mut stream, mut buffer, mut finished)| async move {
            loop {
                if let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let mut line: Vec<u8> = buffer.drain(..=pos).collect();
                    line.pop();
                    if line.last() == Some(&b'\r') {
                        line.pop();
                    }
                    let line = String::from_utf8_lossy(&line).into_owned();
                    return Some((Ok(line), (stream, buffer, finished)));
                }

                if finished {
                    if buffer.is_empty() {
                        return None;
                    }
                    let rest = String::from_utf8_lossy(&std::mem::take(&mut buffer)).into_owned();
                    return Some((Ok(rest), (stream, buffer, finished)));
                }

                match stream.next().await {
                    Some(Ok(bytes)) => buffer.extend_from_slice(bytes.as_ref()),
                    Some(Err(e)) => {
                        // Surface the failure once, then end the stream.
                        buffer.clear();
                        finished = true;
                        return Some((
                            Err(AppError::Stream(format!("Stream read error: {}", e))),
                            (stream, buffer, finished),
                        ));
                    }
                    None => finished = true,
                }
            }
        },
    )
}

/// Extract the payload of an SSE `data:` line.
///
/// Returns `None` for blank lines, comments, and other fields (`event:`, `id:`).
pub fn data_payload(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("data:")?;
    let payload = rest.strip_prefix(' ').unwrap_or(rest).trim_end();
    if payload.is_empty() {
        None
    } else {
        Some(payload)
    }
}

/// Stream of `data:` payloads from an SSE byte stream.
pub fn data_lines<S, B, E>(byte_stream: S) -> impl Stream<Item = AppResult<String>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    lines(byte_stream).filter_map(|line| {
        futures::future::ready(match line {
            Ok(line) => data_payload(&line).map(|p| Ok(p.to_string())),
            Err(e) => Some(Err(e)),
        })
    })
}
