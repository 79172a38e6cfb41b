//! Server-Sent Events (SSE) processing for streaming completions.
//!
//! OpenAI-compatible servers send one `data: {json}` event per chunk, separated by a
//! blank line, and finish with `data: [DONE]`.  This module turns the raw byte stream
//! of such a response into a stream of [`ChatCompletionChunk`]s.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;

use crate::observability::{STREAM_BYTES, STREAM_ERRORS, STREAM_EVENTS};
use crate::{ChatCompletionChunk, Error, Result};

/// What one complete SSE event turned out to be.
enum Event {
    Chunk(Result<ChatCompletionChunk>),
    Done,
    Skip,
}

/// Process a stream of bytes into a stream of completion chunks.
///
/// Events may be split across (or packed into) arbitrary byte chunks, including in the
/// middle of a multi-byte character.  The stream ends at `[DONE]` or when the body
/// ends, whichever comes first.
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<ChatCompletionChunk>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + 'static,
{
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    let buffer: Vec<u8> = Vec::new();

    stream::unfold(
        (stream, buffer, false),
        move |(mut stream, mut buffer, done)| async move {
            if done {
                return None;
            }
            loop {
                if let Some(event) = extract_event(&mut buffer) {
                    match event {
                        Event::Chunk(chunk) => {
                            STREAM_EVENTS.click();
                            if chunk.is_err() {
                                STREAM_ERRORS.click();
                            }
                            return Some((chunk, (stream, buffer, false)));
                        }
                        Event::Done => return None,
                        Event::Skip => continue,
                    }
                }

                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        buffer.extend(bytes.iter().filter(|b| **b != b'\r'));
                    }
                    Some(Err(e)) => {
                        STREAM_ERRORS.click();
                        return Some((Err(e), (stream, buffer, true)));
                    }
                    None => {
                        // A final event may arrive without its trailing blank line.
                        if !buffer.iter().all(u8::is_ascii_whitespace) {
                            buffer.extend_from_slice(b"\n\n");
                            if let Some(Event::Chunk(chunk)) = extract_event(&mut buffer) {
                                return Some((chunk, (stream, Vec::new(), true)));
                            }
                        }
                        return None;
                    }
                }
            }
        },
    )
}

/// Remove one complete SSE event from the front of `buffer`.
fn extract_event(buffer: &mut Vec<u8>) -> Option<Event> {
    let end = buffer.windows(2).position(|w| w == b"\n\n")?;
    let mut raw: Vec<u8> = buffer.drain(..end + 2).collect();
    raw.truncate(end);

    let event_text = match std::str::from_utf8(&raw) {
        Ok(text) => text,
        Err(e) => {
            return Some(Event::Chunk(Err(Error::encoding(
                format!("Invalid UTF-8 in stream: {e}"),
                Some(Box::new(e)),
            ))));
        }
    };

    let data: Vec<&str> = event_text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect();
    if data.is_empty() {
        // Comments (`: keep-alive`) and events without data carry nothing for us.
        return Some(Event::Skip);
    }
    let data = data.join("\n");
    if data.trim() == "[DONE]" {
        return Some(Event::Done);
    }
    Some(Event::Chunk(parse_chunk(&data)))
}

/// Parse the data of one event, recognizing in-band error objects.
fn parse_chunk(data: &str) -> Result<ChatCompletionChunk> {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        error: ErrorDetail,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        #[serde(rename = "type")]
        error_type: Option<String>,
        message: Option<String>,
    }

    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(data) {
        return Err(Error::streaming(
            format!(
                "{}: {}",
                envelope
                    .error
                    .error_type
                    .unwrap_or_else(|| "stream_error".to_string()),
                envelope.error.message.unwrap_or_default()
            ),
            None,
        ));
    }
    serde_json::from_str::<ChatCompletionChunk>(data).map_err(|e| {
        Error::serialization(format!("Failed to parse event JSON: {e}"), Some(Box::new(e)))
    })
}
