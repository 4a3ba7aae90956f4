//! Server-sent-event draining for the completion service.
//!
//! The service streams token fragments as `data:{json}` lines and may emit
//! a final `event:result` block carrying the consolidated transcript, which
//! supersedes whatever was accumulated. Chunks are consumed in arrival
//! order up to a deadline; there is no mid-call cancellation beyond it.

use bytes::Bytes;
use futures::StreamExt;
use tokio::time::{timeout, Duration};

use super::CompletionError;

/// One parsed server-sent-event line. Anything other than event/data lines
/// (comments, blank keep-alives) is ignored by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    Event(String),
    Data(String),
    Done,
}

/// Parses a single SSE line.
pub fn parse_sse_line(line: &str) -> Option<SseLine> {
    let line = line.trim();
    if let Some(name) = line.strip_prefix("event:") {
        return Some(SseLine::Event(name.trim().to_string()));
    }
    if let Some(data) = line.strip_prefix("data:") {
        let data = data.trim();
        if data == "[DONE]" {
            return Some(SseLine::Done);
        }
        return Some(SseLine::Data(data.to_string()));
    }
    None
}

/// Assembles streamed fragments into the final transcript.
///
/// Token events append `message.content` in arrival order. A `result`
/// event replaces the accumulated text with its consolidated content — the
/// service sometimes sends both, and the consolidated form is
/// authoritative. A repeated identical `result` payload is ignored.
#[derive(Debug, Default)]
pub struct TranscriptAssembler {
    accumulated: String,
    consolidated: Option<String>,
    pending_result: bool,
    done: bool,
}

impl TranscriptAssembler {
    pub fn push(&mut self, line: &str) {
        let Some(parsed) = parse_sse_line(line) else {
            return;
        };
        match parsed {
            SseLine::Event(name) => self.pending_result = name == "result",
            SseLine::Done => self.done = true,
            SseLine::Data(data) => {
                let is_result = self.pending_result;
                self.pending_result = false;
                // Malformed payloads are skipped, not fatal: the recovery
                // extractor deals with whatever transcript comes out.
                let Some(content) = extract_content(&data) else {
                    return;
                };
                if is_result {
                    if self.consolidated.as_deref() != Some(content.as_str()) {
                        self.consolidated = Some(content);
                    }
                } else {
                    self.accumulated.push_str(&content);
                }
            }
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Final transcript: the consolidated result when present, otherwise
    /// the concatenation of token fragments.
    pub fn finish(self) -> String {
        self.consolidated.unwrap_or(self.accumulated)
    }
}

/// Pulls `message.content` out of one data payload.
fn extract_content(data: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(data).ok()?;
    value
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

/// Drains the response body line by line until `[DONE]`, end of stream, or
/// the deadline, and assembles the transcript.
pub async fn drain_event_stream(
    response: reqwest::Response,
    deadline: Duration,
) -> Result<String, CompletionError> {
    let mut body = std::pin::pin!(response.bytes_stream());
    let mut assembler = TranscriptAssembler::default();
    let mut buffer: Vec<u8> = Vec::new();

    let drained = timeout(deadline, async {
        while let Some(chunk) = body.next().await {
            let chunk: Bytes = chunk?;
            buffer.extend_from_slice(&chunk);
            while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                assembler.push(String::from_utf8_lossy(&line).trim_end_matches(['\r', '\n']));
            }
            if assembler.is_done() {
                break;
            }
        }
        Ok::<(), CompletionError>(())
    })
    .await;

    match drained {
        Ok(Ok(())) => {
            // Flush a trailing unterminated line.
            if !buffer.is_empty() {
                assembler.push(String::from_utf8_lossy(&buffer).trim_end_matches(['\r', '\n']));
            }
            Ok(assembler.finish())
        }
        Ok(Err(e)) => Err(e),
        Err(_) => Err(CompletionError::Deadline(deadline.as_secs())),
    }
}
