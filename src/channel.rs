//! Live progress channel decoding
//!
//! The server pushes a persistent, session-scoped SSE stream while analysis
//! runs. Each `data:` frame is a JSON object with optional fields; ad hoc
//! field-presence checks are converted here into an explicit tagged message
//! type so the session ingests exactly one kind of event at a time.
//!
//! Frames that fail to parse are logged and ignored so a malformed push
//! does not kill the channel.

use crate::models::record::Record;
use crate::models::progress::ProgressStep;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

/// A decoded push-channel message.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelMessage {
    /// Full progress snapshot; replaces the track wholesale
    ProgressUpdate(Vec<ProgressStep>),
    /// Terminal success: result table plus generated summary
    ResultReady {
        table: Vec<Record>,
        summary: Option<String>,
    },
    /// Terminal failure reported by the pipeline itself. The summary is
    /// retained for diagnostic display; any result payload on the same frame
    /// is discarded.
    PipelineFailed { summary: Option<String> },
    /// Transport fault on the channel itself
    TransportError,
}

/// Raw wire shape of one pushed frame. Field names match the server verbatim.
#[derive(Debug, Deserialize)]
struct FramePayload {
    progress: Option<Vec<ProgressStep>>,
    #[serde(rename = "Results")]
    results: Option<Vec<Map<String, Value>>>,
    #[serde(rename = "Summary")]
    summary: Option<String>,
    status: Option<String>,
}

/// Decode one SSE `data:` payload into zero or more messages.
///
/// A single frame may carry both a progress snapshot and a terminal payload
/// (the final frame does); the snapshot is emitted first so the track is
/// current when the terminal transition fires. Returns an empty vec for
/// malformed or empty frames.
pub fn decode_frame(data: &str) -> Vec<ChannelMessage> {
    let payload: FramePayload = match serde_json::from_str(data) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Ignoring malformed progress channel frame");
            return Vec::new();
        }
    };

    let mut messages = Vec::new();

    if let Some(steps) = payload.progress {
        messages.push(ChannelMessage::ProgressUpdate(steps));
    }

    if payload.status.as_deref() == Some("fail") {
        // Result payload, if any, is dropped on the floor here by contract.
        messages.push(ChannelMessage::PipelineFailed {
            summary: payload.summary,
        });
    } else if let Some(rows) = payload.results {
        let table = rows.iter().map(Record::from_json_object).collect();
        messages.push(ChannelMessage::ResultReady {
            table,
            summary: payload.summary,
        });
    }

    messages
}

/// Incremental SSE wire decoder.
///
/// Pure and transport-agnostic: feed it byte chunks as they arrive and it
/// yields complete `data:` payloads at event boundaries (blank line). Data
/// lines belonging to one event are joined with `\n` per the SSE spec;
/// comment lines (leading `:`) and other fields are skipped.
///
/// The transport may split a chunk anywhere, including inside a multi-byte
/// UTF-8 sequence, so bytes are buffered raw and only complete lines are
/// decoded as text.
#[derive(Debug, Default)]
pub struct SseFrameDecoder {
    buffer: Vec<u8>,
    data_lines: Vec<String>,
}

impl SseFrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns any complete event payloads it finished.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line_bytes);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !self.data_lines.is_empty() {
                    frames.push(self.data_lines.join("\n"));
                    self.data_lines.clear();
                }
            } else if let Some(data) = line.strip_prefix("data:") {
                self.data_lines
                    .push(data.strip_prefix(' ').unwrap_or(data).to_string());
            }
            // Comments and non-data fields (event:, id:, retry:) are ignored.
        }
        frames
    }
}
