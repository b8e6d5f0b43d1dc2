//! Stream event and session types

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use super::decoder::RawEvent;

/// Longest payload excerpt included in malformed-event logs.
const EXCERPT_LEN: usize = 120;

// ============================================================================
// Wire payloads
// ============================================================================

/// `init` event payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InitPayload {
    /// Total chunk count; absent or zero means unknown-total streaming.
    #[serde(default)]
    pub total_chunks: Option<u32>,
}

/// `progress` event payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProgressPayload {
    pub chunk_number: u32,
    #[serde(default)]
    pub total_chunks: Option<u32>,
    #[serde(default)]
    pub translated_chunk: String,
    #[serde(default)]
    pub status: Option<String>,
    /// Chunk-level failure. Does not abort the stream.
    #[serde(default)]
    pub error: Option<String>,
}

impl ProgressPayload {
    pub fn is_failed(&self) -> bool {
        self.error.is_some() || self.status.as_deref() == Some("failed")
    }
}

/// `complete` event payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompletePayload {
    /// Full translated document content.
    #[serde(default)]
    pub content: String,
    /// Server-side artifact holding the persisted translation.
    #[serde(default)]
    pub translation_file: Option<String>,
}

/// `error` event payload (protocol-level failure).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub message: String,
}

/// Decoded translation stream event.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Init(InitPayload),
    Progress(ProgressPayload),
    Complete(CompletePayload),
    Error(ErrorPayload),
}

impl StreamEvent {
    /// Parse a raw record into a typed event.
    ///
    /// A record with an unknown event name or an unparsable payload is
    /// logged and skipped — a single corrupt frame never terminates the
    /// stream.
    pub fn parse(raw: &RawEvent) -> Option<Self> {
        let parsed = match raw.event.as_str() {
            "init" => serde_json::from_str(&raw.data).map(StreamEvent::Init),
            "progress" => serde_json::from_str(&raw.data).map(StreamEvent::Progress),
            "complete" => serde_json::from_str(&raw.data).map(StreamEvent::Complete),
            "error" => serde_json::from_str(&raw.data).map(StreamEvent::Error),
            other => {
                tracing::debug!(event = %other, "Ignoring unknown stream event type");
                return None;
            }
        };

        match parsed {
            Ok(event) => Some(event),
            Err(err) => {
                tracing::warn!(
                    event = %raw.event,
                    error = %err,
                    payload = %excerpt(&raw.data),
                    "Skipping malformed stream event payload"
                );
                None
            }
        }
    }
}

/// Bounded excerpt of an offending payload for diagnosis.
pub(crate) fn excerpt(payload: &str) -> String {
    if payload.len() <= EXCERPT_LEN {
        return payload.to_string();
    }
    let cut = payload
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= EXCERPT_LEN)
        .last()
        .unwrap_or(0);
    format!("{}…", &payload[..cut])
}

// ============================================================================
// Session state
// ============================================================================

/// Stream session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    /// Before the first event; no chunks counted.
    Initializing,
    InProgress,
    Complete,
    Failed,
}

/// One chunk the server flagged as failed. The stream carried on; the
/// chunk's text is treated as empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkFailure {
    pub chunk_number: u32,
    pub error: String,
}

/// Transient state of one in-flight streaming translation request.
///
/// At most one session is active per document session; every incoming event
/// is checked against the active session's id and stale events are dropped.
#[derive(Debug, Clone)]
pub struct StreamSession {
    id: Uuid,
    status: StreamStatus,
    pub total_chunks: Option<u32>,
    pub received_chunks: u32,
    content: String,
    pub chunk_failures: Vec<ChunkFailure>,
    /// Server-side artifact reference, delivered with `complete`.
    pub translation_file: Option<String>,
    /// Protocol-level failure message, delivered with `error`.
    pub failure: Option<String>,
}

impl StreamSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            status: StreamStatus::Initializing,
            total_chunks: None,
            received_chunks: 0,
            content: String::new(),
            chunk_failures: Vec::new(),
            translation_file: None,
            failure: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> StreamStatus {
        self.status
    }

    /// Accumulated translated content. Monotonic: merged chunks are never
    /// rolled back, even after a protocol-level failure.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, StreamStatus::Complete | StreamStatus::Failed)
    }

    /// Completion ratio when the total is known.
    pub fn progress_ratio(&self) -> Option<f32> {
        match self.total_chunks {
            Some(total) if total > 0 => Some(self.received_chunks as f32 / total as f32),
            _ => None,
        }
    }

    /// Apply one event in arrival order.
    pub fn apply(&mut self, event: StreamEvent) {
        if self.is_terminal() {
            tracing::debug!(session_id = %self.id, "Event after terminal state, ignoring");
            return;
        }

        match event {
            StreamEvent::Init(init) => {
                // Zero or absent means unknown-total streaming.
                self.total_chunks = init.total_chunks.filter(|&n| n > 0);
                self.status = StreamStatus::InProgress;
                tracing::info!(
                    session_id = %self.id,
                    total_chunks = ?self.total_chunks,
                    "Translation stream started"
                );
            }
            StreamEvent::Progress(progress) => {
                // The transport guarantees init-first, but a proxy may drop
                // frames; progress alone still moves the session forward.
                self.status = StreamStatus::InProgress;
                self.received_chunks += 1;
                if self.total_chunks.is_none() {
                    self.total_chunks = progress.total_chunks.filter(|&n| n > 0);
                }
                if progress.is_failed() {
                    let error = progress
                        .error
                        .clone()
                        .unwrap_or_else(|| "chunk failed".to_string());
                    tracing::warn!(
                        session_id = %self.id,
                        chunk = progress.chunk_number,
                        error = %error,
                        "Chunk translation failed, stream continues"
                    );
                    self.chunk_failures.push(ChunkFailure {
                        chunk_number: progress.chunk_number,
                        error,
                    });
                } else {
                    self.content.push_str(&progress.translated_chunk);
                }
            }
            StreamEvent::Complete(complete) => {
                // The complete payload is authoritative when present;
                // otherwise the accumulated chunks stand.
                if !complete.content.is_empty() {
                    self.content = complete.content;
                }
                self.translation_file = complete.translation_file;
                self.status = StreamStatus::Complete;
                tracing::info!(
                    session_id = %self.id,
                    received = self.received_chunks,
                    failed = self.chunk_failures.len(),
                    "Translation stream complete"
                );
            }
            StreamEvent::Error(error) => {
                // Partial progress already merged stays visible.
                self.failure = Some(error.message.clone());
                self.status = StreamStatus::Failed;
                tracing::warn!(
                    session_id = %self.id,
                    message = %error.message,
                    "Translation stream failed"
                );
            }
        }
    }

    /// Fail the session from outside the protocol (transport error,
    /// truncated stream).
    pub fn fail(&mut self, message: impl Into<String>) {
        if self.is_terminal() {
            return;
        }
        self.failure = Some(message.into());
        self.status = StreamStatus::Failed;
    }
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Stream error types
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Stream transport error: {0}")]
    Transport(String),

    #[error("Stream ended before a complete or error event")]
    Truncated,

    #[error("Translation stream failed: {0}")]
    Protocol(String),
}
