//! Backend API types
//!
//! Request/response shapes for the parsing/translation service. Every
//! response travels in the `{success, message, data}` envelope; wire field
//! names are snake_case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::layout::Layout;

/// Standard response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: T,
}

/// Where a document operation reads its input from.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// A file already uploaded to the server.
    Filename(String),
    /// A file sent along with the request.
    File { name: String, bytes: Vec<u8> },
}

/// Optional knobs shared by the translation operations.
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    pub model: Option<String>,
    pub force_retranslate: bool,
    /// Client-generated identity for this translation run.
    pub translation_id: Option<Uuid>,
    pub timestamp: Option<DateTime<Utc>>,
}

// ============================================================================
// Response payloads
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResult {
    pub filename: String,
    #[serde(default)]
    pub filepath: Option<String>,
}

/// Result of `parse-pdf`: a task handle, or the full layout when the
/// request asked to wait.
#[derive(Debug, Clone, Deserialize)]
pub struct ParsePdfResult {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub layout: Option<Layout>,
    #[serde(default)]
    pub layout_count: Option<u32>,
}

/// Status of an asynchronous parse/translate task or batch.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatus {
    #[serde(default)]
    pub status: String,
    /// Operation-specific result, present once the task is done.
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

impl TaskStatus {
    pub fn is_done(&self) -> bool {
        matches!(self.status.as_str(), "done" | "completed" | "success")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayoutResult {
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub layout_count: Option<u32>,
    #[serde(default)]
    pub layout_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslateDocumentResult {
    pub translated_file: String,
    #[serde(default)]
    pub target_lang: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FullMarkdownResult {
    pub content: String,
    #[serde(default)]
    pub translation_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FullTextResult {
    pub content: String,
}

// ============================================================================
// Request bodies
// ============================================================================

/// JSON body of `translate-layout`.
#[derive(Debug, Clone, Serialize)]
pub struct TranslateLayoutRequest<'a> {
    pub layout: &'a Layout,
    pub target_lang: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub force_retranslate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// JSON body of the full-markdown translate operations.
#[derive(Debug, Clone, Serialize)]
pub struct TranslateMarkdownRequest<'a> {
    pub task_id: &'a str,
    pub target_lang: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

// ============================================================================
// Errors
// ============================================================================

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connect, timeout, non-success status).
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with `success: false`.
    #[error("{operation} failed: {message}")]
    Rejected {
        operation: &'static str,
        message: String,
    },

    /// Unparsable response body. Distinct from a business-logic failure and
    /// carries a bounded excerpt of the offending payload.
    #[error("Malformed {operation} response: {error} (payload: {excerpt})")]
    MalformedPayload {
        operation: &'static str,
        error: String,
        excerpt: String,
    },
}
