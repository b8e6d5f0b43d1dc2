//! Backend API client
//!
//! Wraps every call to the parsing/translation service. Responses travel in
//! the standard `{success, message, data}` envelope; `success: false` is a
//! rejected operation carrying `message` as the human-readable cause, and an
//! unparsable body is reported as a payload error with a bounded excerpt.
//!
//! The URL builders at the bottom are pure — no network call.

mod types;

pub use types::{
    ApiEnvelope, ApiError, DocumentSource, FullMarkdownResult, FullTextResult, LayoutResult,
    ParsePdfResult, TaskStatus, TranslateDocumentResult, TranslateLayoutRequest,
    TranslateMarkdownRequest, TranslateOptions, UploadResult,
};

use bytes::Bytes;
use futures::Stream;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::layout::Layout;

/// File namespace on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Uploaded source files.
    Files,
    /// Parser output files.
    Mineru,
}

impl FileKind {
    fn segment(&self) -> &'static str {
        match self {
            FileKind::Files => "files",
            FileKind::Mineru => "mineru",
        }
    }
}

/// Client for the document parsing/translation backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Upload a file. Returns the server-side filename.
    pub async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<UploadResult, ApiError> {
        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(name.to_string()));

        let response = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;
        decode_response("upload", &response.text().await?)
    }

    /// Parse a PDF into a layout. With `wait` the response carries the full
    /// layout; otherwise a task id to poll.
    pub async fn parse_pdf(
        &self,
        name: &str,
        bytes: Vec<u8>,
        wait: bool,
    ) -> Result<ParsePdfResult, ApiError> {
        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(name.to_string()))
            .text("wait", wait.to_string());

        let response = self
            .http
            .post(self.endpoint("parse-pdf"))
            .multipart(form)
            .send()
            .await?;
        decode_response("parse-pdf", &response.text().await?)
    }

    pub async fn task_status(&self, task_id: &str) -> Result<TaskStatus, ApiError> {
        let url = self.endpoint(&format!("task/{}", urlencoding::encode(task_id)));
        let response = self.http.get(url).send().await?;
        decode_response("task-status", &response.text().await?)
    }

    pub async fn batch_status(&self, batch_id: &str) -> Result<TaskStatus, ApiError> {
        let url = self.endpoint(&format!("batch/{}", urlencoding::encode(batch_id)));
        let response = self.http.get(url).send().await?;
        decode_response("batch-status", &response.text().await?)
    }

    /// Parse a layout JSON file (already uploaded, or sent inline).
    pub async fn parse_layout(&self, source: DocumentSource) -> Result<LayoutResult, ApiError> {
        let form = source_form(source);
        let response = self
            .http
            .post(self.endpoint("layout"))
            .multipart(form)
            .send()
            .await?;
        decode_response("layout", &response.text().await?)
    }

    /// Translate a layout block-by-block. The response is the full layout
    /// with translated fields populated.
    pub async fn translate_layout(
        &self,
        layout: &Layout,
        target_lang: &str,
        options: &TranslateOptions,
    ) -> Result<LayoutResult, ApiError> {
        let body = TranslateLayoutRequest {
            layout,
            target_lang,
            model: options.model.as_deref(),
            force_retranslate: options.force_retranslate,
            translation_id: options.translation_id,
            timestamp: options.timestamp,
        };
        let response = self
            .http
            .post(self.endpoint("translate-layout"))
            .json(&body)
            .send()
            .await?;
        decode_response("translate-layout", &response.text().await?)
    }

    /// Translate a parsed document file server-side.
    pub async fn translate_document(
        &self,
        source: DocumentSource,
        target_lang: &str,
        model: Option<&str>,
    ) -> Result<TranslateDocumentResult, ApiError> {
        let mut form = source_form(source).text("target_lang", target_lang.to_string());
        if let Some(model) = model {
            form = form.text("model", model.to_string());
        }
        let response = self
            .http
            .post(self.endpoint("translate"))
            .multipart(form)
            .send()
            .await?;
        decode_response("translate", &response.text().await?)
    }

    /// Synchronous full-document markdown translation.
    pub async fn translate_full_markdown(
        &self,
        task_id: &str,
        target_lang: &str,
        options: &TranslateOptions,
    ) -> Result<FullMarkdownResult, ApiError> {
        let body = TranslateMarkdownRequest {
            task_id,
            target_lang,
            model: options.model.as_deref(),
            translation_id: options.translation_id,
            timestamp: options.timestamp,
        };
        let response = self
            .http
            .post(self.endpoint("translate-full"))
            .json(&body)
            .send()
            .await?;
        decode_response("translate-full", &response.text().await?)
    }

    /// Streaming full-document translation: opens the long-lived request
    /// and returns the raw fragment stream for [`crate::stream::drive`].
    ///
    /// `session_id` is the caller's stream session identity; it only tags
    /// the log line here — the session controller checks every event against
    /// its active session id and drops stale ones.
    pub async fn translate_full_markdown_stream(
        &self,
        task_id: &str,
        target_lang: &str,
        options: &TranslateOptions,
        session_id: Uuid,
    ) -> Result<impl Stream<Item = Result<Bytes, reqwest::Error>>, ApiError> {
        let body = TranslateMarkdownRequest {
            task_id,
            target_lang,
            model: options.model.as_deref(),
            translation_id: options.translation_id,
            timestamp: options.timestamp,
        };
        tracing::info!(
            session_id = %session_id,
            task_id = %task_id,
            target_lang = %target_lang,
            "Opening translation stream"
        );
        let response = self
            .http
            .post(self.endpoint("translate-full/stream"))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes_stream())
    }

    pub async fn full_text(&self, task_id: &str) -> Result<FullTextResult, ApiError> {
        let url = self.endpoint(&format!("full-text/{}", urlencoding::encode(task_id)));
        let response = self.http.get(url).send().await?;
        decode_response("full-text", &response.text().await?)
    }

    // ========================================================================
    // URL builders (pure, no network)
    // ========================================================================

    pub fn file_url(&self, filename: &str, kind: FileKind) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            kind.segment(),
            urlencoding::encode(filename)
        )
    }

    pub fn image_url(&self, task_id: &str, image_name: &str) -> String {
        format!(
            "{}/images/{}/{}",
            self.base_url,
            urlencoding::encode(task_id),
            urlencoding::encode(image_name)
        )
    }

    pub fn translation_download_url(&self, filename: &str) -> String {
        format!(
            "{}/download/translation/{}",
            self.base_url,
            urlencoding::encode(filename)
        )
    }
}

fn source_form(source: DocumentSource) -> reqwest::multipart::Form {
    match source {
        DocumentSource::Filename(filename) => {
            reqwest::multipart::Form::new().text("filename", filename)
        }
        DocumentSource::File { name, bytes } => reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(name)),
    }
}

/// Decode a response body: envelope first, then the typed payload.
///
/// Two-step deserialization so a `success: false` envelope with an empty
/// `data` object never reports as a parse error.
fn decode_response<T: DeserializeOwned>(
    operation: &'static str,
    body: &str,
) -> Result<T, ApiError> {
    let envelope: ApiEnvelope<serde_json::Value> =
        serde_json::from_str(body).map_err(|err| ApiError::MalformedPayload {
            operation,
            error: err.to_string(),
            excerpt: crate::stream::payload_excerpt(body),
        })?;

    if !envelope.success {
        return Err(ApiError::Rejected {
            operation,
            message: if envelope.message.is_empty() {
                "operation failed".to_string()
            } else {
                envelope.message
            },
        });
    }

    serde_json::from_value(envelope.data).map_err(|err| ApiError::MalformedPayload {
        operation,
        error: err.to_string(),
        excerpt: crate::stream::payload_excerpt(body),
    })
}
