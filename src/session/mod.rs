//! Reader session controller
//!
//! Exclusive owner of the in-memory document model: the layout, the page
//! renderer and the active translation stream all live here, and all
//! mutation happens on the single cooperative execution context driving the
//! session. Every asynchronous operation snapshots the document generation
//! before suspending and its late result is dropped when the generation has
//! moved on — the general staleness discipline; no locking is needed.

mod config;

pub use config::SessionConfig;

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::api::{ApiClient, ApiError, DocumentSource, FileKind, TranslateOptions};
use crate::layout::{Layout, TextBlock};
use crate::overlay::{self, HitRegion};
use crate::render::{PageRenderer, RenderError, RenderState, Rasterizer};
use crate::stream::{self, StreamError, StreamEvent, StreamSession, StreamStatus};

/// Session error types
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No document loaded")]
    NoDocument,

    #[error("Document has no parse task; parse it first")]
    NoTask,

    #[error("Layout is empty; nothing to translate")]
    EmptyLayout,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Stream(#[from] StreamError),
}

/// The loaded document's server-side identity.
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    /// Server-side filename from the upload.
    pub filename: String,
    /// Parse task id, when the parse ran asynchronously.
    pub task_id: Option<String>,
}

/// Outcome of [`ReaderSession::open_document`]. Upload and parse are gated
/// independently: a parse failure leaves the PDF displayable and is carried
/// here instead of failing the open.
#[derive(Debug, Clone)]
pub struct OpenOutcome {
    pub filename: String,
    pub block_count: usize,
    /// Parse failed; the document still renders without an overlay.
    pub parse_error: Option<String>,
}

/// One reader session over one document at a time.
pub struct ReaderSession {
    api: ApiClient,
    renderer: PageRenderer,
    config: SessionConfig,
    layout: Layout,
    document: Option<DocumentInfo>,
    /// Bumped whenever the document (or its layout) is replaced; async
    /// results snapshoting an older value are stale and dropped.
    document_generation: u64,
    current_page: u32,
    scale: f32,
    /// At most one stream session is active; events are checked against
    /// its id and stale ones dropped.
    stream: Option<StreamSession>,
    /// Finalized full-document translation (stream or sync variant).
    translated_markdown: Option<String>,
    translation_file: Option<String>,
}

impl ReaderSession {
    pub fn new(config: SessionConfig, rasterizer: Arc<dyn Rasterizer>) -> Self {
        let api = ApiClient::new(config.api_base.clone());
        let renderer = PageRenderer::new(rasterizer, config.renderer.clone());
        let scale = config.renderer.default_scale;
        Self {
            api,
            renderer,
            config,
            layout: Layout::new(),
            document: None,
            document_generation: 0,
            current_page: 1,
            scale,
            stream: None,
            translated_markdown: None,
            translation_file: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn document(&self) -> Option<&DocumentInfo> {
        self.document.as_ref()
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn render_state(&self) -> &RenderState {
        self.renderer.state()
    }

    pub fn renderer(&self) -> &PageRenderer {
        &self.renderer
    }

    pub fn stream_session(&self) -> Option<&StreamSession> {
        self.stream.as_ref()
    }

    /// Finalized full-document translation, when one has completed.
    pub fn translated_markdown(&self) -> Option<&str> {
        self.translated_markdown.as_deref()
    }

    pub fn translation_file(&self) -> Option<&str> {
        self.translation_file.as_deref()
    }

    // ========================================================================
    // Document lifecycle
    // ========================================================================

    /// Upload a PDF and parse it into a layout.
    ///
    /// Display and overlay are gated independently: when the parse fails the
    /// upload still succeeds, the renderer points at the new document, and
    /// the parse failure is reported in the outcome.
    pub async fn open_document(
        &mut self,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<OpenOutcome, SessionError> {
        let uploaded = self.api.upload(name, bytes.clone()).await?;

        self.install_document(DocumentInfo {
            filename: uploaded.filename.clone(),
            task_id: None,
        });

        let parse_error = match self.api.parse_pdf(name, bytes, true).await {
            Ok(parsed) => {
                if let Some(doc) = self.document.as_mut() {
                    doc.task_id = parsed.task_id;
                }
                if let Some(layout) = parsed.layout {
                    self.layout.replace(layout.blocks().to_vec());
                }
                None
            }
            Err(err) => {
                tracing::warn!(filename = %uploaded.filename, error = %err, "Parse failed, document still displayable");
                Some(err.to_string())
            }
        };

        Ok(OpenOutcome {
            filename: uploaded.filename,
            block_count: self.layout.len(),
            parse_error,
        })
    }

    /// Load a layout from a parser-output JSON file (uploaded or inline).
    pub async fn load_layout(&mut self, source: DocumentSource) -> Result<usize, SessionError> {
        let generation = self.document_generation;
        let result = self.api.parse_layout(source).await?;
        if generation != self.document_generation {
            tracing::debug!("Discarding layout response for a superseded document");
            return Ok(0);
        }
        self.ingest_layout(result.layout);
        Ok(self.layout.len())
    }

    /// Replace the layout wholesale. Supersedes any in-flight stream: its
    /// results belong to the previous layout.
    pub fn ingest_layout(&mut self, layout: Layout) {
        self.document_generation += 1;
        self.stream = None;
        self.layout = layout;
        self.current_page = 1;
    }

    fn install_document(&mut self, info: DocumentInfo) {
        self.document_generation += 1;
        self.stream = None;
        self.translated_markdown = None;
        self.translation_file = None;
        self.layout = Layout::new();
        self.current_page = 1;
        let url = self.api.file_url(&info.filename, FileKind::Files);
        self.renderer.set_document(url);
        tracing::info!(filename = %info.filename, generation = self.document_generation, "Document opened");
        self.document = Some(info);
    }

    // ========================================================================
    // Rendering & overlay
    // ========================================================================

    /// Render the current page at the session scale.
    pub async fn render_current_page(&mut self) -> Result<(), SessionError> {
        let page = self.current_page;
        let scale = self.scale;
        self.renderer.render(page, scale).await?;
        Ok(())
    }

    /// Move to `page`, clamped to known navigation bounds. The page count
    /// is only known after a first successful render, so before that only
    /// the lower bound is enforced.
    pub fn go_to_page(&mut self, page: u32) -> u32 {
        let mut target = page.max(1);
        if let Some(count) = self.renderer.page_count() {
            target = target.min(count.max(1));
        }
        self.current_page = target;
        target
    }

    pub fn set_scale(&mut self, scale: f32) {
        if scale > 0.0 {
            self.scale = scale;
        }
    }

    /// Hit-regions for the current page; empty until a raster for this page
    /// at the session scale is ready (a zoom change hides the regions until
    /// the re-render lands).
    pub fn hit_regions(&self) -> Vec<HitRegion> {
        overlay::compose(
            &self.layout,
            self.current_page,
            self.scale,
            self.renderer.state(),
        )
    }

    /// Snapshot the block behind an activated hit-region.
    pub fn select_block(&self, index: usize) -> Option<TextBlock> {
        overlay::select(&self.layout, self.current_page, index)
    }

    // ========================================================================
    // Batch translation
    // ========================================================================

    /// Translate the layout block-by-block and merge the translated fields.
    pub async fn translate_layout(
        &mut self,
        target_lang: Option<&str>,
    ) -> Result<(), SessionError> {
        if self.layout.is_empty() {
            return Err(SessionError::EmptyLayout);
        }
        let lang = target_lang
            .unwrap_or(&self.config.default_target_lang)
            .to_string();
        let options = self.translate_options();
        let generation = self.document_generation;

        let result = self
            .api
            .translate_layout(&self.layout, &lang, &options)
            .await?;

        if generation != self.document_generation {
            tracing::debug!("Discarding translated layout for a superseded document");
            return Ok(());
        }
        self.layout.merge_translated_from(&result.layout);
        Ok(())
    }

    /// Translate the parsed document file server-side; returns the path of
    /// the translated artifact.
    pub async fn translate_document(
        &mut self,
        target_lang: Option<&str>,
    ) -> Result<String, SessionError> {
        let filename = self
            .document
            .as_ref()
            .map(|d| d.filename.clone())
            .ok_or(SessionError::NoDocument)?;
        let lang = target_lang
            .unwrap_or(&self.config.default_target_lang)
            .to_string();
        let options = self.translate_options();

        let result = self
            .api
            .translate_document(
                DocumentSource::Filename(filename),
                &lang,
                options.model.as_deref(),
            )
            .await?;
        Ok(result.translated_file)
    }

    // ========================================================================
    // Streaming translation
    // ========================================================================

    /// Register a new stream session, superseding any session in flight.
    /// The superseded session's later events no longer match the active id
    /// and are dropped by [`apply_stream_event`](Self::apply_stream_event).
    pub fn begin_stream(&mut self) -> Uuid {
        if let Some(old) = &self.stream {
            if !old.is_terminal() {
                tracing::info!(superseded = %old.id(), "New stream supersedes one in flight");
            }
        }
        let session = StreamSession::new();
        let id = session.id();
        self.stream = Some(session);
        id
    }

    /// Apply one stream event, with the session identity check every event
    /// goes through: events bearing no matching in-flight session are
    /// dropped silently. Returns whether the event was applied.
    pub fn apply_stream_event(&mut self, session_id: Uuid, event: StreamEvent) -> bool {
        match self.stream.as_mut() {
            Some(session) if session.id() == session_id => {
                session.apply(event);
                if session.status() == StreamStatus::Complete {
                    self.translated_markdown = Some(session.content().to_string());
                    self.translation_file = session.translation_file.clone();
                }
                true
            }
            _ => {
                tracing::debug!(session_id = %session_id, "Dropping event from stale stream session");
                false
            }
        }
    }

    /// Run a full streaming translation to completion.
    ///
    /// Opens the long-lived request and drives the event protocol with
    /// [`stream::drive`]. Partial content already merged stays on the
    /// session even when the stream fails.
    pub async fn translate_stream(
        &mut self,
        target_lang: Option<&str>,
    ) -> Result<(), SessionError> {
        let task_id = self
            .document
            .as_ref()
            .ok_or(SessionError::NoDocument)?
            .task_id
            .clone()
            .ok_or(SessionError::NoTask)?;
        let lang = target_lang
            .unwrap_or(&self.config.default_target_lang)
            .to_string();
        let options = self.translate_options();

        let id = self.begin_stream();

        let byte_stream = match self
            .api
            .translate_full_markdown_stream(&task_id, &lang, &options, id)
            .await
        {
            Ok(byte_stream) => byte_stream,
            Err(err) => {
                self.fail_stream(id, err.to_string());
                return Err(err.into());
            }
        };

        // Nothing can supersede the session while `&mut self` is held
        // across the drive, so it is taken out, driven to a terminal state
        // by `stream::drive`, and re-installed with whatever it merged.
        let mut session = match self.stream.take() {
            Some(session) if session.id() == id => session,
            other => {
                self.stream = other;
                return Ok(());
            }
        };
        let outcome = stream::drive(byte_stream, &mut session).await;

        if session.status() == StreamStatus::Complete {
            self.translated_markdown = Some(session.content().to_string());
            self.translation_file = session.translation_file.clone();
        }
        self.stream = Some(session);
        outcome.map_err(SessionError::from)
    }

    /// Synchronous full-document translation.
    pub async fn translate_full(
        &mut self,
        target_lang: Option<&str>,
    ) -> Result<(), SessionError> {
        let task_id = self
            .document
            .as_ref()
            .ok_or(SessionError::NoDocument)?
            .task_id
            .clone()
            .ok_or(SessionError::NoTask)?;
        let lang = target_lang
            .unwrap_or(&self.config.default_target_lang)
            .to_string();
        let options = self.translate_options();
        let generation = self.document_generation;

        let result = self
            .api
            .translate_full_markdown(&task_id, &lang, &options)
            .await?;

        if generation != self.document_generation {
            tracing::debug!("Discarding full translation for a superseded document");
            return Ok(());
        }
        self.translated_markdown = Some(result.content);
        self.translation_file = result.translation_file;
        Ok(())
    }

    fn translate_options(&self) -> TranslateOptions {
        TranslateOptions {
            model: None,
            force_retranslate: false,
            translation_id: Some(Uuid::new_v4()),
            timestamp: Some(chrono::Utc::now()),
        }
    }

    fn fail_stream(&mut self, id: Uuid, message: impl Into<String>) {
        if let Some(session) = self.stream.as_mut().filter(|s| s.id() == id) {
            session.fail(message);
        }
    }
}
