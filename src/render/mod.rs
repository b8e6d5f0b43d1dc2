//! Page renderer
//!
//! Owns the association between a page number and its raster. Re-renders on
//! any change of the (document, page, scale) triple and reports readiness so
//! the overlay redraws only once the underlying raster exists.
//!
//! Rendering is split into `begin_render` / `apply_result` so the initiating
//! flow can await the raster backend without holding the renderer across the
//! suspension point. Every result carries the [`RenderTicket`] of the request
//! that produced it; a ticket minted before a newer request (or a document
//! change) no longer matches the current generation and its result — success
//! or failure — is dropped.

mod types;

pub use types::{
    RenderError, RenderPhase, RenderState, RenderTicket, RenderedPage, RendererConfig,
};

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;

/// Raster backend abstraction. The embedding shell supplies the actual PDF
/// engine; the core never links one.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Rasterize one page of the document at `url` at the given scale.
    async fn rasterize(&self, url: &str, page: u32, scale: f32)
        -> Result<RenderedPage, RenderError>;
}

type RasterKey = (u32, u32); // (page, scale bits)

/// Page renderer with a stale-result guard and a raster LRU cache.
pub struct PageRenderer {
    rasterizer: Arc<dyn Rasterizer>,
    config: RendererConfig,
    state: RenderState,
    /// Raster currently on screen. Kept across failed renders.
    raster: Option<RenderedPage>,
    cache: LruCache<RasterKey, RenderedPage>,
    /// Monotonically increasing request generation.
    generation: u64,
    document_url: Option<String>,
}

impl PageRenderer {
    pub fn new(rasterizer: Arc<dyn Rasterizer>, config: RendererConfig) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            rasterizer,
            config,
            state: RenderState::idle(),
            raster: None,
            cache: LruCache::new(capacity),
            generation: 0,
            document_url: None,
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    /// Raster currently on screen, if any.
    pub fn raster(&self) -> Option<&RenderedPage> {
        self.raster.as_ref()
    }

    pub fn page_count(&self) -> Option<u32> {
        self.state.page_count
    }

    pub fn document_url(&self) -> Option<&str> {
        self.document_url.as_deref()
    }

    /// Point the renderer at a new document. Invalidates every in-flight
    /// render and the raster cache; stale results for the old document can
    /// no longer match the generation.
    pub fn set_document(&mut self, url: impl Into<String>) {
        let url = url.into();
        tracing::info!(url = %url, "Renderer document changed");
        self.generation += 1;
        self.document_url = Some(url);
        self.cache.clear();
        self.raster = None;
        self.state = RenderState::idle();
    }

    /// Issue a render request for (page, scale). Transitions to `Loading`
    /// and supersedes any request still in flight.
    pub fn begin_render(&mut self, page: u32, scale: f32) -> Result<RenderTicket, RenderError> {
        if self.document_url.is_none() {
            return Err(RenderError::NoDocument);
        }
        self.generation += 1;
        self.state = RenderState {
            page_number: page,
            scale,
            phase: RenderPhase::Loading,
            page_count: self.state.page_count,
        };
        Ok(RenderTicket {
            generation: self.generation,
            page,
            scale_bits: scale.to_bits(),
        })
    }

    /// Serve a render from the raster cache if present, skipping the
    /// backend round-trip. Returns true on a hit.
    pub fn try_cached(&mut self, page: u32, scale: f32) -> bool {
        let Some(rendered) = self.cache.get(&(page, scale.to_bits())).cloned() else {
            return false;
        };
        self.generation += 1;
        self.state = RenderState {
            page_number: page,
            scale,
            phase: RenderPhase::Ready,
            page_count: Some(rendered.page_count),
        };
        self.raster = Some(rendered);
        true
    }

    /// Apply the outcome of an issued request. Results whose ticket no
    /// longer matches the current generation are discarded; in particular a
    /// superseded request's error is never surfaced as if it were current.
    pub fn apply_result(
        &mut self,
        ticket: RenderTicket,
        result: Result<RenderedPage, RenderError>,
    ) {
        if ticket.generation != self.generation {
            tracing::debug!(
                ticket_generation = ticket.generation,
                current_generation = self.generation,
                page = ticket.page,
                "Discarding stale render result"
            );
            return;
        }
        match result {
            Ok(rendered) => {
                self.state.phase = RenderPhase::Ready;
                self.state.page_count = Some(rendered.page_count);
                self.cache
                    .put((ticket.page, ticket.scale_bits), rendered.clone());
                self.raster = Some(rendered);
            }
            Err(err) => {
                tracing::warn!(page = ticket.page, error = %err, "Page render failed");
                // Previous raster stays on screen; only the phase reports
                // the failure.
                self.state.phase = RenderPhase::Error(err.to_string());
            }
        }
    }

    /// Convenience flow for callers that do not interleave requests:
    /// cache check, then backend render, then apply.
    pub async fn render(&mut self, page: u32, scale: f32) -> Result<(), RenderError> {
        if self.try_cached(page, scale) {
            return Ok(());
        }
        let url = self
            .document_url
            .clone()
            .ok_or(RenderError::NoDocument)?;
        let ticket = self.begin_render(page, scale)?;
        let result = self.rasterizer.rasterize(&url, page, scale).await;
        self.apply_result(ticket, result);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::MockRasterizer;
    use super::*;
    use std::sync::atomic::Ordering;

    fn renderer(pages: u32) -> PageRenderer {
        let mut r = PageRenderer::new(
            Arc::new(MockRasterizer::with_pages(pages)),
            RendererConfig::default(),
        );
        r.set_document("/api/files/test.pdf");
        r
    }

    #[tokio::test]
    async fn render_reaches_ready_and_reports_page_count() {
        let mut renderer = renderer(5);
        renderer.render(1, 1.2).await.unwrap();

        assert!(renderer.state().raster_ready());
        assert_eq!(renderer.page_count(), Some(5));
        assert_eq!(renderer.raster().unwrap().width, 120);
    }

    #[tokio::test]
    async fn stale_result_is_discarded() {
        let mut renderer = renderer(5);

        let stale = renderer.begin_render(1, 1.2).unwrap();
        // A newer request supersedes the first before its result lands.
        let current = renderer.begin_render(2, 1.2).unwrap();

        renderer.apply_result(
            stale,
            Ok(RenderedPage {
                data: vec![1],
                width: 1,
                height: 1,
                page_count: 5,
            }),
        );
        assert_eq!(renderer.state().phase, RenderPhase::Loading);
        assert!(renderer.raster().is_none());

        renderer.apply_result(
            current,
            Ok(RenderedPage {
                data: vec![2],
                width: 2,
                height: 2,
                page_count: 5,
            }),
        );
        assert!(renderer.state().raster_ready());
        assert_eq!(renderer.raster().unwrap().data, vec![2]);
    }

    #[tokio::test]
    async fn superseded_error_is_not_surfaced() {
        let mut renderer = renderer(5);

        let stale = renderer.begin_render(3, 1.0).unwrap();
        let current = renderer.begin_render(1, 1.0).unwrap();

        renderer.apply_result(stale, Err(RenderError::Backend("old page".into())));
        assert_eq!(renderer.state().phase, RenderPhase::Loading);

        renderer.apply_result(
            current,
            Ok(RenderedPage {
                data: vec![1],
                width: 1,
                height: 1,
                page_count: 5,
            }),
        );
        assert!(renderer.state().raster_ready());
    }

    #[tokio::test]
    async fn failed_render_keeps_previous_raster() {
        let mut renderer = PageRenderer::new(
            Arc::new({
                let mut m = MockRasterizer::with_pages(5);
                m.failing_pages.insert(2);
                m
            }),
            RendererConfig::default(),
        );
        renderer.set_document("/api/files/test.pdf");

        renderer.render(1, 1.0).await.unwrap();
        let first = renderer.raster().unwrap().clone();

        renderer.render(2, 1.0).await.unwrap();
        assert!(matches!(renderer.state().phase, RenderPhase::Error(_)));
        assert_eq!(renderer.raster(), Some(&first));
    }

    #[tokio::test]
    async fn cache_skips_backend_round_trip() {
        let raster_backend = Arc::new(MockRasterizer::with_pages(5));
        let mut renderer =
            PageRenderer::new(raster_backend.clone(), RendererConfig::default());
        renderer.set_document("/api/files/test.pdf");

        renderer.render(1, 1.2).await.unwrap();
        renderer.render(2, 1.2).await.unwrap();
        renderer.render(1, 1.2).await.unwrap();

        assert_eq!(raster_backend.calls.load(Ordering::SeqCst), 2);
        assert_eq!(renderer.state().page_number, 1);
        assert!(renderer.state().raster_ready());
    }

    #[tokio::test]
    async fn document_change_invalidates_in_flight_renders() {
        let mut renderer = renderer(5);

        let ticket = renderer.begin_render(1, 1.0).unwrap();
        renderer.set_document("/api/files/other.pdf");

        renderer.apply_result(
            ticket,
            Ok(RenderedPage {
                data: vec![9],
                width: 9,
                height: 9,
                page_count: 9,
            }),
        );
        assert_eq!(renderer.state().phase, RenderPhase::Idle);
        assert!(renderer.raster().is_none());
        assert_eq!(renderer.page_count(), None);
    }

    #[tokio::test]
    async fn render_without_document_errors() {
        let mut renderer = PageRenderer::new(
            Arc::new(MockRasterizer::with_pages(1)),
            RendererConfig::default(),
        );
        assert!(matches!(
            renderer.render(1, 1.0).await,
            Err(RenderError::NoDocument)
        ));
    }
}
