//! Render types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Explicit renderer configuration, passed in at session start.
///
/// The raster backend's worker/version wiring lives here instead of in
/// module-wide globals, so independent viewer instances (and tests) never
/// share implicit state.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Worker script source for backends that need one (e.g. a wasm
    /// rasterizer worker). `None` for in-process backends.
    pub worker_src: Option<String>,

    /// Initial render scale for a session that has not zoomed yet.
    pub default_scale: f32,

    /// Rendered pages kept in the raster cache.
    pub cache_capacity: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            worker_src: None,
            default_scale: 1.2,
            cache_capacity: 16,
        }
    }
}

/// Lifecycle of one page render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderPhase {
    /// No render requested yet.
    Idle,
    /// A render for the current (document, page, scale) is in flight.
    Loading,
    /// The raster for the current request is on screen.
    Ready,
    /// The current request failed; any previous raster is left untouched.
    Error(String),
}

/// Per-page render state, read by the overlay compositor to decide whether
/// hit-regions may be drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderState {
    pub page_number: u32,
    pub scale: f32,
    pub phase: RenderPhase,
    /// Known after the first successful render of any page.
    pub page_count: Option<u32>,
}

impl RenderState {
    pub fn idle() -> Self {
        Self {
            page_number: 0,
            scale: 0.0,
            phase: RenderPhase::Idle,
            page_count: None,
        }
    }

    /// True only when the raster currently shown matches this state.
    /// The overlay never draws over a raster that is not ready.
    pub fn raster_ready(&self) -> bool {
        self.phase == RenderPhase::Ready
    }
}

/// One rasterized page as produced by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    /// Encoded pixel data (format is a backend concern).
    pub data: Vec<u8>,
    /// Raster dimensions at the requested scale.
    pub width: u32,
    pub height: u32,
    /// Page count of the containing document, for navigation bounds.
    pub page_count: u32,
}

/// Token for one issued render request. Results are applied only when the
/// ticket's generation still matches the renderer's; superseded results are
/// discarded without surfacing their errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTicket {
    pub(super) generation: u64,
    pub(super) page: u32,
    pub(super) scale_bits: u32,
}

impl RenderTicket {
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn scale(&self) -> f32 {
        f32::from_bits(self.scale_bits)
    }
}

/// Render error types
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No document loaded")]
    NoDocument,

    #[error("Page out of bounds: {page} (document has {count} pages)")]
    PageOutOfBounds { page: u32, count: u32 },

    #[error("Raster backend error: {0}")]
    Backend(String),
}
