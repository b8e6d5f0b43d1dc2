//! Lector Core
//!
//! Session core of a bilingual document reader: keeps a page-indexed layout
//! of extracted text blocks aligned with a re-rendered page raster, and
//! consumes the backend's chunked translation event stream, merging partial
//! results into the in-memory document as they arrive.
//!
//! # Modules
//!
//! - `layout`: the document model (text blocks, bounding boxes, page index)
//! - `geometry`: bbox → screen-pixel mapping at a render scale
//! - `render`: page render state machine with stale-result guarding
//! - `overlay`: hit-region composition over the rendered page
//! - `stream`: streaming translation consumer (event decoding + session)
//! - `api`: client for the parsing/translation backend
//! - `markup`: sanitized markup tree for translated content
//! - `session`: the reader session controller tying it all together
//!
//! The crate performs no PDF parsing and no translation itself; those live
//! behind the [`render::Rasterizer`] trait and the [`api::ApiClient`]
//! respectively. Nothing persists beyond the in-memory session.

pub mod api;
pub mod geometry;
pub mod layout;
pub mod markup;
pub mod overlay;
pub mod render;
pub mod session;
pub mod stream;

pub use session::{ReaderSession, SessionConfig, SessionError};
