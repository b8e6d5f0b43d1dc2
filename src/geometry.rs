//! Geometry mapper
//!
//! Converts backend bounding boxes (PDF user-space units) into on-screen
//! pixel geometry at a render scale. Pure functions; callers must pass the
//! same scale the page renderer used for the current raster — keeping the
//! two synchronized is the compositor's invariant, not defended here.

use serde::{Deserialize, Serialize};

use crate::layout::BBox;

/// On-screen rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    pub fn is_zero_area(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Map a bounding box to screen pixels at `scale`.
///
/// A missing bbox maps to the zero-area rect at the origin so rendering
/// never fails — the block is simply invisible.
pub fn to_screen_rect(bbox: Option<&BBox>, scale: f32) -> ScreenRect {
    let Some(bbox) = bbox else {
        return ScreenRect::default();
    };
    ScreenRect {
        left: bbox.x0() * scale,
        top: bbox.y0() * scale,
        width: bbox.width() * scale,
        height: bbox.height() * scale,
    }
}
