//! Layout wire types
//!
//! These structs mirror the backend layout JSON (snake_case field names on
//! the wire, e.g. `translated_text`).

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in PDF user-space units: `[x0, y0, x1, y1]`
/// with `x1 >= x0` and `y1 >= y0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BBox(pub [f32; 4]);

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self([x0, y0, x1, y1])
    }

    pub fn x0(&self) -> f32 {
        self.0[0]
    }

    pub fn y0(&self) -> f32 {
        self.0[1]
    }

    pub fn x1(&self) -> f32 {
        self.0[2]
    }

    pub fn y1(&self) -> f32 {
        self.0[3]
    }

    pub fn width(&self) -> f32 {
        self.x1() - self.x0()
    }

    pub fn height(&self) -> f32 {
        self.y1() - self.y0()
    }

    /// A zero-area box. Still rendered as a hit-region slot so block
    /// indices stay aligned with the layout order.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

impl Default for BBox {
    fn default() -> Self {
        Self([0.0; 4])
    }
}

/// One extracted region of a document page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// 1-based page number.
    pub page: u32,

    /// Bounding box in PDF user-space units. Absent boxes render as a
    /// zero-area rect at the origin rather than erroring.
    #[serde(default)]
    pub bbox: Option<BBox>,

    /// Original extracted text, possibly empty.
    #[serde(default)]
    pub text: String,

    /// Translated text; absent until translation reaches this block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
}

impl TextBlock {
    pub fn new(page: u32, bbox: BBox, text: impl Into<String>) -> Self {
        Self {
            page,
            bbox: Some(bbox),
            text: text.into(),
            translated_text: None,
        }
    }

    /// Text to show for this block: original first, translated fallback.
    pub fn display_text(&self) -> &str {
        if !self.text.is_empty() {
            &self.text
        } else {
            self.translated_text.as_deref().unwrap_or("")
        }
    }
}
