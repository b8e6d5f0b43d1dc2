//! Overlay compositor
//!
//! Produces the interactive hit-region list layered above the page raster:
//! one region per text block on the active page, positioned by the geometry
//! mapper, emitted only when the page's raster is ready. Regions are a
//! spatial index over the layout — they carry no text handling of their own.

use serde::{Deserialize, Serialize};

use crate::geometry::{to_screen_rect, ScreenRect};
use crate::layout::{Layout, TextBlock};
use crate::render::RenderState;

/// One interactive region over the raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitRegion {
    /// Position within the page's block sequence. Stable across
    /// re-composition: degenerate blocks keep their slot, so this index
    /// always addresses the same block in `Layout::blocks_for_page`.
    pub index: usize,
    /// On-screen geometry at the compositor's scale.
    pub rect: ScreenRect,
    /// Hover title: original text, translated text as fallback.
    pub title: String,
    /// Zero-area region; practically impossible to interact with but kept
    /// so indices do not diverge from the layout order.
    pub degenerate: bool,
}

/// Compose hit-regions for `page` at `scale`.
///
/// `scale` must be the scale the renderer used for the raster described by
/// `render_state`. While the raster is not ready (loading, failed, idle,
/// showing a different page, or rendered at a different scale — zoom changed
/// but the re-render has not landed) no regions are emitted — geometry must
/// never be drawn over a stale or blank canvas.
pub fn compose(
    layout: &Layout,
    page: u32,
    scale: f32,
    render_state: &RenderState,
) -> Vec<HitRegion> {
    if !render_state.raster_ready()
        || render_state.page_number != page
        || render_state.scale != scale
    {
        return Vec::new();
    }

    layout
        .blocks_for_page(page)
        .enumerate()
        .map(|(index, block)| {
            let rect = to_screen_rect(block.bbox.as_ref(), scale);
            HitRegion {
                index,
                rect,
                title: block.display_text().to_string(),
                degenerate: rect.is_zero_area(),
            }
        })
        .collect()
}

/// Resolve a region activation back to its block.
///
/// Selection is a snapshot: the returned block carries whatever translated
/// text is present at this moment, and later merges do not mutate it.
pub fn select(layout: &Layout, page: u32, index: usize) -> Option<TextBlock> {
    layout.page_block(page, index).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{BBox, TextBlock};
    use crate::render::RenderPhase;

    fn ready_state(page: u32, scale: f32) -> RenderState {
        RenderState {
            page_number: page,
            scale,
            phase: RenderPhase::Ready,
            page_count: Some(2),
        }
    }

    fn sample_layout() -> Layout {
        Layout::from_blocks(vec![
            TextBlock::new(1, BBox::new(0.0, 0.0, 100.0, 50.0), "Hello"),
            TextBlock::new(2, BBox::new(0.0, 0.0, 50.0, 50.0), "World"),
        ])
    }

    #[test]
    fn composes_regions_for_active_page() {
        let regions = compose(&sample_layout(), 1, 1.2, &ready_state(1, 1.2));
        assert_eq!(regions.len(), 1);

        let region = &regions[0];
        assert_eq!(region.title, "Hello");
        assert_eq!(region.rect.left, 0.0);
        assert_eq!(region.rect.top, 0.0);
        assert!((region.rect.width - 120.0).abs() < 1e-4);
        assert!((region.rect.height - 60.0).abs() < 1e-4);
    }

    #[test]
    fn no_regions_until_raster_ready() {
        let layout = sample_layout();
        for phase in [
            RenderPhase::Idle,
            RenderPhase::Loading,
            RenderPhase::Error("boom".into()),
        ] {
            let state = RenderState {
                page_number: 1,
                scale: 1.2,
                phase,
                page_count: None,
            };
            assert!(compose(&layout, 1, 1.2, &state).is_empty());
        }
    }

    #[test]
    fn no_regions_when_raster_shows_another_page() {
        let layout = sample_layout();
        assert!(compose(&layout, 2, 1.2, &ready_state(1, 1.2)).is_empty());
    }

    #[test]
    fn no_regions_when_scale_mismatches_the_raster() {
        let layout = sample_layout();
        assert!(compose(&layout, 1, 2.0, &ready_state(1, 1.2)).is_empty());
    }

    #[test]
    fn degenerate_blocks_keep_their_slot() {
        let layout = Layout::from_blocks(vec![
            TextBlock::new(1, BBox::new(0.0, 0.0, 10.0, 10.0), "a"),
            TextBlock::new(1, BBox::new(5.0, 5.0, 5.0, 5.0), "zero"),
            TextBlock::new(1, BBox::new(0.0, 20.0, 10.0, 30.0), "b"),
        ]);
        let regions = compose(&layout, 1, 1.0, &ready_state(1, 1.0));
        assert_eq!(regions.len(), 3);
        assert!(regions[1].degenerate);
        assert_eq!(regions[1].index, 1);
        assert_eq!(regions[2].title, "b");
        assert_eq!(regions[2].index, 2);
    }

    #[test]
    fn selection_is_a_snapshot() {
        let mut layout = sample_layout();
        let selected = select(&layout, 1, 0).unwrap();
        assert_eq!(selected.translated_text, None);

        layout.set_translated(0, "你好");
        // The earlier snapshot is unchanged; a fresh selection sees the merge.
        assert_eq!(selected.translated_text, None);
        assert_eq!(
            select(&layout, 1, 0).unwrap().translated_text.as_deref(),
            Some("你好")
        );
    }

    #[test]
    fn title_falls_back_to_translated_text() {
        let mut layout = Layout::from_blocks(vec![TextBlock::new(
            1,
            BBox::new(0.0, 0.0, 10.0, 10.0),
            "",
        )]);
        layout.set_translated(0, "solo traducción");
        let regions = compose(&layout, 1, 1.0, &ready_state(1, 1.0));
        assert_eq!(regions[0].title, "solo traducción");
    }
}
