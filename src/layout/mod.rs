//! Layout index
//!
//! The in-memory document model: an ordered collection of [`TextBlock`]s in
//! server-provided order, indexed by page for the overlay. The collection is
//! replaced wholesale when a new document is loaded; translated text is
//! mutated in place as batch or streaming results arrive.

mod types;

pub use types::{BBox, TextBlock};

use serde::{Deserialize, Serialize};

/// Ordered collection of text blocks for one document.
///
/// Server order is preserved as-is: it is stable for rendering but not
/// required to be sorted by page or position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layout {
    blocks: Vec<TextBlock>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: Vec<TextBlock>) -> Self {
        Self { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[TextBlock] {
        &self.blocks
    }

    /// Blocks on `page`, in original relative order.
    ///
    /// Pure and repeatable: calling twice on an unmodified layout yields
    /// element-wise identical sequences, so callers may re-run it on every
    /// state change.
    pub fn blocks_for_page(&self, page: u32) -> impl Iterator<Item = &TextBlock> {
        self.blocks.iter().filter(move |b| b.page == page)
    }

    /// Block at `index` within the page's filtered sequence.
    pub fn page_block(&self, page: u32, index: usize) -> Option<&TextBlock> {
        self.blocks_for_page(page).nth(index)
    }

    /// Replace the whole collection (new document loaded).
    pub fn replace(&mut self, blocks: Vec<TextBlock>) {
        tracing::debug!(
            old_count = self.blocks.len(),
            new_count = blocks.len(),
            "Replacing layout"
        );
        self.blocks = blocks;
    }

    /// Set the translated text of the block at a global index.
    ///
    /// Returns false when the index is out of range (stale writer).
    pub fn set_translated(&mut self, index: usize, text: impl Into<String>) -> bool {
        match self.blocks.get_mut(index) {
            Some(block) => {
                block.translated_text = Some(text.into());
                true
            }
            None => false,
        }
    }

    /// Copy translated text from a server-translated layout onto this one.
    ///
    /// The backend returns the full layout with translated fields populated;
    /// blocks are matched positionally (the server preserves order). A
    /// length mismatch means the response belongs to a different document
    /// and nothing is merged.
    pub fn merge_translated_from(&mut self, translated: &Layout) -> bool {
        if translated.blocks.len() != self.blocks.len() {
            tracing::warn!(
                ours = self.blocks.len(),
                theirs = translated.blocks.len(),
                "Translated layout does not match current document, ignoring"
            );
            return false;
        }
        for (block, theirs) in self.blocks.iter_mut().zip(&translated.blocks) {
            if theirs.translated_text.is_some() {
                block.translated_text = theirs.translated_text.clone();
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_layout() -> Layout {
        Layout::from_blocks(vec![
            TextBlock::new(1, BBox::new(0.0, 0.0, 100.0, 50.0), "Hello"),
            TextBlock::new(2, BBox::new(0.0, 0.0, 50.0, 50.0), "World"),
            TextBlock::new(1, BBox::new(0.0, 60.0, 100.0, 90.0), "Again"),
        ])
    }

    #[test]
    fn blocks_for_page_filters_in_order() {
        let layout = sample_layout();
        let page1: Vec<_> = layout.blocks_for_page(1).map(|b| b.text.as_str()).collect();
        assert_eq!(page1, vec!["Hello", "Again"]);

        let page3: Vec<_> = layout.blocks_for_page(3).collect();
        assert!(page3.is_empty());
    }

    #[test]
    fn blocks_for_page_is_idempotent() {
        let layout = sample_layout();
        let first: Vec<_> = layout.blocks_for_page(1).cloned().collect();
        let second: Vec<_> = layout.blocks_for_page(1).cloned().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn set_translated_out_of_range_is_rejected() {
        let mut layout = sample_layout();
        assert!(layout.set_translated(0, "你好"));
        assert!(!layout.set_translated(99, "stale"));
        assert_eq!(layout.blocks()[0].translated_text.as_deref(), Some("你好"));
    }

    #[test]
    fn merge_translated_requires_matching_length() {
        let mut layout = sample_layout();
        let mut translated = sample_layout();
        for i in 0..translated.len() {
            translated.set_translated(i, format!("t{i}"));
        }
        assert!(layout.merge_translated_from(&translated));
        assert_eq!(layout.blocks()[2].translated_text.as_deref(), Some("t2"));

        let mismatched = Layout::from_blocks(vec![TextBlock::new(
            1,
            BBox::new(0.0, 0.0, 1.0, 1.0),
            "x",
        )]);
        assert!(!layout.merge_translated_from(&mismatched));
    }

    #[test]
    fn wire_roundtrip_uses_snake_case() {
        let json = r#"[{"page":1,"bbox":[0,0,100,50],"text":"Hello","translated_text":"你好"}]"#;
        let layout: Layout = serde_json::from_str(json).unwrap();
        assert_eq!(layout.len(), 1);
        assert_eq!(layout.blocks()[0].translated_text.as_deref(), Some("你好"));

        let missing_bbox: TextBlock =
            serde_json::from_str(r#"{"page":2,"text":""}"#).unwrap();
        assert!(missing_bbox.bbox.is_none());
    }
}
