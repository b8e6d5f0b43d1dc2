//! Layout Query Benchmarks
//!
//! Page filtering and overlay composition over a large document layout.
//! The overlay re-composes on every state change, so these paths run hot
//! during page navigation.
//!
//! Run with: `cargo bench --bench layout_queries`

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use lector_core::layout::{BBox, Layout, TextBlock};
use lector_core::overlay;
use lector_core::render::{RenderPhase, RenderState};

/// Synthetic layout: `pages` pages with `per_page` blocks each, in server
/// order (page-major, top to bottom).
fn build_layout(pages: u32, per_page: u32) -> Layout {
    let mut blocks = Vec::with_capacity((pages * per_page) as usize);
    for page in 1..=pages {
        for i in 0..per_page {
            let y = i as f32 * 14.0;
            blocks.push(TextBlock::new(
                page,
                BBox::new(72.0, y, 540.0, y + 12.0),
                format!("Block {i} on page {page}"),
            ));
        }
    }
    Layout::from_blocks(blocks)
}

fn bench_layout_queries(c: &mut Criterion) {
    let layout = build_layout(500, 40);
    let middle_page = 250;
    let state = RenderState {
        page_number: middle_page,
        scale: 1.2,
        phase: RenderPhase::Ready,
        page_count: Some(500),
    };

    c.bench_function("blocks_for_page", |b| {
        b.iter(|| {
            layout
                .blocks_for_page(black_box(middle_page))
                .map(|block| block.text.len())
                .sum::<usize>()
        })
    });

    c.bench_function("page_block_last", |b| {
        b.iter(|| layout.page_block(black_box(middle_page), 39))
    });

    c.bench_function("overlay_compose", |b| {
        b.iter(|| overlay::compose(black_box(&layout), middle_page, 1.2, &state))
    });
}

criterion_group!(benches, bench_layout_queries);
criterion_main!(benches);
