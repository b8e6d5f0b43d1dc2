//! Sanitized markup pipeline
//!
//! Translated content arrives as a restricted markup subset. Instead of
//! splicing it into the display surface as raw markup, it is parsed into a
//! typed node tree ([`Block`]/[`Inline`]) and rendered from the tree through
//! the UI framework's normal rendering path. Math spans round-trip through
//! the pipeline unchanged.

mod parser;
mod types;

pub use parser::{parse, parse_inlines};
pub use types::{Block, Inline};

/// Render a node tree as plain text for the side-by-side text panel.
/// Emphasis markers are dropped; code and math content are kept verbatim,
/// math with its delimiters so the token survives round-tripping.
pub fn plain_text(blocks: &[Block]) -> String {
    let mut rendered: Vec<String> = Vec::with_capacity(blocks.len());
    for block in blocks {
        match block {
            Block::Heading { inlines, .. } | Block::Paragraph { inlines } => {
                rendered.push(inline_text(inlines));
            }
            Block::MathBlock { source } => rendered.push(format!("$${source}$$")),
        }
    }
    rendered.join("\n\n")
}

fn inline_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(text),
            Inline::Bold(inner) | Inline::Italic(inner) => out.push_str(&inline_text(inner)),
            Inline::Code(code) => out.push_str(code),
            Inline::Math(math) => {
                out.push('$');
                out.push_str(math);
                out.push('$');
            }
        }
    }
    out
}
