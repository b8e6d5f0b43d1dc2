//! Markup node tree

use serde::{Deserialize, Serialize};

/// Block-level node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Block {
    Heading { level: u8, inlines: Vec<Inline> },
    Paragraph { inlines: Vec<Inline> },
    /// Display math (`$$…$$`), carried verbatim and never interpreted.
    MathBlock { source: String },
}

/// Inline node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum Inline {
    Text(String),
    Bold(Vec<Inline>),
    Italic(Vec<Inline>),
    /// Inline code, content verbatim.
    Code(String),
    /// Inline math (`$…$`), content verbatim.
    Math(String),
}
