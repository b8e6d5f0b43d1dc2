//! Restricted markup parser
//!
//! Parses the translated-text markup subset (ATX headings, bold, italic,
//! inline code, paragraph breaks, math spans) into the typed node tree.
//! Anything outside the subset — including HTML tags — stays literal text,
//! so rendering from the tree carries no injection surface regardless of
//! how trustworthy the source text is. Unterminated markers degrade to
//! literal characters; parsing never fails.

use super::types::{Block, Inline};

/// Parse a whole document into block nodes. Blocks are separated by blank
/// lines; lines within a paragraph are soft-wrapped with a single space.
pub fn parse(source: &str) -> Vec<Block> {
    source
        .split("\n\n")
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(parse_block)
        .collect()
}

fn parse_block(chunk: &str) -> Block {
    // Display math block, carried opaque.
    if let Some(inner) = chunk
        .strip_prefix("$$")
        .and_then(|rest| rest.strip_suffix("$$"))
    {
        if !inner.is_empty() || chunk.len() >= 4 {
            return Block::MathBlock {
                source: inner.trim().to_string(),
            };
        }
    }

    // ATX heading: 1-6 hashes and a space.
    let hashes = chunk.chars().take_while(|&c| c == '#').count();
    if (1..=6).contains(&hashes) {
        if let Some(rest) = chunk[hashes..].strip_prefix(' ') {
            return Block::Heading {
                level: hashes as u8,
                inlines: parse_inlines(rest.trim()),
            };
        }
    }

    let joined = chunk
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join(" ");
    Block::Paragraph {
        inlines: parse_inlines(&joined),
    }
}

/// Parse inline markup within one block.
pub fn parse_inlines(source: &str) -> Vec<Inline> {
    let chars: Vec<char> = source.chars().collect();
    let mut inlines = Vec::new();
    let mut text = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' if i + 1 < chars.len() => {
                text.push(chars[i + 1]);
                i += 2;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                match find_bold_close(&chars, i + 2) {
                    Some(close) => {
                        flush(&mut inlines, &mut text);
                        let inner: String = chars[i + 2..close].iter().collect();
                        inlines.push(Inline::Bold(parse_inlines(&inner)));
                        i = close + 2;
                    }
                    None => {
                        text.push('*');
                        i += 1;
                    }
                }
            }
            '*' => match find_delimiter(&chars, i + 1, &['*']) {
                Some(close) if close > i + 1 => {
                    flush(&mut inlines, &mut text);
                    let inner: String = chars[i + 1..close].iter().collect();
                    inlines.push(Inline::Italic(parse_inlines(&inner)));
                    i = close + 1;
                }
                _ => {
                    text.push('*');
                    i += 1;
                }
            },
            '`' => match find_delimiter(&chars, i + 1, &['`']) {
                Some(close) => {
                    flush(&mut inlines, &mut text);
                    inlines.push(Inline::Code(chars[i + 1..close].iter().collect()));
                    i = close + 1;
                }
                None => {
                    text.push('`');
                    i += 1;
                }
            },
            '$' => match find_delimiter(&chars, i + 1, &['$']) {
                Some(close) if close > i + 1 => {
                    flush(&mut inlines, &mut text);
                    // Math spans are opaque tokens; content is untouched.
                    inlines.push(Inline::Math(chars[i + 1..close].iter().collect()));
                    i = close + 1;
                }
                _ => {
                    text.push('$');
                    i += 1;
                }
            },
            c => {
                text.push(c);
                i += 1;
            }
        }
    }

    flush(&mut inlines, &mut text);
    inlines
}

fn flush(inlines: &mut Vec<Inline>, text: &mut String) {
    if !text.is_empty() {
        inlines.push(Inline::Text(std::mem::take(text)));
    }
}

/// Position of the `**` that closes a bold span opened before `from`.
///
/// Inside `***` the first star belongs to the inner italic span, so a `**`
/// candidate followed by another star yields to the pair one position later.
fn find_bold_close(chars: &[char], from: usize) -> Option<usize> {
    let mut i = from;
    while i + 2 <= chars.len() {
        if chars[i] == '\\' {
            i += 2;
            continue;
        }
        if chars[i] == '*' && chars[i + 1] == '*' {
            if chars.get(i + 2) == Some(&'*') {
                i += 1;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Position of the next unescaped occurrence of `needle` at or after `from`.
fn find_delimiter(chars: &[char], from: usize, needle: &[char]) -> Option<usize> {
    let mut i = from;
    while i + needle.len() <= chars.len() {
        if chars[i] == '\\' {
            i += 2;
            continue;
        }
        if &chars[i..i + needle.len()] == needle {
            return Some(i);
        }
        i += 1;
    }
    None
}
