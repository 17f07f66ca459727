//! Text position utilities for diagnostics.
//!
//! ## Coordinate Conventions
//!
//! - Lines and columns are **1-indexed** (matching editor conventions)
//! - Byte offsets are **0-indexed**
//! - Columns count Unicode scalar values, not bytes

use crate::types::Span;

/// Convert a byte offset to 1-indexed line and column.
///
/// Offsets past the end of `content` report the position just after the
/// last character.
pub fn offset_to_position(content: &str, offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut col = 1u32;
    for (index, ch) in content.char_indices() {
        if index >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Byte offset of the first character of 1-indexed `line`.
pub fn line_start_offset(content: &str, line: u32) -> Option<usize> {
    if line <= 1 {
        return Some(0);
    }
    content
        .match_indices('\n')
        .nth(line as usize - 2)
        .map(|(index, _)| index + 1)
}

/// Extract the text covered by a span, if it lies on character boundaries.
pub fn extract_span<'a>(content: &'a str, span: &Span) -> Option<&'a str> {
    content.get(span.start..span.end)
}

/// Single-line preview of `text`, cut at the first line break and shortened
/// to at most `max_chars` characters.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let line = text.trim_start().lines().next().unwrap_or_default().trim_end();
    if line.chars().count() <= max_chars {
        return line.to_string();
    }
    let mut out: String = line.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
