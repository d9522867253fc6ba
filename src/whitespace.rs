//! Whitespace pre-pass over raw markup.

extern crate alloc;

use alloc::string::String;

use crate::lexer::{next_tag_start, tag_span_end, RawTag};
use crate::tags::is_block_level;

/// Collapse whitespace that carries no meaning between block-level elements.
///
/// Leading whitespace before any content is dropped, and so is every
/// whitespace run that directly follows a closing block-level tag. Whitespace
/// next to inline content is copied unchanged. The pass is purely textual and
/// idempotent.
pub fn normalize_whitespace(markup: &str) -> String {
    let bytes = markup.as_bytes();
    let mut out = String::with_capacity(markup.len());
    let mut pos = 0usize;
    let mut at_start = true;
    let mut suppress = false;

    while pos < bytes.len() {
        let text_end = next_tag_start(bytes, pos).unwrap_or(bytes.len());
        for ch in markup[pos..text_end].chars() {
            if ch.is_ascii_whitespace() {
                if !(at_start || suppress) {
                    out.push(ch);
                }
            } else {
                at_start = false;
                suppress = false;
                out.push(ch);
            }
        }
        if text_end == bytes.len() {
            break;
        }

        let Some(span_end) = tag_span_end(bytes, text_end) else {
            out.push_str(&markup[text_end..]);
            break;
        };
        let span = &markup[text_end..span_end];
        out.push_str(span);
        at_start = false;
        suppress = false;
        if !span.starts_with("<!--") {
            let tag = RawTag::parse(&span[1..span.len() - 1]);
            suppress = tag.closing && is_block_level(&tag.name);
        }
        pos = span_end;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_whitespace_after_block_closers() {
        let markup = "  <p>One</p>\n   <p>Two</p>\n";
        assert_eq!(normalize_whitespace(markup), "<p>One</p><p>Two</p>");
    }

    #[test]
    fn keeps_whitespace_around_inline_content() {
        let markup = "<p>A <b>bold</b> word</p>";
        assert_eq!(normalize_whitespace(markup), markup);
    }

    #[test]
    fn keeps_interior_text_whitespace_without_tags() {
        assert_eq!(normalize_whitespace("\t hello  world "), "hello  world ");
    }

    #[test]
    fn suppression_ends_at_next_tag() {
        let markup = "<ul><li>a</li>\n <li>b</li></ul>\n <b> x</b>";
        assert_eq!(
            normalize_whitespace(markup),
            "<ul><li>a</li><li>b</li></ul><b> x</b>"
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "",
            "   ",
            "<p>x</p>  \n<div> y </div>  <span> z </span>",
            "  lead <br>  <h1>T</h1>\n\n<ol>\n <li>1</li>\n</ol> tail",
            "<a title=\"a > b\">x</a>  <!-- c --> </p> <b",
        ];
        for sample in samples {
            let once = normalize_whitespace(sample);
            assert_eq!(normalize_whitespace(&once), once, "sample {:?}", sample);
        }
    }
}
