//! Markup-to-styled-text engine.
//!
//! `styled-markup` turns a constrained, pre-sanitized HTML-like markup dialect
//! into render-ready text fragments: resolved font size, weight, style,
//! decoration, color and line height per run, plus writing direction,
//! hyperlink targets and a flattened accessibility label.
//!
//! The pipeline is three linear passes with no I/O and no global state:
//!
//! 1. [`normalize_whitespace`] drops whitespace that carries no meaning
//!    between block-level elements.
//! 2. [`SegmentParser`] scans the markup once, tracking open elements, lists,
//!    links and writing direction, and emits [`Segment`]s.
//! 3. [`StyleResolver`] resolves each segment against a [`BaseStyle`] and
//!    optional per-tag overrides into [`Fragment`]s.
//!
//! Malformed markup never fails; it degrades to whatever can be understood.
//!
//! ```
//! use styled_markup::{parse, BaseStyle};
//!
//! let result = parse("<p>Hello <b>world</b></p>", &BaseStyle::default(), None);
//! assert_eq!(result.plain_text(), "Hello world");
//! assert!(result.fragments[1].is_bold);
//! ```

#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented
    )
)]

pub mod direction;
pub mod error;
pub mod fragment;
mod lexer;
pub mod link;
pub mod segment;
pub mod tag_style;
pub mod tags;
pub mod values;
pub mod whitespace;

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

pub use direction::{
    detect_direction_from_bytes, detect_direction_from_text, parse_dir_attribute, DirAttribute,
    DirectionContext, WritingDirection,
};
pub use error::TagStyleError;
pub use fragment::{
    BaseStyle, Fragment, ParseResult, StyleResolver, TextDecoration, DEFAULT_LINK_COLOR,
    LINE_HEIGHT_BUFFER,
};
pub use lexer::decode_entities;
pub use link::is_safe_link_url;
pub use segment::{ListContext, ParseLimits, Segment, SegmentParser};
pub use tag_style::{lookup_tag_style, try_lookup_tag_style, TagStyle};
pub use tags::{element_kind, heading_scale, is_block_level, is_inline_formatting, ElementKind, ListKind};
pub use values::{parse_argb_integer, parse_hex_color, parse_leading_number};
pub use whitespace::normalize_whitespace;

/// Parse markup into styled fragments.
///
/// `tag_styles` is an optional JSON-like blob of per-tag overrides, e.g.
/// `{"b": {"color": "#c00"}}`. Empty or whitespace-only markup yields an
/// empty result.
pub fn parse(markup: &str, base: &BaseStyle, tag_styles: Option<&str>) -> ParseResult {
    if markup.trim().is_empty() {
        return ParseResult::default();
    }
    let segments = parse_segments(markup);
    let resolver = match tag_styles {
        Some(blob) => StyleResolver::new(base).with_tag_styles(blob),
        None => StyleResolver::new(base),
    };
    resolver.resolve(&segments)
}

/// Normalize whitespace and scan markup into segments with default limits.
pub fn parse_segments(markup: &str) -> Vec<Segment> {
    SegmentParser::new().parse(&normalize_whitespace(markup))
}

/// Discard styling and return normalized text with list markers and
/// paragraph breaks.
pub fn strip_to_plain_text(markup: &str) -> String {
    if markup.trim().is_empty() {
        return String::new();
    }
    fragment::plain_text(&parse_segments(markup))
}
