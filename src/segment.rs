//! Single-pass scanner turning markup into styled text segments.
//!
//! The scanner walks the markup once. Tag spans drive four pushdown stacks
//! (open elements, lists, links, writing direction) from a single
//! classification step, and text between tags accumulates in a buffer that is
//! flushed into a [`Segment`] whenever a style boundary is crossed.
//!
//! Each open element stores the style snapshot in effect inside it, so style
//! lookups never rescan the stack. Malformed markup never fails: unknown tags
//! are ignored, unmatched closes are no-ops, and a paragraph-level close
//! releases everything opened inside it.

extern crate alloc;

use alloc::borrow::Cow;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::direction::{
    parse_dir_attribute, wants_auto_detection, DirAttribute, DirectionContext, WritingDirection,
    ISOLATION_TAG, OVERRIDE_TAG,
};
use crate::lexer::{decode_entities, next_tag_start, tag_span_end, RawTag};
use crate::link::is_safe_link_url;
use crate::tags::{
    element_kind, heading_scale, is_bold_tag, is_heading, is_inline_formatting, is_italic_tag,
    is_strikethrough_tag, stack_tag, ElementKind, ListKind,
};

/// Bullet glyph used for unordered list items.
pub const BULLET: char = '\u{2022}';

const LEFT_TO_RIGHT_ISOLATE: char = '\u{2066}';
const RIGHT_TO_LEFT_ISOLATE: char = '\u{2067}';
const FIRST_STRONG_ISOLATE: char = '\u{2068}';
const POP_DIRECTIONAL_ISOLATE: char = '\u{2069}';
const LEFT_TO_RIGHT_OVERRIDE: char = '\u{202d}';
const RIGHT_TO_LEFT_OVERRIDE: char = '\u{202e}';
const POP_DIRECTIONAL_FORMATTING: char = '\u{202c}';

const LIST_INDENT: &str = "    ";

/// Limits applied while scanning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseLimits {
    /// Maximum number of simultaneously open styled elements. Deeper elements
    /// are flattened: they contribute no style.
    pub max_nesting: usize,
    /// Maximum bytes scanned ahead to detect the direction of a `dir="auto"`
    /// element.
    pub max_lookahead_bytes: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_nesting: 64,
            max_lookahead_bytes: 16 * 1024,
        }
    }
}

/// A run of text sharing one style, direction and link state.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Segment {
    /// Text with character references decoded.
    pub text: String,
    /// Font scale relative to the base size (headings).
    pub font_scale: f32,
    /// Bold.
    pub is_bold: bool,
    /// Italic.
    pub is_italic: bool,
    /// Underlined (`<u>` or a live link).
    pub is_underline: bool,
    /// Struck through.
    pub is_strikethrough: bool,
    /// Inside an accepted hyperlink.
    pub is_link: bool,
    /// Directly follows the close of an inline element, so a leading space is
    /// significant.
    pub follows_inline_element: bool,
    /// Innermost open inline-formatting tag, or empty.
    pub parent_tag: String,
    /// Target of the innermost accepted hyperlink, or empty.
    pub link_url: String,
    /// Direction in effect for the run.
    pub writing_direction: WritingDirection,
    /// Inside a `<bdi>` scope.
    pub is_bdi_isolated: bool,
    /// Inside a `<bdo>` scope.
    pub is_bdo_override: bool,
}

impl Default for Segment {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_scale: 1.0,
            is_bold: false,
            is_italic: false,
            is_underline: false,
            is_strikethrough: false,
            is_link: false,
            follows_inline_element: false,
            parent_tag: String::new(),
            link_url: String::new(),
            writing_direction: WritingDirection::Natural,
            is_bdi_isolated: false,
            is_bdo_override: false,
        }
    }
}

impl Segment {
    /// Whether the text is whitespace containing at least one newline.
    pub fn is_paragraph_break(&self) -> bool {
        self.text.contains('\n') && self.is_blank()
    }

    /// Whether the text is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.text.bytes().all(|b| b.is_ascii_whitespace())
    }
}

/// An open `<ol>` or `<ul>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListContext {
    /// Ordered or unordered.
    pub kind: ListKind,
    /// Number of the most recent item.
    pub item_counter: i64,
    /// 1-based depth among open lists.
    pub nesting_level: usize,
}

/// Markup-to-segment scanner.
///
/// Input is expected to have gone through
/// [`normalize_whitespace`](crate::normalize_whitespace) first;
/// [`parse_segments`](crate::parse_segments) does both.
#[derive(Clone, Debug, Default)]
pub struct SegmentParser {
    limits: ParseLimits,
}

impl SegmentParser {
    /// Create a parser with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the scan limits.
    pub fn with_limits(mut self, limits: ParseLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Active limits.
    pub fn limits(&self) -> &ParseLimits {
        &self.limits
    }

    /// Scan `markup` into a segment list.
    pub fn parse(&self, markup: &str) -> Vec<Segment> {
        let mut out = Vec::new();
        self.parse_into(markup, &mut out);
        out
    }

    /// Scan `markup`, appending segments to `out`.
    pub fn parse_into(&self, markup: &str, out: &mut Vec<Segment>) {
        self.parse_with(markup, |segment| out.push(segment));
    }

    /// Scan `markup` and stream each segment to a callback in document order.
    pub fn parse_with<F>(&self, markup: &str, on_segment: F)
    where
        F: FnMut(Segment),
    {
        Scanner::new(markup, &self.limits, on_segment).run();
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct InlineStyle {
    font_scale: f32,
    bold: bool,
    italic: bool,
    underline: bool,
    strikethrough: bool,
    parent_tag: &'static str,
}

impl Default for InlineStyle {
    fn default() -> Self {
        Self {
            font_scale: 1.0,
            bold: false,
            italic: false,
            underline: false,
            strikethrough: false,
            parent_tag: "",
        }
    }
}

impl InlineStyle {
    /// Style inside `tag` when opened within `self`.
    fn with_element(mut self, tag: &'static str, linked: bool) -> Self {
        if is_heading(tag) {
            self.font_scale = heading_scale(tag);
            self.bold = true;
        }
        self.bold |= is_bold_tag(tag);
        self.italic |= is_italic_tag(tag);
        self.underline |= tag == "u" || (tag == "a" && linked);
        self.strikethrough |= is_strikethrough_tag(tag);
        if is_inline_formatting(tag) {
            self.parent_tag = tag;
        }
        self
    }
}

#[derive(Clone, Copy, Debug)]
struct OpenElement {
    tag: &'static str,
    /// Owns the top entry of the link stack while open.
    linked: bool,
    style: InlineStyle,
}

struct Scanner<'a, F> {
    src: &'a str,
    limits: &'a ParseLimits,
    on_segment: F,
    buffer: String,
    elements: SmallVec<[OpenElement; 16]>,
    lists: SmallVec<[ListContext; 4]>,
    links: SmallVec<[String; 2]>,
    direction: DirectionContext,
    table_rows: SmallVec<[usize; 4]>,
    raw_text: Option<&'static str>,
    follows_inline: bool,
    /// Elements past the nesting cap, innermost last. They sit above every
    /// entry of `elements` and are dropped whenever a real element pops.
    overflowed: SmallVec<[&'static str; 8]>,
    last_emitted: Option<char>,
}

impl<'a, F> Scanner<'a, F>
where
    F: FnMut(Segment),
{
    fn new(src: &'a str, limits: &'a ParseLimits, on_segment: F) -> Self {
        Self {
            src,
            limits,
            on_segment,
            buffer: String::with_capacity(64),
            elements: SmallVec::new(),
            lists: SmallVec::new(),
            links: SmallVec::new(),
            direction: DirectionContext::new(),
            table_rows: SmallVec::new(),
            raw_text: None,
            follows_inline: false,
            overflowed: SmallVec::new(),
            last_emitted: None,
        }
    }

    fn run(mut self) {
        let src = self.src;
        let bytes = src.as_bytes();
        let mut pos = 0usize;
        while pos < bytes.len() {
            let text_end = next_tag_start(bytes, pos).unwrap_or(bytes.len());
            if self.raw_text.is_none() {
                self.buffer.push_str(&src[pos..text_end]);
            }
            if text_end == bytes.len() {
                break;
            }
            let Some(span_end) = tag_span_end(bytes, text_end) else {
                log::debug!("dropping unterminated tag at byte {}", text_end);
                break;
            };
            let tag = RawTag::parse(&src[text_end + 1..span_end - 1]);
            if !tag.name.is_empty() {
                self.handle_tag(&tag, span_end);
            }
            pos = span_end;
        }
        self.flush();
    }

    fn handle_tag(&mut self, tag: &RawTag<'_>, after: usize) {
        if let Some(raw) = self.raw_text {
            if tag.closing && tag.name == raw {
                self.raw_text = None;
            }
            return;
        }
        match element_kind(&tag.name) {
            ElementKind::LineBreak => {
                if !tag.closing {
                    self.buffer.push('\n');
                }
            }
            ElementKind::Paragraph => {
                if tag.closing {
                    self.close_paragraph(&tag.name);
                } else {
                    self.open_paragraph(tag, after);
                    if tag.self_closing {
                        self.close_paragraph(&tag.name);
                    }
                }
            }
            ElementKind::TableRow => {
                if tag.closing {
                    self.close_paragraph(&tag.name);
                    self.table_rows.pop();
                } else if !tag.self_closing {
                    self.open_paragraph(tag, after);
                    self.table_rows.push(0);
                }
            }
            ElementKind::TableCell => {
                if !tag.closing {
                    if let Some(cells) = self.table_rows.last_mut() {
                        if *cells > 0 {
                            self.buffer.push_str(" | ");
                        }
                        *cells = cells.saturating_add(1);
                    }
                }
            }
            ElementKind::Inline => {
                if tag.closing {
                    self.close_inline(&tag.name);
                } else if !tag.self_closing {
                    self.open_inline(tag, after);
                }
            }
            ElementKind::ListItem => {
                if tag.closing {
                    self.close_list_item();
                } else {
                    self.open_list_item();
                }
            }
            ElementKind::List(kind) => {
                if tag.closing {
                    self.close_list();
                } else if !tag.self_closing {
                    self.open_list(kind, tag);
                }
            }
            ElementKind::RawText => {
                if !tag.closing && !tag.self_closing {
                    self.raw_text = stack_tag(&tag.name);
                }
            }
            ElementKind::Ignored => {}
        }
    }

    fn current_style(&self) -> InlineStyle {
        self.elements
            .last()
            .map(|open| open.style)
            .unwrap_or_default()
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let decoded = match decode_entities(&self.buffer) {
            Cow::Owned(decoded) => Some(decoded),
            Cow::Borrowed(_) => None,
        };
        let text = decoded.unwrap_or_else(|| core::mem::take(&mut self.buffer));
        self.buffer.clear();
        if let Some(last) = text.chars().next_back() {
            self.last_emitted = Some(last);
        }

        let style = self.current_style();
        let segment = Segment {
            text,
            font_scale: style.font_scale,
            is_bold: style.bold,
            is_italic: style.italic,
            is_underline: style.underline,
            is_strikethrough: style.strikethrough,
            is_link: !self.links.is_empty(),
            follows_inline_element: core::mem::take(&mut self.follows_inline),
            parent_tag: style.parent_tag.to_string(),
            link_url: self.links.last().cloned().unwrap_or_default(),
            writing_direction: self.direction.effective_direction(),
            is_bdi_isolated: self.direction.is_isolated(),
            is_bdo_override: self.direction.is_override(),
        };
        (self.on_segment)(segment);
    }

    /// Push a styled element, or record it as flattened past the nesting cap.
    fn push_element(&mut self, tag: &'static str, linked: bool) -> bool {
        if self.elements.len() >= self.limits.max_nesting {
            self.overflowed.push(tag);
            log::warn!(
                "Element nesting depth {} exceeds max_nesting ({}); flattening style",
                self.elements.len() + self.overflowed.len(),
                self.limits.max_nesting
            );
            return false;
        }
        let style = self.current_style().with_element(tag, linked);
        self.elements.push(OpenElement { tag, linked, style });
        true
    }

    fn pop_element(&mut self) {
        if let Some(open) = self.elements.pop() {
            self.overflowed.clear();
            if open.linked {
                self.links.pop();
            }
            self.direction.exit_element(open.tag);
        }
    }

    /// Consume the innermost flattened element when `name` closes it.
    fn close_overflowed(&mut self, name: &str) -> bool {
        if self.overflowed.last().is_some_and(|tag| *tag == name) {
            self.overflowed.pop();
            true
        } else {
            false
        }
    }

    fn refold_styles(&mut self) {
        let mut style = InlineStyle::default();
        for open in &mut self.elements {
            style = style.with_element(open.tag, open.linked);
            open.style = style;
        }
    }

    fn clear_links(&mut self) {
        if self.links.is_empty() && !self.elements.iter().any(|open| open.linked) {
            return;
        }
        self.links.clear();
        for open in &mut self.elements {
            open.linked = false;
        }
        self.refold_styles();
    }

    fn release_innermost_link(&mut self) {
        let Some(open) = self.elements.iter_mut().rev().find(|open| open.linked) else {
            return;
        };
        open.linked = false;
        self.links.pop();
        self.refold_styles();
    }

    fn enter_direction(&mut self, tag: &'static str, raw: &RawTag<'_>, after: usize) {
        let dir = raw.attribute("dir").unwrap_or("");
        if wants_auto_detection(tag, dir) {
            let lookahead = self.lookahead_text(tag, after);
            self.direction.enter_element(tag, dir, &lookahead);
        } else {
            self.direction.enter_element(tag, dir, "");
        }
    }

    fn open_paragraph(&mut self, tag: &RawTag<'_>, after: usize) {
        self.flush();
        self.follows_inline = false;
        let Some(name) = stack_tag(&tag.name) else {
            return;
        };
        if self.push_element(name, false) {
            self.enter_direction(name, tag, after);
        }
    }

    fn close_paragraph(&mut self, name: &str) {
        self.buffer.push('\n');
        self.flush();
        self.follows_inline = false;
        if !self.close_overflowed(name) {
            if let Some(index) = self.elements.iter().rposition(|open| open.tag == name) {
                while self.elements.len() > index {
                    self.pop_element();
                }
            }
        }
        self.clear_links();
    }

    fn open_inline(&mut self, tag: &RawTag<'_>, after: usize) {
        self.flush();
        let Some(name) = stack_tag(&tag.name) else {
            return;
        };
        let href = if name == "a" {
            tag.attribute("href").and_then(accepted_link_target)
        } else {
            None
        };
        if !self.push_element(name, href.is_some()) {
            return;
        }
        if let Some(url) = href {
            self.links.push(url);
        }
        self.enter_direction(name, tag, after);

        let dir = parse_dir_attribute(tag.attribute("dir").unwrap_or(""));
        match name {
            ISOLATION_TAG => self.buffer.push(match dir {
                DirAttribute::Rtl => RIGHT_TO_LEFT_ISOLATE,
                DirAttribute::Ltr => LEFT_TO_RIGHT_ISOLATE,
                DirAttribute::Auto | DirAttribute::Natural => FIRST_STRONG_ISOLATE,
            }),
            OVERRIDE_TAG => match dir {
                DirAttribute::Rtl => self.buffer.push(RIGHT_TO_LEFT_OVERRIDE),
                DirAttribute::Ltr => self.buffer.push(LEFT_TO_RIGHT_OVERRIDE),
                DirAttribute::Auto | DirAttribute::Natural => {}
            },
            _ => {}
        }
    }

    fn close_inline(&mut self, name: &str) {
        if self.close_overflowed(name) {
            return;
        }
        match name {
            ISOLATION_TAG => self.buffer.push(POP_DIRECTIONAL_ISOLATE),
            OVERRIDE_TAG => self.buffer.push(POP_DIRECTIONAL_FORMATTING),
            _ => {}
        }
        self.flush();
        self.follows_inline = true;
        if self.elements.last().is_some_and(|open| open.tag == name) {
            self.pop_element();
        } else if name == "a" {
            self.release_innermost_link();
        }
    }

    fn last_char(&self) -> Option<char> {
        self.buffer.chars().next_back().or(self.last_emitted)
    }

    fn open_list_item(&mut self) {
        let kept = self.buffer.trim_end_matches([' ', '\t']).len();
        self.buffer.truncate(kept);
        if self.last_char().is_some_and(|ch| ch != '\n') {
            self.buffer.push('\n');
        }
        let Some(list) = self.lists.last_mut() else {
            self.buffer.push(BULLET);
            self.buffer.push(' ');
            return;
        };
        list.item_counter = list.item_counter.saturating_add(1);
        for _ in 1..list.nesting_level {
            self.buffer.push_str(LIST_INDENT);
        }
        match list.kind {
            ListKind::Ordered => {
                self.buffer.push_str(&list.item_counter.to_string());
                self.buffer.push_str(". ");
            }
            ListKind::Unordered => {
                self.buffer.push(BULLET);
                self.buffer.push(' ');
            }
        }
    }

    fn close_list_item(&mut self) {
        let kept = self.buffer.trim_end_matches([' ', '\t']).len();
        self.buffer.truncate(kept);
        if self
            .last_char()
            .is_some_and(|ch| !matches!(ch, '.' | '!' | '?' | ':' | ';' | '\n'))
        {
            self.buffer.push('.');
        }
    }

    fn open_list(&mut self, kind: ListKind, tag: &RawTag<'_>) {
        let start = match kind {
            ListKind::Ordered => tag
                .attribute("start")
                .and_then(|value| value.trim().parse::<i64>().ok())
                .unwrap_or(1),
            ListKind::Unordered => 1,
        };
        self.lists.push(ListContext {
            kind,
            item_counter: start.saturating_sub(1),
            nesting_level: self.lists.len() + 1,
        });
    }

    fn close_list(&mut self) {
        self.lists.pop();
        if self.lists.is_empty() {
            self.buffer.push('\n');
            self.flush();
            self.follows_inline = false;
        }
    }

    /// Plain text of the element opened just before `from`, up to its
    /// matching close or the lookahead cap.
    fn lookahead_text(&self, tag: &str, from: usize) -> String {
        let mut limit = from
            .saturating_add(self.limits.max_lookahead_bytes)
            .min(self.src.len());
        while !self.src.is_char_boundary(limit) {
            limit -= 1;
        }
        let window = &self.src.as_bytes()[..limit];
        let mut text = String::new();
        let mut depth = 1usize;
        let mut pos = from;
        while pos < limit {
            let text_end = next_tag_start(window, pos).unwrap_or(limit);
            text.push_str(&self.src[pos..text_end]);
            if text_end == limit {
                break;
            }
            let Some(span_end) = tag_span_end(window, text_end) else {
                break;
            };
            let inner = RawTag::parse(&self.src[text_end + 1..span_end - 1]);
            if inner.name == tag && !inner.self_closing {
                if inner.closing {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                } else {
                    depth += 1;
                }
            }
            pos = span_end;
        }
        decode_entities(&text).into_owned()
    }
}

fn accepted_link_target(raw: &str) -> Option<String> {
    let decoded = decode_entities(raw);
    let url = decoded.trim();
    if is_safe_link_url(url) {
        Some(url.to_string())
    } else {
        log::debug!("not recording link target {:?}", url);
        None
    }
}
