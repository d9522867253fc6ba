//! Style resolution: segments in, render-ready fragments out.

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::direction::WritingDirection;
use crate::segment::{Segment, BULLET};
use crate::tag_style::{is_bold_weight, lookup_tag_style, TagStyle};

/// Gap added to the font size to derive the minimum line height.
pub const LINE_HEIGHT_BUFFER: f32 = 4.0;

/// Color applied to link text when no tag style sets one.
pub const DEFAULT_LINK_COLOR: u32 = 0xFF00_7AFF;

/// Caller-supplied base styling.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BaseStyle {
    /// Base font size before heading scale and the accessibility multiplier.
    pub font_size: f32,
    /// Accessibility font-size multiplier.
    pub font_size_multiplier: f32,
    /// When false the multiplier is ignored.
    pub allow_font_scaling: bool,
    /// Upper bound for the multiplier; not applied unless positive.
    pub max_font_size_multiplier: f32,
    /// Requested line height; not applied unless positive.
    pub line_height: f32,
    /// Base weight (`"bold"`, `"700"`, ...); empty for regular.
    pub font_weight: String,
    /// Font family passed through to fragments.
    pub font_family: String,
    /// Base style (`"italic"`); empty for normal.
    pub font_style: String,
    /// Letter spacing passed through to fragments.
    pub letter_spacing: f32,
    /// Base ARGB color; 0 means unset.
    pub color: u32,
}

impl Default for BaseStyle {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            font_size_multiplier: 1.0,
            allow_font_scaling: true,
            max_font_size_multiplier: 0.0,
            line_height: 0.0,
            font_weight: String::new(),
            font_family: String::new(),
            font_style: String::new(),
            letter_spacing: 0.0,
            color: 0,
        }
    }
}

impl BaseStyle {
    /// Multiplier applied to every computed font size.
    ///
    /// Always 1.0 when scaling is disabled. A non-finite or non-positive
    /// multiplier counts as 1.0; a positive cap clamps the result.
    pub fn effective_multiplier(&self) -> f32 {
        if !self.allow_font_scaling {
            return 1.0;
        }
        let multiplier = if self.font_size_multiplier.is_finite() && self.font_size_multiplier > 0.0
        {
            self.font_size_multiplier
        } else {
            1.0
        };
        let cap = self.max_font_size_multiplier;
        if cap.is_finite() && cap > 0.0 {
            multiplier.min(cap)
        } else {
            multiplier
        }
    }

    fn is_bold(&self) -> bool {
        is_bold_weight(&self.font_weight)
    }

    fn is_italic(&self) -> bool {
        self.font_style.trim().eq_ignore_ascii_case("italic")
    }
}

/// Combined underline/strikethrough decoration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TextDecoration {
    /// No decoration.
    #[default]
    None,
    /// Underline only.
    Underline,
    /// Strikethrough only.
    Strikethrough,
    /// Both lines.
    UnderlineStrikethrough,
}

impl TextDecoration {
    /// Combine two decoration flags.
    pub fn from_flags(underline: bool, strikethrough: bool) -> Self {
        match (underline, strikethrough) {
            (false, false) => Self::None,
            (true, false) => Self::Underline,
            (false, true) => Self::Strikethrough,
            (true, true) => Self::UnderlineStrikethrough,
        }
    }

    /// Whether an underline is drawn.
    pub fn has_underline(self) -> bool {
        matches!(self, Self::Underline | Self::UnderlineStrikethrough)
    }

    /// Whether a strikethrough is drawn.
    pub fn has_strikethrough(self) -> bool {
        matches!(self, Self::Strikethrough | Self::UnderlineStrikethrough)
    }
}

/// A text run with every visual attribute resolved.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Fragment {
    /// Normalized display text.
    pub text: String,
    /// Final font size.
    pub font_size: f32,
    /// Final line height.
    pub line_height: f32,
    /// Bold.
    pub is_bold: bool,
    /// Italic.
    pub is_italic: bool,
    /// Decoration lines.
    pub decoration: TextDecoration,
    /// ARGB color, when one applies.
    pub color: Option<u32>,
    /// Font family from the base style.
    pub font_family: String,
    /// Letter spacing from the base style.
    pub letter_spacing: f32,
    /// Writing direction of the run.
    pub writing_direction: WritingDirection,
    /// Inside a `<bdi>` scope.
    pub is_bdi_isolated: bool,
    /// Inside a `<bdo>` scope.
    pub is_bdo_override: bool,
    /// Part of a hyperlink.
    pub is_link: bool,
}

/// Output of a full parse.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParseResult {
    /// Fragments in document order.
    pub fragments: Vec<Fragment>,
    /// Link target per fragment; empty when the fragment is not a link.
    pub link_urls: Vec<String>,
    /// Flattened text for screen readers.
    pub accessibility_label: String,
}

impl ParseResult {
    /// Whether nothing visible was produced.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Concatenated fragment text.
    pub fn plain_text(&self) -> String {
        self.fragments.iter().map(|f| f.text.as_str()).collect()
    }

    /// Link target of the fragment at `index`, if it is a link.
    pub fn link_at(&self, index: usize) -> Option<&str> {
        self.link_urls
            .get(index)
            .map(String::as_str)
            .filter(|url| !url.is_empty())
    }
}

/// Resolves segments against a base style and optional per-tag overrides.
#[derive(Clone, Debug)]
pub struct StyleResolver<'a> {
    base: &'a BaseStyle,
    tag_styles: Option<&'a str>,
}

impl<'a> StyleResolver<'a> {
    /// Create a resolver for `base`.
    pub fn new(base: &'a BaseStyle) -> Self {
        Self {
            base,
            tag_styles: None,
        }
    }

    /// Use per-tag overrides from a JSON-like blob keyed by tag name.
    pub fn with_tag_styles(mut self, blob: &'a str) -> Self {
        self.tag_styles = Some(blob);
        self
    }

    /// Resolve a segment list into fragments, link targets and a label.
    pub fn resolve(&self, segments: &[Segment]) -> ParseResult {
        let visible = trim_trailing_blank(segments);
        if visible.is_empty() {
            return ParseResult::default();
        }
        let multiplier = self.base.effective_multiplier();
        let texts = normalize_texts(visible);
        let mut cache: BTreeMap<&str, TagStyle> = BTreeMap::new();
        let unstyled = TagStyle::default();
        let mut result = ParseResult::default();

        for (segment, text) in visible.iter().zip(texts) {
            if text.is_empty() {
                continue;
            }
            let tag_style: &TagStyle = match self.tag_styles {
                Some(blob) if !segment.parent_tag.is_empty() => cache
                    .entry(segment.parent_tag.as_str())
                    .or_insert_with(|| lookup_tag_style(blob, &segment.parent_tag)),
                _ => &unstyled,
            };
            result
                .fragments
                .push(self.resolve_fragment(segment, text, tag_style, multiplier));
            result.link_urls.push(segment.link_url.clone());
        }
        result.accessibility_label = accessibility_label(&result.fragments);
        result
    }

    fn resolve_fragment(
        &self,
        segment: &Segment,
        text: String,
        tag_style: &TagStyle,
        multiplier: f32,
    ) -> Fragment {
        let font_size = tag_style
            .positive_font_size()
            .unwrap_or(self.base.font_size * segment.font_scale * multiplier);
        let line_height = if self.base.line_height > 0.0 {
            self.base.line_height.max(font_size + LINE_HEIGHT_BUFFER)
        } else {
            font_size + LINE_HEIGHT_BUFFER
        };
        let decoration = tag_style.decoration_override().unwrap_or_else(|| {
            TextDecoration::from_flags(segment.is_underline, segment.is_strikethrough)
        });
        let color = tag_style
            .color
            .or_else(|| segment.is_link.then_some(DEFAULT_LINK_COLOR))
            .or_else(|| (self.base.color != 0).then_some(self.base.color));

        Fragment {
            text,
            font_size,
            line_height,
            is_bold: tag_style.wants_bold() || segment.is_bold || self.base.is_bold(),
            is_italic: tag_style.wants_italic() || segment.is_italic || self.base.is_italic(),
            decoration,
            color,
            font_family: self.base.font_family.clone(),
            letter_spacing: self.base.letter_spacing,
            writing_direction: segment.writing_direction,
            is_bdi_isolated: segment.is_bdi_isolated,
            is_bdo_override: segment.is_bdo_override,
            is_link: segment.is_link,
        }
    }
}

/// Concatenated normalized text of `segments`, without styling.
pub fn plain_text(segments: &[Segment]) -> String {
    normalize_texts(trim_trailing_blank(segments))
        .into_iter()
        .collect()
}

fn trim_trailing_blank(segments: &[Segment]) -> &[Segment] {
    let end = segments
        .iter()
        .rposition(|segment| !segment.is_blank())
        .map_or(0, |index| index + 1);
    &segments[..end]
}

fn is_list_marker(ch: char) -> bool {
    ch.is_ascii_digit() || ch == BULLET
}

/// Normalized text per segment, aligned with the input.
fn normalize_texts(segments: &[Segment]) -> Vec<String> {
    let mut texts = Vec::with_capacity(segments.len());
    let mut last_char: Option<char> = None;
    for segment in segments {
        let text = if segment.is_paragraph_break() {
            segment.text.chars().filter(|ch| *ch == '\n').collect()
        } else {
            let keep_leading_space = segment.follows_inline_element
                && last_char.is_some_and(|ch| !ch.is_whitespace());
            let at_line_start = last_char.is_none_or(|ch| ch == '\n');
            collapse_whitespace(&segment.text, keep_leading_space, at_line_start)
        };
        if let Some(ch) = text.chars().next_back() {
            last_char = Some(ch);
        }
        texts.push(text);
    }
    for text in texts.iter_mut().rev() {
        let kept = text.trim_end().len();
        text.truncate(kept);
        if !text.is_empty() {
            break;
        }
    }
    texts
}

/// Collapse ASCII whitespace runs.
///
/// Runs containing a newline become one newline, followed by the run's
/// indentation when a list marker comes next. A leading newline is dropped
/// when the output is already `at_line_start`. Other runs become one space,
/// except a leading run, which is kept only when `keep_leading_space`.
fn collapse_whitespace(text: &str, keep_leading_space: bool, at_line_start: bool) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut pos = 0usize;
    while pos < bytes.len() {
        if !bytes[pos].is_ascii_whitespace() {
            let start = pos;
            while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            out.push_str(&text[start..pos]);
            continue;
        }
        let start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let run = &text[start..pos];
        match run.rfind('\n') {
            Some(last_newline) => {
                if !(start == 0 && at_line_start) {
                    out.push('\n');
                }
                if text[pos..].chars().next().is_some_and(is_list_marker) {
                    out.extend(run[last_newline + 1..].chars().filter(|ch| *ch == ' '));
                }
            }
            None if start == 0 && !keep_leading_space => {}
            None => out.push(' '),
        }
    }
    out
}

/// Join fragment texts, adding a pause before each line that starts a list
/// item.
fn accessibility_label(fragments: &[Fragment]) -> String {
    let joined: String = fragments.iter().map(|f| f.text.as_str()).collect();
    let mut label = String::with_capacity(joined.len() + 8);
    for (index, ch) in joined.char_indices() {
        if ch == '\n'
            && joined[index + 1..]
                .trim_start_matches(' ')
                .chars()
                .next()
                .is_some_and(is_list_marker)
            && label
                .chars()
                .next_back()
                .is_some_and(|prev| !matches!(prev, '.' | '!' | '?' | ':' | ';' | '\n'))
        {
            label.push('.');
        }
        label.push(ch);
    }
    label
}
