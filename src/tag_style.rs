//! Per-tag style overrides read from a JSON-like blob.
//!
//! The blob is treated as opaque text. Only the two levels the resolver needs
//! are read: a top-level object keyed by tag name, whose values are objects of
//! style properties:
//!
//! ```text
//! { "b": { "color": "#c00", "fontSize": 18 }, "a": { "textDecorationLine": "none" } }
//! ```
//!
//! String values may use either quote style and may contain braces; the
//! tokenizer keeps string contents out of the nesting count.

extern crate alloc;

use alloc::string::{String, ToString};

use crate::error::TagStyleError;
use crate::fragment::TextDecoration;
use crate::values::{parse_argb_integer, parse_hex_color, parse_leading_number};

/// Visual overrides for one tag.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TagStyle {
    /// ARGB color; never `Some(0)`.
    pub color: Option<u32>,
    /// Font size in the caller's units.
    pub font_size: Option<f32>,
    /// Font weight keyword or number (`"bold"`, `"700"`).
    pub font_weight: Option<String>,
    /// Font style keyword (`"italic"`).
    pub font_style: Option<String>,
    /// Decoration keywords (`"underline line-through"`).
    pub text_decoration_line: Option<String>,
}

impl TagStyle {
    /// Whether no property is set.
    pub fn is_empty(&self) -> bool {
        self.color.is_none()
            && self.font_size.is_none()
            && self.font_weight.is_none()
            && self.font_style.is_none()
            && self.text_decoration_line.is_none()
    }

    /// Whether the weight override asks for bold.
    pub fn wants_bold(&self) -> bool {
        self.font_weight
            .as_deref()
            .is_some_and(is_bold_weight)
    }

    /// Whether the style override asks for italic.
    pub fn wants_italic(&self) -> bool {
        self.font_style
            .as_deref()
            .is_some_and(|style| style.trim().eq_ignore_ascii_case("italic"))
    }

    /// Positive font size override, if any.
    pub fn positive_font_size(&self) -> Option<f32> {
        self.font_size.filter(|size| size.is_finite() && *size > 0.0)
    }

    /// Decoration forced by `textDecorationLine`.
    ///
    /// Only the exact keywords `underline`, `line-through` (alone or
    /// combined) and `none` are recognized; anything else leaves the
    /// segment's own decoration in place.
    pub fn decoration_override(&self) -> Option<TextDecoration> {
        let value = self.text_decoration_line.as_deref()?.trim();
        if value.eq_ignore_ascii_case("none") {
            return Some(TextDecoration::None);
        }
        let mut underline = false;
        let mut strikethrough = false;
        for keyword in value.split_ascii_whitespace() {
            if keyword.eq_ignore_ascii_case("underline") {
                underline = true;
            } else if keyword.eq_ignore_ascii_case("line-through") {
                strikethrough = true;
            } else {
                return None;
            }
        }
        if !underline && !strikethrough {
            return None;
        }
        Some(TextDecoration::from_flags(underline, strikethrough))
    }

    fn apply(&mut self, property: &str, raw: &str, quoted: bool) {
        if !quoted && raw == "null" {
            return;
        }
        match property {
            "color" => {
                let color = if quoted {
                    parse_hex_color(raw)
                } else {
                    parse_argb_integer(raw)
                };
                self.color = color.filter(|argb| *argb != 0);
            }
            "fontSize" => self.font_size = parse_leading_number(raw),
            "fontWeight" => self.font_weight = non_empty(raw),
            "fontStyle" => self.font_style = non_empty(raw),
            "textDecorationLine" => self.text_decoration_line = non_empty(raw),
            _ => {}
        }
    }
}

/// Whether a weight keyword counts as bold.
pub(crate) fn is_bold_weight(weight: &str) -> bool {
    let weight = weight.trim();
    weight.eq_ignore_ascii_case("bold") || matches!(weight, "700" | "800" | "900")
}

/// Look up the style block for `tag`, degrading to an empty style.
///
/// A missing tag, a malformed blob, or malformed individual values all yield
/// unset fields rather than an error.
pub fn lookup_tag_style(blob: &str, tag: &str) -> TagStyle {
    match try_lookup_tag_style(blob, tag) {
        Ok(style) => style.unwrap_or_default(),
        Err(err) => {
            log::debug!("ignoring malformed tag style blob: {}", err);
            TagStyle::default()
        }
    }
}

/// Strictly look up the style block for `tag`.
///
/// Returns `Ok(None)` when the blob has no entry for the tag. Structural
/// problems in the blob are errors; unparseable property values are not.
pub fn try_lookup_tag_style(blob: &str, tag: &str) -> Result<Option<TagStyle>, TagStyleError> {
    let Some(start) = find_tag_block(blob, tag).map_err(|err| err.with_tag(tag))? else {
        return Ok(None);
    };
    read_properties(blob, start)
        .map(Some)
        .map_err(|err| err.with_tag(tag))
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Token<'a> {
    ObjectStart,
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    Colon,
    Comma,
    Str(&'a str),
    Bare(&'a str),
}

struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str, pos: usize) -> Self {
        Self { src, pos }
    }

    fn next_token(&mut self) -> Result<Option<(usize, Token<'a>)>, TagStyleError> {
        let bytes = self.src.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        let start = self.pos;
        let Some(&b) = bytes.get(start) else {
            return Ok(None);
        };
        let token = match b {
            b'{' => Token::ObjectStart,
            b'}' => Token::ObjectEnd,
            b'[' => Token::ArrayStart,
            b']' => Token::ArrayEnd,
            b':' => Token::Colon,
            b',' => Token::Comma,
            b'"' | b'\'' => {
                let mut end = start + 1;
                loop {
                    match bytes.get(end) {
                        Some(&c) if c == b => break,
                        Some(b'\\') => end += 2,
                        Some(_) => end += 1,
                        None => {
                            return Err(TagStyleError::new(
                                "BLOB_UNTERMINATED_STRING",
                                "string value is missing its closing quote",
                            )
                            .with_offset(start))
                        }
                    }
                }
                self.pos = end + 1;
                return Ok(Some((start, Token::Str(&self.src[start + 1..end]))));
            }
            _ => {
                let mut end = start;
                while end < bytes.len()
                    && !bytes[end].is_ascii_whitespace()
                    && !matches!(bytes[end], b'{' | b'}' | b'[' | b']' | b':' | b',' | b'"' | b'\'')
                {
                    end += 1;
                }
                self.pos = end;
                return Ok(Some((start, Token::Bare(&self.src[start..end]))));
            }
        };
        self.pos += 1;
        Ok(Some((start, token)))
    }

    fn expect_token(&mut self) -> Result<(usize, Token<'a>), TagStyleError> {
        self.next_token()?.ok_or_else(|| {
            TagStyleError::new("BLOB_UNEXPECTED_EOF", "style blob ended early")
                .with_offset(self.src.len())
        })
    }

    /// Consume the rest of a value whose first token is `first`.
    fn skip_value(&mut self, first: (usize, Token<'a>)) -> Result<(), TagStyleError> {
        match first.1 {
            Token::Str(_) | Token::Bare(_) => Ok(()),
            Token::ObjectStart | Token::ArrayStart => {
                let mut depth = 1usize;
                while depth > 0 {
                    match self.expect_token()?.1 {
                        Token::ObjectStart | Token::ArrayStart => depth += 1,
                        Token::ObjectEnd | Token::ArrayEnd => depth -= 1,
                        _ => {}
                    }
                }
                Ok(())
            }
            _ => Err(unexpected(first.0, "a value")),
        }
    }

    /// Read the next member key of an object, or `None` at its closing brace.
    fn next_key(&mut self) -> Result<Option<&'a str>, TagStyleError> {
        loop {
            let (offset, token) = self.expect_token()?;
            match token {
                Token::ObjectEnd => return Ok(None),
                Token::Comma => continue,
                Token::Str(key) | Token::Bare(key) => {
                    let (colon_offset, colon) = self.expect_token()?;
                    if colon != Token::Colon {
                        return Err(unexpected(colon_offset, "':'"));
                    }
                    return Ok(Some(key));
                }
                _ => return Err(unexpected(offset, "a member key")),
            }
        }
    }

    fn expect_object_start(&mut self) -> Result<(), TagStyleError> {
        match self.expect_token()? {
            (_, Token::ObjectStart) => Ok(()),
            (offset, _) => Err(TagStyleError::new(
                "BLOB_NOT_OBJECT",
                "expected an object",
            )
            .with_offset(offset)),
        }
    }
}

fn unexpected(offset: usize, expected: &str) -> TagStyleError {
    let mut message = String::from("unexpected token, expected ");
    message.push_str(expected);
    TagStyleError::new("BLOB_UNEXPECTED_TOKEN", message).with_offset(offset)
}

/// Byte offset of the `{` opening the style block for `tag`.
fn find_tag_block(blob: &str, tag: &str) -> Result<Option<usize>, TagStyleError> {
    let mut tokens = Tokenizer::new(blob, 0);
    if blob.trim().is_empty() {
        return Ok(None);
    }
    tokens.expect_object_start()?;
    while let Some(key) = tokens.next_key()? {
        let value = tokens.expect_token()?;
        if key.eq_ignore_ascii_case(tag) && value.1 == Token::ObjectStart {
            return Ok(Some(value.0));
        }
        tokens.skip_value(value)?;
    }
    Ok(None)
}

fn read_properties(blob: &str, start: usize) -> Result<TagStyle, TagStyleError> {
    let mut tokens = Tokenizer::new(blob, start);
    tokens.expect_object_start()?;
    let mut style = TagStyle::default();
    while let Some(property) = tokens.next_key()? {
        let value = tokens.expect_token()?;
        match value.1 {
            Token::Str(raw) => style.apply(property, raw, true),
            Token::Bare(raw) => style.apply(property, raw, false),
            _ => tokens.skip_value(value)?,
        }
    }
    Ok(style)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOB: &str = r##"{
        "p": { "color": "#123456" },
        "b": { "color": "#c00", "fontSize": "18px", "fontWeight": "bold", "extra": {"nested": [1, {"x": "}"}]} },
        "a": { "textDecorationLine": "none", "color": -16776961 },
        'em': { 'fontStyle': 'italic' }
    }"##;

    #[test]
    fn reads_properties_for_requested_tag() {
        let style = lookup_tag_style(BLOB, "b");
        assert_eq!(style.color, Some(0xFFCC_0000));
        assert_eq!(style.font_size, Some(18.0));
        assert!(style.wants_bold());
        assert!(!style.wants_italic());

        let em = lookup_tag_style(BLOB, "em");
        assert!(em.wants_italic());
    }

    #[test]
    fn integer_colors_and_decoration_keywords() {
        let style = lookup_tag_style(BLOB, "a");
        assert_eq!(style.color, Some(0xFF00_00FF));
        assert_eq!(style.decoration_override(), Some(TextDecoration::None));
    }

    #[test]
    fn braces_inside_strings_do_not_end_blocks() {
        let blob = r##"{"span": {"note": "}{ not a brace", "color": "#0f0"}, "i": {"color": "#00f"}}"##;
        assert_eq!(lookup_tag_style(blob, "span").color, Some(0xFF00_FF00));
        assert_eq!(lookup_tag_style(blob, "i").color, Some(0xFF00_00FF));
    }

    #[test]
    fn missing_tags_and_bad_values_are_unset() {
        assert!(lookup_tag_style(BLOB, "code").is_empty());
        let blob = r#"{"b": {"color": "red", "fontSize": "big", "fontWeight": ""}}"#;
        let style = lookup_tag_style(blob, "b");
        assert!(style.is_empty());
        assert_eq!(
            try_lookup_tag_style(blob, "b").map(|s| s.is_some()),
            Ok(true)
        );
    }

    #[test]
    fn transparent_black_counts_as_unset() {
        let style = lookup_tag_style(r##"{"b": {"color": "#00000000"}}"##, "b");
        assert_eq!(style.color, None);
    }

    #[test]
    fn malformed_blobs_report_errors_strictly_and_degrade_leniently() {
        let err = try_lookup_tag_style(r##"{"b": {"color": "#fff"}"##, "i")
            .expect_err("unterminated object should fail");
        assert_eq!(err.code, "BLOB_UNEXPECTED_EOF");
        assert_eq!(err.tag.as_deref(), Some("i"));

        let err = try_lookup_tag_style(r#"{"b" "x"}"#, "b").expect_err("missing colon");
        assert_eq!(err.code, "BLOB_UNEXPECTED_TOKEN");
        assert_eq!(err.offset, Some(5));

        let err = try_lookup_tag_style(r##"{"b": {"color": "#fff}}"##, "b")
            .expect_err("unterminated string");
        assert_eq!(err.code, "BLOB_UNTERMINATED_STRING");

        assert!(lookup_tag_style("[1, 2]", "b").is_empty());
        assert!(lookup_tag_style("", "b").is_empty());
    }

    #[test]
    fn decoration_matching_is_exact() {
        let mut style = TagStyle {
            text_decoration_line: Some("line-through underline".to_string()),
            ..TagStyle::default()
        };
        assert_eq!(
            style.decoration_override(),
            Some(TextDecoration::UnderlineStrikethrough)
        );
        style.text_decoration_line = Some("underlined".to_string());
        assert_eq!(style.decoration_override(), None);
        style.text_decoration_line = Some("line-through".to_string());
        assert_eq!(
            style.decoration_override(),
            Some(TextDecoration::Strikethrough)
        );
    }
}
