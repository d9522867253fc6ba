//! Low-level tag lexing shared by the whitespace pass and the segment scanner.

extern crate alloc;

use alloc::borrow::Cow;
use alloc::string::String;

/// Longest character reference body (between `&` and `;`) worth decoding.
const MAX_REFERENCE_LEN: usize = 32;

/// Parsed view of the text between `<` and `>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RawTag<'a> {
    /// Lowercase element name; empty for comments and declarations.
    pub name: String,
    /// `</name>` form.
    pub closing: bool,
    /// `<name/>` form.
    pub self_closing: bool,
    /// Attribute source following the name.
    pub attrs: &'a str,
}

impl<'a> RawTag<'a> {
    /// Parse the inner text of a tag span (without the angle brackets).
    pub fn parse(inner: &'a str) -> Self {
        if inner.starts_with('!') || inner.starts_with('?') {
            return Self {
                name: String::new(),
                closing: false,
                self_closing: false,
                attrs: "",
            };
        }
        let (closing, rest) = match inner.strip_prefix('/') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, inner),
        };
        let name_len = rest
            .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '-' || ch == ':'))
            .unwrap_or(rest.len());
        let attrs = &rest[name_len..];
        Self {
            name: rest[..name_len].to_ascii_lowercase(),
            closing,
            self_closing: attrs.trim_end().ends_with('/'),
            attrs,
        }
    }

    /// Raw value of attribute `name`, if present.
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        find_attribute(self.attrs, name)
    }
}

/// Whether a tag span begins at `pos`.
///
/// A `<` only opens a tag when followed by a letter, `/`, `!` or `?`; anything
/// else is literal text.
pub(crate) fn is_tag_start(bytes: &[u8], pos: usize) -> bool {
    if bytes.get(pos) != Some(&b'<') {
        return false;
    }
    matches!(
        bytes.get(pos + 1),
        Some(b) if b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?')
    )
}

/// Exclusive end of the tag span starting at `start`, or `None` when the
/// input ends first.
///
/// Comments run to `-->`; other tags end at the first `>` outside a quoted
/// attribute value.
pub(crate) fn tag_span_end(bytes: &[u8], start: usize) -> Option<usize> {
    if bytes[start..].starts_with(b"<!--") {
        let body = start + 4;
        return bytes[body..]
            .windows(3)
            .position(|window| window == b"-->")
            .map(|offset| body + offset + 3);
    }
    let mut quote: Option<u8> = None;
    for (offset, &b) in bytes[start + 1..].iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(start + 1 + offset + 1),
            None => {}
        }
    }
    None
}

/// Position of the next tag start at or after `from`.
pub(crate) fn next_tag_start(bytes: &[u8], from: usize) -> Option<usize> {
    let mut pos = from;
    while let Some(offset) = bytes[pos..].iter().position(|&b| b == b'<') {
        let candidate = pos + offset;
        if is_tag_start(bytes, candidate) {
            return Some(candidate);
        }
        pos = candidate + 1;
    }
    None
}

/// Look up an attribute value by case-insensitive name.
///
/// Values may be double-quoted, single-quoted or bare. A valueless attribute
/// yields an empty string.
pub(crate) fn find_attribute<'a>(attrs: &'a str, wanted: &str) -> Option<&'a str> {
    let bytes = attrs.as_bytes();
    let mut pos = 0usize;
    while pos < bytes.len() {
        while pos < bytes.len() && (bytes[pos].is_ascii_whitespace() || bytes[pos] == b'/') {
            pos += 1;
        }
        let name_start = pos;
        while pos < bytes.len()
            && !bytes[pos].is_ascii_whitespace()
            && !matches!(bytes[pos], b'=' | b'/' | b'>')
        {
            pos += 1;
        }
        let name = &attrs[name_start..pos];
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let mut value = "";
        if bytes.get(pos) == Some(&b'=') {
            pos += 1;
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            match bytes.get(pos) {
                Some(&q) if q == b'"' || q == b'\'' => {
                    let value_start = pos + 1;
                    let value_end = bytes[value_start..]
                        .iter()
                        .position(|&b| b == q)
                        .map_or(bytes.len(), |offset| value_start + offset);
                    value = &attrs[value_start..value_end];
                    pos = (value_end + 1).min(bytes.len());
                }
                _ => {
                    let value_start = pos;
                    while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
                        pos += 1;
                    }
                    value = &attrs[value_start..pos];
                }
            }
        }
        if name.is_empty() {
            if pos == name_start {
                pos += 1;
            }
            continue;
        }
        if name.eq_ignore_ascii_case(wanted) {
            return Some(value);
        }
    }
    None
}

/// Decode character references in text or attribute values.
///
/// XML predefined and numeric references go through `quick-xml`; a handful of
/// common HTML names are resolved locally. Unknown references stay verbatim.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let body_len = tail[1..]
            .bytes()
            .take(MAX_REFERENCE_LEN + 1)
            .position(|b| !(b.is_ascii_alphanumeric() || b == b'#'));
        match body_len {
            Some(len) if len > 0 && tail.as_bytes()[1 + len] == b';' => {
                let reference = &tail[..len + 2];
                match quick_xml::escape::unescape(reference) {
                    Ok(decoded) => out.push_str(&decoded),
                    Err(_) => out.push_str(html_reference(&reference[1..len + 1]).unwrap_or(reference)),
                }
                rest = &tail[len + 2..];
            }
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn html_reference(name: &str) -> Option<&'static str> {
    let decoded = match name {
        "nbsp" => "\u{a0}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "laquo" => "\u{ab}",
        "raquo" => "\u{bb}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "trade" => "\u{2122}",
        "bull" => "\u{2022}",
        "middot" => "\u{b7}",
        "times" => "\u{d7}",
        "shy" => "\u{ad}",
        "lrm" => "\u{200e}",
        "rlm" => "\u{200f}",
        _ => return None,
    };
    Some(decoded)
}
