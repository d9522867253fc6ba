//! Writing-direction tracking for nested elements.
//!
//! Direction detection here is the "first strong character" heuristic: the
//! first code point with an inherent left-to-right or right-to-left class
//! decides. This is not the Unicode Bidirectional Algorithm (UAX #9); runs
//! are never reordered.

use smallvec::SmallVec;

/// Isolation element name (`<bdi>`).
pub const ISOLATION_TAG: &str = "bdi";
/// Override element name (`<bdo>`).
pub const OVERRIDE_TAG: &str = "bdo";

/// Resolved writing direction of a text run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum WritingDirection {
    /// Inherit from the surrounding paragraph.
    #[default]
    Natural,
    /// Left-to-right.
    LeftToRight,
    /// Right-to-left.
    RightToLeft,
}

/// Parsed `dir` attribute value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirAttribute {
    /// `dir="ltr"`.
    Ltr,
    /// `dir="rtl"`.
    Rtl,
    /// `dir="auto"`: detect from content.
    Auto,
    /// Missing or unrecognized: inherit from the ancestor.
    Natural,
}

/// Parse a `dir` attribute value case-insensitively.
pub fn parse_dir_attribute(value: &str) -> DirAttribute {
    let value = value.trim();
    if value.eq_ignore_ascii_case("rtl") {
        DirAttribute::Rtl
    } else if value.eq_ignore_ascii_case("ltr") {
        DirAttribute::Ltr
    } else if value.eq_ignore_ascii_case("auto") {
        DirAttribute::Auto
    } else {
        DirAttribute::Natural
    }
}

/// Whether entering `tag` with this `dir` value needs content detection.
pub(crate) fn wants_auto_detection(tag: &str, dir: &str) -> bool {
    match parse_dir_attribute(dir) {
        DirAttribute::Auto => true,
        DirAttribute::Natural => tag == ISOLATION_TAG && dir.trim().is_empty(),
        DirAttribute::Ltr | DirAttribute::Rtl => false,
    }
}

/// Stack of writing directions mirroring the open-element stack.
#[derive(Clone, Debug, Default)]
pub struct DirectionContext {
    current: WritingDirection,
    saved: SmallVec<[WritingDirection; 8]>,
    isolation_scopes: SmallVec<[bool; 8]>,
    override_scopes: SmallVec<[bool; 8]>,
    isolation_depth: usize,
    override_depth: usize,
}

impl DirectionContext {
    /// Create a context with natural direction and no open elements.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter an element.
    ///
    /// `lookahead` is the element's plain-text content, consulted only when the
    /// direction must be detected (`dir="auto"`, or an isolation element with no
    /// `dir`).
    pub fn enter_element(&mut self, tag: &str, dir: &str, lookahead: &str) {
        self.saved.push(self.current);
        let isolates = tag == ISOLATION_TAG;
        let overrides = tag == OVERRIDE_TAG;
        self.isolation_scopes.push(isolates);
        self.override_scopes.push(overrides);
        if isolates {
            self.isolation_depth += 1;
        }
        if overrides {
            self.override_depth += 1;
        }

        match parse_dir_attribute(dir) {
            DirAttribute::Rtl => self.current = WritingDirection::RightToLeft,
            DirAttribute::Ltr => self.current = WritingDirection::LeftToRight,
            _ if wants_auto_detection(tag, dir) => {
                if !lookahead.is_empty() {
                    self.current = detect_direction_from_text(lookahead);
                }
            }
            _ => {}
        }
    }

    /// Leave the most recently entered element. No-op when nothing is open.
    pub fn exit_element(&mut self, tag: &str) {
        let Some(previous) = self.saved.pop() else {
            log::trace!("exit_element(<{}>) with empty direction stack", tag);
            return;
        };
        if self.isolation_scopes.pop().unwrap_or(false) {
            self.isolation_depth = self.isolation_depth.saturating_sub(1);
        }
        if self.override_scopes.pop().unwrap_or(false) {
            self.override_depth = self.override_depth.saturating_sub(1);
        }
        self.current = previous;
    }

    /// Direction in effect for text at the current position.
    pub fn effective_direction(&self) -> WritingDirection {
        self.current
    }

    /// Whether any enclosing element is an isolation scope.
    pub fn is_isolated(&self) -> bool {
        self.isolation_depth > 0
    }

    /// Whether any enclosing element is an override scope.
    pub fn is_override(&self) -> bool {
        self.override_depth > 0
    }

    /// Number of open elements tracked.
    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}

/// Detect direction from the first strong character of `text`.
pub fn detect_direction_from_text(text: &str) -> WritingDirection {
    detect_direction_from_bytes(text.as_bytes())
}

/// Detect direction from the first strong character of UTF-8 bytes.
///
/// Decoding is lenient: an invalid or truncated sequence skips its lead byte
/// and scanning resumes at the next byte. Falls back to left-to-right.
pub fn detect_direction_from_bytes(bytes: &[u8]) -> WritingDirection {
    let mut pos = 0usize;
    while pos < bytes.len() {
        let Some((cp, width)) = decode_code_point(&bytes[pos..]) else {
            pos += 1;
            continue;
        };
        pos += width;
        match strong_class(cp) {
            Some(direction) => return direction,
            None => continue,
        }
    }
    WritingDirection::LeftToRight
}

fn decode_code_point(bytes: &[u8]) -> Option<(u32, usize)> {
    let lead = *bytes.first()?;
    let (width, initial) = match lead {
        0x00..=0x7F => return Some((u32::from(lead), 1)),
        0xC0..=0xDF => (2, u32::from(lead & 0x1F)),
        0xE0..=0xEF => (3, u32::from(lead & 0x0F)),
        0xF0..=0xF7 => (4, u32::from(lead & 0x07)),
        _ => return None,
    };
    let tail = bytes.get(1..width)?;
    let mut cp = initial;
    for &b in tail {
        if b & 0xC0 != 0x80 {
            return None;
        }
        cp = (cp << 6) | u32::from(b & 0x3F);
    }
    Some((cp, width))
}

fn strong_class(cp: u32) -> Option<WritingDirection> {
    if is_strong_rtl(cp) {
        Some(WritingDirection::RightToLeft)
    } else if is_strong_ltr(cp) {
        Some(WritingDirection::LeftToRight)
    } else {
        None
    }
}

fn is_strong_rtl(cp: u32) -> bool {
    matches!(
        cp,
        0x0590..=0x05FF // Hebrew
            | 0x0600..=0x06FF // Arabic
            | 0x0700..=0x074F // Syriac
            | 0x0750..=0x077F // Arabic Supplement
            | 0x0780..=0x07BF // Thaana
            | 0x07C0..=0x07FF // N'Ko
            | 0x08A0..=0x08FF // Arabic Extended-A
            | 0xFB1D..=0xFB4F // Hebrew presentation forms
            | 0xFB50..=0xFDFF // Arabic presentation forms A
            | 0xFE70..=0xFEFF // Arabic presentation forms B
    )
}

fn is_strong_ltr(cp: u32) -> bool {
    matches!(
        cp,
        0x0041..=0x005A
            | 0x0061..=0x007A
            | 0x00C0..=0x00D6
            | 0x00D8..=0x00F6
            | 0x00F8..=0x024F // Latin-1 letters, Latin Extended-A/B
            | 0x0370..=0x03FF // Greek
            | 0x0400..=0x04FF // Cyrillic
            | 0x10A0..=0x10FF // Georgian
            | 0x1E00..=0x1EFF // Latin Extended Additional
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_attribute_is_case_insensitive() {
        assert_eq!(parse_dir_attribute("RTL"), DirAttribute::Rtl);
        assert_eq!(parse_dir_attribute(" ltr "), DirAttribute::Ltr);
        assert_eq!(parse_dir_attribute("Auto"), DirAttribute::Auto);
        assert_eq!(parse_dir_attribute(""), DirAttribute::Natural);
        assert_eq!(parse_dir_attribute("sideways"), DirAttribute::Natural);
    }

    #[test]
    fn detection_skips_neutrals_until_first_strong_character() {
        assert_eq!(
            detect_direction_from_text("123 — \u{5e9}\u{5dc}\u{5d5}\u{5dd} hello"),
            WritingDirection::RightToLeft
        );
        assert_eq!(
            detect_direction_from_text("(42) Straße \u{627}"),
            WritingDirection::LeftToRight
        );
        assert_eq!(
            detect_direction_from_text("\u{43f}\u{440}\u{438}"),
            WritingDirection::LeftToRight
        );
        assert_eq!(
            detect_direction_from_text("12345 !?"),
            WritingDirection::LeftToRight
        );
    }

    #[test]
    fn detection_survives_invalid_utf8() {
        let mut bytes = vec![0xFF, 0x80, 0xE2, 0x28];
        bytes.extend_from_slice("\u{645}".as_bytes());
        assert_eq!(
            detect_direction_from_bytes(&bytes),
            WritingDirection::RightToLeft
        );
        assert_eq!(
            detect_direction_from_bytes(&[0xD8]),
            WritingDirection::LeftToRight
        );
    }

    #[test]
    fn enter_and_exit_restore_previous_direction() {
        let mut ctx = DirectionContext::new();
        ctx.enter_element("p", "rtl", "");
        assert_eq!(ctx.effective_direction(), WritingDirection::RightToLeft);
        ctx.enter_element("span", "", "");
        assert_eq!(ctx.effective_direction(), WritingDirection::RightToLeft);
        ctx.enter_element("span", "ltr", "");
        assert_eq!(ctx.effective_direction(), WritingDirection::LeftToRight);
        ctx.exit_element("span");
        ctx.exit_element("span");
        assert_eq!(ctx.effective_direction(), WritingDirection::RightToLeft);
        ctx.exit_element("p");
        assert_eq!(ctx.effective_direction(), WritingDirection::Natural);
        ctx.exit_element("p");
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn isolation_defaults_to_auto_detection() {
        let mut ctx = DirectionContext::new();
        ctx.enter_element("bdi", "", "\u{627}\u{644}\u{639}\u{631}\u{628}\u{64a}\u{629}");
        assert_eq!(ctx.effective_direction(), WritingDirection::RightToLeft);
        assert!(ctx.is_isolated());
        ctx.exit_element("bdi");
        assert!(!ctx.is_isolated());

        ctx.enter_element("bdi", "", "");
        assert_eq!(ctx.effective_direction(), WritingDirection::Natural);
        ctx.exit_element("bdi");

        ctx.enter_element("span", "", "\u{627}");
        assert_eq!(ctx.effective_direction(), WritingDirection::Natural);
    }

    #[test]
    fn override_without_dir_has_no_directional_effect() {
        let mut ctx = DirectionContext::new();
        ctx.enter_element("p", "ltr", "");
        ctx.enter_element("bdo", "", "\u{5d0}");
        assert!(ctx.is_override());
        assert_eq!(ctx.effective_direction(), WritingDirection::LeftToRight);
        ctx.enter_element("bdo", "rtl", "");
        assert_eq!(ctx.effective_direction(), WritingDirection::RightToLeft);
        ctx.exit_element("bdo");
        ctx.exit_element("bdo");
        assert!(!ctx.is_override());
    }
}
