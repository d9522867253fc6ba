//! Tag classification tables shared by the whitespace pass and the scanner.

/// List flavour for `<ol>` / `<ul>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ListKind {
    /// Numbered list (`<ol>`).
    Ordered,
    /// Bulleted list (`<ul>`).
    Unordered,
}

/// How the segment scanner treats an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    /// Appends a newline without flushing (`br`, `hr`).
    LineBreak,
    /// Paragraph-level container: flushes on open and close.
    Paragraph,
    /// Table row: paragraph-level, plus cell separator bookkeeping.
    TableRow,
    /// Table cell: separated from its previous sibling cell.
    TableCell,
    /// Inline formatting element.
    Inline,
    /// List item.
    ListItem,
    /// List container.
    List(ListKind),
    /// Element whose content is discarded.
    RawText,
    /// Anything else; contributes nothing.
    Ignored,
}

const BLOCK_LEVEL_TAGS: &[&str] = &[
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "ul",
    "ol",
    "li",
    "blockquote",
    "pre",
    "hr",
    "br",
    "table",
    "thead",
    "tbody",
    "tfoot",
    "tr",
    "td",
    "th",
    "div",
    "section",
    "article",
    "header",
    "footer",
    "nav",
    "aside",
    "main",
    "figure",
    "figcaption",
];

const INLINE_FORMATTING_TAGS: &[&str] = &[
    "b", "strong", "i", "em", "u", "s", "strike", "del", "code", "span", "a", "bdi", "bdo",
];

const PARAGRAPH_TAGS: &[&str] = &[
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "div",
    "blockquote",
    "pre",
    "section",
    "article",
    "header",
    "footer",
    "nav",
    "aside",
    "main",
    "figure",
    "figcaption",
    "table",
    "tr",
];

/// Whether `tag` breaks text flow like a paragraph.
pub fn is_block_level(tag: &str) -> bool {
    BLOCK_LEVEL_TAGS.contains(&tag)
}

/// Whether `tag` changes styling without breaking text flow.
pub fn is_inline_formatting(tag: &str) -> bool {
    INLINE_FORMATTING_TAGS.contains(&tag)
}

/// Font scale factor for a heading tag; `1.0` for everything else.
pub fn heading_scale(tag: &str) -> f32 {
    match tag {
        "h1" => 2.0,
        "h2" => 1.5,
        "h3" => 1.17,
        "h4" => 1.0,
        "h5" => 0.83,
        "h6" => 0.67,
        _ => 1.0,
    }
}

pub(crate) fn is_heading(tag: &str) -> bool {
    matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

pub(crate) fn is_bold_tag(tag: &str) -> bool {
    matches!(tag, "b" | "strong")
}

pub(crate) fn is_italic_tag(tag: &str) -> bool {
    matches!(tag, "i" | "em")
}

pub(crate) fn is_strikethrough_tag(tag: &str) -> bool {
    matches!(tag, "s" | "strike" | "del")
}

/// Classify a lowercase tag name for the segment scanner.
pub fn element_kind(tag: &str) -> ElementKind {
    match tag {
        "br" | "hr" => ElementKind::LineBreak,
        "tr" => ElementKind::TableRow,
        "td" | "th" => ElementKind::TableCell,
        "li" => ElementKind::ListItem,
        "ol" => ElementKind::List(ListKind::Ordered),
        "ul" => ElementKind::List(ListKind::Unordered),
        "script" | "style" | "head" | "noscript" => ElementKind::RawText,
        _ if PARAGRAPH_TAGS.contains(&tag) => ElementKind::Paragraph,
        _ if is_inline_formatting(tag) => ElementKind::Inline,
        _ => ElementKind::Ignored,
    }
}

/// Interned name for tags the scanner keeps on its element stack.
pub(crate) fn stack_tag(tag: &str) -> Option<&'static str> {
    PARAGRAPH_TAGS
        .iter()
        .chain(INLINE_FORMATTING_TAGS.iter())
        .chain(["script", "style", "head", "noscript"].iter())
        .find(|known| **known == tag)
        .copied()
}
