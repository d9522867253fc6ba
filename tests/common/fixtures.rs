//! Synthetic markup documents shared by the integration tests.

/// Arabic word used where right-to-left text is needed.
pub const ARABIC_WORD: &str = "\u{645}\u{631}\u{62d}\u{628}\u{627}";

pub const TAG_STYLES: &str = r##"{
    "b": {"color": "#c00", "fontWeight": "bold", "fontSize": "30px"},
    "a": {"textDecorationLine": "none"}
}"##;

/// Article-like document mixing headings, inline styles, links, isolated
/// right-to-left runs and lists.
pub fn article(paragraphs: usize) -> String {
    let mut markup = String::with_capacity(paragraphs * 240);
    markup.push_str("<h1>Synthetic chapter</h1>\n");
    for i in 0..paragraphs {
        markup.push_str("<p>Paragraph ");
        markup.push_str(&i.to_string());
        markup.push_str(" with <b>bold</b>, <i>italic</i> and a <a href=\"https://example.com/");
        markup.push_str(&i.to_string());
        markup.push_str("\">link</a>; <bdi>");
        markup.push_str(ARABIC_WORD);
        markup.push_str("</bdi> &amp; more.</p>\n");
        if i % 8 == 0 {
            markup.push_str(
                "<ol>\n  <li>first</li>\n  <li>second\n    <ul><li>nested</li></ul>\n  </li>\n</ol>\n",
            );
        }
    }
    markup
}

/// `depth` lists nested inside each other, one item per level.
pub fn nested_lists(depth: usize) -> String {
    let mut markup = String::new();
    for level in 0..depth {
        let tag = if level % 2 == 0 { "ol" } else { "ul" };
        markup.push('<');
        markup.push_str(tag);
        markup.push_str("><li>level ");
        markup.push_str(&(level + 1).to_string());
    }
    for level in (0..depth).rev() {
        let tag = if level % 2 == 0 { "ol" } else { "ul" };
        markup.push_str("</li></");
        markup.push_str(tag);
        markup.push('>');
    }
    markup
}

/// `depth` bold elements wrapped around a single word.
pub fn deep_inline_nesting(depth: usize) -> String {
    let mut markup = String::with_capacity(depth * 8 + 16);
    markup.push_str("<p>");
    for _ in 0..depth {
        markup.push_str("<b>");
    }
    markup.push_str("deep");
    for _ in 0..depth {
        markup.push_str("</b>");
    }
    markup.push_str(" tail</p>");
    markup
}
