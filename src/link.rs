//! Hyperlink target validation.

/// Schemes that execute script or embed inline payloads.
pub const DISALLOWED_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

/// Whether `url` may be recorded as a link target.
///
/// The scheme check is case-insensitive and ignores leading whitespace as well
/// as whitespace or control characters smuggled into the scheme
/// (`"java\tscript:"`). Empty targets are rejected.
pub fn is_safe_link_url(url: &str) -> bool {
    let trimmed = url.trim_start();
    if trimmed.is_empty() {
        return false;
    }
    let mut prefix = [0u8; 16];
    let mut len = 0usize;
    for ch in trimmed.chars() {
        if ch.is_whitespace() || ch.is_control() {
            continue;
        }
        if len == prefix.len() || !ch.is_ascii() {
            break;
        }
        prefix[len] = ch.to_ascii_lowercase() as u8;
        len += 1;
    }
    let prefix = &prefix[..len];
    !DISALLOWED_SCHEMES
        .iter()
        .any(|scheme| prefix.starts_with(scheme.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_script_and_data_schemes() {
        assert!(!is_safe_link_url("javascript:alert(1)"));
        assert!(!is_safe_link_url("  JavaScript:alert(1)"));
        assert!(!is_safe_link_url("java\tscript:alert(1)"));
        assert!(!is_safe_link_url("vbscript:msgbox"));
        assert!(!is_safe_link_url("DATA:text/html;base64,AAAA"));
        assert!(!is_safe_link_url("   "));
    }

    #[test]
    fn accepts_ordinary_targets() {
        assert!(is_safe_link_url("https://example.com"));
        assert!(is_safe_link_url("mailto:someone@example.com"));
        assert!(is_safe_link_url("/relative/path"));
        assert!(is_safe_link_url("#anchor"));
        assert!(is_safe_link_url("javascript-guide.html"));
    }
}
