//! Micro-parsers for color and numeric style values.

/// Parse a CSS-style hex color into ARGB.
///
/// Accepts `#rgb`, `#rgba`, `#rrggbb` and `#rrggbbaa`; short forms expand
/// each digit (`#abc` is `#aabbcc`). Colors without alpha are fully opaque.
pub fn parse_hex_color(value: &str) -> Option<u32> {
    let hex = value.trim().strip_prefix('#')?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let digits: Option<([u8; 4], bool)> = match hex.len() {
        3 | 4 => {
            let mut channels = [0u8; 4];
            for (slot, b) in channels.iter_mut().zip(hex.bytes()) {
                let nibble = hex_nibble(b)?;
                *slot = nibble << 4 | nibble;
            }
            Some((channels, hex.len() == 4))
        }
        6 | 8 => {
            let mut channels = [0u8; 4];
            for (slot, pair) in channels.iter_mut().zip(hex.as_bytes().chunks(2)) {
                *slot = hex_nibble(pair[0])? << 4 | hex_nibble(pair[1])?;
            }
            Some((channels, hex.len() == 8))
        }
        _ => None,
    };
    let ([r, g, b, a], has_alpha) = digits?;
    let alpha = if has_alpha { a } else { 0xFF };
    Some(u32::from_be_bytes([alpha, r, g, b]))
}

/// Parse a packed ARGB integer as produced by platform color processors.
///
/// Negative values are accepted as the signed 32-bit view of the same bits.
pub fn parse_argb_integer(value: &str) -> Option<u32> {
    let parsed = value.trim().parse::<i64>().ok()?;
    if let Ok(unsigned) = u32::try_from(parsed) {
        return Some(unsigned);
    }
    i32::try_from(parsed).ok().map(|signed| signed as u32)
}

/// Parse the leading numeric token of `value` (`"18px"` is `18.0`).
///
/// Only digits, `.` and `-` belong to the token; anything else ends it.
pub fn parse_leading_number(value: &str) -> Option<f32> {
    let value = value.trim();
    let end = value
        .find(|ch: char| !(ch.is_ascii_digit() || ch == '.' || ch == '-'))
        .unwrap_or(value.len());
    value[..end].parse::<f32>().ok().filter(|n| n.is_finite())
}

fn hex_nibble(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
