//! RGB color notations understood by the host and normalization to `#rrggbb`.

use thiserror::Error;

/// The value matches none of the known RGB notations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("value \"{0}\" does not match any of known RGB formats")]
pub struct ColorFormatError(pub String);

/// `#RGB`
pub fn is_rgb(value: &str) -> bool {
    is_hex_color(value, 3)
}

/// `#RRGGBB`
pub fn is_rgb_ext(value: &str) -> bool {
    is_hex_color(value, 6)
}

fn is_hex_color(value: &str, digits: usize) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == digits && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Converts any known RGB notation to lowercase `#rrggbb`.
///
/// Accepted inputs (whitespace anywhere is ignored, hex digits in any case):
/// - `#RRGGBB`
/// - `#RGB`, every digit doubled
/// - `rgb(R,G,B)` and `rgba(R,G,B,A)`, decimal components `0..=255`
pub fn to_rgb_ext(value: &str) -> Result<String, ColorFormatError> {
    let clean: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if is_rgb_ext(&clean) {
        return Ok(clean);
    }

    if is_rgb(&clean) {
        let mut color = String::with_capacity(7);
        color.push('#');
        for c in clean.chars().skip(1) {
            color.push(c);
            color.push(c);
        }
        return Ok(color);
    }

    let components = css_components(&clean, "rgb(", 3)
        .or_else(|| css_components(&clean, "rgba(", 4))
        .ok_or_else(|| ColorFormatError(value.to_string()))?;

    let mut color = String::from("#");
    for component in &components[..3] {
        let n: u8 = component
            .parse()
            .map_err(|_| ColorFormatError(value.to_string()))?;
        color.push_str(&format!("{n:02x}"));
    }
    Ok(color)
}

/// Splits `rgb(...)`/`rgba(...)` bodies into exactly `count` 1-3 digit parts.
fn css_components<'a>(clean: &'a str, prefix: &str, count: usize) -> Option<Vec<&'a str>> {
    let body = clean.strip_prefix(prefix)?.strip_suffix(')')?;
    let parts: Vec<&str> = body.split(',').collect();
    let valid = parts.len() == count
        && parts
            .iter()
            .all(|p| (1..=3).contains(&p.len()) && p.chars().all(|c| c.is_ascii_digit()));
    valid.then_some(parts)
}

/// `true` when the color is perceived as dark (HSP brightness below 120).
///
/// Accepts `#RGB` and `#RRGGBB`.
pub fn is_color_dark(color: &str) -> Result<bool, ColorFormatError> {
    let full = if is_rgb(color) {
        to_rgb_ext(color)?
    } else if is_rgb_ext(color) {
        color.to_string()
    } else {
        return Err(ColorFormatError(color.to_string()));
    };

    let channel = |idx: usize| -> f64 {
        let start = 1 + idx * 2;
        f64::from(u8::from_str_radix(&full[start..start + 2], 16).unwrap_or(0))
    };
    let (r, g, b) = (channel(0), channel(1), channel(2));
    let hsp = (0.299 * r * r + 0.587 * g * g + 0.114 * b * b).sqrt();
    Ok(hsp < 120.0)
}
