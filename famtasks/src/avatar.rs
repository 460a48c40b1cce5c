//! Deterministic avatars derived from a display name.
//!
//! The colour hash follows the web client bit for bit (UTF-16 code units,
//! 32-bit shift, truncated remainder) so the same name gets the same colour
//! in every client.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// An HSL colour as produced by [`string_to_color`].
///
/// Components may be negative for names whose hash is negative; CSS
/// normalises those when rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsl {
    /// Hue, `hash % 360`.
    pub hue: i64,
    /// Saturation percentage, `65 + hash % 10`.
    pub saturation: i64,
    /// Lightness percentage, `55 + hash % 10`.
    pub lightness: i64,
}

impl std::fmt::Display for Hsl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

/// Everything needed to draw a participant's avatar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Avatar {
    /// Background colour.
    pub color: Hsl,
    /// One or two upper-case letters, or `?`.
    pub initials: String,
    /// Inline `data:` URL of the rendered SVG.
    pub url: String,
}

impl Avatar {
    /// Builds the avatar for `name`.
    #[must_use]
    pub fn for_name(name: &str) -> Self {
        Self {
            color: string_to_color(name),
            initials: get_initials(name),
            url: generate_avatar_url(name),
        }
    }
}

/// Rolling `hash = unit + ((hash << 5) - hash)` over UTF-16 code units.
///
/// The shift operates on the low 32 bits of the running value; the
/// subtraction and addition do not wrap to 32 bits.
fn name_hash(name: &str) -> i64 {
    name.encode_utf16().fold(0_i64, |hash, unit| {
        #[allow(clippy::cast_possible_truncation)]
        let low = hash as i32;
        let shifted = i64::from(low.wrapping_shl(5));
        i64::from(unit).wrapping_add(shifted).wrapping_sub(hash)
    })
}

/// Maps a name to a pastel colour.
#[must_use]
pub fn string_to_color(name: &str) -> Hsl {
    let hash = name_hash(name);
    Hsl {
        hue: hash % 360,
        saturation: 65 + hash % 10,
        lightness: 55 + hash % 10,
    }
}

/// Returns the initials shown inside the avatar.
///
/// Empty names give `?`; a single word gives its first two characters;
/// several words give the first character of the first and last word.
#[must_use]
pub fn get_initials(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    match words.as_slice() {
        [] => "?".to_string(),
        [only] => only.chars().take(2).collect::<String>().to_uppercase(),
        [first, .., last] => first
            .chars()
            .take(1)
            .chain(last.chars().take(1))
            .collect::<String>()
            .to_uppercase(),
    }
}

/// Renders a 40x40 circular SVG avatar and returns it as a base64 `data:` URL.
#[must_use]
pub fn generate_avatar_url(name: &str) -> String {
    let initials = escape_xml(&get_initials(name));
    let background = string_to_color(name);
    let svg = format!(
        r#"<svg width="40" height="40" xmlns="http://www.w3.org/2000/svg"><circle cx="20" cy="20" r="20" fill="{background}"/><text x="50%" y="50%" font-family="Inter, system-ui, sans-serif" font-size="16" font-weight="600" fill="white" text-anchor="middle" dominant-baseline="central">{initials}</text></svg>"#
    );
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}
