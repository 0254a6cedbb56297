//! 256-color palette with OSC overrides.
//!
//! The default table is process-wide constant data (the xterm palette:
//! 16 named colors, a 6×6×6 cube, and a 24-step grayscale ramp). OSC 4
//! installs per-terminal overrides on top of it; OSC 104 removes them.
//! OSC 10/11 override the theme's default foreground/background.

use rustc_hash::FxHashMap;

use crate::grid::Rgb;

/// Standard ANSI colors 0-15 (xterm defaults).
const ANSI_16: [Rgb; 16] = [
    (0, 0, 0),       // 0: Black
    (205, 0, 0),     // 1: Red
    (0, 205, 0),     // 2: Green
    (205, 205, 0),   // 3: Yellow
    (0, 0, 238),     // 4: Blue
    (205, 0, 205),   // 5: Magenta
    (0, 205, 205),   // 6: Cyan
    (229, 229, 229), // 7: White
    (127, 127, 127), // 8: Bright Black (Gray)
    (255, 0, 0),     // 9: Bright Red
    (0, 255, 0),     // 10: Bright Green
    (255, 255, 0),   // 11: Bright Yellow
    (92, 92, 255),   // 12: Bright Blue
    (255, 0, 255),   // 13: Bright Magenta
    (0, 255, 255),   // 14: Bright Cyan
    (255, 255, 255), // 15: Bright White
];

/// The built-in color for a palette index.
///
/// - 0-15: standard and bright colors
/// - 16-231: 6×6×6 color cube (`16 + 36r + 6g + b`, components in 0-5)
/// - 232-255: grayscale from dark to light
#[must_use]
pub const fn default_color(index: u8) -> Rgb {
    if index < 16 {
        ANSI_16[index as usize]
    } else if index < 232 {
        let idx = index - 16;
        let r = if idx / 36 == 0 { 0 } else { 55 + (idx / 36) * 40 };
        let g = if (idx % 36) / 6 == 0 {
            0
        } else {
            55 + ((idx % 36) / 6) * 40
        };
        let b = if idx % 6 == 0 { 0 } else { 55 + (idx % 6) * 40 };
        (r, g, b)
    } else {
        let gray = 8 + (index - 232) * 10;
        (gray, gray, gray)
    }
}

/// Per-terminal palette state: the built-in table plus OSC overrides.
#[derive(Debug, Default)]
pub struct Palette {
    overrides: FxHashMap<u8, Rgb>,
    foreground: Option<Rgb>,
    background: Option<Rgb>,
}

impl Palette {
    /// Create a palette with no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a palette index through any override.
    #[must_use]
    pub fn color(&self, index: u8) -> Rgb {
        self.overrides
            .get(&index)
            .copied()
            .unwrap_or_else(|| default_color(index))
    }

    /// The override for one slot, if any (used by theme-aware resolution).
    #[must_use]
    pub fn override_for(&self, index: u8) -> Option<Rgb> {
        self.overrides.get(&index).copied()
    }

    /// Install an override for one slot (OSC 4).
    pub fn set(&mut self, index: u8, rgb: Rgb) {
        self.overrides.insert(index, rgb);
    }

    /// Remove the override for one slot (OSC 104 with arguments).
    pub fn reset(&mut self, index: u8) {
        self.overrides.remove(&index);
    }

    /// Remove every override, including fg/bg (OSC 104 bare).
    pub fn reset_all(&mut self) {
        self.overrides.clear();
        self.foreground = None;
        self.background = None;
    }

    /// Default-foreground override (OSC 10), if set.
    #[must_use]
    pub fn foreground(&self) -> Option<Rgb> {
        self.foreground
    }

    /// Default-background override (OSC 11), if set.
    #[must_use]
    pub fn background(&self) -> Option<Rgb> {
        self.background
    }

    /// Override the default foreground (OSC 10).
    pub fn set_foreground(&mut self, rgb: Rgb) {
        self.foreground = Some(rgb);
    }

    /// Override the default background (OSC 11).
    pub fn set_background(&mut self, rgb: Rgb) {
        self.background = Some(rgb);
    }

    /// Clear the default-foreground override (OSC 110).
    pub fn reset_foreground(&mut self) {
        self.foreground = None;
    }

    /// Clear the default-background override (OSC 111).
    pub fn reset_background(&mut self) {
        self.background = None;
    }
}

/// Parse an X-style color specification: `rgb:RR/GG/BB` (1-4 hex digits
/// per component, scaled) or `#RRGGBB`.
#[must_use]
pub fn parse_color_spec(spec: &str) -> Option<Rgb> {
    let spec = spec.trim();
    if let Some(hex) = spec.strip_prefix('#') {
        if hex.len() == 6 {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            return Some((r, g, b));
        }
        return None;
    }
    if let Some(body) = spec.strip_prefix("rgb:") {
        let mut parts = body.split('/');
        let r = scale_component(parts.next()?)?;
        let g = scale_component(parts.next()?)?;
        let b = scale_component(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        return Some((r, g, b));
    }
    None
}

/// Scale a 1-4 hex digit component to 8 bits, X11-style: the value is a
/// fraction of `16^len - 1`.
fn scale_component(digits: &str) -> Option<u8> {
    let len = digits.len();
    if !(1..=4).contains(&len) {
        return None;
    }
    let value = u32::from_str_radix(digits, 16).ok()?;
    let max = (1u32 << (4 * len as u32)) - 1;
    Some(((value * 255 + max / 2) / max) as u8)
}
