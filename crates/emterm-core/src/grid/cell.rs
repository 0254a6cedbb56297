//! Cell and attribute model.
//!
//! A [`Cell`] is the value stored at one grid position: a Unicode scalar,
//! its column width (0, 1, or 2), and an [`Attributes`] bundle. Width 0
//! marks the spacer occupying the second column of a wide character; its
//! codepoint is never rendered or extracted.

use bitflags::bitflags;

/// RGB color tuple type (R, G, B).
pub type Rgb = (u8, u8, u8);

/// A terminal color.
///
/// `Default` defers to the theme's foreground/background; `Indexed` is a
/// slot in the 256-color palette; `Rgb` is a 24-bit truecolor value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// Default terminal color (theme foreground or background).
    #[default]
    Default,
    /// Indexed color (0-255 palette).
    Indexed(u8),
    /// True color RGB.
    Rgb(u8, u8, u8),
}

impl Color {
    /// Check if this is the default color.
    #[must_use]
    #[inline]
    pub const fn is_default(self) -> bool {
        matches!(self, Self::Default)
    }
}

bitflags! {
    /// Text style flags carried by a cell.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[repr(transparent)]
    pub struct AttrFlags: u16 {
        /// Bold text.
        const BOLD = 1 << 0;
        /// Dim/faint text.
        const DIM = 1 << 1;
        /// Italic text.
        const ITALIC = 1 << 2;
        /// Underlined text.
        const UNDERLINE = 1 << 3;
        /// Blinking text.
        const BLINK = 1 << 4;
        /// Inverse video.
        const INVERSE = 1 << 5;
        /// Hidden/invisible text.
        const HIDDEN = 1 << 6;
        /// Strikethrough text.
        const STRIKETHROUGH = 1 << 7;
    }
}

/// Foreground color, background color, and style flags for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Attributes {
    /// Foreground color.
    pub fg: Color,
    /// Background color.
    pub bg: Color,
    /// Style flags.
    pub flags: AttrFlags,
}

impl Attributes {
    /// Default attributes (default colors, no flags).
    pub const DEFAULT: Self = Self {
        fg: Color::Default,
        bg: Color::Default,
        flags: AttrFlags::empty(),
    };

    /// Attributes applied to erased cells: the given background only.
    ///
    /// Erase operations keep the pen's background but drop every other
    /// attribute, matching widely-used terminals.
    #[must_use]
    #[inline]
    pub const fn erased(bg: Color) -> Self {
        Self {
            fg: Color::Default,
            bg,
            flags: AttrFlags::empty(),
        }
    }

    /// Check if these are the default attributes.
    #[must_use]
    #[inline]
    pub fn is_default(self) -> bool {
        self == Self::DEFAULT
    }

    /// Reset to defaults.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::DEFAULT;
    }
}

/// A single terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Unicode scalar value. `'\0'` marks a never-written cell and
    /// materializes as a space during text extraction.
    pub cp: char,
    /// Cell width in columns: 0 (wide-char spacer), 1, or 2.
    pub width: u8,
    /// Visual attributes.
    pub attrs: Attributes,
}

impl Default for Cell {
    #[inline]
    fn default() -> Self {
        Self::BLANK
    }
}

impl Cell {
    /// Blank cell (space with default attributes).
    pub const BLANK: Self = Self {
        cp: ' ',
        width: 1,
        attrs: Attributes::DEFAULT,
    };

    /// Create a cell.
    #[must_use]
    #[inline]
    pub const fn new(cp: char, width: u8, attrs: Attributes) -> Self {
        Self { cp, width, attrs }
    }

    /// The spacer cell written into the second column of a wide character.
    #[must_use]
    #[inline]
    pub const fn spacer(attrs: Attributes) -> Self {
        Self {
            cp: '\0',
            width: 0,
            attrs,
        }
    }

    /// An erased cell: a space carrying only the given background.
    #[must_use]
    #[inline]
    pub const fn erased(attrs: Attributes) -> Self {
        Self {
            cp: ' ',
            width: 1,
            attrs,
        }
    }

    /// Check if this cell starts a wide (two-column) character.
    #[must_use]
    #[inline]
    pub const fn is_wide(&self) -> bool {
        self.width == 2
    }

    /// Check if this is the spacer half of a wide character.
    #[must_use]
    #[inline]
    pub const fn is_spacer(&self) -> bool {
        self.width == 0
    }

    /// Check if this cell is blank (space or never written, default attrs).
    #[must_use]
    #[inline]
    pub fn is_blank(&self) -> bool {
        (self.cp == ' ' || self.cp == '\0') && self.width == 1 && self.attrs.is_default()
    }

    /// The character to materialize for this cell: never-written cells
    /// yield a space.
    #[must_use]
    #[inline]
    pub const fn display_char(&self) -> char {
        if self.cp == '\0' {
            ' '
        } else {
            self.cp
        }
    }
}
