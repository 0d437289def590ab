//! Color representation

use std::fmt;

/// Font, fill or border color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Color {
    /// Automatic/default color
    #[default]
    Auto,

    /// RGB color (no alpha)
    Rgb { r: u8, g: u8, b: u8 },
}

impl Color {
    /// Create an RGB color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb { r, g, b }
    }

    // Common colors
    pub const BLACK: Color = Color::Rgb { r: 0, g: 0, b: 0 };
    pub const BLUE: Color = Color::Rgb { r: 0, g: 0, b: 255 };
    /// Column header fill and table border color
    pub const HEADER_BLUE: Color = Color::Rgb {
        r: 164,
        g: 194,
        b: 244,
    };
    /// Merged header and region subtotal fill
    pub const LIGHT_GRAY: Color = Color::Rgb {
        r: 243,
        g: 243,
        b: 243,
    };
    /// Muted label text
    pub const DARK_GRAY: Color = Color::Rgb {
        r: 100,
        g: 100,
        b: 100,
    };
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Auto => write!(f, "auto"),
            Color::Rgb { r, g, b } => write!(f, "#{:02X}{:02X}{:02X}", r, g, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Color::HEADER_BLUE.to_string(), "#A4C2F4");
        assert_eq!(Color::rgb(100, 100, 100), Color::DARK_GRAY);
        assert_eq!(Color::Auto.to_string(), "auto");
    }
}
