use std::str::FromStr;

use thiserror::Error;

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel (255 = opaque)
    pub a: u8,
}

impl Color {
    /// Opaque black
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    /// Opaque white
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    /// Opaque color from RGB channels
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Channels in RGBA order
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Error for a malformed `#RRGGBB` / `#RRGGBBAA` color
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid color: \"{0}\". Expected #RRGGBB or #RRGGBBAA")]
pub struct ParseColorError(pub String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(ParseColorError(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ParseColorError(s.to_string()))
        };
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a,
        })
    }
}

/// Shape used for each dark data module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelShape {
    /// Full square cell
    #[default]
    Square,
    /// Circle inscribed in the cell
    Circle,
    /// Square with rounded corners
    RoundedSquare,
}

/// Shape used for the finder patterns ("eyes")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EyeShape {
    /// Square ring and square pupil
    #[default]
    Square,
    /// Circular ring and circular pupil
    Circle,
    /// Rounded-rectangle ring and pupil
    Rounded,
}

/// Rendering configuration for a symbol
///
/// Pure configuration; it never changes the module matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct QrStyle {
    /// Fill behind every light module and the quiet zone
    pub background_color: Color,
    /// Dark data modules
    pub foreground_color: Color,
    /// Outer ring of each finder pattern
    pub eye_color: Color,
    /// 3x3 center of each finder pattern
    pub pupil_color: Color,
    /// Data module shape
    pub pixel_shape: PixelShape,
    /// Finder pattern shape
    pub eye_shape: EyeShape,
    /// Pixels per module on screen surfaces
    pub scale: u32,
    /// Light border in modules
    pub quiet_zone: u32,
}

impl QrStyle {
    /// Same style with a uniform foreground for data, eyes and pupils
    pub fn with_foreground(mut self, color: Color) -> Self {
        self.foreground_color = color;
        self.eye_color = color;
        self.pupil_color = color;
        self
    }
}

impl Default for QrStyle {
    fn default() -> Self {
        Self {
            background_color: Color::WHITE,
            foreground_color: Color::BLACK,
            eye_color: Color::BLACK,
            pupil_color: Color::BLACK,
            pixel_shape: PixelShape::Square,
            eye_shape: EyeShape::Square,
            scale: 8,
            quiet_zone: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse() {
        assert_eq!("#ff8000".parse(), Ok(Color::rgb(255, 128, 0)));
        assert_eq!(
            "00000080".parse(),
            Ok(Color {
                r: 0,
                g: 0,
                b: 0,
                a: 128
            })
        );
        assert!("#fff".parse::<Color>().is_err());
        assert!("#gg0000".parse::<Color>().is_err());
    }

    #[test]
    fn test_with_foreground_recolors_eyes() {
        let red = Color::rgb(255, 0, 0);
        let style = QrStyle::default().with_foreground(red);
        assert_eq!(style.eye_color, red);
        assert_eq!(style.pupil_color, red);
        assert_eq!(style.background_color, Color::WHITE);
    }
}
