/// Module grid
pub mod matrix;
/// Colors and shapes
pub mod style;
/// Versions, levels, masks and symbols
pub mod symbol;

pub use matrix::BitMatrix;
pub use style::{Color, EyeShape, ParseColorError, PixelShape, QrStyle};
pub use symbol::{
    Charset, ECLevel, MaskPattern, ParseCharsetError, ParseLevelError, QrContent, QrSymbol, Version,
};
