//! Coverage tests for module and finder shapes.
//!
//! Coordinates are in module units with the origin at the top-left corner of
//! the shape's bounding box. A pixel is painted when its center is covered.

use crate::models::{EyeShape, PixelShape};

/// Whether a data module of `shape` covers the point `(u, v)` of a unit cell
pub fn module_covers(shape: PixelShape, u: f32, v: f32) -> bool {
    match shape {
        PixelShape::Square => true,
        PixelShape::Circle => circle_covers(1.0, u, v),
        PixelShape::RoundedSquare => rounded_covers(1.0, 0.3, u, v),
    }
}

/// Finder pattern parts at a point, relative to a 7x7 finder box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyePart {
    /// Outer ring
    Ring,
    /// 3x3 center
    Pupil,
    /// Light gap between ring and pupil
    Gap,
}

/// Which part of a finder pattern drawn as `shape` covers `(u, v)`
pub fn eye_part(shape: EyeShape, u: f32, v: f32) -> EyePart {
    let inside = |inset: f32, u: f32, v: f32| {
        let extent = 7.0 - 2.0 * inset;
        let (u, v) = (u - inset, v - inset);
        if !(0.0..extent).contains(&u) || !(0.0..extent).contains(&v) {
            return false;
        }
        match shape {
            EyeShape::Square => true,
            EyeShape::Circle => circle_covers(extent, u, v),
            EyeShape::Rounded => rounded_covers(extent, extent * 0.25, u, v),
        }
    };

    if inside(2.0, u, v) {
        EyePart::Pupil
    } else if inside(0.0, u, v) && !inside(1.0, u, v) {
        EyePart::Ring
    } else {
        EyePart::Gap
    }
}

fn circle_covers(extent: f32, u: f32, v: f32) -> bool {
    let r = extent / 2.0;
    let (dx, dy) = (u - r, v - r);
    dx * dx + dy * dy <= r * r
}

fn rounded_covers(extent: f32, radius: f32, u: f32, v: f32) -> bool {
    // Distance into the nearest corner square, zero along the straight edges
    let dx = (radius - u).max(u - (extent - radius)).max(0.0);
    let dy = (radius - v).max(v - (extent - radius)).max(0.0);
    dx * dx + dy * dy <= radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_module_covers_corners() {
        assert!(module_covers(PixelShape::Square, 0.05, 0.05));
        assert!(!module_covers(PixelShape::Circle, 0.05, 0.05));
        assert!(!module_covers(PixelShape::RoundedSquare, 0.02, 0.02));
        assert!(module_covers(PixelShape::RoundedSquare, 0.5, 0.02));
    }

    #[test]
    fn test_square_eye_parts() {
        assert_eq!(eye_part(EyeShape::Square, 0.5, 0.5), EyePart::Ring);
        assert_eq!(eye_part(EyeShape::Square, 1.5, 1.5), EyePart::Gap);
        assert_eq!(eye_part(EyeShape::Square, 3.5, 3.5), EyePart::Pupil);
        assert_eq!(eye_part(EyeShape::Square, 6.5, 3.5), EyePart::Ring);
    }

    #[test]
    fn test_circle_eye_corner_is_gap() {
        assert_eq!(eye_part(EyeShape::Circle, 0.2, 0.2), EyePart::Gap);
        assert_eq!(eye_part(EyeShape::Circle, 3.5, 0.5), EyePart::Ring);
        assert_eq!(eye_part(EyeShape::Circle, 3.5, 3.5), EyePart::Pupil);
    }
}
