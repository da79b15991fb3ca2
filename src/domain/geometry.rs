//! Typed 2D geometry for the two coordinate spaces of a drawing.
//!
//! Layout space counts node slots (one unit per leaf, one unit per depth
//! level); pixel space is what renderers draw in.

use euclid::{Angle, Rotation2D};

/// Unscaled layout coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSpace;

/// Renderer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSpace;

pub type LayoutPoint = euclid::Point2D<f64, LayoutSpace>;
pub type LayoutVector = euclid::Vector2D<f64, LayoutSpace>;
pub type PixelPoint = euclid::Point2D<f64, PixelSpace>;
pub type PixelVector = euclid::Vector2D<f64, PixelSpace>;
pub type PixelBox = euclid::Box2D<f64, PixelSpace>;
pub type LayoutToPixel = euclid::Scale<f64, LayoutSpace, PixelSpace>;

pub fn layout_point(x: f64, y: f64) -> LayoutPoint {
    euclid::point2(x, y)
}

pub fn pixel_point(x: f64, y: f64) -> PixelPoint {
    euclid::point2(x, y)
}

/// Angle of the vector from `from` to `to`, as `atan2(dy, dx)`.
pub fn direction(from: PixelPoint, to: PixelPoint) -> f64 {
    let delta = to - from;
    delta.y.atan2(delta.x)
}

/// Vector of length `length` pointing along `angle`.
pub fn polar(angle: f64, length: f64) -> PixelVector {
    PixelVector::from_angle_and_length(Angle::radians(angle), length)
}

/// Standard counter-clockwise 2D rotation by `angle` radians.
pub fn rotate(vector: PixelVector, angle: f64) -> PixelVector {
    Rotation2D::<f64, PixelSpace, PixelSpace>::radians(angle).transform_vector(vector)
}
