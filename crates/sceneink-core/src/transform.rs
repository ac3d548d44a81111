//! 2D affine matrix helpers.
//!
//! Matrices are [`kurbo::Affine`] values whose coefficients `[a, b, c, d, e, f]`
//! map to
//!
//! ```text
//! | a  c  e |
//! | b  d  f |
//! | 0  0  1 |
//! ```
//!
//! Angles are passed in radians only at construction (`rotation`); everything
//! stored on shapes is in degrees. Positive angles rotate from +x towards +y,
//! which is the same convention as [`rotate_point`].

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Determinant magnitude below which a matrix is treated as non-invertible.
pub const SINGULAR_EPSILON: f64 = 1e-10;

/// Translation, rotation and scale extracted from a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decomposed {
    pub x: f64,
    pub y: f64,
    /// Rotation in degrees.
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

pub fn identity() -> Affine {
    Affine::IDENTITY
}

pub fn translation(tx: f64, ty: f64) -> Affine {
    Affine::translate(Vec2::new(tx, ty))
}

/// Rotation matrix for an angle in radians.
pub fn rotation(radians: f64) -> Affine {
    Affine::rotate(radians)
}

pub fn scale(sx: f64, sy: f64) -> Affine {
    Affine::scale_non_uniform(sx, sy)
}

/// Matrix product `m1 * m2`: `m2` is applied first, then `m1`.
pub fn multiply(m1: Affine, m2: Affine) -> Affine {
    m1 * m2
}

/// Fold matrices left to right, so `compose(&[a, b, c]) == a * b * c`
/// and `c` is applied to a point first.
pub fn compose(matrices: &[Affine]) -> Affine {
    matrices.iter().fold(Affine::IDENTITY, |acc, &m| acc * m)
}

pub fn determinant(m: Affine) -> f64 {
    m.determinant()
}

/// Invert a matrix, degrading to identity when it is (nearly) singular.
pub fn invert(m: Affine) -> Affine {
    let det = m.determinant();
    if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
        log::warn!("Refusing to invert singular matrix (det = {det}), using identity");
        return Affine::IDENTITY;
    }
    m.inverse()
}

pub fn apply_to_point(point: Point, m: Affine) -> Point {
    m * point
}

/// Extract translation, rotation (via `atan2`) and per-axis column scale.
pub fn decompose(m: Affine) -> Decomposed {
    let [a, b, c, d, e, f] = m.as_coeffs();
    Decomposed {
        x: e,
        y: f,
        rotation: b.atan2(a).to_degrees(),
        scale_x: a.hypot(b),
        scale_y: c.hypot(d),
    }
}

/// Map a point from the local frame described by `m` into world space.
pub fn local_to_world(point: Point, m: Affine) -> Point {
    m * point
}

/// Map a world point into the local frame described by `m`.
pub fn world_to_local(point: Point, m: Affine) -> Point {
    invert(m) * point
}

/// Rotate `point` about `center` by `degrees`.
///
/// Computed directly rather than through a matrix; must agree with
/// [`rotation`] for the same angle.
pub fn rotate_point(point: Point, center: Point, degrees: f64) -> Point {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    Point::new(
        center.x + dx * cos - dy * sin,
        center.y + dx * sin + dy * cos,
    )
}

/// Normalize an angle in degrees to `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}
