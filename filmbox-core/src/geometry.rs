//! Points, rectangles and the alignment transform

use nalgebra::{DMatrix, DVector, Matrix3, Point2, Vector3};
use serde::{Deserialize, Serialize};

/// A point in continuous pixel coordinates
pub type Point = Point2<f32>;

/// Axis-aligned integer rectangle, half-open on the right and bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: i64,
    /// Top edge
    pub y: i64,
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
}

impl Rect {
    /// Create a new rectangle
    pub const fn new(x: i64, y: i64, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// One past the right-most column
    pub fn right(&self) -> i64 {
        self.x + self.width as i64
    }

    /// One past the bottom-most row
    pub fn bottom(&self) -> i64 {
        self.y + self.height as i64
    }

    /// Whether the rectangle covers no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Center in continuous coordinates
    pub fn center(&self) -> Point {
        Point::new(
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }

    /// Whether the two rectangles share at least one pixel
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Whether `other` lies entirely inside this rectangle
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Grow by `margin` pixels on every side
    pub fn inflate(&self, margin: usize) -> Rect {
        Rect::new(
            self.x - margin as i64,
            self.y - margin as i64,
            self.width + 2 * margin,
            self.height + 2 * margin,
        )
    }
}

/// Similarity transform from nominal frame coordinates to image coordinates
///
/// Stored as a homogeneous matrix
///
/// ```text
/// | a  -b  tx |
/// | b   a  ty |
/// | 0   0   1 |
/// ```
///
/// with `a = s*cos(θ)` and `b = s*sin(θ)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    m: Matrix3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    fn from_coefficients(a: f32, b: f32, tx: f32, ty: f32) -> Self {
        Self {
            m: Matrix3::new(a, -b, tx, b, a, ty, 0.0, 0.0, 1.0),
        }
    }

    /// The transform that leaves coordinates unchanged
    pub fn identity() -> Self {
        Self {
            m: Matrix3::identity(),
        }
    }

    /// Pure translation
    pub fn translation(tx: f32, ty: f32) -> Self {
        Self::from_coefficients(1.0, 0.0, tx, ty)
    }

    /// Build from scale, rotation (radians) and translation
    pub fn from_parts(scale: f32, rotation: f32, tx: f32, ty: f32) -> Self {
        Self::from_coefficients(scale * rotation.cos(), scale * rotation.sin(), tx, ty)
    }

    /// Scale and rotate about `center`, then translate by `(tx, ty)`
    pub fn about(center: Point, scale: f32, rotation: f32, tx: f32, ty: f32) -> Self {
        let turn = Self::from_parts(scale, rotation, 0.0, 0.0).apply(center);
        Self::from_parts(
            scale,
            rotation,
            center.x - turn.x + tx,
            center.y - turn.y + ty,
        )
    }

    /// Homogeneous matrix
    pub fn matrix(&self) -> &Matrix3<f32> {
        &self.m
    }

    /// Map a nominal point into the image
    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        let v = self.m * Vector3::new(p.x, p.y, 1.0);
        Point::new(v[0], v[1])
    }

    /// Image-to-nominal transform, `None` for a zero scale
    pub fn inverse(&self) -> Option<Transform> {
        self.m.try_inverse().map(|m| Self { m })
    }

    /// Uniform scale factor
    pub fn scale(&self) -> f32 {
        self.m[(0, 0)].hypot(self.m[(1, 0)])
    }

    /// Rotation in radians
    pub fn rotation(&self) -> f32 {
        self.m[(1, 0)].atan2(self.m[(0, 0)])
    }

    /// Translation component
    pub fn offset(&self) -> Point {
        Point::new(self.m[(0, 2)], self.m[(1, 2)])
    }

    /// Least-squares similarity mapping `nominal[i]` onto `observed[i]`
    ///
    /// Solves the stacked `2N x 4` system for `(a, b, tx, ty)` by SVD.
    /// Returns `None` when the nominal points do not pin down all four
    /// unknowns (fewer than two distinct points).
    pub fn fit_similarity(nominal: &[Point], observed: &[Point]) -> Option<Transform> {
        if nominal.len() != observed.len() || nominal.len() < 2 {
            return None;
        }

        let n = nominal.len();
        let mut a = DMatrix::<f64>::zeros(2 * n, 4);
        let mut rhs = DVector::<f64>::zeros(2 * n);
        for (k, (p, q)) in nominal.iter().zip(observed).enumerate() {
            let x = p.x as f64;
            let y = p.y as f64;

            // [ x -y 1 0 ] -> u
            a[(2 * k, 0)] = x;
            a[(2 * k, 1)] = -y;
            a[(2 * k, 2)] = 1.0;
            rhs[2 * k] = q.x as f64;

            // [ y  x 0 1 ] -> v
            a[(2 * k + 1, 0)] = y;
            a[(2 * k + 1, 1)] = x;
            a[(2 * k + 1, 3)] = 1.0;
            rhs[2 * k + 1] = q.y as f64;
        }

        let svd = a.svd(true, true);
        if svd.rank(1e-6) < 4 {
            return None;
        }
        let h = svd.solve(&rhs, 1e-9).ok()?;

        Some(Self::from_coefficients(
            h[0] as f32,
            h[1] as f32,
            h[2] as f32,
            h[3] as f32,
        ))
    }

    /// Largest distance between a mapped nominal point and its observation
    pub fn max_residual(&self, nominal: &[Point], observed: &[Point]) -> f32 {
        nominal
            .iter()
            .zip(observed)
            .map(|(p, q)| nalgebra::distance(&self.apply(*p), q))
            .fold(0.0, f32::max)
    }
}
