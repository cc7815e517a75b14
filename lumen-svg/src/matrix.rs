//! 2D affine transformation matrix.

use std::ops::{Index, Mul, MulAssign};

/// A 2D affine transformation matrix.
///
/// The matrix is represented as:
/// ```text
/// | a c e |
/// | b d f |
/// | 0 0 1 |
/// ```
///
/// A point maps as `(x, y) -> (a*x + c*y + e, b*x + d*y + f)`. For a product
/// `lhs * rhs`, `rhs` is applied first and `lhs` second.
///
/// Mutating builders (`translate`, `scale`, ...) right-multiply, so the new
/// operation acts in the matrix's local coordinate space, the same way canvas
/// transforms accumulate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    /// Scale X component.
    pub a: f32,
    /// Skew Y component.
    pub b: f32,
    /// Skew X component.
    pub c: f32,
    /// Scale Y component.
    pub d: f32,
    /// Translate X component.
    pub e: f32,
    /// Translate Y component.
    pub f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    /// Create a new matrix with the specified components.
    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Create an identity matrix.
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub fn translated(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn scaled(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation by `angle` degrees about the origin.
    pub fn rotated(angle: f32) -> Self {
        let (sin, cos) = angle.to_radians().sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Rotation by `angle` degrees about the pivot `(cx, cy)`.
    pub fn rotated_about(angle: f32, cx: f32, cy: f32) -> Self {
        Self::translated(cx, cy) * Self::rotated(angle) * Self::translated(-cx, -cy)
    }

    /// Shear by `shx` degrees along X and `shy` degrees along Y.
    pub fn sheared(shx: f32, shy: f32) -> Self {
        let x = shx.to_radians().tan();
        let y = shy.to_radians().tan();
        Self::new(1.0, y, x, 1.0, 0.0, 0.0)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse of this matrix, or `None` when it is singular.
    pub fn try_inverse(&self) -> Option<Matrix> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }

        let inv_det = 1.0 / det;
        Some(Self::new(
            self.d * inv_det,
            -self.b * inv_det,
            -self.c * inv_det,
            self.a * inv_det,
            (self.c * self.f - self.d * self.e) * inv_det,
            (self.b * self.e - self.a * self.f) * inv_det,
        ))
    }

    /// Inverse of this matrix. A singular matrix inverts to the identity.
    pub fn inverse(&self) -> Matrix {
        self.try_inverse().unwrap_or_default()
    }

    /// Invert in place. A singular matrix becomes the identity.
    pub fn invert(&mut self) -> &mut Self {
        *self = self.inverse();
        self
    }

    /// Reset to the identity matrix.
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::identity();
        self
    }

    /// `self = self * other`.
    pub fn multiply(&mut self, other: &Matrix) -> &mut Self {
        *self = *self * *other;
        self
    }

    pub fn translate(&mut self, tx: f32, ty: f32) -> &mut Self {
        self.multiply(&Self::translated(tx, ty))
    }

    pub fn scale(&mut self, sx: f32, sy: f32) -> &mut Self {
        self.multiply(&Self::scaled(sx, sy))
    }

    pub fn rotate(&mut self, angle: f32) -> &mut Self {
        self.multiply(&Self::rotated(angle))
    }

    pub fn rotate_about(&mut self, angle: f32, cx: f32, cy: f32) -> &mut Self {
        self.multiply(&Self::rotated_about(angle, cx, cy))
    }

    pub fn shear(&mut self, shx: f32, shy: f32) -> &mut Self {
        self.multiply(&Self::sheared(shx, shy))
    }

    /// Map a point through this matrix.
    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Component by index in the order `[a, b, c, d, e, f]`.
    pub fn get(&self, index: usize) -> Option<f32> {
        self.to_array().get(index).copied()
    }

    pub fn to_array(&self) -> [f32; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Average of the X and Y axis scale factors.
    pub(crate) fn mean_scale(&self) -> f32 {
        let sx = (self.a * self.a + self.b * self.b).sqrt();
        let sy = (self.c * self.c + self.d * self.d).sqrt();
        (sx + sy) / 2.0
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Matrix) -> Matrix {
        Matrix::new(
            self.a * rhs.a + self.c * rhs.b,
            self.b * rhs.a + self.d * rhs.b,
            self.a * rhs.c + self.c * rhs.d,
            self.b * rhs.c + self.d * rhs.d,
            self.a * rhs.e + self.c * rhs.f + self.e,
            self.b * rhs.e + self.d * rhs.f + self.f,
        )
    }
}

impl MulAssign for Matrix {
    fn mul_assign(&mut self, rhs: Matrix) {
        *self = *self * rhs;
    }
}

impl Index<usize> for Matrix {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        match index {
            0 => &self.a,
            1 => &self.b,
            2 => &self.c,
            3 => &self.d,
            4 => &self.e,
            5 => &self.f,
            _ => panic!("Matrix index out of range: {index}"),
        }
    }
}

impl From<tiny_skia::Transform> for Matrix {
    fn from(t: tiny_skia::Transform) -> Self {
        Matrix {
            a: t.sx,
            b: t.ky,
            c: t.kx,
            d: t.sy,
            e: t.tx,
            f: t.ty,
        }
    }
}

impl From<Matrix> for tiny_skia::Transform {
    fn from(m: Matrix) -> Self {
        tiny_skia::Transform::from_row(m.a, m.b, m.c, m.d, m.e, m.f)
    }
}

impl From<svgtypes::Transform> for Matrix {
    fn from(t: svgtypes::Transform) -> Self {
        Matrix::new(
            t.a as f32, t.b as f32, t.c as f32, t.d as f32, t.e as f32, t.f as f32,
        )
    }
}
