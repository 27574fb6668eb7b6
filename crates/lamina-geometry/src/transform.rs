//! 4x4 affine transforms.

use nalgebra::{Matrix3, Matrix4, Vector4};
use serde::{Deserialize, Serialize};

use crate::point::{Pointf3, Vectorf3};

/// A coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// X axis.
    X,
    /// Y axis.
    Y,
    /// Z axis.
    Z,
}

/// A 4x4 affine transformation matrix.
///
/// Rotation, scale and shear live in the upper-left 3x3 block, translation
/// in the last column; the bottom row is always `(0 0 0 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformationMatrix {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl TransformationMatrix {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(x, y, z)`.
    pub fn mat_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            matrix: Matrix4::new_translation(&Vectorf3::new(x, y, z)),
        }
    }

    /// Non-uniform scale about the origin.
    pub fn mat_scale(x: f64, y: f64, z: f64) -> Self {
        Self {
            matrix: Matrix4::new_nonuniform_scaling(&Vectorf3::new(x, y, z)),
        }
    }

    /// Uniform scale about the origin.
    pub fn mat_scale_uniform(factor: f64) -> Self {
        Self::mat_scale(factor, factor, factor)
    }

    /// Rotation by `angle` radians about a coordinate axis.
    pub fn mat_rotation(angle: f64, axis: Axis) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        match axis {
            Axis::X => {
                m[(1, 1)] = c;
                m[(1, 2)] = -s;
                m[(2, 1)] = s;
                m[(2, 2)] = c;
            }
            Axis::Y => {
                m[(0, 0)] = c;
                m[(0, 2)] = s;
                m[(2, 0)] = -s;
                m[(2, 2)] = c;
            }
            Axis::Z => {
                m[(0, 0)] = c;
                m[(0, 1)] = -s;
                m[(1, 0)] = s;
                m[(1, 1)] = c;
            }
        }
        Self { matrix: m }
    }

    /// Rotation from a quaternion `(qx, qy, qz, qw)`, normalized if needed.
    pub fn mat_rotation_quaternion(qx: f64, qy: f64, qz: f64, qw: f64) -> Self {
        let (mut q1, mut q2, mut q3, mut q4) = (qx, qy, qz, qw);
        let norm_sq = q1 * q1 + q2 * q2 + q3 * q3 + q4 * q4;
        if (norm_sq - 1.0).abs() > 1e-12 {
            let factor = 1.0 / norm_sq.sqrt();
            q1 *= factor;
            q2 *= factor;
            q3 *= factor;
            q4 *= factor;
        }
        let mut m = Matrix4::identity();
        m[(0, 0)] = 1.0 - 2.0 * (q2 * q2 + q3 * q3);
        m[(0, 1)] = 2.0 * (q1 * q2 - q3 * q4);
        m[(0, 2)] = 2.0 * (q1 * q3 + q2 * q4);
        m[(1, 0)] = 2.0 * (q1 * q2 + q3 * q4);
        m[(1, 1)] = 1.0 - 2.0 * (q1 * q1 + q3 * q3);
        m[(1, 2)] = 2.0 * (q2 * q3 - q1 * q4);
        m[(2, 0)] = 2.0 * (q1 * q3 - q2 * q4);
        m[(2, 1)] = 2.0 * (q2 * q3 + q1 * q4);
        m[(2, 2)] = 1.0 - 2.0 * (q1 * q1 + q2 * q2);
        Self { matrix: m }
    }

    /// Rotation by `angle` radians about an arbitrary axis through the origin.
    pub fn mat_rotation_axis(angle: f64, axis: &Vectorf3) -> Self {
        let s = (angle / 2.0).sin();
        let factor = s / axis.norm();
        Self::mat_rotation_quaternion(
            factor * axis.x,
            factor * axis.y,
            factor * axis.z,
            (angle / 2.0).cos(),
        )
    }

    /// Mirror across the plane whose normal is a coordinate axis.
    pub fn mat_mirror(axis: Axis) -> Self {
        let mut m = Matrix4::identity();
        match axis {
            Axis::X => m[(0, 0)] = -1.0,
            Axis::Y => m[(1, 1)] = -1.0,
            Axis::Z => m[(2, 2)] = -1.0,
        }
        Self { matrix: m }
    }

    /// Mirror across the plane through the origin with the given normal.
    pub fn mat_mirror_normal(normal: &Vectorf3) -> Self {
        // Householder reflection: I - 2nn^T for a unit normal.
        let n = normal.normalize();
        let block = Matrix3::identity() - 2.0 * n * n.transpose();
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&block);
        Self { matrix: m }
    }

    /// `left * right`: the transform applying `right` first, then `left`.
    pub fn multiply(left: &Self, right: &Self) -> Self {
        Self {
            matrix: left.matrix * right.matrix,
        }
    }

    /// Replace `self` with `left * self`.
    pub fn apply_left(&mut self, left: &Self) {
        self.matrix = left.matrix * self.matrix;
    }

    /// Replace `self` with `self * right`.
    pub fn apply_right(&mut self, right: &Self) {
        self.matrix *= right.matrix;
    }

    /// `left * self` without mutating.
    pub fn multiply_left(&self, left: &Self) -> Self {
        Self::multiply(left, self)
    }

    /// `self * right` without mutating.
    pub fn multiply_right(&self, right: &Self) -> Self {
        Self::multiply(self, right)
    }

    /// Determinant of the 3x3 block (translation does not contribute).
    pub fn determinant(&self) -> f64 {
        self.matrix.fixed_view::<3, 3>(0, 0).determinant()
    }

    /// Inverse transform, or `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        if self.determinant().abs() < 1e-9 {
            return None;
        }
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }

    /// The translation column.
    pub fn translation(&self) -> Vectorf3 {
        Vectorf3::new(self.matrix[(0, 3)], self.matrix[(1, 3)], self.matrix[(2, 3)])
    }

    /// Set the translation column without touching the 3x3 block.
    pub fn set_translation(&mut self, x: f64, y: f64, z: f64) {
        self.matrix[(0, 3)] = x;
        self.matrix[(1, 3)] = y;
        self.matrix[(2, 3)] = z;
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Pointf3) -> Pointf3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Pointf3::new(v.x, v.y, v.z)
    }

    /// Transform a direction (translation ignored).
    pub fn apply_vector(&self, v: &Vectorf3) -> Vectorf3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vectorf3::new(r.x, r.y, r.z)
    }
}

impl Default for TransformationMatrix {
    fn default() -> Self {
        Self::identity()
    }
}
