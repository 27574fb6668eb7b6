//! Object placement: offset, rotation, scale, and the affine residual.

use std::f64::consts::PI;

use lamina_geometry::{
    Axis, BoundingBoxf3, Pointf, Polygon, TransformationMatrix, Vectorf3,
};
use lamina_mesh::TriangleMesh;

/// One placement of an object in the scene.
///
/// The printable parameters are a planar XY offset, a rotation about Z and
/// a uniform scale. `additional_trafo` holds whatever part of a full affine
/// placement those three cannot express (shear, non-uniform scale, off-axis
/// rotation, Z translation), so [`ModelInstance::get_trafo_matrix`] always
/// reconstructs the complete matrix exactly.
#[derive(Debug, Clone)]
pub struct ModelInstance {
    /// Rotation about the Z axis, radians in `[0, 2*pi)`.
    pub rotation: f64,
    /// Uniform scaling factor.
    pub scaling_factor: f64,
    /// Placement offset in the XY plane.
    pub offset: Pointf,
    /// Residual transform applied before rotation and scale.
    pub additional_trafo: TransformationMatrix,
}

impl Default for ModelInstance {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            scaling_factor: 1.0,
            offset: Pointf::origin(),
            additional_trafo: TransformationMatrix::identity(),
        }
    }
}

impl ModelInstance {
    /// The complete placement matrix.
    ///
    /// Composition order: residual first, then uniform scale, rotation
    /// about Z, and finally the offset (skipped when `dont_translate`).
    pub fn get_trafo_matrix(&self, dont_translate: bool) -> TransformationMatrix {
        let scale = TransformationMatrix::mat_scale_uniform(self.scaling_factor);
        let rotation = TransformationMatrix::mat_rotation(self.rotation, Axis::Z);
        let mut trafo = TransformationMatrix::multiply(
            &rotation,
            &TransformationMatrix::multiply(&scale, &self.additional_trafo),
        );
        if !dont_translate {
            trafo.apply_left(&TransformationMatrix::mat_translation(
                self.offset.x,
                self.offset.y,
                0.0,
            ));
        }
        trafo
    }

    /// Decompose a complete placement matrix into this instance's fields.
    ///
    /// The XY translation becomes the offset, the mean column norm of the
    /// linear block the scaling factor, and the Z component of the block's
    /// rotation (extracted through its quaternion, with the gimbal-lock
    /// branches at `|qx*qy + qz*qw| > 0.499`) the rotation. Everything the
    /// three parameters cannot express lands in `additional_trafo`, so
    /// `get_trafo_matrix` reproduces `trafo` exactly.
    pub fn set_complete_trafo(&mut self, trafo: &TransformationMatrix) {
        let translation = trafo.translation();
        self.offset = Pointf::new(translation.x, translation.y);

        let m = &trafo.matrix;
        let norms = [
            Vectorf3::new(m[(0, 0)], m[(1, 0)], m[(2, 0)]).norm(),
            Vectorf3::new(m[(0, 1)], m[(1, 1)], m[(2, 1)]).norm(),
            Vectorf3::new(m[(0, 2)], m[(1, 2)], m[(2, 2)]).norm(),
        ];
        let mut scaling = (norms[0] + norms[1] + norms[2]) / 3.0;
        if !scaling.is_finite() || scaling < f64::EPSILON {
            // A collapsed linear block; park everything in the residual.
            scaling = 1.0;
        }
        self.scaling_factor = scaling;

        self.rotation = if norms.iter().all(|&n| n > f64::EPSILON) {
            let e = |r: usize, c: usize| m[(r, c)] / norms[c];
            let qw = (1.0 + e(0, 0) + e(1, 1) + e(2, 2)).max(0.0).sqrt() / 2.0;
            let qx = ((1.0 + e(0, 0) - e(1, 1) - e(2, 2)).max(0.0).sqrt() / 2.0)
                .copysign(e(2, 1) - e(1, 2));
            let qy = ((1.0 - e(0, 0) + e(1, 1) - e(2, 2)).max(0.0).sqrt() / 2.0)
                .copysign(e(0, 2) - e(2, 0));
            let qz = ((1.0 - e(0, 0) - e(1, 1) + e(2, 2)).max(0.0).sqrt() / 2.0)
                .copysign(e(1, 0) - e(0, 1));
            let test = qx * qy + qz * qw;
            let angle = if test > 0.499 {
                2.0 * qx.atan2(qw)
            } else if test < -0.499 {
                -2.0 * qx.atan2(qw)
            } else {
                (2.0 * (qw * qz + qx * qy)).atan2(1.0 - 2.0 * (qy * qy + qz * qz))
            };
            angle.rem_euclid(2.0 * PI)
        } else {
            0.0
        };

        // Whatever T * R * S misses goes into the residual.
        let reconstructed = ModelInstance {
            rotation: self.rotation,
            scaling_factor: self.scaling_factor,
            offset: self.offset,
            additional_trafo: TransformationMatrix::identity(),
        }
        .get_trafo_matrix(false);
        // T * R * S is invertible by construction thanks to the scaling
        // guard; fall back to the full matrix if that ever stops holding.
        self.additional_trafo = match reconstructed.inverse() {
            Some(inverse) => TransformationMatrix::multiply(&inverse, trafo),
            None => *trafo,
        };
    }

    /// Transform a mesh by this placement.
    pub fn transform_mesh(&self, mesh: &mut TriangleMesh, dont_translate: bool) {
        mesh.transform(&self.get_trafo_matrix(dont_translate));
    }

    /// Transform a bounding box by this placement (corner-wise, so the
    /// result is the box of the transformed box, not of the mesh).
    pub fn transform_bounding_box(
        &self,
        bbox: &BoundingBoxf3,
        dont_translate: bool,
    ) -> BoundingBoxf3 {
        let trafo = self.get_trafo_matrix(dont_translate);
        let mut out = BoundingBoxf3::default();
        if !bbox.defined {
            return out;
        }
        for &x in &[bbox.min.x, bbox.max.x] {
            for &y in &[bbox.min.y, bbox.max.y] {
                for &z in &[bbox.min.z, bbox.max.z] {
                    out.merge_point(&trafo.apply_point(&lamina_geometry::Pointf3::new(x, y, z)));
                }
            }
        }
        out
    }

    /// Rotate and scale a 2D outline by the planar part of the placement.
    pub fn transform_polygon(&self, polygon: &mut Polygon) {
        polygon.rotate(self.rotation);
        polygon.scale(self.scaling_factor);
    }
}
