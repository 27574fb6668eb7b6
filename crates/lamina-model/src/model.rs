//! Model, object, volume, and material types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use lamina_geometry::{Axis, BoundingBoxf3, TransformationMatrix, Vectorf3};
use lamina_mesh::TriangleMesh;
use lamina_slice::TriangleMeshSlicer;

use crate::error::{ModelError, Result};
use crate::instance::ModelInstance;

slotmap::new_key_type! {
    /// Key of an object in a [`Model`].
    pub struct ObjectKey;
    /// Key of a material in a [`Model`].
    pub struct MaterialKey;
}

/// A print material, referenced by volumes through [`MaterialKey`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Material {
    /// Display name.
    pub name: String,
    /// Free-form attributes from the source file.
    pub attributes: HashMap<String, String>,
}

/// What role a volume's geometry plays in the printed object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeKind {
    /// Solid geometry of the object itself.
    #[default]
    Model,
    /// A region that modifies settings of the solid it overlaps, without
    /// contributing geometry.
    Modifier,
    /// Manually modeled support material.
    Support,
}

impl VolumeKind {
    /// True when the volume's geometry ends up in the printed result.
    pub fn is_printable(self) -> bool {
        !matches!(self, VolumeKind::Modifier)
    }
}

/// One mesh belonging to an object.
#[derive(Debug, Clone, Default)]
pub struct ModelVolume {
    /// Display name, usually the source file name.
    pub name: String,
    /// The volume's geometry.
    pub mesh: TriangleMesh,
    /// Role of the geometry.
    pub kind: VolumeKind,
    /// Material assignment, if any.
    pub material: Option<MaterialKey>,
}

/// An object: volumes plus the instances that place them in the scene.
///
/// Every transform applied to the object is baked into the volume meshes
/// immediately and appended to a command log, so the cumulative transform
/// is a fold over the log and the last edit can always be undone.
#[derive(Debug, Clone, Default)]
pub struct ModelObject {
    /// Display name.
    pub name: String,
    /// The object's meshes.
    pub volumes: Vec<ModelVolume>,
    /// Placements of this object; none means the object is not printed.
    pub instances: Vec<ModelInstance>,
    applied: Vec<TransformationMatrix>,
    bounding_box: Option<BoundingBoxf3>,
}

impl ModelObject {
    /// An empty object.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a volume and return it for further setup.
    pub fn add_volume(&mut self, mesh: TriangleMesh, kind: VolumeKind) -> &mut ModelVolume {
        self.invalidate_bounding_box();
        self.volumes.push(ModelVolume {
            name: String::new(),
            mesh,
            kind,
            material: None,
        });
        // Just pushed, so the vector is non-empty.
        let last = self.volumes.len() - 1;
        &mut self.volumes[last]
    }

    /// Add a default (identity) instance and return it.
    pub fn add_instance(&mut self) -> &mut ModelInstance {
        self.invalidate_bounding_box();
        self.instances.push(ModelInstance::default());
        let last = self.instances.len() - 1;
        &mut self.instances[last]
    }

    /// Total facet count across all volumes.
    pub fn facets_count(&self) -> usize {
        self.volumes.iter().map(|v| v.mesh.facets_count()).sum()
    }

    /// True when any volume's last repair had to intervene.
    pub fn needed_repair(&self) -> bool {
        self.volumes.iter().any(|v| v.mesh.needed_repair())
    }

    /// Repair all volume meshes.
    pub fn repair(&mut self) {
        for volume in &mut self.volumes {
            volume.mesh.repair();
        }
        self.invalidate_bounding_box();
    }

    /// Merge of all printable volume meshes, without instance placement.
    pub fn raw_mesh(&self) -> TriangleMesh {
        let mut mesh = TriangleMesh::new();
        for volume in &self.volumes {
            if volume.kind.is_printable() {
                mesh.merge(&volume.mesh);
            }
        }
        mesh
    }

    /// Merge of the raw mesh placed at every instance.
    pub fn mesh(&self) -> TriangleMesh {
        let raw = self.raw_mesh();
        if self.instances.is_empty() {
            return raw;
        }
        let mut mesh = TriangleMesh::new();
        for instance in &self.instances {
            let mut placed = raw.clone();
            instance.transform_mesh(&mut placed, false);
            mesh.merge(&placed);
        }
        mesh
    }

    /// Bounding box of all volumes, without instance placement.
    pub fn raw_bounding_box(&self) -> BoundingBoxf3 {
        let mut bbox = BoundingBoxf3::default();
        for volume in &self.volumes {
            bbox.merge(&volume.mesh.bounding_box());
        }
        bbox
    }

    /// Bounding box of one instance's placement of the object.
    pub fn instance_bounding_box(&self, index: usize) -> Option<BoundingBoxf3> {
        self.instances
            .get(index)
            .map(|i| i.transform_bounding_box(&self.raw_bounding_box(), false))
    }

    /// Bounding box over all instances (or the raw box when there are
    /// none), cached until the next mutation.
    pub fn bounding_box(&mut self) -> BoundingBoxf3 {
        if let Some(bbox) = self.bounding_box {
            return bbox;
        }
        let bbox = if self.instances.is_empty() {
            self.raw_bounding_box()
        } else {
            let raw = self.raw_bounding_box();
            let mut bbox = BoundingBoxf3::default();
            for instance in &self.instances {
                bbox.merge(&instance.transform_bounding_box(&raw, false));
            }
            bbox
        };
        self.bounding_box = Some(bbox);
        bbox
    }

    /// Drop the cached bounding box.
    pub fn invalidate_bounding_box(&mut self) {
        self.bounding_box = None;
    }

    /// The transform command log, oldest first.
    pub fn applied_transformations(&self) -> &[TransformationMatrix] {
        &self.applied
    }

    /// Fold of the command log: the object's total transform so far.
    pub fn cumulative_trafo(&self) -> TransformationMatrix {
        self.applied
            .iter()
            .fold(TransformationMatrix::identity(), |acc, t| {
                TransformationMatrix::multiply(t, &acc)
            })
    }

    /// Apply an arbitrary transform to all volumes and log it.
    ///
    /// Singular transforms are refused since they could never be undone.
    pub fn apply_transformation(&mut self, trafo: &TransformationMatrix) -> Result<()> {
        if trafo.determinant().abs() < f64::EPSILON {
            return Err(ModelError::SingularTransform);
        }
        self.apply_logged(*trafo);
        Ok(())
    }

    /// Translate the object.
    pub fn translate(&mut self, x: f64, y: f64, z: f64) {
        self.apply_logged(TransformationMatrix::mat_translation(x, y, z));
    }

    /// Uniformly scale the object about its bounding box center.
    pub fn scale(&mut self, factor: f64) -> Result<()> {
        self.scale_xyz(&Vectorf3::new(factor, factor, factor))
    }

    /// Per-axis scale about the bounding box center.
    pub fn scale_xyz(&mut self, versor: &Vectorf3) -> Result<()> {
        if versor.x == 0.0 || versor.y == 0.0 || versor.z == 0.0 {
            return Err(ModelError::SingularTransform);
        }
        let op = TransformationMatrix::mat_scale(versor.x, versor.y, versor.z);
        let pivoted = self.pivoted(&op);
        self.apply_logged(pivoted);
        Ok(())
    }

    /// Rotate about a coordinate axis through the bounding box center.
    pub fn rotate(&mut self, angle: f64, axis: Axis) {
        let op = TransformationMatrix::mat_rotation(angle, axis);
        let pivoted = self.pivoted(&op);
        self.apply_logged(pivoted);
    }

    /// Mirror across the center plane perpendicular to `axis`.
    pub fn mirror(&mut self, axis: Axis) {
        let op = TransformationMatrix::mat_mirror(axis);
        let pivoted = self.pivoted(&op);
        self.apply_logged(pivoted);
    }

    /// Undo the most recent transform; false when the log is empty.
    pub fn undo_last_transformation(&mut self) -> bool {
        let inverse = match self.applied.last().and_then(TransformationMatrix::inverse) {
            Some(inverse) => inverse,
            None => return false,
        };
        self.applied.pop();
        for volume in &mut self.volumes {
            volume.mesh.transform(&inverse);
        }
        self.invalidate_bounding_box();
        true
    }

    /// Translate so the raw bounding box center lands on the origin;
    /// returns the shift that was applied.
    pub fn center_around_origin(&mut self) -> Vectorf3 {
        let center = self.raw_bounding_box().center();
        let shift = -center.coords;
        self.translate(shift.x, shift.y, shift.z);
        shift
    }

    /// Split the object at a plane into two objects.
    ///
    /// Printable volumes are cut and capped; modifier volumes apply to both
    /// halves and are copied unchanged. Both halves keep all instances.
    /// Cut volume meshes come back repaired; empty halves are omitted.
    pub fn cut(&self, axis: Axis, z: f64) -> Result<(ModelObject, ModelObject)> {
        if self.volumes.is_empty() {
            return Err(ModelError::EmptyObject);
        }
        let mut upper = ModelObject::new(format!("{}_upper", self.name));
        let mut lower = ModelObject::new(format!("{}_lower", self.name));
        upper.instances = self.instances.clone();
        lower.instances = self.instances.clone();

        for volume in &self.volumes {
            if !volume.kind.is_printable() {
                upper.volumes.push(volume.clone());
                lower.volumes.push(volume.clone());
                continue;
            }
            let mut mesh = volume.mesh.clone();
            if !mesh.repaired() {
                mesh.repair();
            }
            let mut upper_mesh = TriangleMesh::new();
            let mut lower_mesh = TriangleMesh::new();
            {
                let slicer = TriangleMeshSlicer::with_axis(&mesh, axis)?;
                slicer.cut(z, &mut upper_mesh, &mut lower_mesh)?;
            }
            for (half, half_mesh) in [(&mut upper, upper_mesh), (&mut lower, lower_mesh)] {
                let mut half_mesh = half_mesh;
                if half_mesh.is_empty() {
                    continue;
                }
                half_mesh.repair();
                half.volumes.push(ModelVolume {
                    name: volume.name.clone(),
                    mesh: half_mesh,
                    kind: volume.kind,
                    material: volume.material,
                });
            }
        }
        Ok((upper, lower))
    }

    /// Wrap `op` so it pivots about the current bounding box center.
    fn pivoted(&self, op: &TransformationMatrix) -> TransformationMatrix {
        let center = self.raw_bounding_box().center();
        let to_origin = TransformationMatrix::mat_translation(-center.x, -center.y, -center.z);
        let back = TransformationMatrix::mat_translation(center.x, center.y, center.z);
        TransformationMatrix::multiply(&back, &TransformationMatrix::multiply(op, &to_origin))
    }

    fn apply_logged(&mut self, trafo: TransformationMatrix) {
        for volume in &mut self.volumes {
            volume.mesh.transform(&trafo);
        }
        self.applied.push(trafo);
        self.invalidate_bounding_box();
    }
}

/// A scene: objects and materials in keyed arenas.
#[derive(Debug, Clone, Default)]
pub struct Model {
    /// All objects, keyed by [`ObjectKey`].
    pub objects: SlotMap<ObjectKey, ModelObject>,
    /// All materials, keyed by [`MaterialKey`].
    pub materials: SlotMap<MaterialKey, Material>,
}

impl Model {
    /// An empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object.
    pub fn add_object(&mut self, object: ModelObject) -> ObjectKey {
        self.objects.insert(object)
    }

    /// Remove an object, returning it if present.
    pub fn remove_object(&mut self, key: ObjectKey) -> Option<ModelObject> {
        self.objects.remove(key)
    }

    /// Insert a material with the given name.
    pub fn add_material(&mut self, name: impl Into<String>) -> MaterialKey {
        self.materials.insert(Material {
            name: name.into(),
            attributes: HashMap::new(),
        })
    }

    /// Total facet count across all objects.
    pub fn facets_count(&self) -> usize {
        self.objects.values().map(ModelObject::facets_count).sum()
    }

    /// True when any object's volumes needed repair.
    pub fn needed_repair(&self) -> bool {
        self.objects.values().any(ModelObject::needed_repair)
    }

    /// Repair every volume mesh in the model.
    pub fn repair(&mut self) {
        for object in self.objects.values_mut() {
            object.repair();
        }
    }

    /// Bounding box over all objects and their instances.
    pub fn bounding_box(&mut self) -> BoundingBoxf3 {
        let mut bbox = BoundingBoxf3::default();
        for object in self.objects.values_mut() {
            bbox.merge(&object.bounding_box());
        }
        bbox
    }

    /// Replace an object with its two halves cut at a plane.
    ///
    /// Returns the keys of the upper and lower halves. The original object
    /// is removed only after the cut succeeds.
    pub fn cut_object(
        &mut self,
        key: ObjectKey,
        axis: Axis,
        z: f64,
    ) -> Result<(ObjectKey, ObjectKey)> {
        let object = self.objects.get(key).ok_or(ModelError::UnknownObject)?;
        let (upper, lower) = object.cut(axis, z)?;
        self.objects.remove(key);
        Ok((self.objects.insert(upper), self.objects.insert(lower)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lamina_mesh::mesh::unit_cube;

    fn cube_object() -> ModelObject {
        let mut object = ModelObject::new("cube");
        let mut mesh = unit_cube();
        mesh.repair();
        object.add_volume(mesh, VolumeKind::Model);
        object
    }

    #[test]
    fn test_instance_bounding_box() {
        let mut object = cube_object();
        {
            let instance = object.add_instance();
            instance.scaling_factor = 2.0;
            instance.offset = lamina_geometry::Pointf::new(2.0, 0.0);
        }
        let bbox = object.bounding_box();
        assert_relative_eq!(bbox.min.x, 2.0);
        assert_relative_eq!(bbox.max.x, 4.0);
        assert_relative_eq!(bbox.max.z, 2.0);
    }

    #[test]
    fn test_transform_log_and_undo() {
        let mut object = cube_object();
        let before = object.bounding_box();
        object.rotate(0.3, Axis::Z);
        object.translate(1.0, 0.0, 0.0);
        assert_eq!(object.applied_transformations().len(), 2);

        assert!(object.undo_last_transformation());
        assert!(object.undo_last_transformation());
        assert!(!object.undo_last_transformation());
        let after = object.bounding_box();
        assert_relative_eq!(before.min, after.min, epsilon = 1e-9);
        assert_relative_eq!(before.max, after.max, epsilon = 1e-9);
        assert_relative_eq!(
            object.cumulative_trafo().matrix,
            TransformationMatrix::identity().matrix
        );
    }

    #[test]
    fn test_rotation_pivots_about_center() {
        let mut object = cube_object();
        object.rotate(std::f64::consts::FRAC_PI_2, Axis::Z);
        let bbox = object.bounding_box();
        // A quarter turn about the center maps the unit cube onto itself.
        assert_relative_eq!(bbox.min.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(bbox.max.x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_scale_is_rejected() {
        let mut object = cube_object();
        assert!(matches!(
            object.scale(0.0),
            Err(ModelError::SingularTransform)
        ));
        assert!(object.applied_transformations().is_empty());
    }

    #[test]
    fn test_cumulative_trafo_orders_left() {
        let mut object = cube_object();
        object.translate(1.0, 0.0, 0.0);
        object.translate(0.0, 2.0, 0.0);
        let t = object.cumulative_trafo().translation();
        assert_relative_eq!(t.x, 1.0);
        assert_relative_eq!(t.y, 2.0);
    }

    #[test]
    fn test_cut_object_in_model() {
        let mut model = Model::new();
        let mut object = cube_object();
        object.add_volume(unit_cube(), VolumeKind::Modifier);
        let key = model.add_object(object);

        let (upper_key, lower_key) = model.cut_object(key, Axis::Z, 0.5).unwrap();
        assert!(model.objects.get(key).is_none());

        let upper = model.objects.get(upper_key).unwrap();
        let lower = model.objects.get(lower_key).unwrap();
        // One cut solid plus the uncut modifier on each side.
        assert_eq!(upper.volumes.len(), 2);
        assert_eq!(lower.volumes.len(), 2);
        let upper_vol = upper.volumes[0].mesh.volume();
        let lower_vol = lower.volumes[0].mesh.volume();
        assert_relative_eq!(upper_vol + lower_vol, 1.0, epsilon = 1e-9);
        assert!(upper.volumes.iter().any(|v| v.kind == VolumeKind::Modifier));
    }

    #[test]
    fn test_cut_empty_object_fails() {
        let object = ModelObject::new("empty");
        assert!(matches!(
            object.cut(Axis::Z, 0.5),
            Err(ModelError::EmptyObject)
        ));
    }

    #[test]
    fn test_center_around_origin() {
        let mut object = cube_object();
        let shift = object.center_around_origin();
        assert_relative_eq!(shift, Vectorf3::new(-0.5, -0.5, -0.5));
        let bbox = object.bounding_box();
        assert_relative_eq!(bbox.min.x, -0.5);
        assert_relative_eq!(bbox.max.x, 0.5);
    }

    #[test]
    fn test_model_mesh_and_repair() {
        let mut model = Model::new();
        let material = model.add_material("pla");
        let mut object = cube_object();
        object.volumes[0].material = Some(material);
        object.add_instance();
        let key = model.add_object(object);
        assert_eq!(model.facets_count(), 12);

        let merged = model.objects[key].mesh();
        assert_eq!(merged.facets_count(), 12);

        model.repair();
        assert!(!model.needed_repair());
    }
}
