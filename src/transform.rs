use nalgebra::{Matrix4, UnitQuaternion};

use crate::math::{Point3, Vector3};

/// A rigid pose: unit-quaternion rotation followed by a translation.
///
/// One of these is produced for every (frame, bone) pair; applying it to a
/// bind-pose vertex gives that vertex's position under the bone in that
/// frame. The rotation is normalized on construction and the value is
/// immutable until the next optimization pass overwrites it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigidTransform {
    pub rotation: UnitQuaternion<f32>,
    pub translation: Vector3,
}

impl RigidTransform {
    /// The neutral pose: identity rotation, zero translation.
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
        }
    }

    pub fn new(rotation: UnitQuaternion<f32>, translation: Vector3) -> Self {
        Self { rotation, translation }
    }

    /// Apply the pose to a point: `rotate(p) + translation`.
    pub fn transform_coord(&self, p: &Point3) -> Point3 {
        self.rotation.transform_point(p) + self.translation
    }

    /// Expand to a homogeneous matrix (translation in the last column) for
    /// use in a skinning matrix palette.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        let mut m = self.rotation.to_homogeneous();
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.translation);
        m
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}
