//! 3D transformation matrices and rotation state
use nalgebra::{Matrix4, UnitQuaternion, Vector3};

/// Rotation around three axes (in radians)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    /// Move the X and Y angles toward `target` by `factor` of the remaining
    /// gap. Z is pinned to zero.
    pub fn approach(&mut self, target: &RotationState, factor: f32) {
        self.x += (target.x - self.x) * factor;
        self.y += (target.y - self.y) * factor;
        self.z = 0.0;
    }

    /// Euclidean distance in angle space.
    pub fn distance_to(&self, other: &RotationState) -> f32 {
        Vector3::new(self.x - other.x, self.y - other.y, self.z - other.z).norm()
    }
}

/// Local position / orientation / scale of a scene node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub translation: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
}

impl NodeTransform {
    pub fn identity() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        Self {
            translation: Vector3::new(x, y, z),
            ..Self::identity()
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// T * R * S
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.translation)
            * self.rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Create a rotation matrix from a rotation state
    pub fn rotation_matrix(rotation: &RotationState) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(rotation.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, rotation.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, rotation.z));

        // Apply rotations in order: Z, Y, X
        rz * ry * rx
    }

    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    pub fn uniform_scale_matrix(scale: f32) -> Matrix4<f32> {
        Matrix4::new_scaling(scale)
    }

    /// Create a model-view-projection matrix
    pub fn mvp_matrix(
        model: &Matrix4<f32>,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) -> Matrix4<f32> {
        projection * view * model
    }
}
