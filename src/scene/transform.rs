//! Local transform of a scene object

use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};

/// Position, rotation and uniform scale of an object relative to its parent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: 1.0,
    };

    pub const fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            scale: 1.0,
        }
    }

    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self::from_position(Vec3::new(x, y, z))
    }

    /// Decompose an affine matrix.
    ///
    /// Non-uniform scale collapses to the mean of the three axis scales. A mirrored
    /// matrix yields a negative scale.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, mut rotation, position) = matrix.to_scale_rotation_translation();
        let mut uniform = scale.abs().element_sum() / 3.0;
        if matrix.determinant() < 0.0 {
            // glam puts the reflection on X alone; -I is that reflection times a half turn about X.
            rotation *= Quat::from_rotation_x(std::f32::consts::PI);
            uniform = -uniform;
        }
        Self {
            position,
            rotation: rotation.normalize(),
            scale: uniform,
        }
    }

    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Set rotation from XYZ Euler angles in degrees
    #[must_use]
    pub fn with_euler_degrees(mut self, degrees: Vec3) -> Self {
        self.set_euler_degrees(degrees);
        self
    }

    /// Rotation as XYZ Euler angles in degrees, the form the UI edits
    pub fn euler_degrees(&self) -> Vec3 {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
    }

    pub fn set_euler_degrees(&mut self, degrees: Vec3) {
        self.rotation = Quat::from_euler(
            EulerRot::XYZ,
            degrees.x.to_radians(),
            degrees.y.to_radians(),
            degrees.z.to_radians(),
        );
    }

    /// Local matrix (translation * rotation * scale)
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), self.rotation, self.position)
    }

    /// Compose with the parent's world matrix
    pub fn world_matrix(&self, parent: Option<&Mat4>) -> Mat4 {
        match parent {
            Some(parent) => *parent * self.matrix(),
            None => self.matrix(),
        }
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * (point * self.scale) + self.position
    }

    /// Local -Z in parent space
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }

    pub fn rotate_axis(&mut self, axis: Vec3, angle: f32) {
        self.rotation = Quat::from_axis_angle(axis.normalize(), angle) * self.rotation;
    }

    /// Point the forward axis at `target`. Degenerate inputs leave the rotation untouched.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let forward = (target - self.position).normalize_or_zero();
        if forward.length_squared() < 1e-6 {
            return;
        }
        let right = forward.cross(up).normalize_or_zero();
        if right.length_squared() < 1e-6 {
            return;
        }
        let up = right.cross(forward);
        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, up, -forward));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn identity_matrix() {
        assert_eq!(Transform::IDENTITY.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn child_world_is_parent_times_local() {
        let parent = Transform::from_xyz(10.0, 0.0, 0.0).with_scale(2.0);
        let child = Transform::from_xyz(0.0, 1.0, 0.0);
        let world = child.world_matrix(Some(&parent.matrix()));
        let origin = world.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(10.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn euler_round_trip() {
        let t = Transform::IDENTITY.with_euler_degrees(Vec3::new(10.0, 20.0, 30.0));
        let e = t.euler_degrees();
        assert!((e - Vec3::new(10.0, 20.0, 30.0)).length() < 1e-3);
    }

    #[test]
    fn from_matrix_averages_scale() {
        let m = Mat4::from_scale(Vec3::new(1.0, 2.0, 3.0));
        let t = Transform::from_matrix(m);
        assert!((t.scale - 2.0).abs() < 1e-5);
    }

    #[test]
    fn from_matrix_keeps_mirrored_scale() {
        let original = Transform::from_xyz(1.0, 2.0, 3.0)
            .with_euler_degrees(Vec3::new(0.0, 40.0, 15.0))
            .with_scale(-2.0);
        let t = Transform::from_matrix(original.matrix());
        assert!((t.scale + 2.0).abs() < 1e-5);
        for p in [Vec3::X, Vec3::Y, Vec3::new(0.5, -1.0, 2.0)] {
            let delta = t.transform_point(p) - original.transform_point(p);
            assert!(delta.length() < 1e-4, "{p} drifted by {delta}");
        }
    }

    #[test]
    fn forward_after_yaw() {
        let t = Transform::IDENTITY.with_rotation(Quat::from_rotation_y(FRAC_PI_2));
        assert!((t.forward() - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn look_at_points_forward() {
        let mut t = Transform::from_xyz(0.0, 0.0, 5.0);
        t.look_at(Vec3::ZERO, Vec3::Y);
        assert!((t.forward() - Vec3::NEG_Z).length() < 1e-5);
    }
}
