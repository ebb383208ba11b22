//! Math utilities and types
//!
//! Provides fundamental math types for 3D graphics. Matrices follow the
//! OpenGL conventions: column-major storage, right-handed view space and a
//! clip-space depth range of [-1, 1].

pub use nalgebra::{
    Vector3, Vector4,
    Matrix4,
    Quaternion,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix (translate * rotate * scale)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: &Point3) -> Point3 {
        self.to_matrix().transform_point(point)
    }

    /// Rotate by Euler angles in degrees, applied X then Y then Z in local space
    pub fn rotate_degrees(&mut self, x: f32, y: f32, z: f32) {
        let delta = Quat::from_axis_angle(&Vec3::x_axis(), utils::deg_to_rad(x))
            * Quat::from_axis_angle(&Vec3::y_axis(), utils::deg_to_rad(y))
            * Quat::from_axis_angle(&Vec3::z_axis(), utils::deg_to_rad(z));
        self.rotation *= delta;
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// OpenGL perspective projection (vertical field of view in radians)
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Copy of the upper 3x3 block with translation stripped
    fn rotation_only(&self) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        // P = [1/(a·tan(φ/2))  0           0                0             ]
        //     [0               1/tan(φ/2)  0                0             ]
        //     [0               0           -(f+n)/(f-n)     -2fn/(f-n)    ]
        //     [0               0           -1               0             ]
        let tan_half_fovy = (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = -(far + near) / (far - near);
        result[(2, 3)] = -(2.0 * far * near) / (far - near);
        result[(3, 2)] = -1.0;
        result
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let camera_up = right.cross(&forward);

        let translation = Mat4::new(
            1.0, 0.0, 0.0, -eye.x,
            0.0, 1.0, 0.0, -eye.y,
            0.0, 0.0, 1.0, -eye.z,
            0.0, 0.0, 0.0, 1.0,
        );

        let rotation = Mat4::new(
            right.x, right.y, right.z, 0.0,
            camera_up.x, camera_up.y, camera_up.z, 0.0,
            -forward.x, -forward.y, -forward.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        rotation * translation
    }

    fn rotation_only(&self) -> Mat4 {
        let mut result = Mat4::identity();
        result.fixed_view_mut::<3, 3>(0, 0).copy_from(&self.fixed_view::<3, 3>(0, 0));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_perspective_matches_gl_convention() {
        let proj = Mat4::perspective(utils::deg_to_rad(45.0), 2.0, 0.1, 10000.0);
        let f = 1.0 / utils::deg_to_rad(22.5).tan();
        assert_relative_eq!(proj[(1, 1)], f, epsilon = 1e-5);
        assert_relative_eq!(proj[(0, 0)], f / 2.0, epsilon = 1e-5);
        assert_relative_eq!(proj[(3, 2)], -1.0);

        // Points on the near and far planes land on -1 and +1 in NDC
        let near = proj * Vec4::new(0.0, 0.0, -0.1, 1.0);
        let far = proj * Vec4::new(0.0, 0.0, -10000.0, 1.0);
        assert_relative_eq!(near.z / near.w, -1.0, epsilon = 1e-3);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_rotation_only_strips_translation() {
        let view = Mat4::look_at(Vec3::new(5.0, 3.0, -2.0), Vec3::zeros(), Vec3::y());
        let sky = view.rotation_only();
        assert_eq!(sky[(0, 3)], 0.0);
        assert_eq!(sky[(1, 3)], 0.0);
        assert_eq!(sky[(2, 3)], 0.0);
        assert_eq!(sky[(3, 3)], 1.0);
        assert_eq!(sky.fixed_view::<3, 3>(0, 0), view.fixed_view::<3, 3>(0, 0));
    }

    #[test]
    fn test_transform_matrix_order() {
        let mut transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        transform.scale = Vec3::new(2.0, 2.0, 2.0);
        let moved = transform.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(moved, Point3::new(3.0, 2.0, 3.0), epsilon = 1e-6);

        transform.rotate_degrees(0.0, 90.0, 0.0);
        let rotated = transform.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(rotated, Point3::new(1.0, 2.0, 1.0), epsilon = 1e-5);
    }
}
