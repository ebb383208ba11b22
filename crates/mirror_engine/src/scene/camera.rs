//! # Cameras
//!
//! Cameras are described by a position and a roll/yaw/pitch orientation in
//! degrees rather than a look-at target, which lets the reflection pass
//! program each cubemap face from a fixed table.
//!
//! ## Coordinate System
//! Right-handed, Y-up world space. With zero yaw and pitch the camera looks
//! down +X; positive yaw turns towards +Z, positive pitch towards +Y.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// Look direction as Euler angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    /// Rotation about the look direction
    pub roll: f32,
    /// Rotation about the world vertical
    pub yaw: f32,
    /// Elevation above the horizontal plane
    pub pitch: f32,
}

impl Orientation {
    /// Orientation from (roll, yaw, pitch) degrees
    pub const fn new(roll: f32, yaw: f32, pitch: f32) -> Self {
        Self { roll, yaw, pitch }
    }
}

/// Perspective camera
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Position in world space
    pub position: Vec3,

    /// World up reference used to derive the camera basis
    pub world_up: Vec3,

    orientation: Orientation,
    fov_degrees: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl Camera {
    /// Create a perspective camera at `position` looking down +X
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            world_up: Vec3::y(),
            orientation: Orientation::default(),
            fov_degrees,
            aspect,
            near,
            far,
        }
    }

    /// Replace the world up reference
    #[must_use]
    pub fn with_world_up(mut self, world_up: Vec3) -> Self {
        self.world_up = world_up;
        self
    }

    /// Replace the orientation
    #[must_use]
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Current orientation
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Overwrite the orientation
    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    /// Move to `position`
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Turn by yaw and pitch deltas in degrees, keeping pitch short of vertical
    pub fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.orientation.yaw = (self.orientation.yaw + yaw_delta).rem_euclid(360.0);
        self.orientation.pitch = (self.orientation.pitch + pitch_delta).clamp(-89.0, 89.0);
    }

    /// Move along the camera basis: forward, right and world up
    pub fn move_relative(&mut self, forward: f32, right: f32, up: f32) {
        self.position += self.front() * forward + self.right() * right + self.world_up.normalize() * up;
    }

    /// Replace all projection parameters
    pub fn set_projection(&mut self, fov_degrees: f32, aspect: f32, near: f32, far: f32) {
        self.fov_degrees = fov_degrees;
        self.aspect = aspect;
        self.near = near;
        self.far = far;
    }

    /// Vertical field of view in degrees
    pub fn fov_degrees(&self) -> f32 {
        self.fov_degrees
    }

    /// Width over height
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Unit look direction
    pub fn front(&self) -> Vec3 {
        let yaw = utils::deg_to_rad(self.orientation.yaw);
        let pitch = utils::deg_to_rad(self.orientation.pitch);
        Vec3::new(pitch.cos() * yaw.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    /// Unit right vector, before roll
    ///
    /// Derived from yaw alone so that straight up or down views keep a
    /// defined basis. A downward world up mirrors it.
    fn base_right(&self) -> Vec3 {
        let yaw = utils::deg_to_rad(self.orientation.yaw);
        let right = Vec3::new(-yaw.sin(), 0.0, yaw.cos());
        if self.world_up.y < 0.0 { -right } else { right }
    }

    /// Unit right vector
    pub fn right(&self) -> Vec3 {
        self.basis().0
    }

    /// Unit up vector
    pub fn up(&self) -> Vec3 {
        self.basis().1
    }

    fn basis(&self) -> (Vec3, Vec3) {
        let front = self.front();
        let right = self.base_right();
        let up = right.cross(&front).normalize();
        if self.orientation.roll.abs() < f32::EPSILON {
            return (right, up);
        }

        let roll = utils::deg_to_rad(self.orientation.roll);
        let (sin, cos) = roll.sin_cos();
        (right * cos + up * sin, up * cos - right * sin)
    }

    /// World to view transform
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.position + self.front(), self.up())
    }

    /// View to clip transform
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective(utils::deg_to_rad(self.fov_degrees), self.aspect, self.near, self.far)
    }
}

/// Indexed cameras with one active slot
///
/// Passes read the active camera for their uniforms; the reflection pass
/// swaps the active slot for its duration.
#[derive(Debug, Clone)]
pub struct CameraSet {
    cameras: Vec<Camera>,
    active: usize,
}

impl CameraSet {
    /// Slot of the user-controlled camera
    pub const PRIMARY: usize = 0;

    /// Slot of the camera that captures the reflection cubemap
    pub const REFLECTION: usize = 1;

    /// Standard pair: primary camera for the screen and the reflection camera
    pub fn standard(screen_aspect: f32) -> Self {
        let primary = Camera::perspective(Vec3::new(1.0, 0.5, 1.0), 45.0, screen_aspect, 0.1, 10000.0)
            .with_orientation(Orientation::new(0.0, 225.0, -35.0));
        let reflection = Camera::perspective(Vec3::zeros(), 90.0, 1.0, 0.1, 10000.0)
            .with_world_up(Vec3::new(0.0, -1.0, 0.0));
        Self::new(vec![primary, reflection])
    }

    /// Wrap cameras; the first one starts active
    pub fn new(cameras: Vec<Camera>) -> Self {
        debug_assert!(!cameras.is_empty(), "camera set needs at least one camera");
        Self { cameras, active: Self::PRIMARY }
    }

    /// Active slot
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Select the active slot; out of range indices are ignored
    pub fn set_active(&mut self, index: usize) {
        if index < self.cameras.len() {
            self.active = index;
        } else {
            debug_assert!(false, "camera index {index} out of range");
            log::warn!("Ignoring out of range camera index {index}");
        }
    }

    /// Camera in the active slot
    pub fn active(&self) -> &Camera {
        &self.cameras[self.active]
    }

    /// Camera at `index`
    pub fn get(&self, index: usize) -> Option<&Camera> {
        self.cameras.get(index)
    }

    /// Mutable camera at `index`
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Camera> {
        self.cameras.get_mut(index)
    }

    /// Primary camera
    pub fn primary(&self) -> &Camera {
        &self.cameras[Self::PRIMARY]
    }

    /// Mutable primary camera
    pub fn primary_mut(&mut self) -> &mut Camera {
        &mut self.cameras[Self::PRIMARY]
    }

    /// Number of cameras
    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    /// Whether the set holds no cameras
    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_front_follows_yaw_and_pitch() {
        let mut camera = Camera::perspective(Vec3::zeros(), 90.0, 1.0, 0.1, 100.0);
        assert_relative_eq!(camera.front(), Vec3::x(), epsilon = 1e-6);

        camera.set_orientation(Orientation::new(0.0, 90.0, 0.0));
        assert_relative_eq!(camera.front(), Vec3::z(), epsilon = 1e-6);

        camera.set_orientation(Orientation::new(0.0, -90.0, 90.0));
        assert_relative_eq!(camera.front(), Vec3::y(), epsilon = 1e-6);
    }

    #[test]
    fn test_basis_is_orthonormal_when_looking_straight_down() {
        let camera = Camera::perspective(Vec3::zeros(), 90.0, 1.0, 0.1, 100.0)
            .with_world_up(Vec3::new(0.0, -1.0, 0.0))
            .with_orientation(Orientation::new(0.0, -90.0, -90.0));

        let (front, right, up) = (camera.front(), camera.right(), camera.up());
        assert_relative_eq!(front, -Vec3::y(), epsilon = 1e-6);
        assert_relative_eq!(front.dot(&right), 0.0, epsilon = 1e-6);
        assert_relative_eq!(front.dot(&up), 0.0, epsilon = 1e-6);
        assert_relative_eq!(up.norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_roll_rotates_up_around_front() {
        let camera = Camera::perspective(Vec3::zeros(), 45.0, 1.0, 0.1, 100.0)
            .with_orientation(Orientation::new(90.0, 0.0, 0.0));
        assert_relative_eq!(camera.front(), Vec3::x(), epsilon = 1e-6);
        assert_relative_eq!(camera.up(), -Vec3::z(), epsilon = 1e-6);
    }

    #[test]
    fn test_view_matrix_moves_position_to_origin() {
        let camera = Camera::perspective(Vec3::new(3.0, 4.0, 5.0), 45.0, 1.0, 0.1, 100.0)
            .with_orientation(Orientation::new(0.0, 30.0, 10.0));
        let view = camera.view_matrix();
        let eye = view.transform_point(&crate::foundation::math::Point3::from(camera.position));
        assert_relative_eq!(eye.coords, Vec3::zeros(), epsilon = 1e-5);

        // the look direction maps onto -Z in view space
        let ahead = view.transform_vector(&camera.front());
        assert_relative_eq!(ahead, -Vec3::z(), epsilon = 1e-5);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = Camera::perspective(Vec3::zeros(), 45.0, 1.0, 0.1, 100.0);
        camera.rotate(0.0, 120.0);
        assert_relative_eq!(camera.orientation().pitch, 89.0);
        camera.rotate(-30.0, 0.0);
        assert_relative_eq!(camera.orientation().yaw, 330.0);
    }

    #[test]
    fn test_standard_set() {
        let mut cameras = CameraSet::standard(16.0 / 9.0);
        assert_eq!(cameras.len(), 2);
        assert_eq!(cameras.active_index(), CameraSet::PRIMARY);

        cameras.set_active(CameraSet::REFLECTION);
        assert_relative_eq!(cameras.active().fov_degrees(), 90.0);
        assert_relative_eq!(cameras.active().aspect(), 1.0);
    }
}
