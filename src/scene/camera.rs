use crate::core::math::transform::TransformFactory;
use nalgebra::{Matrix4, Point3, Vector3};

/// Discrete movement requests coming from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// Field-of-view bounds applied to scroll zoom, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLimits {
    pub min: f32,
    pub max: f32,
}

impl ZoomLimits {
    /// Bounds in either order.
    pub fn new(a: f32, b: f32) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self { min: 1.0, max: 45.0 }
    }
}

/// First-person fly camera driven by yaw and pitch (degrees).
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub front: Vector3<f32>,
    pub up: Vector3<f32>,
    pub right: Vector3<f32>,
    pub world_up: Vector3<f32>,

    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub zoom: f32,

    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    /// `None` leaves scroll zoom unbounded.
    pub zoom_limits: Option<ZoomLimits>,
}

const PITCH_LIMIT: f32 = 89.0;

impl Default for Camera {
    fn default() -> Self {
        Self::new(Point3::new(0.0, 0.0, 3.0))
    }
}

impl Camera {
    pub fn new(position: Point3<f32>) -> Self {
        let mut cam = Self {
            position,
            front: Vector3::new(0.0, 0.0, -1.0),
            up: Vector3::y(),
            right: Vector3::x(),
            world_up: Vector3::y(),
            yaw: -90.0,
            pitch: 0.0,
            zoom: 45.0,
            movement_speed: 2.5,
            mouse_sensitivity: 0.1,
            zoom_limits: Some(ZoomLimits::default()),
        };
        cam.update_vectors();
        cam
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        TransformFactory::view(&self.position, &(self.position + self.front), &self.up)
    }

    pub fn projection_matrix(&self, aspect_ratio: f32, near: f32, far: f32) -> Matrix4<f32> {
        TransformFactory::perspective(aspect_ratio, self.zoom.to_radians(), near, far)
    }

    pub fn process_keyboard(&mut self, direction: CameraMovement, delta_time: f32) {
        let velocity = self.movement_speed * delta_time;
        let offset = match direction {
            CameraMovement::Forward => self.front,
            CameraMovement::Backward => -self.front,
            CameraMovement::Left => -self.right,
            CameraMovement::Right => self.right,
            CameraMovement::Up => self.up,
            CameraMovement::Down => -self.up,
        };
        self.position += offset * velocity;
    }

    /// Mouse deltas in pixels; positive `y_offset` looks up.
    pub fn process_mouse_movement(&mut self, x_offset: f32, y_offset: f32, constrain_pitch: bool) {
        self.yaw += x_offset * self.mouse_sensitivity;
        self.pitch += y_offset * self.mouse_sensitivity;

        if constrain_pitch {
            self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }
        self.update_vectors();
    }

    pub fn process_mouse_scroll(&mut self, y_offset: f32) {
        self.zoom -= y_offset;
        if let Some(limits) = self.zoom_limits {
            // max/min rather than clamp: hand-built limits may be inverted.
            self.zoom = self.zoom.max(limits.min).min(limits.max);
        }
    }

    /// Restores orientation from a stored front vector. Yaw and pitch are
    /// re-derived so the next mouse move continues from the same heading.
    /// A zero vector is ignored.
    pub fn set_front(&mut self, front: Vector3<f32>) {
        let Some(front) = front.try_normalize(f32::EPSILON) else {
            return;
        };
        self.pitch = front.y.clamp(-1.0, 1.0).asin().to_degrees();
        self.yaw = front.z.atan2(front.x).to_degrees();
        self.front = front;
        self.right = self.front.cross(&self.world_up).normalize();
        self.up = self.right.cross(&self.front).normalize();
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vector3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos())
            .normalize();
        self.right = self.front.cross(&self.world_up).normalize();
        self.up = self.right.cross(&self.front).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_camera_looks_down_negative_z() {
        let cam = Camera::default();
        assert_relative_eq!(cam.front, Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
        assert_relative_eq!(cam.right, Vector3::x(), epsilon = 1e-6);
        assert_relative_eq!(cam.up, Vector3::y(), epsilon = 1e-6);
    }

    #[test]
    fn pitch_is_constrained() {
        let mut cam = Camera::default();
        cam.process_mouse_movement(0.0, 5000.0, true);
        assert_eq!(cam.pitch, 89.0);

        cam.process_mouse_movement(0.0, 5000.0, false);
        assert!(cam.pitch > 89.0);
    }

    #[test]
    fn zoom_limits_are_optional() {
        let mut cam = Camera::default();
        cam.process_mouse_scroll(-10.0);
        assert_eq!(cam.zoom, 45.0);
        cam.process_mouse_scroll(100.0);
        assert_eq!(cam.zoom, 1.0);

        cam.zoom_limits = None;
        cam.process_mouse_scroll(-100.0);
        assert_eq!(cam.zoom, 101.0);
    }

    #[test]
    fn inverted_limits_do_not_panic() {
        let mut cam = Camera::default();
        cam.zoom_limits = Some(ZoomLimits { min: 45.0, max: 1.0 });
        cam.process_mouse_scroll(1.0);
        assert!(cam.zoom.is_finite());

        cam.zoom_limits = Some(ZoomLimits::new(45.0, 1.0));
        cam.process_mouse_scroll(100.0);
        assert_eq!(cam.zoom, 1.0);
        cam.process_mouse_scroll(-100.0);
        assert_eq!(cam.zoom, 45.0);
    }

    #[test]
    fn keyboard_moves_along_basis() {
        let mut cam = Camera::default();
        cam.process_keyboard(CameraMovement::Forward, 1.0);
        assert_relative_eq!(cam.position, Point3::new(0.0, 0.0, 0.5), epsilon = 1e-6);
        cam.process_keyboard(CameraMovement::Up, 0.4);
        assert_relative_eq!(cam.position.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn set_front_rederives_yaw_and_pitch() {
        let mut cam = Camera::default();
        let front = Vector3::new(1.0, 1.0, 0.0).normalize();
        cam.set_front(front);
        assert_relative_eq!(cam.pitch, 45.0, epsilon = 1e-4);
        assert_relative_eq!(cam.yaw, 0.0, epsilon = 1e-4);

        cam.process_mouse_movement(0.0, 0.0, true);
        assert_relative_eq!(cam.front, front, epsilon = 1e-5);
    }

    #[test]
    fn default_projection_matches_fov() {
        let p = Camera::default().projection_matrix(800.0 / 600.0, 0.1, 100.0);
        assert_relative_eq!(p[(1, 1)], 2.414_213_5, epsilon = 1e-5);
    }
}
