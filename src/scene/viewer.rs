use crate::io::config::Config;
use crate::io::state::ProgramState;
use crate::scene::camera::Camera;
use crate::scene::light::LightRig;
use crate::scene::placement::{Placement, cabin_furniture};
use crate::scene::trees::TreeInstanceList;
use nalgebra::{Point3, Vector3};

/// Step applied by the height-scale key.
pub const HEIGHT_SCALE_STEP: f32 = 0.5;

/// Everything the frame loop reads and input mutates, passed explicitly to
/// the composer each frame.
#[derive(Debug, Clone)]
pub struct ViewerState {
    pub camera: Camera,
    pub clear_color: Vector3<f32>,
    /// Debug overlay (title bar camera readout).
    pub overlay_enabled: bool,
    /// Mouse look is switched off while the overlay is shown.
    pub mouse_look: bool,
    /// Parallax depth of the path tiles.
    pub height_scale: f32,
    pub lights: LightRig,
    pub furniture: Vec<Placement>,
    pub trees: TreeInstanceList,
    /// Persisted values the viewer carries but does not render with.
    carried: ProgramState,
}

impl ViewerState {
    pub fn new(config: &Config, trees: TreeInstanceList) -> Self {
        let mut camera = Camera::default();
        camera.movement_speed = config.camera.speed;
        camera.mouse_sensitivity = config.camera.sensitivity;
        camera.zoom_limits = config.camera.zoom_limits();

        Self {
            camera,
            clear_color: Vector3::zeros(),
            overlay_enabled: false,
            mouse_look: true,
            height_scale: config.scene.height_scale,
            lights: config.lights.to_rig(),
            furniture: cabin_furniture(),
            trees,
            carried: ProgramState::default(),
        }
    }

    /// Overlays persisted values onto a freshly configured viewer.
    pub fn restore(&mut self, state: &ProgramState) {
        self.clear_color = Vector3::from(state.clear_color);
        self.overlay_enabled = state.overlay_enabled;
        self.mouse_look = !state.overlay_enabled;
        self.camera.position = Point3::from(state.camera_position);
        self.camera.set_front(Vector3::from(state.camera_front));
        self.carried = state.clone();
    }

    pub fn program_state(&self) -> ProgramState {
        ProgramState {
            clear_color: self.clear_color.into(),
            overlay_enabled: self.overlay_enabled,
            camera_position: self.camera.position.coords.into(),
            camera_front: self.camera.front.into(),
            ..self.carried.clone()
        }
    }

    /// Flips the overlay. Mouse look follows it: off while the overlay is on.
    pub fn toggle_overlay(&mut self) {
        self.overlay_enabled = !self.overlay_enabled;
        self.mouse_look = !self.overlay_enabled;
    }

    /// Moves the parallax height scale one step towards zero, landing on zero
    /// exactly.
    pub fn step_height_scale(&mut self) {
        self.height_scale = if self.height_scale.abs() <= HEIGHT_SCALE_STEP {
            0.0
        } else {
            self.height_scale - HEIGHT_SCALE_STEP.copysign(self.height_scale)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn viewer() -> ViewerState {
        ViewerState::new(&Config::default(), TreeInstanceList::scatter(Some(1)))
    }

    #[test]
    fn new_viewer_uses_configured_camera() {
        let v = viewer();
        assert_eq!(v.camera.position, Point3::new(0.0, 0.0, 3.0));
        assert_eq!(v.camera.movement_speed, 2.5);
        assert_eq!(v.furniture.len(), 11);
        assert_eq!(v.trees.len(), 80);
        assert!(v.mouse_look);
    }

    #[test]
    fn restore_then_export_keeps_carried_fields() {
        let state = ProgramState {
            clear_color: [0.2, 0.3, 0.4],
            overlay_enabled: true,
            camera_position: [1.0, 2.0, 3.0],
            camera_front: [1.0, 0.0, 0.0],
            object_position: [5.0, 6.0, 7.0],
            object_scale: 2.5,
            point_attenuation: [1.0, 0.7, 1.8],
        };
        let mut v = viewer();
        v.restore(&state);

        assert!(!v.mouse_look);
        assert_relative_eq!(v.camera.yaw, 0.0, epsilon = 1e-5);

        let out = v.program_state();
        assert_eq!(out.object_position, state.object_position);
        assert_eq!(out.object_scale, state.object_scale);
        assert_eq!(out.point_attenuation, state.point_attenuation);
        assert_eq!(out.camera_position, state.camera_position);
        assert_relative_eq!(Vector3::from(out.camera_front), Vector3::x(), epsilon = 1e-6);
    }

    #[test]
    fn overlay_toggle_controls_mouse_look() {
        let mut v = viewer();
        v.toggle_overlay();
        assert!(v.overlay_enabled && !v.mouse_look);
        v.toggle_overlay();
        assert!(!v.overlay_enabled && v.mouse_look);
    }

    #[test]
    fn height_scale_steps_to_zero() {
        let mut v = viewer();
        v.height_scale = -1.2;
        v.step_height_scale();
        assert_relative_eq!(v.height_scale, -0.7, epsilon = 1e-6);
        v.step_height_scale();
        assert_relative_eq!(v.height_scale, -0.2, epsilon = 1e-6);
        v.step_height_scale();
        assert_eq!(v.height_scale, 0.0);
        v.step_height_scale();
        assert_eq!(v.height_scale, 0.0);

        v.height_scale = 0.1;
        v.step_height_scale();
        assert_eq!(v.height_scale, 0.0);
    }
}
