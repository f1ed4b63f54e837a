use crate::scene::camera::CameraMovement;
use crate::scene::viewer::ViewerState;
use log::info;
use minifb::{Key, KeyRepeat, MouseMode, Window};

/// Input sampled from the window once per frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    pub movement: Vec<CameraMovement>,
    pub mouse_pos: Option<(f32, f32)>,
    pub scroll_y: f32,
    /// F1 went down this frame.
    pub toggle_overlay: bool,
    /// H went down this frame.
    pub step_height_scale: bool,
}

impl InputSnapshot {
    pub fn poll(window: &Window) -> Self {
        const MOVEMENT_KEYS: [(Key, CameraMovement); 6] = [
            (Key::W, CameraMovement::Forward),
            (Key::S, CameraMovement::Backward),
            (Key::A, CameraMovement::Left),
            (Key::D, CameraMovement::Right),
            (Key::Space, CameraMovement::Up),
            (Key::LeftCtrl, CameraMovement::Down),
        ];

        Self {
            movement: MOVEMENT_KEYS
                .iter()
                .filter(|(key, _)| window.is_key_down(*key))
                .map(|(_, movement)| *movement)
                .collect(),
            mouse_pos: window.get_mouse_pos(MouseMode::Pass),
            scroll_y: window.get_scroll_wheel().map_or(0.0, |(_, y)| y),
            toggle_overlay: window.is_key_pressed(Key::F1, KeyRepeat::No),
            step_height_scale: window.is_key_pressed(Key::H, KeyRepeat::No),
        }
    }
}

/// Turns per-frame input into camera and viewer updates.
#[derive(Debug, Default)]
pub struct InputController {
    last_mouse_pos: Option<(f32, f32)>,
}

impl InputController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, window: &Window, viewer: &mut ViewerState, dt: f32) {
        self.apply(&InputSnapshot::poll(window), viewer, dt);
    }

    pub fn apply(&mut self, input: &InputSnapshot, viewer: &mut ViewerState, dt: f32) {
        for movement in &input.movement {
            viewer.camera.process_keyboard(*movement, dt);
        }

        // The cursor is tracked even with mouse look off so re-enabling it
        // does not jump.
        if let Some((x, y)) = input.mouse_pos {
            if let Some((last_x, last_y)) = self.last_mouse_pos
                && viewer.mouse_look
            {
                // Screen y grows downwards.
                viewer.camera.process_mouse_movement(x - last_x, last_y - y, true);
            }
            self.last_mouse_pos = Some((x, y));
        }

        if input.scroll_y != 0.0 {
            viewer.camera.process_mouse_scroll(input.scroll_y);
        }

        if input.toggle_overlay {
            viewer.toggle_overlay();
            info!("Debug overlay {}", if viewer.overlay_enabled { "on" } else { "off" });
        }
        if input.step_height_scale {
            viewer.step_height_scale();
            info!("Height scale: {}", viewer.height_scale);
        }
    }
}
