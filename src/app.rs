use crate::io::config::Config;
use crate::io::image::save_buffer_to_image;
use crate::io::state::ProgramState;
use crate::pipeline::composer::FrameComposer;
use crate::pipeline::programs::ProgramTable;
use crate::pipeline::renderer::{FrameStats, Renderer};
use crate::scene::assets::{AssetError, SceneAssets};
use crate::scene::trees::TreeInstanceList;
use crate::scene::viewer::ViewerState;
use crate::ui::input::InputController;
use log::{error, info};
use minifb::{Key, Window, WindowOptions};
use std::path::Path;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to open window: {0}")]
    Window(#[from] minifb::Error),
    #[error(transparent)]
    Screenshot(#[from] AssetError),
}

/// Everything one frame needs, built once at startup.
pub struct Session {
    pub assets: SceneAssets,
    pub viewer: ViewerState,
    pub programs: ProgramTable,
    pub composer: FrameComposer,
    pub renderer: Renderer,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        let assets = SceneAssets::load(&config.assets);
        let trees = TreeInstanceList::scatter(config.scene.tree_seed);
        info!("Scattered {} trees.", trees.len());

        let mut viewer = ViewerState::new(config, trees);
        viewer.restore(&ProgramState::load(&config.scene.state_file));

        let (width, height) = (config.window.width, config.window.height);
        Self {
            assets,
            viewer,
            programs: ProgramTable::new(),
            composer: FrameComposer::new(
                width as f32 / height.max(1) as f32,
                config.camera.near,
                config.camera.far,
            ),
            renderer: Renderer::new(width, height, config.window.samples),
        }
    }

    /// Composes and rasterizes one frame from the current viewer state.
    pub fn render(&mut self) -> FrameStats {
        let plan = self
            .composer
            .compose(&mut self.programs, &self.viewer, &self.assets);
        self.renderer
            .render_frame(&plan, &mut self.programs, &self.assets)
    }
}

/// Title bar text. With the overlay on it carries the camera readout.
pub fn window_title(base: &str, viewer: &ViewerState, fps: f32) -> String {
    if !viewer.overlay_enabled {
        return base.to_string();
    }
    let cam = &viewer.camera;
    format!(
        "{} - pos ({:.2}, {:.2}, {:.2}) - front ({:.2}, {:.2}, {:.2}) - fov {:.1} - height {:.2} - {:.1} FPS",
        base,
        cam.position.x,
        cam.position.y,
        cam.position.z,
        cam.front.x,
        cam.front.y,
        cam.front.z,
        cam.zoom,
        viewer.height_scale,
        fps
    )
}

/// Runs the interactive viewer until the window closes or Escape is hit,
/// then saves the program state.
pub fn run_gui(config: Config) -> Result<(), AppError> {
    let (width, height) = (config.window.width, config.window.height);
    info!("Starting viewer ({}x{})...", width, height);
    info!("Controls: WASD=Move, Space/LeftCtrl=Up/Down, Mouse=Look, Scroll=Zoom, F1=Overlay, H=Height scale, Esc=Quit");

    let mut window = Window::new(
        &config.window.title,
        width,
        height,
        WindowOptions {
            resize: false,
            ..WindowOptions::default()
        },
    )?;
    window.set_target_fps(60);

    let mut session = Session::new(&config);
    let mut input = InputController::new();
    let mut buffer = vec![0u32; width * height];

    let mut last_frame_time = Instant::now();
    let mut frame_count = 0;
    let mut last_fps_update = Instant::now();

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let now = Instant::now();
        let dt = (now - last_frame_time).as_secs_f32();
        last_frame_time = now;

        input.update(&window, &mut session.viewer, dt);

        session.render();
        session.renderer.resolve_into(&mut buffer);
        window.update_with_buffer(&buffer, width, height)?;
        window.set_title(&window_title(
            &config.window.title,
            &session.viewer,
            1.0 / dt.max(f32::EPSILON),
        ));

        frame_count += 1;
        if last_fps_update.elapsed().as_secs_f32() >= 2.0 {
            info!(
                "Average FPS: {:.1}",
                frame_count as f32 / last_fps_update.elapsed().as_secs_f32()
            );
            frame_count = 0;
            last_fps_update = Instant::now();
        }
    }

    let state_file = &config.scene.state_file;
    match session.viewer.program_state().save(state_file) {
        Ok(()) => info!("Saved program state to '{}'.", state_file),
        Err(e) => error!("{}", e),
    }
    Ok(())
}

/// Renders a single frame from the saved viewpoint and writes it as a PNG.
/// The state file is read but never written.
pub fn run_headless(config: Config, output: &Path) -> Result<(), AppError> {
    info!("Starting headless render...");
    let start_time = Instant::now();

    let mut session = Session::new(&config);
    let stats = session.render();
    info!(
        "Rendered {} draws ({} triangles) in {:.2?}",
        stats.draw_calls,
        stats.triangles,
        start_time.elapsed()
    );

    let (width, height) = (config.window.width, config.window.height);
    let mut buffer = vec![0u32; width * height];
    session.renderer.resolve_into(&mut buffer);

    info!("Saving output to '{}'...", output.display());
    save_buffer_to_image(&buffer, width, height, output)?;
    info!("Done.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_readout_follows_overlay() {
        let mut viewer = ViewerState::new(&Config::default(), TreeInstanceList::from_positions(Vec::new()));
        assert_eq!(window_title("Cabin", &viewer, 60.0), "Cabin");

        viewer.toggle_overlay();
        let title = window_title("Cabin", &viewer, 60.0);
        assert!(title.starts_with("Cabin - pos (0.00, 0.00, 3.00)"));
        assert!(title.ends_with("60.0 FPS"));
    }
}
