use approx::assert_relative_eq;
use cabin_viewer::app::{Session, run_headless};
use cabin_viewer::core::render_state::{CullMode, DepthFunc};
use cabin_viewer::io::config::Config;
use cabin_viewer::io::state::ProgramState;
use cabin_viewer::pipeline::programs::ProgramKind;
use cabin_viewer::scene::trees::TreeInstanceList;
use std::path::Path;

fn offline_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.window.width = 80;
    config.window.height = 60;
    config.assets.enabled = false;
    config.scene.tree_seed = Some(7);
    config.scene.state_file = dir.join("state.txt").display().to_string();
    config
}

#[test]
fn full_frame_restores_baseline_state() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::new(&offline_config(dir.path()));

    let before = session.renderer.rasterizer.state();
    let stats = session.render();
    let after = session.renderer.rasterizer.state();

    assert!(stats.draw_calls > 100);
    assert_eq!(after, before);
    assert_eq!(after.cull, CullMode::Back);
    assert_eq!(after.depth, DepthFunc::Less);
}

#[test]
fn spot_cutoff_is_uploaded_as_cosine() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::new(&offline_config(dir.path()));
    session.render();

    for kind in [ProgramKind::Room, ProgramKind::Inside, ProgramKind::Blend] {
        let spot = session.programs.get(kind).lights.spot.as_ref().unwrap();
        assert_relative_eq!(spot.cos_cut_off, 0.342, epsilon = 1e-3);
    }
    assert!(session.programs.get(ProgramKind::Outside).lights.spot.is_none());
}

#[test]
fn default_camera_projection() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = offline_config(dir.path());
    config.window.width = 800;
    config.window.height = 600;
    let mut session = Session::new(&config);
    session.render();

    let projection = session.programs.get(ProgramKind::Room).projection;
    assert_relative_eq!(projection[(1, 1)], 2.414_213_6, epsilon = 1e-5);
    assert_relative_eq!(projection[(0, 0)], 2.414_213_6 / (800.0 / 600.0), epsilon = 1e-5);
}

#[test]
fn saved_state_is_restored_bit_exact() {
    let dir = tempfile::tempdir().unwrap();
    let config = offline_config(dir.path());
    let state = ProgramState {
        clear_color: [0.1, 0.2, 0.3],
        overlay_enabled: true,
        camera_position: [1.25, -0.1, 5.5],
        camera_front: [0.0, 0.0, -1.0],
        object_position: [0.3, 0.0, 1e-7],
        object_scale: 0.75,
        point_attenuation: [1.0, 0.09, 0.032],
    };
    state.save(&config.scene.state_file).unwrap();

    let session = Session::new(&config);
    assert_eq!(session.viewer.program_state(), state);
    assert!(!session.viewer.mouse_look);
}

#[test]
fn seeded_forest_is_reproducible() {
    let dir = tempfile::tempdir().unwrap();
    let a = Session::new(&offline_config(dir.path()));
    let b = Session::new(&offline_config(dir.path()));
    assert_eq!(a.viewer.trees, b.viewer.trees);
    assert_eq!(a.viewer.trees, TreeInstanceList::scatter(Some(7)));
}

#[test]
fn headless_render_writes_png() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("cabin.png");
    run_headless(offline_config(dir.path()), &output).unwrap();

    let img = image::open(&output).unwrap().to_rgb8();
    assert_eq!(img.dimensions(), (80, 60));
    // The headless run reads state but never writes it.
    assert!(!dir.path().join("state.txt").exists());
}
