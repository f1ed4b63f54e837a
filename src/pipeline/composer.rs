use crate::core::math::transform::TransformFactory;
use crate::core::render_state::RenderState;
use crate::pipeline::programs::{ProgramKind, ProgramTable};
use crate::scene::assets::{CubeMapId, MeshId, ModelId, SceneAssets, SceneTexture, TextureId};
use crate::scene::camera::Camera;
use crate::scene::mesh::CubeFace;
use crate::scene::placement::Prop;
use crate::scene::viewer::ViewerState;
use log::warn;
use nalgebra::{Matrix4, Point3, Vector3};

/// Number of path tiles after the first one.
pub const EXTRA_PATH_TILES: usize = 12;

/// Camera matrices derived once per frame and fed to every program.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraFeed {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub position: Point3<f32>,
}

impl CameraFeed {
    pub fn derive(camera: &Camera, aspect_ratio: f32, near: f32, far: f32) -> Self {
        Self {
            view: camera.view_matrix(),
            projection: camera.projection_matrix(aspect_ratio, near, far),
            position: camera.position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawTarget {
    Mesh(MeshId),
    /// Every mesh of a model, each with the model's own material when it
    /// has one.
    Model(ModelId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureBinding {
    Texture2D(TextureId),
    CubeMap(CubeMapId),
}

/// One draw with everything it needs. Nothing is inherited from the
/// previous draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub label: String,
    pub program: ProgramKind,
    pub target: DrawTarget,
    pub model: Matrix4<f32>,
    /// `(unit, binding)` pairs.
    pub textures: Vec<(usize, TextureBinding)>,
    pub state: RenderState,
}

/// The ordered draw list for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub frame: u64,
    pub clear_color: Vector3<f32>,
    pub draws: Vec<DrawCall>,
}

impl FramePlan {
    pub fn draws_for(&self, program: ProgramKind) -> impl Iterator<Item = &DrawCall> {
        self.draws.iter().filter(move |d| d.program == program)
    }
}

/// Builds each frame's plan and keeps the program uniforms current.
#[derive(Debug, Clone)]
pub struct FrameComposer {
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
    frame: u64,
}

impl FrameComposer {
    pub fn new(aspect_ratio: f32, near: f32, far: f32) -> Self {
        Self {
            aspect_ratio,
            near,
            far,
            frame: 0,
        }
    }

    /// Feeds the camera and lights to every program, then lays out the draw
    /// sequence.
    pub fn compose(
        &mut self,
        programs: &mut ProgramTable,
        viewer: &ViewerState,
        assets: &SceneAssets,
    ) -> FramePlan {
        let frame = self.frame;
        self.frame += 1;

        let feed = CameraFeed::derive(&viewer.camera, self.aspect_ratio, self.near, self.far);
        programs.upload_camera(&feed, frame);
        for kind in ProgramKind::ALL {
            programs.bind_lights(kind, &viewer.lights);
        }
        programs.set_height_scale(viewer.height_scale);

        let mut draws = Vec::new();
        furniture(&mut draws, viewer, assets);
        cabin_shell(&mut draws, assets);
        sky(&mut draws, assets);
        grounds(&mut draws, viewer, assets);
        stone_path(&mut draws, assets);
        windows(&mut draws, assets);

        FramePlan {
            frame,
            clear_color: viewer.clear_color,
            draws,
        }
    }
}

fn lit_units(diffuse: TextureId, specular: TextureId) -> Vec<(usize, TextureBinding)> {
    vec![
        (0, TextureBinding::Texture2D(diffuse)),
        (1, TextureBinding::Texture2D(specular)),
    ]
}

fn furniture(draws: &mut Vec<DrawCall>, viewer: &ViewerState, assets: &SceneAssets) {
    for placement in &viewer.furniture {
        let Some(model) = assets.prop(placement.prop) else {
            warn!("No model for '{}'; skipping.", placement.label);
            continue;
        };
        draws.push(DrawCall {
            label: placement.label.to_string(),
            program: ProgramKind::Inside,
            target: DrawTarget::Model(model),
            model: placement.model_matrix(),
            textures: Vec::new(),
            state: RenderState::double_sided(),
        });
    }
}

fn cabin_shell(draws: &mut Vec<DrawCall>, assets: &SceneAssets) {
    let wall = assets.scene_texture(SceneTexture::Wall);
    let floor = assets.scene_texture(SceneTexture::Floor);

    let room = TransformFactory::translation(&Vector3::new(0.0, 1.5, 0.0))
        * TransformFactory::scaling(&Vector3::new(7.0, 3.0, 7.0));
    let shell = [
        ("front wall", CubeFace::PosZ, wall),
        ("left wall", CubeFace::NegX, wall),
        ("floor", CubeFace::NegY, floor),
        ("ceiling", CubeFace::PosY, wall),
    ];
    for (label, face, texture) in shell {
        draws.push(DrawCall {
            label: label.to_string(),
            program: ProgramKind::Room,
            target: DrawTarget::Mesh(assets.builtin.face(face)),
            model: room,
            textures: lit_units(texture, texture),
            state: RenderState::double_sided(),
        });
    }

    draws.push(DrawCall {
        label: "half wall".to_string(),
        program: ProgramKind::Inside,
        target: DrawTarget::Mesh(assets.builtin.face(CubeFace::PosX)),
        model: TransformFactory::translation(&Vector3::new(-1.51, 1.48, 1.76))
            * TransformFactory::scaling(&Vector3::new(7.0, 3.0, 3.5)),
        textures: lit_units(wall, wall),
        state: RenderState::double_sided(),
    });

    let auxiliary = TransformFactory::translation(&Vector3::new(-0.1, 1.5, 0.02))
        * TransformFactory::scaling(&Vector3::new(7.0, 3.0, 7.0));
    for (label, face) in [
        ("outer front wall", CubeFace::PosZ),
        ("outer left wall", CubeFace::NegX),
    ] {
        draws.push(DrawCall {
            label: label.to_string(),
            program: ProgramKind::Room,
            target: DrawTarget::Mesh(assets.builtin.face(face)),
            model: auxiliary,
            textures: lit_units(wall, wall),
            state: RenderState::double_sided(),
        });
    }
}

fn sky(draws: &mut Vec<DrawCall>, assets: &SceneAssets) {
    draws.push(DrawCall {
        label: "skybox".to_string(),
        program: ProgramKind::Skybox,
        target: DrawTarget::Mesh(assets.builtin.skybox),
        model: Matrix4::identity(),
        textures: vec![(0, TextureBinding::CubeMap(assets.sky))],
        state: RenderState::skybox(),
    });
}

fn grounds(draws: &mut Vec<DrawCall>, viewer: &ViewerState, assets: &SceneAssets) {
    draws.push(DrawCall {
        label: "platform".to_string(),
        program: ProgramKind::Outside,
        target: DrawTarget::Mesh(assets.builtin.platform),
        model: TransformFactory::translation(&Vector3::new(0.0, -0.001, 0.0))
            * TransformFactory::scaling(&Vector3::new(25.0, 1.0, 25.0)),
        textures: lit_units(
            assets.scene_texture(SceneTexture::GrassDiffuse),
            assets.scene_texture(SceneTexture::GrassSpecular),
        ),
        state: RenderState::opaque(),
    });

    let roof = assets.scene_texture(SceneTexture::Roof);
    draws.push(DrawCall {
        label: "roof".to_string(),
        program: ProgramKind::Outside,
        target: DrawTarget::Mesh(assets.builtin.roof),
        model: TransformFactory::translation(&Vector3::new(0.0, 6.2, 0.1))
            * TransformFactory::uniform_scaling(8.05),
        textures: lit_units(roof, roof),
        state: RenderState::double_sided(),
    });

    let Some(tree) = assets.prop(Prop::Tree) else {
        warn!("No tree model; skipping {} trees.", viewer.trees.len());
        return;
    };
    for (i, position) in viewer.trees.positions().iter().enumerate() {
        draws.push(DrawCall {
            label: format!("tree {i}"),
            program: ProgramKind::Outside,
            target: DrawTarget::Model(tree),
            model: TransformFactory::translation(position),
            textures: Vec::new(),
            state: RenderState::double_sided(),
        });
    }
}

fn stone_path(draws: &mut Vec<DrawCall>, assets: &SceneAssets) {
    let textures = vec![
        (0, TextureBinding::Texture2D(assets.scene_texture(SceneTexture::PathDiffuse))),
        (1, TextureBinding::Texture2D(assets.scene_texture(SceneTexture::PathNormal))),
        (2, TextureBinding::Texture2D(assets.scene_texture(SceneTexture::PathHeight))),
    ];
    let base = TransformFactory::translation(&Vector3::new(4.0, 0.001, 2.5))
        * TransformFactory::uniform_scaling(0.5);
    let step = Vector3::new(2.0, 0.001, 0.0);

    for i in 0..=EXTRA_PATH_TILES {
        draws.push(DrawCall {
            label: format!("path tile {i}"),
            program: ProgramKind::NormalMapped,
            target: DrawTarget::Mesh(assets.builtin.path_tile),
            model: base * TransformFactory::translation(&(step * i as f32)),
            textures: textures.clone(),
            state: RenderState::opaque(),
        });
    }
}

fn windows(draws: &mut Vec<DrawCall>, assets: &SceneAssets) {
    let room = TransformFactory::translation(&Vector3::new(0.0, 1.5, 0.0))
        * TransformFactory::scaling(&Vector3::new(7.0, 3.0, 7.0));
    let panes = [
        ("back window", CubeFace::NegZ, SceneTexture::BackWindow),
        ("side window", CubeFace::PosX, SceneTexture::Window),
    ];
    for (label, face, texture) in panes {
        let texture = assets.scene_texture(texture);
        draws.push(DrawCall {
            label: label.to_string(),
            program: ProgramKind::Blend,
            target: DrawTarget::Mesh(assets.builtin.face(face)),
            model: room,
            textures: lit_units(texture, texture),
            state: RenderState::translucent(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render_state::{BlendMode, CullMode, DepthFunc};
    use crate::io::config::Config;
    use crate::scene::trees::TreeInstanceList;
    use approx::assert_relative_eq;
    use nalgebra::Vector4;

    fn plan() -> (FramePlan, ProgramTable) {
        let assets = SceneAssets::placeholder();
        let viewer = ViewerState::new(&Config::default(), TreeInstanceList::scatter(Some(3)));
        let mut programs = ProgramTable::new();
        let mut composer = FrameComposer::new(800.0 / 600.0, 0.1, 100.0);
        (composer.compose(&mut programs, &viewer, &assets), programs)
    }

    fn index_of(plan: &FramePlan, label: &str) -> usize {
        plan.draws.iter().position(|d| d.label == label).unwrap()
    }

    #[test]
    fn draw_order_follows_layering_rules() {
        let (plan, _) = plan();
        let sky = index_of(&plan, "skybox");
        let last_interior = index_of(&plan, "outer left wall");
        assert!(last_interior < sky);
        assert!(index_of(&plan, "bed") < index_of(&plan, "front wall"));
        assert!(sky < index_of(&plan, "platform"));
        assert!(index_of(&plan, "roof") < index_of(&plan, "tree 0"));

        let first_blend = plan
            .draws
            .iter()
            .position(|d| d.state.blend == BlendMode::Alpha)
            .unwrap();
        assert_eq!(first_blend, plan.draws.len() - 2);
        assert!(plan.draws[first_blend..].iter().all(|d| d.program == ProgramKind::Blend));
    }

    #[test]
    fn skybox_draw_reverses_cull_and_relaxes_depth() {
        let (plan, _) = plan();
        let sky = &plan.draws[index_of(&plan, "skybox")];
        assert_eq!(sky.state.cull, CullMode::Front);
        assert_eq!(sky.state.depth, DepthFunc::LessEqual);
        assert!(matches!(sky.textures[..], [(0, TextureBinding::CubeMap(_))]));

        let after = &plan.draws[index_of(&plan, "platform")];
        assert_eq!(after.state, RenderState::default());
    }

    #[test]
    fn every_tree_gets_its_own_matrix() {
        let (plan, _) = plan();
        let trees: Vec<_> = plan.draws_for(ProgramKind::Outside).filter(|d| d.label.starts_with("tree")).collect();
        assert_eq!(trees.len(), 80);
        for d in trees {
            let expected = TransformFactory::translation(&d.model.fixed_view::<3, 1>(0, 3).into_owned());
            assert_eq!(d.model, expected);
        }
    }

    #[test]
    fn path_has_thirteen_tiles_offset_in_tile_space() {
        let (plan, _) = plan();
        let tiles: Vec<_> = plan.draws_for(ProgramKind::NormalMapped).collect();
        assert_eq!(tiles.len(), EXTRA_PATH_TILES + 1);

        let origin = |d: &DrawCall| d.model * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(origin(tiles[0]), Vector4::new(4.0, 0.001, 2.5, 1.0), epsilon = 1e-6);
        assert_relative_eq!(origin(tiles[12]), Vector4::new(16.0, 0.007, 2.5, 1.0), epsilon = 1e-5);
        assert!(tiles.iter().all(|d| d.textures.len() == 3));
    }

    #[test]
    fn compose_feeds_every_program() {
        let (plan, programs) = plan();
        for kind in ProgramKind::ALL {
            assert!(programs.is_fed(kind, plan.frame));
        }
        assert_relative_eq!(
            programs.get(ProgramKind::Room).projection[(1, 1)],
            1.0 / 22.5f32.to_radians().tan(),
            epsilon = 1e-5
        );
    }

    #[test]
    fn windows_use_their_own_panes() {
        let (plan, _) = plan();
        let assets = SceneAssets::placeholder();
        let back = &plan.draws[index_of(&plan, "back window")];
        assert_eq!(back.target, DrawTarget::Mesh(assets.builtin.face(CubeFace::NegZ)));
        assert_eq!(
            back.textures[0].1,
            TextureBinding::Texture2D(assets.scene_texture(SceneTexture::BackWindow))
        );
    }
}
