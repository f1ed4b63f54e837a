use crate::core::color::srgb_to_linear;
use crate::core::framebuffer::{FAR_DEPTH, FrameBuffer};
use crate::core::pipeline::Shader;
use crate::core::rasterizer::Rasterizer;
use crate::core::render_state::RenderState;
use crate::pipeline::composer::{DrawCall, DrawTarget, FramePlan, TextureBinding};
use crate::pipeline::programs::{ProgramKind, ProgramTable, ProgramUniforms, UnitRole};
use crate::pipeline::shaders::lit::LitShader;
use crate::pipeline::shaders::normal_map::NormalMapShader;
use crate::pipeline::shaders::skybox::SkyboxShader;
use crate::scene::assets::SceneAssets;
use crate::scene::mesh::Mesh;
use crate::scene::model::ModelMaterial;
use crate::scene::texture::{CubeMap, Texture};
use log::{debug, warn};
use nalgebra::Vector3;

/// Counters for one rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: usize,
    pub program_switches: usize,
    pub state_changes: usize,
    pub triangles: usize,
}

/// Textures resolved for one mesh, indexed by unit.
struct UnitTextures<'a> {
    units: [Option<&'a Texture>; 3],
    cube: Option<&'a CubeMap>,
}

/// Executes frame plans against the rasterizer and framebuffer.
pub struct Renderer {
    pub rasterizer: Rasterizer,
    pub framebuffer: FrameBuffer,
}

impl Renderer {
    /// `sample_count`: 1 for no AA, 2 for 2x2 SSAA, etc.
    pub fn new(width: usize, height: usize, sample_count: usize) -> Self {
        Self {
            rasterizer: Rasterizer::new(),
            framebuffer: FrameBuffer::new(width, height, sample_count),
        }
    }

    /// Clears to a display-space colour.
    pub fn clear(&mut self, color: Vector3<f32>) {
        let linear = color.map(srgb_to_linear);
        self.framebuffer.clear(linear, FAR_DEPTH);
    }

    /// Clears, runs every draw in order and restores the baseline render
    /// state afterwards.
    pub fn render_frame(
        &mut self,
        plan: &FramePlan,
        programs: &mut ProgramTable,
        assets: &SceneAssets,
    ) -> FrameStats {
        self.clear(plan.clear_color);

        let mut stats = FrameStats::default();
        let mut current_program = None;

        for draw in &plan.draws {
            if current_program != Some(draw.program) {
                current_program = Some(draw.program);
                stats.program_switches += 1;
            }
            if self.rasterizer.apply_state(draw.state) {
                stats.state_changes += 1;
            }
            if !programs.is_fed(draw.program, plan.frame) {
                warn!(
                    "Program '{}' has no camera feed for frame {} (draw '{}').",
                    draw.program.name(),
                    plan.frame,
                    draw.label
                );
            }

            programs.get_mut(draw.program).model = draw.model;
            stats.triangles += self.execute(draw, programs.get(draw.program), assets);
            stats.draw_calls += 1;
        }

        self.rasterizer.apply_state(RenderState::default());
        debug!(
            "Frame {}: {} draws, {} program switches, {} state changes, {} triangles",
            plan.frame, stats.draw_calls, stats.program_switches, stats.state_changes, stats.triangles
        );
        stats
    }

    /// Packs the resolved frame into a 0RGB buffer.
    pub fn resolve_into(&self, out: &mut [u32]) {
        self.framebuffer.resolve_into(out);
    }

    fn execute(&self, draw: &DrawCall, uniforms: &ProgramUniforms, assets: &SceneAssets) -> usize {
        match draw.target {
            DrawTarget::Mesh(id) => {
                let Some(mesh) = assets.mesh(id) else {
                    warn!("Draw '{}' refers to missing mesh {:?}; skipped.", draw.label, id);
                    return 0;
                };
                let units = resolve_units(draw, None, assets, true);
                self.draw_with_program(draw.program, mesh, uniforms, &units)
            }
            DrawTarget::Model(id) => {
                let Some(model) = assets.model(id) else {
                    warn!("Draw '{}' refers to missing model {:?}; skipped.", draw.label, id);
                    return 0;
                };
                model
                    .meshes
                    .iter()
                    .map(|mesh| {
                        let units = resolve_units(draw, model.material_for(mesh), assets, false);
                        self.draw_with_program(draw.program, mesh, uniforms, &units)
                    })
                    .sum()
            }
        }
    }

    fn draw_with_program(
        &self,
        program: ProgramKind,
        mesh: &Mesh,
        uniforms: &ProgramUniforms,
        units: &UnitTextures,
    ) -> usize {
        let unit = |index: usize| units.units[index];
        match program {
            ProgramKind::Room | ProgramKind::Inside | ProgramKind::Outside | ProgramKind::Blend => {
                let (Some(diffuse), Some(specular)) = (unit(0), unit(1)) else {
                    return 0;
                };
                let keep_alpha = program == ProgramKind::Blend;
                self.draw_mesh(mesh, &LitShader::new(uniforms, diffuse, specular, keep_alpha))
            }
            ProgramKind::NormalMapped => {
                let (Some(diffuse), Some(normal), Some(height)) =
                    (unit(0), unit(1), unit(2))
                else {
                    return 0;
                };
                self.draw_mesh(mesh, &NormalMapShader::new(uniforms, diffuse, normal, height))
            }
            ProgramKind::Skybox => {
                let Some(cube) = units.cube else {
                    return 0;
                };
                self.draw_mesh(mesh, &SkyboxShader::new(uniforms, cube))
            }
        }
    }

    /// Runs the vertex stage per triangle and hands the result to the
    /// rasterizer. Returns the number of triangles submitted.
    pub fn draw_mesh<S: Shader>(&self, mesh: &Mesh, shader: &S) -> usize {
        let mut submitted = 0;
        for [v0, v1, v2] in mesh.triangles() {
            let (pos0, var0) = shader.vertex(v0);
            let (pos1, var1) = shader.vertex(v1);
            let (pos2, var2) = shader.vertex(v2);

            self.rasterizer.rasterize_triangle(
                &self.framebuffer,
                shader,
                &[pos0, pos1, pos2],
                &[var0, var1, var2],
            );
            submitted += 1;
        }
        submitted
    }
}

/// Looks up every unit the program declares. A model's own material wins
/// over the draw's diffuse and specular bindings. Missing or mismatched
/// bindings fall back to the white texture or the fallback cube map.
fn resolve_units<'a>(
    draw: &DrawCall,
    material: Option<&ModelMaterial>,
    assets: &'a SceneAssets,
    warn_unbound: bool,
) -> UnitTextures<'a> {
    let mut resolved = UnitTextures {
        units: [None; 3],
        cube: None,
    };

    for slot in draw.program.units() {
        let bound = draw
            .textures
            .iter()
            .find(|(unit, _)| *unit == slot.unit)
            .map(|(_, binding)| *binding);

        if slot.role.is_cube() {
            let cube = match bound {
                Some(TextureBinding::CubeMap(id)) => assets.cube_map(id).or_else(|| {
                    warn!("Draw '{}': cube map {:?} missing; using fallback.", draw.label, id);
                    None
                }),
                Some(TextureBinding::Texture2D(_)) => {
                    warn!(
                        "Draw '{}': unit {} expects a cube map; using fallback.",
                        draw.label, slot.unit
                    );
                    None
                }
                None => {
                    warn!("Draw '{}': unit {} unbound; using fallback.", draw.label, slot.unit);
                    None
                }
            };
            resolved.cube = cube.or_else(|| assets.cube_map(assets.fallback_cube_map));
            continue;
        }

        let own = material.and_then(|m| match slot.role {
            UnitRole::Diffuse => m.diffuse,
            UnitRole::Specular => m.specular,
            _ => None,
        });

        let texture = match (own, bound) {
            (Some(id), _) => assets.texture(id),
            (None, Some(TextureBinding::Texture2D(id))) => assets.texture(id).or_else(|| {
                warn!("Draw '{}': texture {:?} missing; using fallback.", draw.label, id);
                None
            }),
            (None, Some(TextureBinding::CubeMap(_))) => {
                warn!(
                    "Draw '{}': unit {} expects a 2D texture; using fallback.",
                    draw.label, slot.unit
                );
                None
            }
            (None, None) => {
                if warn_unbound {
                    warn!("Draw '{}': unit {} unbound; using fallback.", draw.label, slot.unit);
                }
                None
            }
        };

        if let Some(unit) = resolved.units.get_mut(slot.unit) {
            *unit = texture.or_else(|| assets.texture(assets.fallback_texture));
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render_state::{CullMode, DepthFunc};
    use crate::io::config::Config;
    use crate::pipeline::composer::FrameComposer;
    use crate::scene::assets::{MeshId, SceneTexture};
    use crate::scene::mesh::CubeFace;
    use crate::scene::trees::TreeInstanceList;
    use crate::scene::viewer::ViewerState;
    use nalgebra::Matrix4;

    fn setup() -> (SceneAssets, ViewerState, ProgramTable, FrameComposer) {
        let assets = SceneAssets::placeholder();
        let viewer = ViewerState::new(&Config::default(), TreeInstanceList::scatter(Some(11)));
        (assets, viewer, ProgramTable::new(), FrameComposer::new(4.0 / 3.0, 0.1, 100.0))
    }

    #[test]
    fn frame_restores_baseline_state() {
        let (assets, viewer, mut programs, mut composer) = setup();
        let mut renderer = Renderer::new(64, 48, 1);
        let plan = composer.compose(&mut programs, &viewer, &assets);

        let stats = renderer.render_frame(&plan, &mut programs, &assets);
        assert_eq!(stats.draw_calls, plan.draws.len());
        assert!(stats.state_changes >= 4);
        assert!(stats.triangles > 0);

        let state = renderer.rasterizer.state();
        assert_eq!(state.cull, CullMode::Back);
        assert_eq!(state.depth, DepthFunc::Less);
    }

    #[test]
    fn program_switches_count_runs() {
        let (assets, viewer, mut programs, mut composer) = setup();
        let mut renderer = Renderer::new(16, 12, 1);
        let plan = composer.compose(&mut programs, &viewer, &assets);
        let stats = renderer.render_frame(&plan, &mut programs, &assets);

        let runs = 1 + plan
            .draws
            .windows(2)
            .filter(|w| w[0].program != w[1].program)
            .count();
        assert_eq!(stats.program_switches, runs);
    }

    #[test]
    fn wrong_texture_kind_falls_back() {
        let assets = SceneAssets::placeholder();
        let draw = DrawCall {
            label: "sky with a flat texture".to_string(),
            program: ProgramKind::Skybox,
            target: DrawTarget::Mesh(assets.builtin.skybox),
            model: Matrix4::identity(),
            textures: vec![(0, TextureBinding::Texture2D(assets.scene_texture(SceneTexture::Wall)))],
            state: RenderState::skybox(),
        };
        let units = resolve_units(&draw, None, &assets, true);
        assert!(units.cube.is_some());

        let draw = DrawCall {
            program: ProgramKind::Room,
            target: DrawTarget::Mesh(assets.builtin.face(CubeFace::PosZ)),
            textures: vec![(0, TextureBinding::CubeMap(assets.sky))],
            ..draw
        };
        let units = resolve_units(&draw, None, &assets, true);
        assert!(units.units[0].is_some() && units.units[1].is_some());
    }

    #[test]
    fn missing_mesh_is_skipped() {
        let (assets, viewer, mut programs, mut composer) = setup();
        let mut renderer = Renderer::new(8, 8, 1);
        let mut plan = composer.compose(&mut programs, &viewer, &assets);
        plan.draws.truncate(1);
        plan.draws[0].target = DrawTarget::Mesh(MeshId(usize::MAX));

        let stats = renderer.render_frame(&plan, &mut programs, &assets);
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.triangles, 0);
    }
}
