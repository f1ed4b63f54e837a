use crate::core::geometry::Vertex;
use crate::io::config::AssetsConfig;
use crate::io::obj_loader::load_obj;
use crate::scene::mesh::{self, CubeFace, Mesh};
use crate::scene::model::{Model, ModelMaterial};
use crate::scene::placement::Prop;
use crate::scene::texture::{CUBE_FACE_NAMES, ColorSpace, CubeMap, Texture};
use log::{error, info, warn};
use nalgebra::{Point3, Vector3};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to load image '{path}': {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to load model '{path}': {source}")]
    Obj {
        path: String,
        #[source]
        source: tobj::LoadError,
    },
    #[error("cube map face '{path}' is {found:?}, expected {expected:?}")]
    CubeFaceSize {
        path: String,
        found: (u32, u32),
        expected: (u32, u32),
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CubeMapId(pub usize);

/// Image maps used by the hand-built scene geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SceneTexture {
    Wall,
    Floor,
    GrassDiffuse,
    GrassSpecular,
    Roof,
    /// Pane on the +x wall.
    Window,
    /// Pane on the back (-z) wall.
    BackWindow,
    PathDiffuse,
    PathNormal,
    PathHeight,
}

impl SceneTexture {
    pub const ALL: [SceneTexture; 10] = [
        SceneTexture::Wall,
        SceneTexture::Floor,
        SceneTexture::GrassDiffuse,
        SceneTexture::GrassSpecular,
        SceneTexture::Roof,
        SceneTexture::Window,
        SceneTexture::BackWindow,
        SceneTexture::PathDiffuse,
        SceneTexture::PathNormal,
        SceneTexture::PathHeight,
    ];

    /// Key used in the `[assets.textures]` config table.
    pub fn name(self) -> &'static str {
        match self {
            SceneTexture::Wall => "wall",
            SceneTexture::Floor => "floor",
            SceneTexture::GrassDiffuse => "grass_diffuse",
            SceneTexture::GrassSpecular => "grass_specular",
            SceneTexture::Roof => "roof",
            SceneTexture::Window => "window",
            SceneTexture::BackWindow => "back_window",
            SceneTexture::PathDiffuse => "path_diffuse",
            SceneTexture::PathNormal => "path_normal",
            SceneTexture::PathHeight => "path_height",
        }
    }

    pub fn default_path(self) -> &'static str {
        match self {
            SceneTexture::Wall => "textures/wall/wood_plank_wall_diff_4k.jpg",
            SceneTexture::Floor => "textures/floor/laminate_floor_02_diff_4k.jpg",
            SceneTexture::GrassDiffuse => "textures/grass/forrest_ground_01_diff_4k.jpg",
            SceneTexture::GrassSpecular => "textures/grass/forrest_ground_01_spec_4k.jpg",
            SceneTexture::Roof => "textures/roof/thatch_roof_angled_diff_4k.jpg",
            SceneTexture::Window => "textures/window/window.png",
            SceneTexture::BackWindow => "textures/window/prozor1.png",
            SceneTexture::PathDiffuse => "textures/path/concrete_rock_path_diff_4k.jpg",
            SceneTexture::PathNormal => "textures/path/concrete_rock_path_nor_gl_4k.jpg",
            SceneTexture::PathHeight => "textures/path/concrete_rock_path_disp_4k.png",
        }
    }

    pub fn color_space(self) -> ColorSpace {
        match self {
            SceneTexture::PathNormal | SceneTexture::PathHeight => ColorSpace::Linear,
            _ => ColorSpace::Srgb,
        }
    }

    /// Stand-in colour when the file is missing.
    fn fallback_rgba(self) -> [u8; 4] {
        match self {
            SceneTexture::Wall => [150, 105, 70, 255],
            SceneTexture::Floor => [180, 140, 95, 255],
            SceneTexture::GrassDiffuse => [60, 95, 45, 255],
            SceneTexture::GrassSpecular => [20, 20, 20, 255],
            SceneTexture::Roof => [170, 145, 80, 255],
            SceneTexture::Window | SceneTexture::BackWindow => [185, 210, 230, 90],
            SceneTexture::PathDiffuse => [125, 120, 115, 255],
            // Flat tangent-space normal.
            SceneTexture::PathNormal => [128, 128, 255, 255],
            SceneTexture::PathHeight => [0, 0, 0, 255],
        }
    }
}

/// Meshes built in code rather than loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinMeshes {
    faces: [MeshId; 6],
    pub skybox: MeshId,
    pub platform: MeshId,
    pub roof: MeshId,
    pub path_tile: MeshId,
}

impl BuiltinMeshes {
    pub fn face(&self, face: CubeFace) -> MeshId {
        self.faces[face_slot(face)]
    }
}

fn face_slot(face: CubeFace) -> usize {
    match face {
        CubeFace::NegZ => 0,
        CubeFace::PosZ => 1,
        CubeFace::NegX => 2,
        CubeFace::PosX => 3,
        CubeFace::NegY => 4,
        CubeFace::PosY => 5,
    }
}

const ALL_FACES: [CubeFace; 6] = [
    CubeFace::NegZ,
    CubeFace::PosZ,
    CubeFace::NegX,
    CubeFace::PosX,
    CubeFace::NegY,
    CubeFace::PosY,
];

/// Every resource the frame draws from, addressed by typed handles.
pub struct SceneAssets {
    meshes: Vec<Mesh>,
    models: Vec<Model>,
    textures: Vec<Texture>,
    cube_maps: Vec<CubeMap>,

    pub builtin: BuiltinMeshes,
    props: BTreeMap<Prop, ModelId>,
    scene_textures: BTreeMap<SceneTexture, TextureId>,
    pub sky: CubeMapId,
    /// White, bound when a unit would otherwise be empty or mismatched.
    pub fallback_texture: TextureId,
    pub fallback_cube_map: CubeMapId,
}

impl SceneAssets {
    /// The whole tableau with generated stand-ins and no file I/O.
    pub fn placeholder() -> Self {
        let mut assets = Self::with_builtins();
        for prop in Prop::ALL {
            let model = assets.placeholder_model(prop);
            let id = assets.add_model(model);
            assets.props.insert(prop, id);
        }
        for tex in SceneTexture::ALL {
            let id = assets.add_texture(Texture::solid(tex.fallback_rgba(), tex.color_space()));
            assets.scene_textures.insert(tex, id);
        }
        assets.sky = assets.add_cube_map(night_sky());
        assets
    }

    /// Loads models, textures and the sky from disk. Anything that fails to
    /// load is logged and replaced by its placeholder.
    pub fn load(config: &AssetsConfig) -> Self {
        if !config.enabled {
            info!("Asset loading disabled; using placeholder scene.");
            return Self::placeholder();
        }

        let root = Path::new(&config.root);
        let mut assets = Self::with_builtins();

        for prop in Prop::ALL {
            let path = resolve(root, config.models.get(prop.name()), prop.default_path());
            let model = match assets.load_model(&path) {
                Ok(model) => model,
                Err(e) => {
                    error!("{}. Using placeholder for '{}'.", e, prop.name());
                    assets.placeholder_model(prop)
                }
            };
            let id = assets.add_model(model);
            assets.props.insert(prop, id);
        }

        for tex in SceneTexture::ALL {
            let path = resolve(root, config.textures.get(tex.name()), tex.default_path());
            let texture = Texture::load(&path, tex.color_space()).unwrap_or_else(|e| {
                warn!("{}. Using flat colour for '{}'.", e, tex.name());
                Texture::solid(tex.fallback_rgba(), tex.color_space())
            });
            let id = assets.add_texture(texture);
            assets.scene_textures.insert(tex, id);
        }

        let sky_dir = root.join(&config.skybox_dir);
        let faces = CUBE_FACE_NAMES.map(|name| sky_dir.join(format!("{name}.jpg")));
        let sky = CubeMap::load(&faces).unwrap_or_else(|e| {
            warn!("{}. Using flat night sky.", e);
            night_sky()
        });
        assets.sky = assets.add_cube_map(sky);

        info!(
            "Assets ready: {} meshes, {} models, {} textures",
            assets.meshes.len(),
            assets.models.len(),
            assets.textures.len()
        );
        assets
    }

    fn with_builtins() -> Self {
        let mut assets = Self {
            meshes: Vec::new(),
            models: Vec::new(),
            textures: Vec::new(),
            cube_maps: Vec::new(),
            builtin: BuiltinMeshes {
                faces: [MeshId(0); 6],
                skybox: MeshId(0),
                platform: MeshId(0),
                roof: MeshId(0),
                path_tile: MeshId(0),
            },
            props: BTreeMap::new(),
            scene_textures: BTreeMap::new(),
            sky: CubeMapId(0),
            fallback_texture: TextureId(0),
            fallback_cube_map: CubeMapId(0),
        };

        for face in ALL_FACES {
            assets.builtin.faces[face_slot(face)] = assets.add_mesh(mesh::cube_face(face));
        }
        assets.builtin.skybox = assets.add_mesh(mesh::skybox_cube());
        assets.builtin.platform = assets.add_mesh(mesh::platform());
        assets.builtin.roof = assets.add_mesh(mesh::roof());
        assets.builtin.path_tile = assets.add_mesh(mesh::path_tile());

        assets.fallback_texture = assets.add_texture(Texture::solid([255; 4], ColorSpace::Srgb));
        assets.fallback_cube_map = assets.add_cube_map(CubeMap::solid([0, 0, 0]));
        assets
    }

    fn load_model(&mut self, path: &Path) -> Result<Model, AssetError> {
        let obj = load_obj(path)?;
        let materials = obj
            .materials
            .iter()
            .map(|m| ModelMaterial {
                diffuse: m.diffuse.as_deref().and_then(|p| self.load_material_texture(p)),
                specular: m.specular.as_deref().and_then(|p| self.load_material_texture(p)),
            })
            .collect();
        Ok(Model::new(obj.meshes, materials))
    }

    fn load_material_texture(&mut self, path: &Path) -> Option<TextureId> {
        match Texture::load(path, ColorSpace::Srgb) {
            Ok(tex) => Some(self.add_texture(tex)),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    fn placeholder_model(&mut self, prop: Prop) -> Model {
        let (half, rgba) = match prop {
            Prop::Tree => (Vector3::new(0.6, 2.5, 0.6), [40, 80, 35, 255]),
            Prop::Rug => (Vector3::new(1.0, 0.01, 0.7), [120, 40, 40, 255]),
            Prop::Lamp => (Vector3::new(0.1, 0.2, 0.1), [230, 220, 170, 255]),
            _ => (Vector3::new(0.5, 0.5, 0.5), [110, 80, 55, 255]),
        };
        let diffuse = self.add_texture(Texture::solid(rgba, ColorSpace::Srgb));
        let mut body = standing_box(half);
        body.material_id = Some(0);
        Model::new(
            vec![body],
            vec![ModelMaterial {
                diffuse: Some(diffuse),
                specular: None,
            }],
        )
    }

    fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    fn add_model(&mut self, model: Model) -> ModelId {
        self.models.push(model);
        ModelId(self.models.len() - 1)
    }

    fn add_texture(&mut self, texture: Texture) -> TextureId {
        self.textures.push(texture);
        TextureId(self.textures.len() - 1)
    }

    fn add_cube_map(&mut self, cube_map: CubeMap) -> CubeMapId {
        self.cube_maps.push(cube_map);
        CubeMapId(self.cube_maps.len() - 1)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.models.get(id.0)
    }

    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id.0)
    }

    pub fn cube_map(&self, id: CubeMapId) -> Option<&CubeMap> {
        self.cube_maps.get(id.0)
    }

    pub fn prop(&self, prop: Prop) -> Option<ModelId> {
        self.props.get(&prop).copied()
    }

    pub fn scene_texture(&self, tex: SceneTexture) -> TextureId {
        self.scene_textures
            .get(&tex)
            .copied()
            .unwrap_or(self.fallback_texture)
    }
}

fn resolve(root: &Path, configured: Option<&String>, default: &str) -> PathBuf {
    root.join(configured.map(String::as_str).unwrap_or(default))
}

fn night_sky() -> CubeMap {
    CubeMap::solid([12, 16, 38])
}

/// Axis-aligned box resting on y = 0, built from the six cube faces.
fn standing_box(half: Vector3<f32>) -> Mesh {
    let mut vertices: Vec<Vertex> = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for face in ALL_FACES {
        let quad = mesh::cube_face(face);
        let base = vertices.len() as u32;
        vertices.extend(quad.vertices.iter().map(|v| {
            let p = v.position.coords.component_mul(&(half * 2.0));
            Vertex {
                position: Point3::new(p.x, p.y + half.y, p.z),
                ..*v
            }
        }));
        indices.extend(quad.indices.iter().map(|i| base + i));
    }

    Mesh::new(vertices, indices)
}
