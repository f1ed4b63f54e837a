use crate::scene::assets::TextureId;
use crate::scene::mesh::Mesh;

/// Texture maps a model brings for its own meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModelMaterial {
    pub diffuse: Option<TextureId>,
    pub specular: Option<TextureId>,
}

/// A Model represents a complete 3D object.
/// It consists of one or more Meshes and a list of Materials.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<ModelMaterial>,
}

impl Model {
    pub fn new(meshes: Vec<Mesh>, materials: Vec<ModelMaterial>) -> Self {
        Self { meshes, materials }
    }

    /// The material a mesh refers to, when the index is valid.
    pub fn material_for(&self, mesh: &Mesh) -> Option<&ModelMaterial> {
        mesh.material_id.and_then(|id| self.materials.get(id))
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(Mesh::triangle_count).sum()
    }
}
