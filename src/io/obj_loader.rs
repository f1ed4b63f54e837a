use crate::core::geometry::Vertex;
use crate::scene::assets::AssetError;
use crate::scene::mesh::Mesh;
use log::{info, warn};
use nalgebra::{Point3, Vector2, Vector3};
use std::path::{Path, PathBuf};

/// Texture files named by an OBJ's material library, resolved against the
/// OBJ's directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjMaterial {
    pub name: String,
    pub diffuse: Option<PathBuf>,
    pub specular: Option<PathBuf>,
}

/// Meshes of one OBJ file, one per object/group, with material indices.
#[derive(Debug, Clone, Default)]
pub struct ObjModel {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<ObjMaterial>,
}

/// Loads an OBJ file, keeping each sub-mesh separate so it can carry its
/// own material.
pub fn load_obj(path: &Path) -> Result<ObjModel, AssetError> {
    info!("Loading OBJ file: {}", path.display());

    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: true, // Unifies indices for Position/Normal/UV
        ..Default::default()
    };

    let (models, materials) =
        tobj::load_obj(path, &load_options).map_err(|source| AssetError::Obj {
            path: path.display().to_string(),
            source,
        })?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    let materials = match materials {
        Ok(materials) => materials
            .into_iter()
            .map(|m| ObjMaterial {
                diffuse: m.diffuse_texture.map(|t| base_dir.join(t)),
                specular: m.specular_texture.map(|t| base_dir.join(t)),
                name: m.name,
            })
            .collect(),
        Err(e) => {
            warn!("No usable material library for '{}': {}", path.display(), e);
            Vec::new()
        }
    };

    let meshes: Vec<Mesh> = models
        .into_iter()
        .map(|model| {
            let mesh = &model.mesh;
            if mesh.normals.is_empty() {
                warn!(
                    "Mesh '{}' is missing normals. Using default (0, 1, 0).",
                    model.name
                );
            }
            let mut out = Mesh::new(convert_vertices(mesh), mesh.indices.clone());
            out.material_id = mesh.material_id;
            out
        })
        .collect();

    info!(
        "OBJ loaded: {} meshes, {} triangles, {} materials",
        meshes.len(),
        meshes.iter().map(Mesh::triangle_count).sum::<usize>(),
        materials.len()
    );

    Ok(ObjModel { meshes, materials })
}

fn convert_vertices(mesh: &tobj::Mesh) -> Vec<Vertex> {
    let has_normals = !mesh.normals.is_empty();
    let has_texcoords = !mesh.texcoords.is_empty();

    mesh.positions
        .chunks_exact(3)
        .enumerate()
        .map(|(i, p)| {
            let normal = if has_normals {
                Vector3::new(
                    mesh.normals[i * 3],
                    mesh.normals[i * 3 + 1],
                    mesh.normals[i * 3 + 2],
                )
            } else {
                Vector3::y()
            };
            let texcoord = if has_texcoords {
                Vector2::new(mesh.texcoords[i * 2], mesh.texcoords[i * 2 + 1])
            } else {
                Vector2::zeros()
            };
            Vertex::new(Point3::new(p[0], p[1], p[2]), normal, texcoord)
        })
        .collect()
}
