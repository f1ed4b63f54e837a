use crate::core::geometry::Vertex;
use nalgebra::{Point3, Vector2, Vector3};

/// A collection of vertices and indices representing a 3D object.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// List of vertices.
    pub vertices: Vec<Vertex>,
    /// List of indices defining triangles (3 indices per triangle).
    pub indices: Vec<u32>,
    /// Index into the owning model's materials, if it has one.
    pub material_id: Option<usize>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            material_id: None,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterates triangles as vertex triples. Out-of-range indices are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [&Vertex; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            Some([
                self.vertices.get(tri[0] as usize)?,
                self.vertices.get(tri[1] as usize)?,
                self.vertices.get(tri[2] as usize)?,
            ])
        })
    }

    /// Builds an unindexed-style mesh from a flat triangle list.
    fn from_triangle_list(vertices: Vec<Vertex>) -> Self {
        let indices = (0..vertices.len() as u32).collect();
        Self::new(vertices, indices)
    }
}

/// One face of the unit cube centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeFace {
    NegZ,
    PosZ,
    NegX,
    PosX,
    /// Floor.
    NegY,
    /// Ceiling.
    PosY,
}

impl CubeFace {
    fn corners(self) -> ([[f32; 3]; 4], [f32; 3]) {
        match self {
            CubeFace::NegZ => (
                [[-0.5, -0.5, -0.5], [0.5, -0.5, -0.5], [0.5, 0.5, -0.5], [-0.5, 0.5, -0.5]],
                [0.0, 0.0, -1.0],
            ),
            CubeFace::PosZ => (
                [[-0.5, -0.5, 0.5], [0.5, -0.5, 0.5], [0.5, 0.5, 0.5], [-0.5, 0.5, 0.5]],
                [0.0, 0.0, 1.0],
            ),
            CubeFace::NegX => (
                [[-0.5, 0.5, 0.5], [-0.5, 0.5, -0.5], [-0.5, -0.5, -0.5], [-0.5, -0.5, 0.5]],
                [-1.0, 0.0, 0.0],
            ),
            CubeFace::PosX => (
                [[0.5, 0.5, 0.5], [0.5, 0.5, -0.5], [0.5, -0.5, -0.5], [0.5, -0.5, 0.5]],
                [1.0, 0.0, 0.0],
            ),
            CubeFace::NegY => (
                [[-0.5, -0.5, -0.5], [0.5, -0.5, -0.5], [0.5, -0.5, 0.5], [-0.5, -0.5, 0.5]],
                [0.0, -1.0, 0.0],
            ),
            CubeFace::PosY => (
                [[-0.5, 0.5, -0.5], [0.5, 0.5, -0.5], [0.5, 0.5, 0.5], [-0.5, 0.5, 0.5]],
                [0.0, 1.0, 0.0],
            ),
        }
    }
}

const QUAD_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// A single textured cube face (two triangles).
pub fn cube_face(face: CubeFace) -> Mesh {
    let (corners, normal) = face.corners();
    let normal = Vector3::from(normal);
    let vertices = corners
        .iter()
        .zip(QUAD_UVS)
        .map(|(p, uv)| Vertex::new(Point3::from(*p), normal, Vector2::from(uv)))
        .collect();
    Mesh::new(vertices, QUAD_INDICES.to_vec())
}

/// Position-only cube of half-extent 1, wound so that its faces are back
/// facing when seen from inside.
pub fn skybox_cube() -> Mesh {
    #[rustfmt::skip]
    const POSITIONS: [[f32; 3]; 36] = [
        [-1.0,  1.0, -1.0], [-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0],
        [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [-1.0,  1.0, -1.0],

        [-1.0, -1.0,  1.0], [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0],
        [-1.0,  1.0, -1.0], [-1.0,  1.0,  1.0], [-1.0, -1.0,  1.0],

        [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0],
        [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0], [ 1.0, -1.0, -1.0],

        [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0], [ 1.0,  1.0,  1.0],
        [ 1.0,  1.0,  1.0], [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0],

        [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0,  1.0,  1.0],
        [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0],

        [-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0, -1.0],
        [ 1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0],
    ];

    Mesh::from_triangle_list(POSITIONS.iter().map(|&[x, y, z]| Vertex::at(x, y, z)).collect())
}

/// Ground quad spanning [-1, 1] on x and z at y = 0, texture repeated 50 times.
pub fn platform() -> Mesh {
    let up = Vector3::y();
    let v = |x: f32, z: f32, u: f32, t: f32| Vertex::new(Point3::new(x, 0.0, z), up, Vector2::new(u, t));
    Mesh::from_triangle_list(vec![
        v(1.0, 1.0, 50.0, 0.0),
        v(-1.0, 1.0, 0.0, 0.0),
        v(-1.0, -1.0, 0.0, 50.0),
        v(1.0, 1.0, 50.0, 0.0),
        v(-1.0, -1.0, 0.0, 50.0),
        v(1.0, -1.0, 50.0, 50.0),
    ])
}

/// The four sloped sides of a pyramid in the unit cube, thatch repeated 25 times.
pub fn roof() -> Mesh {
    let apex = |n: Vector3<f32>| Vertex::new(Point3::new(0.0, 0.5, 0.0), n, Vector2::new(12.5, 25.0));
    let v = |x: f32, z: f32, n: Vector3<f32>, u: f32, t: f32| {
        Vertex::new(Point3::new(x, -0.5, z), n, Vector2::new(u, t))
    };
    let (nz, pz, nx, px) = (-Vector3::z(), Vector3::z(), -Vector3::x(), Vector3::x());

    Mesh::from_triangle_list(vec![
        v(-0.5, -0.5, nz, 0.0, 0.0),
        v(0.5, -0.5, nz, 25.0, 0.0),
        apex(nz),
        v(-0.5, 0.5, pz, 0.0, 0.0),
        v(0.5, 0.5, pz, 25.0, 0.0),
        apex(pz),
        v(-0.5, -0.5, nx, 0.0, 25.0),
        v(-0.5, 0.5, nx, 0.0, 0.0),
        apex(nx),
        v(0.5, -0.5, px, 0.0, 25.0),
        v(0.5, 0.5, px, 0.0, 0.0),
        apex(px),
    ])
}

/// One stone path tile: a quad in [-1, 1] on x and z at y = 0 with a
/// tangent frame for normal mapping.
pub fn path_tile() -> Mesh {
    let up = Vector3::y();
    let corners = [
        Vertex::new(Point3::new(1.0, 0.0, 1.0), up, Vector2::new(1.0, 0.0)),
        Vertex::new(Point3::new(-1.0, 0.0, 1.0), up, Vector2::new(0.0, 0.0)),
        Vertex::new(Point3::new(-1.0, 0.0, -1.0), up, Vector2::new(0.0, 1.0)),
        Vertex::new(Point3::new(1.0, 0.0, -1.0), up, Vector2::new(1.0, 1.0)),
    ];
    let mut mesh = Mesh::new(corners.to_vec(), vec![0, 1, 2, 0, 2, 3]);
    compute_tangents(&mut mesh);
    mesh
}

/// Fills per-vertex tangent and bitangent from position and UV deltas.
///
/// Each triangle contributes its tangent frame to its three vertices; shared
/// vertices end up with the normalized sum. Triangles with a degenerate UV
/// mapping contribute nothing.
pub fn compute_tangents(mesh: &mut Mesh) {
    let mut tangents = vec![Vector3::zeros(); mesh.vertices.len()];
    let mut bitangents = vec![Vector3::zeros(); mesh.vertices.len()];

    for tri in mesh.indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (Some(v0), Some(v1), Some(v2)) =
            (mesh.vertices.get(i0), mesh.vertices.get(i1), mesh.vertices.get(i2))
        else {
            continue;
        };

        let edge1 = v1.position - v0.position;
        let edge2 = v2.position - v0.position;
        let duv1 = v1.texcoord - v0.texcoord;
        let duv2 = v2.texcoord - v0.texcoord;

        let det = duv1.x * duv2.y - duv2.x * duv1.y;
        if det.abs() < 1e-12 {
            continue;
        }
        let f = 1.0 / det;

        let tangent = (edge1 * duv2.y - edge2 * duv1.y) * f;
        let bitangent = (edge2 * duv1.x - edge1 * duv2.x) * f;

        for i in [i0, i1, i2] {
            tangents[i] += tangent;
            bitangents[i] += bitangent;
        }
    }

    for ((vertex, t), b) in mesh.vertices.iter_mut().zip(tangents).zip(bitangents) {
        vertex.tangent = t.try_normalize(1e-12).unwrap_or_else(Vector3::zeros);
        vertex.bitangent = b.try_normalize(1e-12).unwrap_or_else(Vector3::zeros);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn path_tangent_frame_follows_uv_axes() {
        let tile = path_tile();
        for v in &tile.vertices {
            assert_relative_eq!(v.tangent, Vector3::x(), epsilon = 1e-6);
            assert_relative_eq!(v.bitangent, -Vector3::z(), epsilon = 1e-6);
            assert_relative_eq!(v.tangent.cross(&v.bitangent), v.normal, epsilon = 1e-6);
        }
    }

    #[test]
    fn degenerate_uvs_leave_tangents_zero() {
        let n = Vector3::y();
        let mut mesh = Mesh::new(
            vec![
                Vertex::new(Point3::new(0.0, 0.0, 0.0), n, Vector2::zeros()),
                Vertex::new(Point3::new(1.0, 0.0, 0.0), n, Vector2::zeros()),
                Vertex::new(Point3::new(0.0, 0.0, 1.0), n, Vector2::zeros()),
            ],
            vec![0, 1, 2],
        );
        compute_tangents(&mut mesh);
        assert!(mesh.vertices.iter().all(|v| v.tangent == Vector3::zeros()));
    }

    #[test]
    fn builder_triangle_counts() {
        assert_eq!(skybox_cube().triangle_count(), 12);
        assert_eq!(platform().triangle_count(), 2);
        assert_eq!(roof().triangle_count(), 4);
        assert_eq!(path_tile().triangle_count(), 2);
        assert_eq!(cube_face(CubeFace::NegY).triangle_count(), 2);
    }

    #[test]
    fn cube_face_normals_point_along_axis() {
        let floor = cube_face(CubeFace::NegY);
        assert!(floor.vertices.iter().all(|v| v.position.y == -0.5));
        assert!(floor.vertices.iter().all(|v| v.normal == -Vector3::y()));
    }

    #[test]
    fn triangles_skips_out_of_range_indices() {
        let mut mesh = platform();
        mesh.indices.extend([0, 1, 99]);
        assert_eq!(mesh.triangles().count(), 2);
    }
}
