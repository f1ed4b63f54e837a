use nalgebra::{Point3, Vector2, Vector3};

/// Represents a single vertex in 3D space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in local object space.
    pub position: Point3<f32>,
    /// Normal vector for lighting calculations.
    pub normal: Vector3<f32>,
    /// Texture coordinates (UV).
    pub texcoord: Vector2<f32>,
    /// Tangent-space basis for normal mapping. Zero when the mesh never had
    /// tangents computed.
    pub tangent: Vector3<f32>,
    pub bitangent: Vector3<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, texcoord: Vector2<f32>) -> Self {
        Self {
            position,
            normal,
            texcoord,
            tangent: Vector3::zeros(),
            bitangent: Vector3::zeros(),
        }
    }

    /// Position-only vertex (skybox).
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self::new(Point3::new(x, y, z), Vector3::zeros(), Vector2::zeros())
    }
}
