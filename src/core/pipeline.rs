use crate::core::geometry::Vertex;
use nalgebra::{Vector2, Vector4};
use std::ops::{Add, Mul};

/// Trait for types that can be linearly interpolated across a triangle's surface.
///
/// Requirements:
/// - Copy + Clone: cheaply duplicable values for per-vertex storage and interpolation.
/// - Add + Mul<f32>: support linear combination (a + b * t) used by barycentric interpolation.
/// - Send + Sync: safe to use from multiple threads during parallel rasterization.
pub trait Interpolatable:
    Copy + Clone + Add<Output = Self> + Mul<f32, Output = Self> + Send + Sync
{
    /// UV coordinates carried by the varying, if any.
    fn uv(&self) -> Option<Vector2<f32>> {
        None
    }
}

/// Shader represents the programmable stages of the pipeline.
///
/// A shader value is built per draw call from the program's uniforms and the
/// textures bound to its units, then shared read-only by the pixel workers.
pub trait Shader: Send + Sync {
    /// Per-vertex varying data to be interpolated and provided to the fragment shader.
    type Varying: Interpolatable;

    /// Vertex shader stage.
    ///
    /// Returns the homogeneous clip-space position and the varying for this vertex.
    fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, Self::Varying);

    /// Fragment shader stage.
    ///
    /// Returns linear RGB plus alpha. Alpha only matters under
    /// `BlendMode::Alpha`; a fragment with alpha <= 0 is discarded.
    fn fragment(&self, varying: Self::Varying) -> Vector4<f32>;
}
