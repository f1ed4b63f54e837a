use crate::core::geometry::Vertex;
use crate::core::pipeline::{Interpolatable, Shader};
use crate::pipeline::programs::ProgramUniforms;
use crate::scene::texture::CubeMap;
use nalgebra::{Matrix4, Vector3, Vector4};
use std::ops::{Add, Mul};

/// Cube map lookup direction.
#[derive(Clone, Copy, Debug)]
pub struct SkyboxVarying(pub Vector3<f32>);

impl Add for SkyboxVarying {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl Mul<f32> for SkyboxVarying {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self(self.0 * scalar)
    }
}

impl Interpolatable for SkyboxVarying {}

/// Draws the sky cube at the far plane. Expects the program's view matrix
/// to have no translation.
pub struct SkyboxShader<'a> {
    view_projection: Matrix4<f32>,
    cube_map: &'a CubeMap,
}

impl<'a> SkyboxShader<'a> {
    pub fn new(uniforms: &ProgramUniforms, cube_map: &'a CubeMap) -> Self {
        Self {
            view_projection: uniforms.projection * uniforms.view,
            cube_map,
        }
    }
}

impl Shader for SkyboxShader<'_> {
    type Varying = SkyboxVarying;

    fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, Self::Varying) {
        let clip = self.view_projection * vertex.position.to_homogeneous();
        // z = w puts every sky fragment at depth 1.0.
        (
            Vector4::new(clip.x, clip.y, clip.w, clip.w),
            SkyboxVarying(vertex.position.coords),
        )
    }

    fn fragment(&self, varying: Self::Varying) -> Vector4<f32> {
        let rgb = self.cube_map.sample(&varying.0);
        Vector4::new(rgb.x, rgb.y, rgb.z, 1.0)
    }
}
