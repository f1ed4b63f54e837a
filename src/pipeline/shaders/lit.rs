use crate::core::geometry::Vertex;
use crate::core::pipeline::{Interpolatable, Shader};
use crate::pipeline::programs::ProgramUniforms;
use crate::scene::light::SurfacePoint;
use crate::scene::texture::Texture;
use nalgebra::{Matrix3, Matrix4, Point3, Vector2, Vector3, Vector4};
use std::ops::{Add, Mul};

/// Interpolated per-fragment inputs of the lit programs.
#[derive(Clone, Copy, Debug)]
pub struct LitVarying {
    /// World-space position.
    pub world_pos: Vector3<f32>,
    /// World-space normal, not normalized after interpolation.
    pub normal: Vector3<f32>,
    pub uv: Vector2<f32>,
}

impl Add for LitVarying {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            world_pos: self.world_pos + other.world_pos,
            normal: self.normal + other.normal,
            uv: self.uv + other.uv,
        }
    }
}

impl Mul<f32> for LitVarying {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            world_pos: self.world_pos * scalar,
            normal: self.normal * scalar,
            uv: self.uv * scalar,
        }
    }
}

impl Interpolatable for LitVarying {
    fn uv(&self) -> Option<Vector2<f32>> {
        Some(self.uv)
    }
}

/// Inverse-transpose of the model's linear part, for carrying normals.
pub(crate) fn normal_matrix(model: &Matrix4<f32>) -> Matrix3<f32> {
    let linear: Matrix3<f32> = model.fixed_view::<3, 3>(0, 0).into_owned();
    linear
        .try_inverse()
        .map(|inv| inv.transpose())
        .unwrap_or(linear)
}

/// Phong shading with diffuse and specular maps over whatever lights the
/// program has bound. Serves the room, inside, outside and blend programs.
pub struct LitShader<'a> {
    uniforms: &'a ProgramUniforms,
    mvp: Matrix4<f32>,
    normal_matrix: Matrix3<f32>,
    diffuse: &'a Texture,
    specular: &'a Texture,
    /// Blend program: output the diffuse map's alpha instead of 1.
    keep_alpha: bool,
}

impl<'a> LitShader<'a> {
    pub fn new(
        uniforms: &'a ProgramUniforms,
        diffuse: &'a Texture,
        specular: &'a Texture,
        keep_alpha: bool,
    ) -> Self {
        Self {
            uniforms,
            mvp: uniforms.projection * uniforms.view * uniforms.model,
            normal_matrix: normal_matrix(&uniforms.model),
            diffuse,
            specular,
            keep_alpha,
        }
    }
}

impl Shader for LitShader<'_> {
    type Varying = LitVarying;

    fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, Self::Varying) {
        let local = vertex.position.to_homogeneous();
        let world = self.uniforms.model * local;

        let varying = LitVarying {
            world_pos: world.xyz(),
            normal: self.normal_matrix * vertex.normal,
            uv: vertex.texcoord,
        };
        (self.mvp * local, varying)
    }

    fn fragment(&self, varying: Self::Varying) -> Vector4<f32> {
        let albedo = self.diffuse.sample(varying.uv.x, varying.uv.y);
        let position = Point3::from(varying.world_pos);

        let surface = SurfacePoint {
            position,
            normal: varying.normal.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::y),
            view_dir: (self.uniforms.view_pos - position)
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(Vector3::z),
            diffuse: albedo.xyz(),
            specular: self.specular.sample_rgb(varying.uv.x, varying.uv.y),
            shininess: self.uniforms.shininess,
        };

        let lights = &self.uniforms.lights;
        let mut color = Vector3::zeros();
        if let Some(dir) = &lights.directional {
            color += dir.shade(&surface);
        }
        for point in &lights.points {
            color += point.shade(&surface);
        }
        if let Some(spot) = &lights.spot {
            color += spot
                .light
                .shade_with_cutoffs(&surface, spot.cos_cut_off, spot.cos_outer_cut_off);
        }

        let alpha = if self.keep_alpha { albedo.w } else { 1.0 };
        Vector4::new(color.x, color.y, color.z, alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::programs::{ProgramKind, ProgramTable};
    use crate::scene::light::LightRig;
    use crate::scene::texture::ColorSpace;
    use approx::assert_relative_eq;

    fn white() -> Texture {
        Texture::solid([255; 4], ColorSpace::Srgb)
    }

    fn varying_at(pos: Vector3<f32>, normal: Vector3<f32>) -> LitVarying {
        LitVarying {
            world_pos: pos,
            normal,
            uv: Vector2::new(0.5, 0.5),
        }
    }

    #[test]
    fn unlit_program_is_black() {
        let uniforms = ProgramUniforms::default();
        let (d, s) = (white(), white());
        let shader = LitShader::new(&uniforms, &d, &s, false);
        let rgba = shader.fragment(varying_at(Vector3::zeros(), Vector3::y()));
        assert_eq!(rgba, Vector4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn moonlight_matches_light_model() {
        let rig = LightRig::default();
        let mut table = ProgramTable::new();
        table.bind_lights(ProgramKind::Outside, &rig);
        let uniforms = table.get(ProgramKind::Outside);

        let (d, s) = (white(), white());
        let shader = LitShader::new(uniforms, &d, &s, false);
        let v = varying_at(Vector3::zeros(), Vector3::y());
        let expected = rig.directional.as_ref().unwrap().shade(&SurfacePoint {
            position: Point3::origin(),
            normal: Vector3::y(),
            view_dir: Vector3::z(),
            diffuse: Vector3::repeat(1.0),
            specular: Vector3::repeat(1.0),
            shininess: 32.0,
        });
        // Default view position is the origin, so the view direction falls back to +z.
        assert_relative_eq!(shader.fragment(v).xyz(), expected, epsilon = 1e-5);
    }

    #[test]
    fn blend_keeps_texture_alpha() {
        let uniforms = ProgramUniforms::default();
        let pane = Texture::solid([200, 200, 200, 51], ColorSpace::Srgb);
        let s = white();
        let shader = LitShader::new(&uniforms, &pane, &s, true);
        let rgba = shader.fragment(varying_at(Vector3::zeros(), Vector3::y()));
        assert_relative_eq!(rgba.w, 0.2, epsilon = 1e-6);
    }

    #[test]
    fn normals_follow_non_uniform_scale() {
        let model = Matrix4::new_nonuniform_scaling(&Vector3::new(7.0, 3.0, 7.0));
        let n = normal_matrix(&model) * Vector3::new(1.0, 1.0, 0.0);
        // Stretching the surface along x tilts its normal towards y.
        assert!(n.x < n.y);
    }
}
