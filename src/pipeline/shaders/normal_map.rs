use crate::core::geometry::Vertex;
use crate::core::pipeline::{Interpolatable, Shader};
use crate::pipeline::programs::ProgramUniforms;
use crate::pipeline::shaders::lit::normal_matrix;
use crate::scene::texture::Texture;
use nalgebra::{Matrix3, Matrix4, Point3, Vector2, Vector3, Vector4};
use std::ops::{Add, Mul};

const AMBIENT: f32 = 0.1;
const SPECULAR: f32 = 0.2;
/// Keeps the parallax offset finite at grazing angles.
const MIN_VIEW_Z: f32 = 0.05;

#[derive(Clone, Copy, Debug)]
pub struct NormalMapVarying {
    pub world_pos: Vector3<f32>,
    pub uv: Vector2<f32>,
    pub tangent: Vector3<f32>,
    pub bitangent: Vector3<f32>,
    pub normal: Vector3<f32>,
}

impl Add for NormalMapVarying {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            world_pos: self.world_pos + other.world_pos,
            uv: self.uv + other.uv,
            tangent: self.tangent + other.tangent,
            bitangent: self.bitangent + other.bitangent,
            normal: self.normal + other.normal,
        }
    }
}

impl Mul<f32> for NormalMapVarying {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            world_pos: self.world_pos * scalar,
            uv: self.uv * scalar,
            tangent: self.tangent * scalar,
            bitangent: self.bitangent * scalar,
            normal: self.normal * scalar,
        }
    }
}

impl Interpolatable for NormalMapVarying {
    fn uv(&self) -> Option<Vector2<f32>> {
        Some(self.uv)
    }
}

/// Tangent-space normal mapping with a single-step parallax offset.
///
/// The bound directional light's direction vector is used as a light
/// position, so the path brightens towards that point rather than being lit
/// uniformly.
pub struct NormalMapShader<'a> {
    uniforms: &'a ProgramUniforms,
    mvp: Matrix4<f32>,
    normal_matrix: Matrix3<f32>,
    diffuse: &'a Texture,
    normal_map: &'a Texture,
    height_map: &'a Texture,
}

impl<'a> NormalMapShader<'a> {
    pub fn new(
        uniforms: &'a ProgramUniforms,
        diffuse: &'a Texture,
        normal_map: &'a Texture,
        height_map: &'a Texture,
    ) -> Self {
        Self {
            uniforms,
            mvp: uniforms.projection * uniforms.view * uniforms.model,
            normal_matrix: normal_matrix(&uniforms.model),
            diffuse,
            normal_map,
            height_map,
        }
    }

    /// Shifts `uv` along the tangent-space view direction by the sampled
    /// height times the program's height scale.
    fn parallax(&self, uv: Vector2<f32>, view_ts: &Vector3<f32>) -> Vector2<f32> {
        let height = self.height_map.sample(uv.x, uv.y).x;
        let offset = view_ts.xy() / view_ts.z.max(MIN_VIEW_Z) * (height * self.uniforms.height_scale);
        uv - offset
    }
}

impl Shader for NormalMapShader<'_> {
    type Varying = NormalMapVarying;

    fn vertex(&self, vertex: &Vertex) -> (Vector4<f32>, Self::Varying) {
        let local = vertex.position.to_homogeneous();
        let varying = NormalMapVarying {
            world_pos: (self.uniforms.model * local).xyz(),
            uv: vertex.texcoord,
            tangent: self.normal_matrix * vertex.tangent,
            bitangent: self.normal_matrix * vertex.bitangent,
            normal: self.normal_matrix * vertex.normal,
        };
        (self.mvp * local, varying)
    }

    fn fragment(&self, v: Self::Varying) -> Vector4<f32> {
        let Some(light) = &self.uniforms.lights.directional else {
            return Vector4::new(0.0, 0.0, 0.0, 1.0);
        };

        let n = v.normal.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::y);
        let t = v.tangent.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::x);
        let b = v.bitangent.try_normalize(f32::EPSILON).unwrap_or_else(|| n.cross(&t));

        let position = Point3::from(v.world_pos);
        let view_dir = (self.uniforms.view_pos - position)
            .try_normalize(f32::EPSILON)
            .unwrap_or(n);
        let view_ts = Vector3::new(view_dir.dot(&t), view_dir.dot(&b), view_dir.dot(&n));

        let uv = self.parallax(v.uv, &view_ts);
        let color = self.diffuse.sample_rgb(uv.x, uv.y);

        let mapped = self.normal_map.sample_rgb(uv.x, uv.y) * 2.0 - Vector3::repeat(1.0);
        let normal = (t * mapped.x + b * mapped.y + n * mapped.z)
            .try_normalize(f32::EPSILON)
            .unwrap_or(n);

        let light_pos = Point3::from(light.direction);
        let light_dir = (light_pos - position)
            .try_normalize(f32::EPSILON)
            .unwrap_or(normal);

        let ambient = color * AMBIENT;
        let diffuse = color * light_dir.dot(&normal).max(0.0);
        let halfway = (light_dir + view_dir).try_normalize(f32::EPSILON).unwrap_or(normal);
        let spec = normal.dot(&halfway).max(0.0).powf(self.uniforms.shininess);
        let specular = Vector3::repeat(SPECULAR * spec);

        let rgb = ambient + diffuse + specular;
        Vector4::new(rgb.x, rgb.y, rgb.z, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::programs::{ProgramKind, ProgramTable};
    use crate::scene::light::LightRig;
    use crate::scene::texture::ColorSpace;
    use approx::assert_relative_eq;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn flat_normal() -> Texture {
        Texture::solid([128, 128, 255, 255], ColorSpace::Linear)
    }

    fn varying(uv: Vector2<f32>) -> NormalMapVarying {
        NormalMapVarying {
            world_pos: Vector3::zeros(),
            uv,
            tangent: Vector3::x(),
            bitangent: -Vector3::z(),
            normal: Vector3::y(),
        }
    }

    #[test]
    fn zero_height_scale_leaves_uv_alone() {
        let uniforms = ProgramUniforms::default();
        let (d, n) = (flat_normal(), flat_normal());
        let h = Texture::solid([255; 4], ColorSpace::Linear);
        let shader = NormalMapShader::new(&uniforms, &d, &n, &h);

        let uv = Vector2::new(0.3, 0.7);
        let out = shader.parallax(uv, &Vector3::new(0.5, 0.5, 0.7).normalize());
        assert_eq!(out, uv);
    }

    #[test]
    fn parallax_shifts_against_view_direction() {
        let uniforms = ProgramUniforms {
            height_scale: 0.1,
            ..ProgramUniforms::default()
        };
        let (d, n) = (flat_normal(), flat_normal());
        let h = Texture::solid([255; 4], ColorSpace::Linear);
        let shader = NormalMapShader::new(&uniforms, &d, &n, &h);

        let view_ts = Vector3::new(1.0, 0.0, 1.0).normalize();
        let out = shader.parallax(Vector2::new(0.5, 0.5), &view_ts);
        assert_relative_eq!(out, Vector2::new(0.4, 0.5), epsilon = 1e-6);
    }

    #[test]
    fn no_directional_light_is_black() {
        let uniforms = ProgramUniforms::default();
        let (d, n, h) = (flat_normal(), flat_normal(), flat_normal());
        let shader = NormalMapShader::new(&uniforms, &d, &n, &h);
        assert_eq!(
            shader.fragment(varying(Vector2::new(0.5, 0.5))),
            Vector4::new(0.0, 0.0, 0.0, 1.0)
        );
    }

    #[test]
    fn lit_path_is_brighter_than_ambient() {
        let mut table = ProgramTable::new();
        table.bind_lights(ProgramKind::NormalMapped, &LightRig::default());
        let uniforms = table.get(ProgramKind::NormalMapped);

        let grey = Texture::from_image(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([128, 128, 128, 255]))),
            crate::scene::texture::WrapMode::Repeat,
            ColorSpace::Linear,
        );
        let (n, h) = (flat_normal(), Texture::solid([0, 0, 0, 255], ColorSpace::Linear));
        let shader = NormalMapShader::new(uniforms, &grey, &n, &h);

        let rgba = shader.fragment(varying(Vector2::new(0.25, 0.25)));
        assert!(rgba.x > AMBIENT * 0.5);
        assert_eq!(rgba.w, 1.0);
    }
}
