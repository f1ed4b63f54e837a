use crate::core::color::srgb_to_linear;
use crate::scene::assets::AssetError;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use log::info;
use nalgebra::{Vector3, Vector4};
use std::path::Path;
use std::sync::Arc;

/// Addressing outside [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    ClampToEdge,
}

/// How stored channel values map to shader inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Color data; RGB is decoded to linear light on sampling.
    Srgb,
    /// Normal and height maps; values are used as stored.
    Linear,
}

/// Represents a 2D texture map.
#[derive(Debug, Clone)]
pub struct Texture {
    pub image: Arc<DynamicImage>,
    pub width: u32,
    pub height: u32,
    pub wrap: WrapMode,
    pub color_space: ColorSpace,
}

impl Texture {
    /// Loads an image file. Images with an alpha channel clamp at the
    /// edges so blended borders do not pick up texels from the opposite side.
    pub fn load<P: AsRef<Path>>(path: P, color_space: ColorSpace) -> Result<Self, AssetError> {
        let path_ref = path.as_ref();
        let img = image::open(path_ref).map_err(|source| AssetError::Image {
            path: path_ref.display().to_string(),
            source,
        })?;

        let wrap = if img.color().has_alpha() {
            WrapMode::ClampToEdge
        } else {
            WrapMode::Repeat
        };

        info!("Loaded texture: {:?} ({}x{})", path_ref, img.width(), img.height());

        Ok(Self::from_image(img, wrap, color_space))
    }

    pub fn from_image(image: DynamicImage, wrap: WrapMode, color_space: ColorSpace) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            image: Arc::new(image),
            wrap,
            color_space,
        }
    }

    /// A 1x1 texture of a single RGBA colour given in 0..=255.
    pub fn solid(rgba: [u8; 4], color_space: ColorSpace) -> Self {
        let img = RgbaImage::from_pixel(1, 1, Rgba(rgba));
        Self::from_image(DynamicImage::ImageRgba8(img), WrapMode::Repeat, color_space)
    }

    /// Samples the texture using bilinear interpolation.
    ///
    /// `v = 0` addresses the first stored row. Returns RGBA with RGB in linear
    /// space for sRGB textures.
    pub fn sample(&self, u: f32, v: f32) -> Vector4<f32> {
        let x = u * self.width as f32 - 0.5;
        let y = v * self.height as f32 - 0.5;

        let x0 = x.floor() as i32;
        let y0 = y.floor() as i32;
        let wx = x - x.floor();
        let wy = y - y.floor();

        let c00 = self.texel(x0, y0);
        let c10 = self.texel(x0 + 1, y0);
        let c01 = self.texel(x0, y0 + 1);
        let c11 = self.texel(x0 + 1, y0 + 1);

        let top = c00 * (1.0 - wx) + c10 * wx;
        let bottom = c01 * (1.0 - wx) + c11 * wx;
        let texel = top * (1.0 - wy) + bottom * wy;

        match self.color_space {
            ColorSpace::Srgb => Vector4::new(
                srgb_to_linear(texel.x),
                srgb_to_linear(texel.y),
                srgb_to_linear(texel.z),
                texel.w,
            ),
            ColorSpace::Linear => texel,
        }
    }

    pub fn sample_rgb(&self, u: f32, v: f32) -> Vector3<f32> {
        self.sample(u, v).xyz()
    }

    /// Raw [0, 1] texel with the wrap mode applied.
    fn texel(&self, x: i32, y: i32) -> Vector4<f32> {
        let (w, h) = (self.width as i32, self.height as i32);
        let (x, y) = match self.wrap {
            WrapMode::Repeat => (x.rem_euclid(w), y.rem_euclid(h)),
            WrapMode::ClampToEdge => (x.clamp(0, w - 1), y.clamp(0, h - 1)),
        };

        let pixel = self.image.get_pixel(x as u32, y as u32);
        Vector4::new(
            pixel[0] as f32 / 255.0,
            pixel[1] as f32 / 255.0,
            pixel[2] as f32 / 255.0,
            pixel[3] as f32 / 255.0,
        )
    }
}

/// Order of the six faces, matching +X, -X, +Y, -Y, +Z, -Z.
pub const CUBE_FACE_NAMES: [&str; 6] = ["right", "left", "top", "bottom", "front", "back"];

/// Six square faces addressed by direction.
#[derive(Debug, Clone)]
pub struct CubeMap {
    faces: [Texture; 6],
}

impl CubeMap {
    pub fn new(faces: [Texture; 6]) -> Self {
        let faces = faces.map(|mut f| {
            f.wrap = WrapMode::ClampToEdge;
            f
        });
        Self { faces }
    }

    /// Loads six faces in +X, -X, +Y, -Y, +Z, -Z order. All faces must share
    /// the first face's size.
    pub fn load<P: AsRef<Path>>(paths: &[P; 6]) -> Result<Self, AssetError> {
        let [p0, p1, p2, p3, p4, p5] = paths;
        let first = Texture::load(p0, ColorSpace::Srgb)?;
        let expected = (first.width, first.height);

        let matching = |path: &P| -> Result<Texture, AssetError> {
            let face = Texture::load(path, ColorSpace::Srgb)?;
            if (face.width, face.height) != expected {
                return Err(AssetError::CubeFaceSize {
                    path: path.as_ref().display().to_string(),
                    found: (face.width, face.height),
                    expected,
                });
            }
            Ok(face)
        };

        Ok(Self::new([
            first,
            matching(p1)?,
            matching(p2)?,
            matching(p3)?,
            matching(p4)?,
            matching(p5)?,
        ]))
    }

    /// Every face a single colour (0..=255 sRGB).
    pub fn solid(rgb: [u8; 3]) -> Self {
        let face = Texture::solid([rgb[0], rgb[1], rgb[2], 255], ColorSpace::Srgb);
        Self::new(std::array::from_fn(|_| face.clone()))
    }

    /// Linear RGB seen along `dir` from the cube's centre.
    pub fn sample(&self, dir: &Vector3<f32>) -> Vector3<f32> {
        let (ax, ay, az) = (dir.x.abs(), dir.y.abs(), dir.z.abs());

        // Major axis selects the face; (sc, tc) follow the usual cube map layout.
        let (face, sc, tc, ma) = if ax >= ay && ax >= az {
            if dir.x > 0.0 {
                (0, -dir.z, -dir.y, ax)
            } else {
                (1, dir.z, -dir.y, ax)
            }
        } else if ay >= az {
            if dir.y > 0.0 {
                (2, dir.x, dir.z, ay)
            } else {
                (3, dir.x, -dir.z, ay)
            }
        } else if dir.z > 0.0 {
            (4, dir.x, -dir.y, az)
        } else {
            (5, -dir.x, -dir.y, az)
        };

        if ma <= f32::EPSILON {
            return Vector3::zeros();
        }

        let s = 0.5 * (sc / ma + 1.0);
        let t = 0.5 * (tc / ma + 1.0);
        self.faces[face].sample_rgb(s, t)
    }
}
