use nalgebra::Vector3;

/// Converts an sRGB-encoded channel in [0, 1] to linear light.
#[inline]
pub fn srgb_to_linear(c: f32) -> f32 {
    c.powf(2.2)
}

/// Converts linear RGB to sRGB (Gamma Correction).
pub fn linear_to_srgb(color: Vector3<f32>) -> Vector3<f32> {
    let gamma = 1.0 / 2.2;
    Vector3::new(
        color.x.max(0.0).powf(gamma),
        color.y.max(0.0).powf(gamma),
        color.z.max(0.0).powf(gamma),
    )
}

/// Gamma-encodes and packs a linear color as 0RGB (top byte zero), the
/// layout minifb and the PNG writer expect.
pub fn pack_rgb(linear: Vector3<f32>) -> u32 {
    let srgb = linear_to_srgb(linear);
    let r = (srgb.x.clamp(0.0, 1.0) * 255.0) as u32;
    let g = (srgb.y.clamp(0.0, 1.0) * 255.0) as u32;
    let b = (srgb.z.clamp(0.0, 1.0) * 255.0) as u32;
    (r << 16) | (g << 8) | b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_rgb_saturates_and_keeps_channel_order() {
        assert_eq!(pack_rgb(Vector3::new(1.0, 0.0, 0.0)), 0x00FF_0000);
        assert_eq!(pack_rgb(Vector3::new(0.0, 5.0, 0.0)), 0x0000_FF00);
        assert_eq!(pack_rgb(Vector3::new(0.0, 0.0, -1.0)), 0);
        assert_eq!(pack_rgb(Vector3::repeat(1.0)) >> 24, 0);
    }
}
