use crate::scene::assets::AssetError;
use image::{ImageBuffer, Rgb};
use std::path::Path;

/// Saves a 0RGB buffer of `width * height` pixels as a PNG screenshot.
pub fn save_buffer_to_image(
    buffer: &[u32],
    width: usize,
    height: usize,
    path: &Path,
) -> Result<(), AssetError> {
    let img_buf = ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
        let color = buffer
            .get(y as usize * width + x as usize)
            .copied()
            .unwrap_or(0);
        Rgb([(color >> 16) as u8, (color >> 8) as u8, color as u8])
    });

    img_buf.save(path).map_err(|source| AssetError::Image {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_channels_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        save_buffer_to_image(&[0x0011_2233, 0x0044_5566], 2, 1, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.get_pixel(0, 0).0, [0x11, 0x22, 0x33]);
        assert_eq!(img.get_pixel(1, 0).0, [0x44, 0x55, 0x66]);
    }

    #[test]
    fn bad_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("shot.png");
        assert!(save_buffer_to_image(&[0], 1, 1, &path).is_err());
    }
}
