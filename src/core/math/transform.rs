use nalgebra::{Matrix4, Point2, Point3, Vector3, Vector4};

//=================================
// Transform Matrix Factory
//=================================

/// Factory for the handful of matrices the viewer needs.
/// Right-handed, column vectors, OpenGL clip conventions (NDC z in [-1, 1]).
pub struct TransformFactory;

#[rustfmt::skip]
impl TransformFactory {
    /// Rotation around an arbitrary axis (Rodrigues' formula).
    /// The axis does not need to be normalized.
    pub fn rotation(axis: &Vector3<f32>, angle_rad: f32) -> Matrix4<f32> {
        let a = axis.normalize();
        let (x, y, z) = (a.x, a.y, a.z);
        let c = angle_rad.cos();
        let s = angle_rad.sin();
        let t = 1.0 - c;

        Matrix4::new(
            t * x * x + c,     t * x * y - z * s, t * x * z + y * s, 0.0,
            t * x * y + z * s, t * y * y + c,     t * y * z - x * s, 0.0,
            t * x * z - y * s, t * y * z + x * s, t * z * z + c,     0.0,
            0.0,               0.0,               0.0,               1.0,
        )
    }

    pub fn translation(translation: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new(
            1.0, 0.0, 0.0, translation.x,
            0.0, 1.0, 0.0, translation.y,
            0.0, 0.0, 1.0, translation.z,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn scaling(scale: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new(
            scale.x, 0.0,     0.0,     0.0,
            0.0,     scale.y, 0.0,     0.0,
            0.0,     0.0,     scale.z, 0.0,
            0.0,     0.0,     0.0,     1.0,
        )
    }

    pub fn uniform_scaling(scale: f32) -> Matrix4<f32> {
        Self::scaling(&Vector3::repeat(scale))
    }

    /// Look-At view matrix. The camera looks down its local -Z.
    pub fn view(eye: &Point3<f32>, target: &Point3<f32>, up: &Vector3<f32>) -> Matrix4<f32> {
        let z_axis = (eye - target).normalize();
        let x_axis = up.cross(&z_axis).normalize();
        let y_axis = z_axis.cross(&x_axis);

        let rotation = Matrix4::new(
            x_axis.x, x_axis.y, x_axis.z, 0.0,
            y_axis.x, y_axis.y, y_axis.z, 0.0,
            z_axis.x, z_axis.y, z_axis.z, 0.0,
            0.0,      0.0,      0.0,      1.0,
        );

        rotation * Self::translation(&-eye.coords)
    }

    /// OpenGL-style perspective projection.
    pub fn perspective(aspect_ratio: f32, fov_y_rad: f32, near: f32, far: f32) -> Matrix4<f32> {
        let tan_half = (fov_y_rad / 2.0).tan();
        let depth = far - near;

        Matrix4::new(
            1.0 / (aspect_ratio * tan_half), 0.0,            0.0,                  0.0,
            0.0,                             1.0 / tan_half, 0.0,                  0.0,
            0.0,                             0.0,            -(far + near) / depth, -(2.0 * far * near) / depth,
            0.0,                             0.0,            -1.0,                 0.0,
        )
    }

    /// Keeps only the rotational 3x3 part, so geometry drawn with it stays
    /// centered on the eye (skybox).
    pub fn without_translation(m: &Matrix4<f32>) -> Matrix4<f32> {
        m.fixed_view::<3, 3>(0, 0).into_owned().to_homogeneous()
    }
}

//=================================
// Core Transformation Functions
//=================================

/// Performs perspective division: Clip Space -> NDC.
#[inline]
pub fn apply_perspective_division(clip: &Vector4<f32>) -> Point3<f32> {
    let w = clip.w;
    if w.abs() > 1e-6 {
        Point3::new(clip.x / w, clip.y / w, clip.z / w)
    } else {
        Point3::origin()
    }
}

/// Converts NDC coordinates to Screen coordinates (Viewport Transform).
/// Note: Y-axis is flipped (NDC +Y is up, Screen +Y is down).
#[inline]
pub fn ndc_to_screen(ndc_x: f32, ndc_y: f32, width: f32, height: f32) -> Point2<f32> {
    Point2::new(
        (ndc_x + 1.0) * 0.5 * width,
        (1.0 - (ndc_y + 1.0) * 0.5) * height,
    )
}

/// Maps NDC z in [-1, 1] to window depth in [0, 1].
#[inline]
pub fn ndc_to_depth(ndc_z: f32) -> f32 {
    (ndc_z * 0.5 + 0.5).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn perspective_matches_opengl_formula() {
        let (fovy, aspect, near, far) = (45.0_f32.to_radians(), 800.0 / 600.0, 0.1, 100.0);
        let p = TransformFactory::perspective(aspect, fovy, near, far);

        let tan_half = (fovy / 2.0).tan();
        assert_eq!(p[(0, 0)], 1.0 / (aspect * tan_half));
        assert_eq!(p[(1, 1)], 1.0 / tan_half);
        assert_eq!(p[(2, 2)], -(far + near) / (far - near));
        assert_eq!(p[(2, 3)], -(2.0 * far * near) / (far - near));
        assert_eq!(p[(3, 2)], -1.0);
        assert_eq!(p[(3, 3)], 0.0);
        assert_relative_eq!(p[(1, 1)], 2.414_213_5, epsilon = 1e-5);
    }

    #[test]
    fn view_moves_eye_to_origin() {
        let eye = Point3::new(0.0, 0.0, 3.0);
        let v = TransformFactory::view(&eye, &Point3::origin(), &Vector3::y());
        let moved = v * eye.to_homogeneous();
        assert_relative_eq!(moved, Vector4::new(0.0, 0.0, 0.0, 1.0), epsilon = 1e-6);

        let ahead = v * Point3::new(0.0, 0.0, 0.0).to_homogeneous();
        assert_relative_eq!(ahead.z, -3.0, epsilon = 1e-6);
    }

    #[test]
    fn without_translation_drops_column_three() {
        let m = TransformFactory::translation(&Vector3::new(1.0, 2.0, 3.0))
            * TransformFactory::rotation(&Vector3::y(), 0.5);
        let r = TransformFactory::without_translation(&m);
        assert_eq!(r.column(3), Vector4::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(r.fixed_view::<3, 3>(0, 0), m.fixed_view::<3, 3>(0, 0));
    }

    #[test]
    fn far_plane_maps_to_unit_depth() {
        assert_eq!(ndc_to_depth(1.0), 1.0);
        assert_eq!(ndc_to_depth(1.000_001), 1.0);
        assert_eq!(ndc_to_depth(-1.0), 0.0);
    }
}
