use nalgebra::{Point2, Vector3};

const EPSILON: f32 = 1e-5;

/// Signed doubled area of triangle (a, b, p). Positive when p lies to the
/// left of a->b in a y-up frame.
#[inline(always)]
pub fn edge_function(a: Point2<f32>, b: Point2<f32>, p: Point2<f32>) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Screen-space barycentric weights of `p` in triangle (v0, v1, v2).
///
/// Returns `None` for a degenerate triangle.
pub fn barycentric_coordinates(
    p: Point2<f32>,
    v0: Point2<f32>,
    v1: Point2<f32>,
    v2: Point2<f32>,
) -> Option<Vector3<f32>> {
    let area = edge_function(v0, v1, v2);
    if area.abs() < EPSILON {
        return None;
    }
    let inv_area = 1.0 / area;
    let w1 = edge_function(v2, v0, p) * inv_area;
    let w2 = edge_function(v0, v1, p) * inv_area;
    Some(Vector3::new(1.0 - w1 - w2, w1, w2))
}

#[inline(always)]
pub fn is_inside_triangle(bary: Vector3<f32>) -> bool {
    bary.x >= -EPSILON && bary.y >= -EPSILON && bary.z >= -EPSILON
}

/// Re-weights screen-space barycentrics by `1/w` so attributes interpolate
/// linearly in view space.
///
/// Returns `None` when the weights collapse (sum near zero).
pub fn perspective_correct_barycentric(
    bary: Vector3<f32>,
    w0: f32,
    w1: f32,
    w2: f32,
) -> Option<Vector3<f32>> {
    let inv = |w: f32| if w.abs() > EPSILON { 1.0 / w } else { 1.0 };
    let weighted = Vector3::new(bary.x * inv(w0), bary.y * inv(w1), bary.z * inv(w2));

    let sum = weighted.x + weighted.y + weighted.z;
    if sum.abs() < EPSILON {
        return None;
    }
    Some(weighted / sum)
}
