use crate::core::framebuffer::FrameBuffer;
use crate::core::math::interpolation::{
    barycentric_coordinates, is_inside_triangle, perspective_correct_barycentric,
};
use crate::core::math::transform::{apply_perspective_division, ndc_to_depth, ndc_to_screen};
use crate::core::pipeline::{Interpolatable, Shader};
use crate::core::render_state::{CullMode, RenderState};
use nalgebra::{Point2, Vector4};
use rayon::prelude::*;

/// The Rasterizer draws triangles onto a FrameBuffer under the currently
/// applied `RenderState`.
#[derive(Default)]
pub struct Rasterizer {
    state: RenderState,
}

/// A clip-space vertex paired with its varying.
type ClipVertex<V> = (Vector4<f32>, V);

impl Rasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Applies a draw's state descriptor. Returns true when anything changed.
    pub fn apply_state(&mut self, state: RenderState) -> bool {
        let changed = self.state != state;
        self.state = state;
        changed
    }

    /// Rasterize a single triangle given clip-space coordinates and corresponding varyings.
    ///
    /// The triangle is clipped against the view frustum in homogeneous clip space
    /// (Sutherland-Hodgman) and the resulting convex polygon is drawn as a fan.
    pub fn rasterize_triangle<S: Shader>(
        &self,
        framebuffer: &FrameBuffer,
        shader: &S,
        clip_coords: &[Vector4<f32>; 3],
        varyings: &[S::Varying; 3],
    ) {
        let mut current_poly: Vec<ClipVertex<S::Varying>> = Vec::with_capacity(16);
        let mut clip_buffer: Vec<ClipVertex<S::Varying>> = Vec::with_capacity(16);
        current_poly.extend(clip_coords.iter().copied().zip(varyings.iter().copied()));

        // (axis, sign): inside when sign * p[axis] <= p.w
        let planes = [
            (0, 1.0),
            (0, -1.0),
            (1, 1.0),
            (1, -1.0),
            (2, 1.0),
            (2, -1.0),
        ];

        for &(axis, sign) in &planes {
            if current_poly.is_empty() {
                return;
            }
            Self::clip_polygon_against_plane(&current_poly, &mut clip_buffer, axis, sign);
            std::mem::swap(&mut current_poly, &mut clip_buffer);
        }

        if current_poly.len() < 3 {
            return;
        }

        let v0 = current_poly[0];
        for pair in current_poly[1..].windows(2) {
            let (v1, v2) = (pair[0], pair[1]);
            self.rasterize_triangle_clipped(
                framebuffer,
                shader,
                &[v0.0, v1.0, v2.0],
                &[v0.1, v1.1, v2.1],
            );
        }
    }

    fn clip_polygon_against_plane<V: Interpolatable>(
        input: &[ClipVertex<V>],
        output: &mut Vec<ClipVertex<V>>,
        axis: usize,
        sign: f32,
    ) {
        output.clear();

        let Some(&last) = input.last() else {
            return;
        };

        // Small tolerance keeps vertices that sit exactly on a plane (z = w for the skybox).
        let is_inside = |p: &Vector4<f32>| sign * p[axis] <= p.w + 1e-6;

        let mut prev = last;
        let mut prev_inside = is_inside(&prev.0);

        for &curr in input {
            let curr_inside = is_inside(&curr.0);

            match (prev_inside, curr_inside) {
                (true, true) => output.push(curr),
                (false, true) => {
                    output.extend(Self::intersect_edge_plane(prev, curr, axis, sign));
                    output.push(curr);
                }
                (true, false) => output.extend(Self::intersect_edge_plane(prev, curr, axis, sign)),
                (false, false) => {}
            }

            prev = curr;
            prev_inside = curr_inside;
        }
    }

    /// Intersection of edge a->b with the plane `sign * p[axis] = p.w`,
    /// interpolating both position and varying.
    #[inline(always)]
    fn intersect_edge_plane<V: Interpolatable>(
        a: ClipVertex<V>,
        b: ClipVertex<V>,
        axis: usize,
        sign: f32,
    ) -> Option<ClipVertex<V>> {
        let (ac, bc) = (a.0[axis], b.0[axis]);
        let (aw, bw) = (a.0.w, b.0.w);

        let denom = sign * (bc - ac) - (bw - aw);
        if denom.abs() < 1e-9 {
            return None;
        }

        let t = (aw - sign * ac) / denom;
        if !t.is_finite() {
            return None;
        }

        Some((a.0 + (b.0 - a.0) * t, a.1 * (1.0 - t) + b.1 * t))
    }

    /// Draws a triangle already inside the frustum: perspective division,
    /// viewport transform, culling, then the parallel pixel loop.
    fn rasterize_triangle_clipped<S: Shader>(
        &self,
        framebuffer: &FrameBuffer,
        shader: &S,
        clip_coords: &[Vector4<f32>; 3],
        varyings: &[S::Varying; 3],
    ) {
        let width = framebuffer.buffer_width as f32;
        let height = framebuffer.buffer_height as f32;

        let mut screen = [Point2::origin(); 3];
        let mut ndc_z = [0.0; 3];
        let mut w_values = [0.0; 3];

        for i in 0..3 {
            if clip_coords[i].w.abs() < 1e-6 {
                return;
            }
            let ndc = apply_perspective_division(&clip_coords[i]);
            screen[i] = ndc_to_screen(ndc.x, ndc.y, width, height);
            ndc_z[i] = ndc.z;
            w_values[i] = clip_coords[i].w;
        }

        // Screen y points down, so clockwise in NDC has positive area here.
        let e1 = screen[1] - screen[0];
        let e2 = screen[2] - screen[1];
        let signed_area = e1.x * e2.y - e1.y * e2.x;
        if signed_area == 0.0 {
            return;
        }
        let front_facing = signed_area > 0.0;

        match self.state.cull {
            CullMode::Back if !front_facing => return,
            CullMode::Front if front_facing => return,
            _ => {}
        }

        let min_x = screen.iter().map(|p| p.x).fold(f32::INFINITY, f32::min).floor() as i32;
        let min_y = screen.iter().map(|p| p.y).fold(f32::INFINITY, f32::min).floor() as i32;
        let max_x = screen.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max).ceil() as i32;
        let max_y = screen.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max).ceil() as i32;

        if max_x < 0
            || max_y < 0
            || min_x >= framebuffer.buffer_width as i32
            || min_y >= framebuffer.buffer_height as i32
        {
            return;
        }

        let start_x = min_x.max(0) as usize;
        let end_x = max_x.min(framebuffer.buffer_width as i32 - 1) as usize;
        let start_y = min_y.max(0) as usize;
        let end_y = max_y.min(framebuffer.buffer_height as i32 - 1) as usize;

        let state = self.state;

        (start_y..=end_y).into_par_iter().for_each(|y| {
            for x in start_x..=end_x {
                let pixel_center = Point2::new(x as f32 + 0.5, y as f32 + 0.5);

                let Some(bary) = barycentric_coordinates(pixel_center, screen[0], screen[1], screen[2])
                else {
                    continue;
                };
                if !is_inside_triangle(bary) {
                    continue;
                }

                // Window depth is affine in screen space.
                let depth = ndc_to_depth(bary.x * ndc_z[0] + bary.y * ndc_z[1] + bary.z * ndc_z[2]);

                let Some(corrected) =
                    perspective_correct_barycentric(bary, w_values[0], w_values[1], w_values[2])
                else {
                    continue;
                };

                let interpolated = varyings[0] * corrected.x
                    + varyings[1] * corrected.y
                    + varyings[2] * corrected.z;

                let rgba = shader.fragment(interpolated);
                if rgba.w <= 0.0 {
                    continue;
                }

                if framebuffer.depth_test_and_update(x, y, depth, state.depth) {
                    framebuffer.write_fragment(x, y, rgba, state.blend);
                }
            }
        });
    }
}
