use crate::core::color::pack_rgb;
use crate::core::render_state::{BlendMode, DepthFunc};
use nalgebra::{Vector3, Vector4};
use rayon::prelude::*;
use std::cell::UnsafeCell;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// Window-space depth of the far plane. Depth is cleared to this value.
pub const FAR_DEPTH: f32 = 1.0;

/// Represents a 2D buffer containing color and depth information.
/// Thread-safe for parallel rendering using atomic depth and striped locking for color.
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub sample_count: usize,
    pub buffer_width: usize,
    pub buffer_height: usize,

    /// Color buffer wrapped in UnsafeCell to allow interior mutability.
    /// Safety is guaranteed by `locks`.
    color_buffer: UnsafeCell<Vec<Vector3<f32>>>,

    /// Depth buffer stored as atomic bits of f32.
    depth_buffer: Vec<AtomicU32>,

    /// Striped locks to protect color writes.
    locks: Vec<Mutex<()>>,
}

// Color access goes through the striped locks; depth is atomic.
unsafe impl Sync for FrameBuffer {}

impl FrameBuffer {
    pub fn new(width: usize, height: usize, sample_count: usize) -> Self {
        let sample_count = sample_count.max(1);
        let buffer_width = width * sample_count;
        let buffer_height = height * sample_count;
        let size = buffer_width * buffer_height;

        let far_bits = FAR_DEPTH.to_bits();
        let depth_buffer = (0..size).map(|_| AtomicU32::new(far_bits)).collect();
        let locks = (0..1024).map(|_| Mutex::new(())).collect();

        Self {
            width,
            height,
            sample_count,
            buffer_width,
            buffer_height,
            color_buffer: UnsafeCell::new(vec![Vector3::zeros(); size]),
            depth_buffer,
            locks,
        }
    }

    #[inline(always)]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.buffer_width && y < self.buffer_height
    }

    #[inline(always)]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.buffer_width + x
    }

    /// Resets every sample to `color` and every depth to `depth`.
    pub fn clear(&mut self, color: Vector3<f32>, depth: f32) {
        self.color_buffer.get_mut().fill(color);
        let bits = depth.to_bits();
        for d in &mut self.depth_buffer {
            *d.get_mut() = bits;
        }
    }

    /// Thread-safe depth test and update.
    /// Returns true (and stores `new_depth`) when the fragment passes `func`.
    #[inline]
    pub fn depth_test_and_update(&self, x: usize, y: usize, new_depth: f32, func: DepthFunc) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let idx = self.index(x, y);
        let new_bits = new_depth.to_bits();
        let depth_atomic = &self.depth_buffer[idx];

        let mut current_bits = depth_atomic.load(Ordering::Relaxed);
        loop {
            if !func.passes(new_depth, f32::from_bits(current_bits)) {
                return false;
            }
            match depth_atomic.compare_exchange_weak(
                current_bits,
                new_bits,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(updated_bits) => current_bits = updated_bits,
            }
        }
    }

    /// Thread-safe fragment write.
    /// Should only be called AFTER depth_test_and_update returns true.
    #[inline]
    pub fn write_fragment(&self, x: usize, y: usize, rgba: Vector4<f32>, blend: BlendMode) {
        if !self.in_bounds(x, y) {
            return;
        }
        let idx = self.index(x, y);
        let _guard = self.locks[idx % self.locks.len()]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // We hold the lock for this stripe of samples.
        let buffer = unsafe { &mut *self.color_buffer.get() };
        let src = rgba.xyz();
        buffer[idx] = match blend {
            BlendMode::Opaque => src,
            BlendMode::Alpha => {
                let a = rgba.w.clamp(0.0, 1.0);
                src * a + buffer[idx] * (1.0 - a)
            }
        };
    }

    /// Resolved (box-filtered) color of an output pixel.
    /// Only meaningful once rendering of the frame is done.
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Vector3<f32>> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let buffer = unsafe { &*self.color_buffer.get() };

        if self.sample_count == 1 {
            return Some(buffer[self.index(x, y)]);
        }

        let mut sum_color = Vector3::zeros();
        let start_x = x * self.sample_count;
        let start_y = y * self.sample_count;
        for dy in 0..self.sample_count {
            for dx in 0..self.sample_count {
                sum_color += buffer[self.index(start_x + dx, start_y + dy)];
            }
        }
        Some(sum_color / (self.sample_count * self.sample_count) as f32)
    }

    /// Stored depth of a single sample.
    pub fn depth_at(&self, x: usize, y: usize) -> Option<f32> {
        self.in_bounds(x, y)
            .then(|| f32::from_bits(self.depth_buffer[self.index(x, y)].load(Ordering::Relaxed)))
    }

    /// Downsamples, gamma-encodes and packs the frame into a 0RGB buffer of
    /// `width * height` pixels.
    pub fn resolve_into(&self, out: &mut [u32]) {
        out.par_chunks_mut(self.width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, pixel) in row.iter_mut().enumerate() {
                    *pixel = self.get_pixel(x, y).map_or(0, pack_rgb);
                }
            });
    }
}
