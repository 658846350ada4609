// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-primitive setup: clipping, edge equations and interpolation deltas.
//!
//! Each worker owns one [`SetupChunk`] covering its contiguous slice of the
//! draw iteration. The chunk is written during the geometry phase and shared
//! read-only with every worker after the post-binning sync point.

use crate::shader::{ShaderMetadata, VertexAttributes};
use crate::MAX_VERTEX_ATTRIBUTES;
use glam::{Vec2, Vec3, Vec4};

/// An axis-aligned rectangle in pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Rect2D {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Rect2D {
    /// Whether the rectangle lies entirely outside a `width × height` screen.
    pub(crate) fn outside_screen(&self, width: u32, height: u32) -> bool {
        self.min_x >= width as f32
            || self.max_x < 0.0
            || self.min_y >= height as f32
            || self.max_y < 0.0
    }

    pub(crate) fn clamped_to_screen(&self, width: u32, height: u32) -> Self {
        Self {
            min_x: self.min_x.max(0.0),
            min_y: self.min_y.max(0.0),
            max_x: self.max_x.min(width as f32),
            max_y: self.max_y.min(height as f32),
        }
    }

    pub(crate) fn intersect(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        }
    }
}

/// Whether all three clip-space vertices lie strictly outside the same clip
/// plane. Triangles that merely straddle a plane are kept; homogeneous
/// rasterization handles them without explicit line clipping.
///
/// The planes bound `-w < x < w`, `-w < y < w` and `0 < z < w`.
pub(crate) fn trivially_rejected(v0: Vec4, v1: Vec4, v2: Vec4) -> bool {
    let outside_left = v0.x < -v0.w && v1.x < -v1.w && v2.x < -v2.w;
    let outside_right = v0.x > v0.w && v1.x > v1.w && v2.x > v2.w;
    let outside_bottom = v0.y < -v0.w && v1.y < -v1.w && v2.y < -v2.w;
    let outside_top = v0.y > v0.w && v1.y > v1.w && v2.y > v2.w;
    let outside_near = v0.z < 0.0 && v1.z < 0.0 && v2.z < 0.0;
    let outside_far = v0.z > v0.w && v1.z > v1.w && v2.z > v2.w;

    outside_left || outside_right || outside_bottom || outside_top || outside_near || outside_far
}

/// Maps a clip-space vertex to 2D homogeneous pixel coordinates
/// `(w·(x+cw)/2, h·(y+cw)/2, z, cw)`.
#[inline]
fn to_homogeneous(clip: Vec4, width: u32, height: u32) -> Vec4 {
    Vec4::new(
        width as f32 * (clip.x + clip.w) * 0.5,
        height as f32 * (clip.y + clip.w) * 0.5,
        clip.z,
        clip.w,
    )
}

/// Computes the three edge-equation coefficient triples `(a, b, c)` of a
/// triangle, or `None` when the triangle is back-facing or degenerate.
///
/// The coefficients form the adjoint of the homogeneous vertex matrix
/// `[[x0 x1 x2], [y0 y1 y2], [w0 w1 w2]]`, so `E_k(x, y) = a_k·x + b_k·y + c_k`
/// is nonnegative inside the triangle for every edge `k`, and
/// `det = c0·w0 + c1·w1 + c2·w2` is positive exactly for front-facing
/// (counter-clockwise) triangles.
pub(crate) fn edge_equations(
    v0_clip: Vec4,
    v1_clip: Vec4,
    v2_clip: Vec4,
    width: u32,
    height: u32,
) -> Option<[Vec3; 3]> {
    let v0 = to_homogeneous(v0_clip, width, height);
    let v1 = to_homogeneous(v1_clip, width, height);
    let v2 = to_homogeneous(v2_clip, width, height);

    let a0 = v1.y * v2.w - v2.y * v1.w;
    let a1 = v2.y * v0.w - v0.y * v2.w;
    let a2 = v0.y * v1.w - v1.y * v0.w;

    let b0 = v2.x * v1.w - v1.x * v2.w;
    let b1 = v0.x * v2.w - v2.x * v0.w;
    let b2 = v1.x * v0.w - v0.x * v1.w;

    let c0 = v1.x * v2.y - v2.x * v1.y;
    let c1 = v2.x * v0.y - v0.x * v2.y;
    let c2 = v0.x * v1.y - v1.x * v0.y;

    let det = c0 * v0.w + c1 * v1.w + c2 * v2.w;
    (det > 0.0).then(|| {
        [
            Vec3::new(a0, b0, c0),
            Vec3::new(a1, b1, c1),
            Vec3::new(a2, b2, c2),
        ]
    })
}

/// Computes the pixel-space bounding box of a triangle from its clip-space
/// vertices, by way of NDC. The result is unclamped.
pub(crate) fn bounding_box(v0: Vec4, v1: Vec4, v2: Vec4, width: u32, height: u32) -> Rect2D {
    let to_raster = |v: Vec4| {
        let ndc = Vec2::new(v.x, v.y) / v.w;
        Vec2::new(
            width as f32 * (ndc.x + 1.0) * 0.5,
            height as f32 * (ndc.y + 1.0) * 0.5,
        )
    };
    let r0 = to_raster(v0);
    let r1 = to_raster(v1);
    let r2 = to_raster(v2);

    Rect2D {
        min_x: r0.x.min(r1.x).min(r2.x),
        min_y: r0.y.min(r1.y).min(r2.y),
        max_x: r0.x.max(r1.x).max(r2.x),
        max_y: r0.y.max(r1.y).max(r2.y),
    }
}

#[inline]
fn delta_triple(a0: f32, a1: f32, a2: f32) -> Vec3 {
    Vec3::new(a0 - a2, a1 - a2, a2)
}

/// One worker's slice of the draw-iteration setup buffers, indexed by the
/// primitive index relative to the slice start.
///
/// Slots of culled or rejected primitives keep stale data; nothing downstream
/// references a primitive that did not survive setup.
#[derive(Debug, Default)]
pub(crate) struct SetupChunk {
    /// Three `(a, b, c)` triples per primitive.
    edges: Vec<Vec3>,
    /// `(z0−z2, z1−z2, z2)` per primitive.
    z_deltas: Vec<Vec3>,
    /// Clamped pixel-space bounding box per primitive.
    bboxes: Vec<Rect2D>,
    /// Interpolation deltas, one `Vec` per slot, `arity` triples per primitive.
    attr4: [Vec<Vec3>; MAX_VERTEX_ATTRIBUTES],
    attr3: [Vec<Vec3>; MAX_VERTEX_ATTRIBUTES],
    attr2: [Vec<Vec3>; MAX_VERTEX_ATTRIBUTES],
}

impl SetupChunk {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            edges: vec![Vec3::ZERO; capacity * 3],
            z_deltas: vec![Vec3::ZERO; capacity],
            bboxes: vec![Rect2D::default(); capacity],
            attr4: std::array::from_fn(|_| vec![Vec3::ZERO; capacity * 4]),
            attr3: std::array::from_fn(|_| vec![Vec3::ZERO; capacity * 3]),
            attr2: std::array::from_fn(|_| vec![Vec3::ZERO; capacity * 2]),
        }
    }

    pub(crate) fn set_edges(&mut self, local: usize, edges: [Vec3; 3]) {
        self.edges[local * 3..local * 3 + 3].copy_from_slice(&edges);
    }

    pub(crate) fn edges(&self, local: usize) -> &[Vec3] {
        &self.edges[local * 3..local * 3 + 3]
    }

    pub(crate) fn set_z_delta(&mut self, local: usize, v0: Vec4, v1: Vec4, v2: Vec4) {
        self.z_deltas[local] = delta_triple(v0.z, v1.z, v2.z);
    }

    pub(crate) fn z_delta(&self, local: usize) -> Vec3 {
        self.z_deltas[local]
    }

    pub(crate) fn set_bbox(&mut self, local: usize, bbox: Rect2D) {
        self.bboxes[local] = bbox;
    }

    pub(crate) fn bbox(&self, local: usize) -> Rect2D {
        self.bboxes[local]
    }

    /// Stores the interpolation deltas of every active attribute component,
    /// rewriting each as `(a0−a2, a1−a2, a2)` so that the fragment phase can
    /// evaluate `f0·Δ0 + f1·Δ1 + a2` directly.
    pub(crate) fn store_attribute_deltas(
        &mut self,
        local: usize,
        metadata: &ShaderMetadata,
        a0: &VertexAttributes,
        a1: &VertexAttributes,
        a2: &VertexAttributes,
    ) {
        for slot in 0..metadata.num_vec4 {
            let (v0, v1, v2) = (a0.vec4[slot], a1.vec4[slot], a2.vec4[slot]);
            let out = &mut self.attr4[slot][local * 4..local * 4 + 4];
            out[0] = delta_triple(v0.x, v1.x, v2.x);
            out[1] = delta_triple(v0.y, v1.y, v2.y);
            out[2] = delta_triple(v0.z, v1.z, v2.z);
            out[3] = delta_triple(v0.w, v1.w, v2.w);
        }
        for slot in 0..metadata.num_vec3 {
            let (v0, v1, v2) = (a0.vec3[slot], a1.vec3[slot], a2.vec3[slot]);
            let out = &mut self.attr3[slot][local * 3..local * 3 + 3];
            out[0] = delta_triple(v0.x, v1.x, v2.x);
            out[1] = delta_triple(v0.y, v1.y, v2.y);
            out[2] = delta_triple(v0.z, v1.z, v2.z);
        }
        for slot in 0..metadata.num_vec2 {
            let (v0, v1, v2) = (a0.vec2[slot], a1.vec2[slot], a2.vec2[slot]);
            let out = &mut self.attr2[slot][local * 2..local * 2 + 2];
            out[0] = delta_triple(v0.x, v1.x, v2.x);
            out[1] = delta_triple(v0.y, v1.y, v2.y);
        }
    }

    pub(crate) fn attr4_deltas(&self, slot: usize, local: usize) -> &[Vec3] {
        &self.attr4[slot][local * 4..local * 4 + 4]
    }

    pub(crate) fn attr3_deltas(&self, slot: usize, local: usize) -> &[Vec3] {
        &self.attr3[slot][local * 3..local * 3 + 3]
    }

    pub(crate) fn attr2_deltas(&self, slot: usize, local: usize) -> &[Vec3] {
        &self.attr2[slot][local * 2..local * 2 + 2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULLSCREEN: [Vec4; 3] = [
        Vec4::new(-1.0, -1.0, 0.0, 1.0),
        Vec4::new(3.0, -1.0, 0.0, 1.0),
        Vec4::new(-1.0, 3.0, 0.0, 1.0),
    ];

    #[test]
    fn fullscreen_triangle_is_front_facing() {
        let edges = edge_equations(FULLSCREEN[0], FULLSCREEN[1], FULLSCREEN[2], 8, 8)
            .expect("counter-clockwise triangle must survive culling");

        // Every edge function must be positive at the screen center.
        for e in edges {
            assert!(e.x * 4.0 + e.y * 4.0 + e.z > 0.0);
        }
    }

    #[test]
    fn clockwise_triangle_is_culled() {
        assert!(edge_equations(FULLSCREEN[0], FULLSCREEN[2], FULLSCREEN[1], 8, 8).is_none());
    }

    #[test]
    fn degenerate_triangle_is_culled() {
        let v = Vec4::new(0.25, 0.25, 0.0, 1.0);
        assert!(edge_equations(v, v, v, 8, 8).is_none());
    }

    #[test]
    fn straddling_triangle_is_kept() {
        // One vertex far beyond the right plane; the other two inside.
        let v0 = Vec4::new(-0.5, -0.5, 0.5, 1.0);
        let v1 = Vec4::new(4.0, 0.0, 0.5, 1.0);
        let v2 = Vec4::new(-0.5, 0.5, 0.5, 1.0);
        assert!(!trivially_rejected(v0, v1, v2));
    }

    #[test]
    fn offscreen_triangle_is_rejected() {
        let off = |y: f32| Vec4::new(10.0, y, 0.5, 1.0);
        assert!(trivially_rejected(off(-0.5), off(0.0), off(0.5)));
    }

    #[test]
    fn bbox_covers_the_screen_for_fullscreen_triangle() {
        let bbox = bounding_box(FULLSCREEN[0], FULLSCREEN[1], FULLSCREEN[2], 8, 8);
        let clamped = bbox.clamped_to_screen(8, 8);
        assert_eq!(
            clamped,
            Rect2D {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 8.0,
                max_y: 8.0
            }
        );
    }

    #[test]
    fn disjoint_bbox_is_detected() {
        let bbox = Rect2D {
            min_x: 9.0,
            min_y: 0.0,
            max_x: 12.0,
            max_y: 4.0,
        };
        assert!(bbox.outside_screen(8, 8));
        assert!(!bbox.outside_screen(16, 8));
    }
}
