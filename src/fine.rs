// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Four-wide pixel kernels: edge tests, interpolation basis functions and the
//! depth compare.
//!
//! Everything here operates on one quad, four contiguous samples in a row,
//! with sample centers at `(x + lane + 0.5, y + 0.5)`. Lane `i` of a quad mask
//! is sample `x + i`.

use crate::setup::SetupChunk;
use crate::shader::{InterpolatedAttributes, ShaderMetadata, QUAD_LANES};
use fearless_simd::*;
use glam::Vec3;

/// Whether samples exactly on this edge belong to the triangle.
///
/// The tie-breaker keeps shared edges from being shaded by both adjacent
/// triangles: a boundary sample passes edge `(a, b, c)` only when
/// `a > 0 ∨ (a = 0 ∧ b ≥ 0)`.
#[inline]
pub(crate) fn edge_accepts_boundary(edge: Vec3) -> bool {
    edge.x > 0.0 || (edge.x == 0.0 && edge.y >= 0.0)
}

/// X coordinates of the four sample centers starting at pixel `x`.
#[inline]
fn sample_xs<S: Simd>(simd: S, x: u32) -> f32x4<S> {
    let x = x as f32;
    [x + 0.5, x + 1.5, x + 2.5, x + 3.5].simd_into(simd)
}

/// Evaluates one edge function at four samples.
#[inline]
fn edge_values<S: Simd>(simd: S, edge: Vec3, xs: f32x4<S>, ys: f32x4<S>) -> f32x4<S> {
    xs.mul_add(
        f32x4::splat(simd, edge.x),
        ys.mul_add(f32x4::splat(simd, edge.y), f32x4::splat(simd, edge.z)),
    )
}

/// Collapses a comparison mask to its lane bits.
#[inline]
pub(crate) fn mask_bits<S: Simd>(simd: S, mask: mask32x4<S>) -> u16 {
    let lanes = simd.select_f32x4(mask, f32x4::splat(simd, 1.0), f32x4::splat(simd, 0.0));
    let lanes: [f32; 4] = lanes.into();
    let mut bits = 0;
    for (lane, value) in lanes.iter().enumerate() {
        if *value != 0.0 {
            bits |= 1 << lane;
        }
    }
    bits
}

/// Tests the quad at `(x, y)` against all three edges, returning the coverage
/// bits of the samples inside the triangle.
pub(crate) fn quad_coverage<S: Simd>(simd: S, edges: &[Vec3; 3], x: u32, y: u32) -> u16 {
    let xs = sample_xs(simd, x);
    let ys = f32x4::splat(simd, y as f32 + 0.5);
    let zero = f32x4::splat(simd, 0.0);

    let mut bits = 0b1111;
    for &edge in edges {
        let values = edge_values(simd, edge, xs, ys);
        let mask = if edge_accepts_boundary(edge) {
            simd.simd_ge_f32x4(values, zero)
        } else {
            simd.simd_gt_f32x4(values, zero)
        };
        bits &= mask_bits(simd, mask);
        if bits == 0 {
            break;
        }
    }
    bits
}

/// Computes the perspective-correct basis functions `f0, f1` for the quad at
/// `(x, y)`.
///
/// With `F_k(x, y) = a_k·x + b_k·y + c_k` and `r = 1 / (F_0 + F_1 + F_2)`,
/// the basis is `f_0 = r·F_0`, `f_1 = r·F_1`; `f_2 = 1 − f_0 − f_1` is never
/// materialized because the deltas are rewritten relative to vertex 2.
pub(crate) fn basis_functions<S: Simd>(
    simd: S,
    edges: &[Vec3; 3],
    x: u32,
    y: u32,
) -> (f32x4<S>, f32x4<S>) {
    let xs = sample_xs(simd, x);
    let ys = f32x4::splat(simd, y as f32 + 0.5);

    let f0 = edge_values(simd, edges[0], xs, ys);
    let f1 = edge_values(simd, edges[1], xs, ys);
    let f2 = edge_values(simd, edges[2], xs, ys);

    let r = f32x4::splat(simd, 1.0) / (f0 + f1 + f2);
    (f0 * r, f1 * r)
}

/// Interpolates one attribute component from its `(a0−a2, a1−a2, a2)` delta
/// triple.
#[inline]
pub(crate) fn interpolate<S: Simd>(
    simd: S,
    f0: f32x4<S>,
    f1: f32x4<S>,
    delta: Vec3,
) -> f32x4<S> {
    f0.mul_add(
        f32x4::splat(simd, delta.x),
        f1.mul_add(f32x4::splat(simd, delta.y), f32x4::splat(simd, delta.z)),
    )
}

/// Lane bits passing the `LEQ` depth compare against `current`.
#[inline]
pub(crate) fn depth_test_leq<S: Simd>(
    simd: S,
    z: f32x4<S>,
    current: [f32; QUAD_LANES],
) -> u16 {
    let current = f32x4::from_slice(simd, &current);
    mask_bits(simd, simd.simd_le_f32x4(z, current))
}

/// Interpolates every active attribute of a primitive for the current quad.
pub(crate) fn interpolate_attributes<S: Simd>(
    simd: S,
    f0: f32x4<S>,
    f1: f32x4<S>,
    chunk: &SetupChunk,
    local: usize,
    metadata: &ShaderMetadata,
    out: &mut InterpolatedAttributes,
) {
    for slot in 0..metadata.num_vec4 {
        let deltas = chunk.attr4_deltas(slot, local);
        for (component, &delta) in deltas.iter().enumerate() {
            out.vec4[slot][component] = interpolate(simd, f0, f1, delta).into();
        }
    }
    for slot in 0..metadata.num_vec3 {
        let deltas = chunk.attr3_deltas(slot, local);
        for (component, &delta) in deltas.iter().enumerate() {
            out.vec3[slot][component] = interpolate(simd, f0, f1, delta).into();
        }
    }
    for slot in 0..metadata.num_vec2 {
        let deltas = chunk.attr2_deltas(slot, local);
        for (component, &delta) in deltas.iter().enumerate() {
            out.vec2[slot][component] = interpolate(simd, f0, f1, delta).into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::edge_equations;
    use glam::Vec4;

    fn fullscreen_edges(size: u32) -> [Vec3; 3] {
        edge_equations(
            Vec4::new(-1.0, -1.0, 0.0, 1.0),
            Vec4::new(3.0, -1.0, 0.0, 1.0),
            Vec4::new(-1.0, 3.0, 0.0, 1.0),
            size,
            size,
        )
        .unwrap()
    }

    fn reference_coverage(edges: &[Vec3; 3], x: u32, y: u32) -> u16 {
        let mut bits = 0;
        for lane in 0..4 {
            let px = x as f32 + lane as f32 + 0.5;
            let py = y as f32 + 0.5;
            let inside = edges.iter().all(|e| {
                let v = e.x * px + e.y * py + e.z;
                v > 0.0 || (v == 0.0 && edge_accepts_boundary(*e))
            });
            if inside {
                bits |= 1 << lane;
            }
        }
        bits
    }

    #[test]
    fn quad_coverage_matches_scalar_reference() {
        dispatch!(Level::new(), simd => check_coverage(simd));
    }

    fn check_coverage<S: Simd>(simd: S) {
        // Right half of an 8x8 screen, covered by the triangle's hypotenuse
        // region: mixes fully covered, partially covered and empty quads.
        let edges = fullscreen_edges(8);
        for y in 0..8 {
            for x in [0, 4] {
                assert_eq!(
                    quad_coverage(simd, &edges, x, y),
                    reference_coverage(&edges, x, y),
                    "quad at ({x}, {y})"
                );
            }
        }
        // The fullscreen triangle covers every sample of the screen.
        assert_eq!(quad_coverage(simd, &edges, 0, 0), 0b1111);
    }

    #[test]
    fn basis_functions_partition_unity() {
        dispatch!(Level::new(), simd => check_basis(simd));
    }

    fn check_basis<S: Simd>(simd: S) {
        let edges = fullscreen_edges(8);
        let (f0, f1) = basis_functions(simd, &edges, 4, 2);
        let f0_val: [f32; 4] = f0.into();
        let f1_val: [f32; 4] = f1.into();
        for lane in 0..4 {
            assert!(f0_val[lane] >= 0.0 && f0_val[lane] <= 1.0);
            assert!(f1_val[lane] >= 0.0 && f1_val[lane] <= 1.0);
        }
        // A constant attribute interpolates to itself no matter the basis.
        let constant = interpolate(simd, f0, f1, Vec3::new(0.0, 0.0, 0.75));
        let constant_val: [f32; 4] = constant.into();
        for lane in 0..4 {
            assert_eq!(constant_val[lane], 0.75);
        }
    }

    #[test]
    fn depth_compare_is_less_equal() {
        dispatch!(Level::new(), simd => check_depth(simd));
    }

    fn check_depth<S: Simd>(simd: S) {
        let z = [0.5_f32, 0.5, 0.5, 0.5].simd_into(simd);
        let bits = depth_test_leq(simd, z, [0.4, 0.5, 0.6, f32::INFINITY]);
        assert_eq!(bits, 0b1110);
    }
}
