// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end pipeline scenarios.

use glam::{Vec3, Vec4};
use std::sync::Arc;
use tilerast::{
    FragmentOutput, Framebuffer, InterpolatedAttributes, RasterizerConfig, RenderEngine, Shader,
    ShaderMetadata, VertexAttributes,
};

const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
const RED: [f32; 3] = [1.0, 0.0, 0.0];
const GREEN: [f32; 3] = [0.0, 1.0, 0.0];
const BLUE: [f32; 3] = [0.0, 0.0, 1.0];

/// Vertex layout: `x y z w r g b`, 28 bytes.
const STRIDE: usize = 28;

/// Passes the clip-space position through and interpolates a per-vertex color.
struct ColorShader;

impl Shader for ColorShader {
    fn metadata(&self) -> ShaderMetadata {
        ShaderMetadata {
            num_vec3: 1,
            ..ShaderMetadata::default()
        }
    }

    fn vertex(&self, vertex_in: &[u8], attrs: &mut VertexAttributes) -> Vec4 {
        let v: [f32; 7] = bytemuck::pod_read_unaligned(vertex_in);
        attrs.vec3[0] = Vec3::new(v[4], v[5], v[6]);
        Vec4::new(v[0], v[1], v[2], v[3])
    }

    fn fragment(&self, attrs: &InterpolatedAttributes, out: &mut FragmentOutput) {
        for lane in 0..4 {
            out.colors[lane] = [
                attrs.vec3[0][0][lane],
                attrs.vec3[0][1][lane],
                attrs.vec3[0][2][lane],
                1.0,
            ];
        }
    }
}

#[derive(Clone, Copy)]
struct Tri {
    v: [[f32; 4]; 3],
    color: [f32; 3],
}

fn tri(v: [[f32; 4]; 3], color: [f32; 3]) -> Tri {
    Tri { v, color }
}

/// The canonical counter-clockwise fullscreen triangle at depth `z`.
fn fullscreen(z: f32, color: [f32; 3]) -> Tri {
    tri(
        [
            [-1.0, -1.0, z, 1.0],
            [3.0, -1.0, z, 1.0],
            [-1.0, 3.0, z, 1.0],
        ],
        color,
    )
}

fn config(tile_size: u32, num_threads: usize) -> RasterizerConfig {
    RasterizerConfig {
        tile_size,
        num_threads,
        ..RasterizerConfig::default()
    }
}

fn vertex_bytes(tris: &[Tri]) -> Arc<[u8]> {
    let mut data: Vec<f32> = Vec::new();
    for t in tris {
        for v in t.v {
            data.extend_from_slice(&v);
            data.extend_from_slice(&t.color);
        }
    }
    bytemuck::cast_slice(&data).into()
}

fn draw_tris(engine: &mut RenderEngine, tris: &[Tri]) {
    let indices: Vec<u32> = (0..tris.len() as u32 * 3).collect();
    engine.bind_shader(Arc::new(ColorShader));
    engine.bind_vertex_buffer(vertex_bytes(tris), STRIDE);
    engine.bind_index_buffer(indices.into());
    engine.draw_indexed(tris.len() as u32, 0);
}

fn render(config: RasterizerConfig, width: u32, height: u32, tris: &[Tri]) -> RenderEngine {
    let mut engine = RenderEngine::new(config).unwrap();
    engine.set_render_targets(Framebuffer::new(width, height));
    engine.clear(Some(CLEAR_COLOR), Some(1.0));
    draw_tris(&mut engine, tris);
    engine
}

fn expect_uniform(fb: &Framebuffer, color: [u8; 4]) {
    for y in 0..fb.height() {
        for x in 0..fb.width() {
            assert_eq!(fb.color_at(x, y), color, "pixel ({x}, {y})");
        }
    }
}

#[test]
fn s1_fullscreen_triangle_covers_every_pixel() {
    let engine = render(config(8, 1), 8, 8, &[fullscreen(0.0, RED)]);
    let fb = engine.framebuffer().unwrap();
    expect_uniform(fb, [255, 0, 0, 255]);
    assert!(fb.to_depth().iter().all(|d| *d == 0.0));
}

#[test]
fn s2_offscreen_triangle_leaves_the_framebuffer_untouched() {
    let offscreen = tri(
        [
            [10.0, -0.5, 0.0, 1.0],
            [10.0, 0.5, 0.0, 1.0],
            [10.0, 0.0, 0.5, 1.0],
        ],
        RED,
    );
    let engine = render(config(8, 1), 8, 8, &[offscreen]);
    let fb = engine.framebuffer().unwrap();
    expect_uniform(fb, [0, 0, 0, 255]);
    assert!(fb.to_depth().iter().all(|d| *d == 1.0));
}

#[test]
fn s3_backfacing_triangle_is_culled() {
    let clockwise = tri(
        [
            [-1.0, -1.0, 0.0, 1.0],
            [-1.0, 3.0, 0.0, 1.0],
            [3.0, -1.0, 0.0, 1.0],
        ],
        RED,
    );
    let engine = render(config(8, 1), 8, 8, &[clockwise]);
    expect_uniform(engine.framebuffer().unwrap(), [0, 0, 0, 255]);
}

#[test]
fn s4_later_primitive_wins_at_equal_depth() {
    let engine = render(
        config(8, 1),
        8,
        8,
        &[fullscreen(0.5, RED), fullscreen(0.5, GREEN)],
    );
    expect_uniform(engine.framebuffer().unwrap(), [0, 255, 0, 255]);
}

#[test]
fn s5_depth_test_keeps_the_nearer_primitive() {
    // Submitted far-to-near and near-to-far, the near triangle must win both
    // times.
    for tris in [
        [fullscreen(0.8, GREEN), fullscreen(0.2, RED)],
        [fullscreen(0.2, RED), fullscreen(0.8, GREEN)],
    ] {
        let engine = render(config(8, 1), 8, 8, &tris);
        let fb = engine.framebuffer().unwrap();
        expect_uniform(fb, [255, 0, 0, 255]);
        assert!(fb.to_depth().iter().all(|d| *d == 0.2));
    }
}

/// Scalar reference for the rasterizer's coverage rule, including the
/// shared-edge tie-breaker.
fn reference_coverage(t: &Tri, width: u32, height: u32) -> Vec<(u32, u32)> {
    let raster: Vec<(f32, f32, f32)> = t
        .v
        .iter()
        .map(|v| {
            (
                width as f32 * (v[0] + v[3]) * 0.5,
                height as f32 * (v[1] + v[3]) * 0.5,
                v[3],
            )
        })
        .collect();
    let &[(x0, y0, w0), (x1, y1, w1), (x2, y2, w2)] = raster.as_slice() else {
        unreachable!()
    };
    let edges = [
        (y1 * w2 - y2 * w1, x2 * w1 - x1 * w2, x1 * y2 - x2 * y1),
        (y2 * w0 - y0 * w2, x0 * w2 - x2 * w0, x2 * y0 - x0 * y2),
        (y0 * w1 - y1 * w0, x1 * w0 - x0 * w1, x0 * y1 - x1 * y0),
    ];

    let mut covered = Vec::new();
    for y in 0..height {
        for x in 0..width {
            let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
            let inside = edges.iter().all(|&(a, b, c)| {
                let e = a * px + b * py + c;
                e > 0.0 || (e == 0.0 && (a > 0.0 || (a == 0.0 && b >= 0.0)))
            });
            if inside {
                covered.push((x, y));
            }
        }
    }
    covered
}

#[test]
fn s6_triangle_spanning_a_tile_boundary_shades_each_sample_once() {
    // Raster-space (0,0), (12,0), (0,8) on a 16x8 target: spans the boundary
    // between tiles (0,0) and (1,0) at x = 8.
    let spanning = tri(
        [
            [-1.0, -1.0, 0.0, 1.0],
            [0.5, -1.0, 0.0, 1.0],
            [-1.0, 1.0, 0.0, 1.0],
        ],
        RED,
    );
    let engine = render(config(8, 1), 16, 8, &[spanning]);
    let fb = engine.framebuffer().unwrap();

    let expected = reference_coverage(&spanning, 16, 8);
    let mut painted = Vec::new();
    for y in 0..8 {
        for x in 0..16 {
            if fb.color_at(x, y) == [255, 0, 0, 255] {
                painted.push((x, y));
            }
        }
    }
    assert_eq!(painted, expected);
    // The triangle reaches into both tiles.
    assert!(painted.iter().any(|&(x, _)| x < 8));
    assert!(painted.iter().any(|&(x, _)| x >= 8));
}

/// A scene that exercises trivial accept, overlap and multiple tiles at once.
fn busy_scene() -> Vec<Tri> {
    vec![
        fullscreen(0.9, BLUE),
        tri(
            [
                [-0.8, -0.8, 0.4, 1.0],
                [0.8, -0.8, 0.4, 1.0],
                [-0.2, 0.9, 0.4, 1.0],
            ],
            RED,
        ),
        tri(
            [
                [-0.4, -0.9, 0.2, 1.0],
                [0.9, 0.6, 0.2, 1.0],
                [-0.9, 0.8, 0.2, 1.0],
            ],
            GREEN,
        ),
    ]
}

#[test]
fn identical_draws_are_idempotent() {
    let mut engine = render(config(8, 2), 32, 16, &busy_scene());
    let color = engine.framebuffer().unwrap().to_rgba8();
    let depth = engine.framebuffer().unwrap().to_depth();

    // Drawing the same scene again on top must not change a single value.
    draw_tris(&mut engine, &busy_scene());
    assert_eq!(engine.framebuffer().unwrap().to_rgba8(), color);
    assert_eq!(engine.framebuffer().unwrap().to_depth(), depth);
}

#[test]
fn output_is_independent_of_thread_count() {
    let reference = render(config(8, 1), 32, 16, &busy_scene());
    let ref_color = reference.framebuffer().unwrap().to_rgba8();
    let ref_depth = reference.framebuffer().unwrap().to_depth();

    for num_threads in [2, 3, 8] {
        let engine = render(config(8, num_threads), 32, 16, &busy_scene());
        assert_eq!(
            engine.framebuffer().unwrap().to_rgba8(),
            ref_color,
            "{num_threads} threads"
        );
        assert_eq!(
            engine.framebuffer().unwrap().to_depth(),
            ref_depth,
            "{num_threads} threads"
        );
    }
}

#[test]
fn output_is_independent_of_the_vertex_cache() {
    // Two triangles sharing two vertices, so the cache actually hits.
    let vertices: Vec<f32> = [
        [-0.8_f32, -0.8, 0.5, 1.0, 1.0, 0.0, 0.0],
        [0.8, -0.8, 0.5, 1.0, 0.0, 1.0, 0.0],
        [-0.8, 0.8, 0.5, 1.0, 0.0, 0.0, 1.0],
        [0.8, 0.8, 0.5, 1.0, 1.0, 1.0, 0.0],
    ]
    .concat();
    let indices: Vec<u32> = vec![0, 1, 2, 2, 1, 3];

    let run = |vertex_cache_enabled: bool| {
        let mut engine = RenderEngine::new(RasterizerConfig {
            tile_size: 8,
            num_threads: 2,
            vertex_cache_enabled,
            ..RasterizerConfig::default()
        })
        .unwrap();
        engine.set_render_targets(Framebuffer::new(16, 16));
        engine.clear(Some(CLEAR_COLOR), Some(1.0));
        engine.bind_shader(Arc::new(ColorShader));
        engine.bind_vertex_buffer(bytemuck::cast_slice(&vertices).into(), STRIDE);
        engine.bind_index_buffer(indices.clone().into());
        engine.draw_indexed(2, 0);
        engine.framebuffer().unwrap().to_rgba8()
    };

    assert_eq!(run(true), run(false));
}

#[test]
fn large_draws_split_into_iterations() {
    let mut tris = Vec::new();
    for i in 0..7 {
        let z = 0.9 - i as f32 * 0.1;
        let color = [i as f32 / 7.0, 1.0 - i as f32 / 7.0, 0.5];
        tris.push(fullscreen(z, color));
    }

    let reference = render(config(8, 2), 16, 16, &tris);
    let small_iterations = render(
        RasterizerConfig {
            tile_size: 8,
            num_threads: 2,
            max_iter_size: 2,
            ..RasterizerConfig::default()
        },
        16,
        16,
        &tris,
    );

    assert_eq!(
        small_iterations.framebuffer().unwrap().to_rgba8(),
        reference.framebuffer().unwrap().to_rgba8()
    );
    assert_eq!(
        small_iterations.framebuffer().unwrap().to_depth(),
        reference.framebuffer().unwrap().to_depth()
    );
}

#[test]
fn last_worker_absorbs_the_remainder_of_a_partial_iteration() {
    // A single-iteration draw just under the iteration limit maximizes the
    // remainder: with 3 workers and 5 primitives the last worker takes
    // 5/3 + 5%3 = 3 primitives, more than max_iter_size/n + max_iter_size%n
    // would suggest. Same shape with 4 workers and 7 of 8 primitives.
    for (num_threads, max_iter_size, prim_count) in [(3, 6, 5), (4, 8, 7)] {
        let mut tris = Vec::new();
        for i in 0..prim_count {
            let z = 0.9 - i as f32 * 0.1;
            let color = [
                i as f32 / prim_count as f32,
                1.0 - i as f32 / prim_count as f32,
                0.25,
            ];
            tris.push(fullscreen(z, color));
        }

        let reference = render(config(8, 1), 16, 16, &tris);
        let partial = render(
            RasterizerConfig {
                tile_size: 8,
                num_threads,
                max_iter_size,
                ..RasterizerConfig::default()
            },
            16,
            16,
            &tris,
        );

        assert_eq!(
            partial.framebuffer().unwrap().to_rgba8(),
            reference.framebuffer().unwrap().to_rgba8(),
            "{num_threads} threads, iteration limit {max_iter_size}"
        );
        assert_eq!(
            partial.framebuffer().unwrap().to_depth(),
            reference.framebuffer().unwrap().to_depth(),
            "{num_threads} threads, iteration limit {max_iter_size}"
        );
    }
}

#[test]
fn framebuffer_needs_not_be_a_multiple_of_the_tile_size() {
    let engine = render(config(8, 2), 12, 10, &[fullscreen(0.0, RED)]);
    expect_uniform(engine.framebuffer().unwrap(), [255, 0, 0, 255]);
}

#[test]
fn attributes_interpolate_across_the_triangle() {
    // A triangle with red, green and blue corners: the exact center carries
    // the mean of the corner colors.
    let vertices: Vec<f32> = [
        [-1.0_f32, -1.0, 0.0, 1.0, 1.0, 0.0, 0.0],
        [1.0, -1.0, 0.0, 1.0, 0.0, 1.0, 0.0],
        [-1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0],
    ]
    .concat();

    let mut engine = RenderEngine::new(config(8, 1)).unwrap();
    engine.set_render_targets(Framebuffer::new(64, 64));
    engine.clear(Some(CLEAR_COLOR), Some(1.0));
    engine.bind_shader(Arc::new(ColorShader));
    engine.bind_vertex_buffer(bytemuck::cast_slice(&vertices).into(), STRIDE);
    engine.bind_index_buffer(vec![0, 1, 2].into());
    engine.draw_indexed(1, 0);

    let fb = engine.framebuffer().unwrap();
    // At pixel (16, 16) the sample center (16.5, 16.5) has barycentric
    // weights (31/64, 16.5/64, 16.5/64), so roughly (123, 65, 65).
    let center = fb.color_at(16, 16);
    assert!((center[0] as i32 - 123).abs() <= 2, "center {center:?}");
    assert!((center[1] as i32 - 65).abs() <= 2, "center {center:?}");
    assert!((center[2] as i32 - 65).abs() <= 2, "center {center:?}");
    assert_eq!(center[3], 255);

    // Corners are dominated by their own color. (Pixel (62, 1) itself sits
    // exactly on the hypotenuse and is excluded by the tie-breaker.)
    assert!(fb.color_at(1, 1)[0] > 220);
    assert!(fb.color_at(61, 1)[1] > 220);
    assert!(fb.color_at(1, 61)[2] > 220);
}
