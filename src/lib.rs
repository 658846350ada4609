// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tilerast is a CPU-only, tile-based software rasterizer for indexed triangle
//! streams with programmable vertex and fragment shading.
//!
//! A draw call is chopped into iterations, each iteration is partitioned across
//! a pool of long-lived pipeline workers, and every worker runs the full
//! pipeline for its slice: vertex shading, trivial-reject clipping, triangle
//! setup, binning into screen tiles, hierarchical rasterization
//! (tile → block → quad) and fragment shading. The inner pixel loops evaluate
//! four samples at a time using [`fearless_simd`].
//!
//! Output is deterministic: the same scene produces bit-identical color and
//! depth buffers regardless of the number of worker threads.
//!
//! ## Usage
//!
//! To render, you need to:
//!
//! - Create a [`RenderEngine`] from a [`RasterizerConfig`].
//! - Hand it a [`Framebuffer`] with [`RenderEngine::set_render_targets`].
//! - Bind a [`Shader`] and the vertex/index buffers.
//! - Issue [`RenderEngine::draw_indexed`] and read the result back.
//!
//! ```rust
//! use std::sync::Arc;
//! use tilerast::{
//!     Framebuffer, FragmentOutput, InterpolatedAttributes, RasterizerConfig, RenderEngine,
//!     Shader, ShaderMetadata, VertexAttributes,
//! };
//! use glam::Vec4;
//!
//! /// Ignores vertex data beyond the position and paints everything red.
//! struct SolidRed;
//!
//! impl Shader for SolidRed {
//!     fn metadata(&self) -> ShaderMetadata {
//!         ShaderMetadata::default()
//!     }
//!
//!     fn vertex(&self, vertex_in: &[u8], _attrs: &mut VertexAttributes) -> Vec4 {
//!         let pos: [f32; 4] = bytemuck::pod_read_unaligned(vertex_in);
//!         Vec4::from_array(pos)
//!     }
//!
//!     fn fragment(&self, _attrs: &InterpolatedAttributes, out: &mut FragmentOutput) {
//!         out.colors = [[1.0, 0.0, 0.0, 1.0]; 4];
//!     }
//! }
//!
//! let config = RasterizerConfig {
//!     tile_size: 8,
//!     num_threads: 2,
//!     ..RasterizerConfig::default()
//! };
//! let mut engine = RenderEngine::new(config).unwrap();
//! engine.set_render_targets(Framebuffer::new(8, 8));
//! engine.clear(Some([0.0; 4]), Some(1.0));
//!
//! // A triangle covering the whole screen.
//! let vertices: Vec<f32> = [
//!     [-1.0_f32, -1.0, 0.0, 1.0],
//!     [3.0, -1.0, 0.0, 1.0],
//!     [-1.0, 3.0, 0.0, 1.0],
//! ]
//! .concat();
//! engine.bind_shader(Arc::new(SolidRed));
//! engine.bind_vertex_buffer(bytemuck::cast_slice(&vertices).into(), 16);
//! engine.bind_index_buffer(vec![0_u32, 1, 2].into());
//! engine.draw_indexed(1, 0);
//!
//! assert_eq!(engine.framebuffer().unwrap().color_at(4, 4), [255, 0, 0, 255]);
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![warn(clippy::print_stdout, clippy::print_stderr)]
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
#![forbid(unsafe_code)]
#![expect(
    clippy::cast_possible_truncation,
    reason = "pixel coordinates are cast between f32 and integer types in well-understood ranges"
)]

mod bin;
mod config;
mod coverage;
mod engine;
mod fine;
mod framebuffer;
mod queue;
mod setup;
mod shader;
mod tile;
mod vertex_cache;
mod worker;

pub use config::{RasterizerConfig, RasterizerError};
pub use engine::RenderEngine;
pub use fearless_simd::Level;
pub use framebuffer::Framebuffer;
pub use shader::{
    FragmentOutput, InterpolatedAttributes, Shader, ShaderMetadata, VertexAttributes,
};

/// Side length of the fixed pixel block, the unit of trivial accept/reject
/// inside a tile.
pub const PIXEL_BLOCK_SIZE: u32 = 8;

/// Number of attribute slots of each arity a shader may declare.
pub const MAX_VERTEX_ATTRIBUTES: usize = 4;
