// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rasterizer configuration.

use crate::PIXEL_BLOCK_SIZE;
use fearless_simd::Level;
use thiserror::Error;

/// Fixed parameters of a [`RenderEngine`](crate::RenderEngine).
///
/// The configuration is validated when the engine is created; see
/// [`RasterizerError`] for the rejection cases.
#[derive(Clone, Copy, Debug)]
pub struct RasterizerConfig {
    /// Side length of a screen tile in pixels. Must be a power of two and at
    /// least [`PIXEL_BLOCK_SIZE`].
    pub tile_size: u32,
    /// Maximum number of primitives processed per draw iteration. Draw calls
    /// larger than this are transparently split into several iterations.
    pub max_iter_size: u32,
    /// Number of pipeline worker threads.
    pub num_threads: usize,
    /// Whether post-vertex-shader results are cached per worker.
    ///
    /// Disabling the cache never changes the rendered output, only how often
    /// the vertex shader runs.
    pub vertex_cache_enabled: bool,
    /// Whether triangles entirely outside a clip plane are rejected before
    /// setup. Straddling triangles are never split; homogeneous rasterization
    /// handles them downstream.
    pub clipping_enabled: bool,
    /// SIMD level used by the pixel kernels.
    pub level: Level,
}

impl Default for RasterizerConfig {
    fn default() -> Self {
        Self {
            tile_size: 64,
            max_iter_size: 2048,
            num_threads: 4,
            vertex_cache_enabled: true,
            clipping_enabled: true,
            level: Level::new(),
        }
    }
}

impl RasterizerConfig {
    pub(crate) fn validate(&self) -> Result<(), RasterizerError> {
        if !self.tile_size.is_power_of_two() || self.tile_size < PIXEL_BLOCK_SIZE {
            return Err(RasterizerError::InvalidTileSize(self.tile_size));
        }
        if self.num_threads == 0 {
            return Err(RasterizerError::NoPipelineThreads);
        }
        if self.max_iter_size == 0 {
            return Err(RasterizerError::InvalidIterationSize);
        }
        Ok(())
    }
}

/// Errors reported when constructing a [`RenderEngine`](crate::RenderEngine).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RasterizerError {
    /// The tile size is not a power of two, or smaller than a pixel block.
    #[error("tile size must be a power of two of at least {PIXEL_BLOCK_SIZE}, got {0}")]
    InvalidTileSize(u32),
    /// The worker pool would be empty.
    #[error("at least one pipeline thread is required")]
    NoPipelineThreads,
    /// The draw iteration size is zero.
    #[error("the maximum draw iteration size must be nonzero")]
    InvalidIterationSize,
}
