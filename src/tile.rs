// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The screen-tile grid.

use crate::setup::Rect2D;
use std::sync::atomic::{AtomicBool, Ordering};

/// The grid of `tile_size`-square screen regions covering the framebuffer.
///
/// Each tile carries its immutable pixel origin and one atomic "queued" flag,
/// cleared at the start of every draw iteration; the flag's winner is the one
/// worker that inserts the tile into the rasterizer queue.
#[derive(Debug)]
pub(crate) struct TileGrid {
    tile_size: u32,
    width: u32,
    height: u32,
    tiles_per_row: u32,
    tiles_per_column: u32,
    queued: Vec<AtomicBool>,
}

impl TileGrid {
    pub(crate) fn new(width: u32, height: u32, tile_size: u32) -> Self {
        let tiles_per_row = width.div_ceil(tile_size);
        let tiles_per_column = height.div_ceil(tile_size);
        Self {
            tile_size,
            width,
            height,
            tiles_per_row,
            tiles_per_column,
            queued: (0..tiles_per_row * tiles_per_column)
                .map(|_| AtomicBool::new(false))
                .collect(),
        }
    }

    /// Framebuffer width this grid was built for.
    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    /// Framebuffer height this grid was built for.
    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn tile_count(&self) -> usize {
        self.queued.len()
    }

    /// Global tile index of grid cell `(tx, ty)`.
    pub(crate) fn index(&self, tx: u32, ty: u32) -> u32 {
        debug_assert!(tx < self.tiles_per_row && ty < self.tiles_per_column);
        ty * self.tiles_per_row + tx
    }

    /// Pixel origin of a tile.
    pub(crate) fn origin(&self, tile: u32) -> (f32, f32) {
        let tx = tile % self.tiles_per_row;
        let ty = tile / self.tiles_per_row;
        ((tx * self.tile_size) as f32, (ty * self.tile_size) as f32)
    }

    /// Test-and-sets the tile's queued flag. Returns `true` for the one caller
    /// that claimed it and must insert the tile into the rasterizer queue.
    pub(crate) fn claim(&self, tile: u32) -> bool {
        !self.queued[tile as usize].swap(true, Ordering::AcqRel)
    }

    pub(crate) fn is_queued(&self, tile: u32) -> bool {
        self.queued[tile as usize].load(Ordering::Acquire)
    }

    /// Clears all queued flags. Only called at iteration start, when no worker
    /// touches the grid.
    pub(crate) fn reset_flags(&self) {
        for flag in &self.queued {
            flag.store(false, Ordering::Relaxed);
        }
    }

    /// The half-open tile index ranges `(tx0..tx1, ty0..ty1)` intersecting a
    /// screen-clamped bounding box.
    pub(crate) fn tile_range(&self, bbox: &Rect2D) -> (u32, u32, u32, u32) {
        let tile = self.tile_size as f32;
        let tx0 = (bbox.min_x / tile).floor() as u32;
        let tx1 = ((bbox.max_x / tile).ceil() as u32).min(self.tiles_per_row);
        let ty0 = (bbox.min_y / tile).floor() as u32;
        let ty1 = ((bbox.max_y / tile).ceil() as u32).min(self.tiles_per_column);
        (tx0, tx1, ty0, ty1)
    }
}
