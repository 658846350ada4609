// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Append-only arenas of coverage masks.
//!
//! Each `(tile, worker)` pair has its own arena, written only by that worker
//! and read by whichever worker fragment-shades the tile after the post-raster
//! sync point. An arena is a list of fixed-size slabs rather than one growable
//! vector: records already written never move, and growing means appending a
//! slab. Slabs are retained across draw iterations and rewound by `reset`.

/// Granularity of a coverage record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CoverageKind {
    /// The whole tile is covered.
    Tile,
    /// A whole `PIXEL_BLOCK_SIZE`-square block is covered.
    Block,
    /// Four contiguous samples in one row, covered per `quad_bits`.
    Quad,
}

/// A rasterized region of one primitive awaiting fragment shading.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CoverageMask {
    /// Pixel x of the region origin (leftmost sample for quads).
    pub sample_x: u32,
    /// Pixel y of the region origin.
    pub sample_y: u32,
    /// Draw-relative primitive index.
    pub prim: u32,
    pub kind: CoverageKind,
    /// For `Quad`: bit `i` set means sample `x + i` is covered.
    pub quad_bits: u16,
}

#[derive(Debug)]
pub(crate) struct CoverageMaskBuffer {
    slabs: Vec<Vec<CoverageMask>>,
    current: usize,
    slab_capacity: usize,
}

impl CoverageMaskBuffer {
    pub(crate) fn new(slab_capacity: usize) -> Self {
        Self {
            slabs: vec![Vec::with_capacity(slab_capacity)],
            current: 0,
            slab_capacity,
        }
    }

    /// Appends a record to the current slab. The caller guarantees room via
    /// [`Self::refresh_capacity`]; appending never reallocates.
    pub(crate) fn append(&mut self, mask: CoverageMask) {
        let slab = &mut self.slabs[self.current];
        debug_assert!(slab.len() < slab.capacity(), "coverage slab overflow");
        slab.push(mask);
    }

    /// Ensures at least `watermark` records fit without reallocation, moving
    /// to a fresh slab if the current one is too full.
    pub(crate) fn refresh_capacity(&mut self, watermark: usize) {
        let slab = &self.slabs[self.current];
        if slab.capacity() - slab.len() < watermark {
            self.current += 1;
            if self.current == self.slabs.len() {
                self.slabs.push(Vec::with_capacity(self.slab_capacity));
            }
        }
    }

    /// Rewinds every slab, keeping the allocations for reuse.
    pub(crate) fn reset(&mut self) {
        for slab in &mut self.slabs {
            slab.clear();
        }
        self.current = 0;
    }

    /// All records in emission order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &CoverageMask> {
        self.slabs.iter().flat_map(|slab| slab.iter())
    }
}

/// One worker's coverage arenas, one per tile.
#[derive(Debug, Default)]
pub(crate) struct ArenaRow {
    buffers: Vec<CoverageMaskBuffer>,
    /// Worst-case records a single primitive can emit into one tile: one quad
    /// record per four samples.
    watermark: usize,
}

impl ArenaRow {
    pub(crate) fn new(tile_count: usize, tile_size: u32) -> Self {
        let watermark = (tile_size * tile_size / 4) as usize;
        Self {
            buffers: (0..tile_count)
                .map(|_| CoverageMaskBuffer::new(watermark * 2))
                .collect(),
            watermark,
        }
    }

    pub(crate) fn append(&mut self, tile: u32, mask: CoverageMask) {
        self.buffers[tile as usize].append(mask);
    }

    /// Called between primitives so that `append` stays check-free.
    pub(crate) fn refresh(&mut self, tile: u32) {
        let watermark = self.watermark;
        self.buffers[tile as usize].refresh_capacity(watermark);
    }

    pub(crate) fn reset(&mut self) {
        for buffer in &mut self.buffers {
            buffer.reset();
        }
    }

    pub(crate) fn buffer(&self, tile: u32) -> &CoverageMaskBuffer {
        &self.buffers[tile as usize]
    }
}
