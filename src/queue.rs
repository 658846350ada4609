// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shared rasterizer work queue.

use std::sync::atomic::{AtomicU32, Ordering};

/// Sentinel returned by the fetch operations when the queue is drained.
pub(crate) const INVALID_TILE: u32 = u32::MAX;

/// A lock-free FIFO of tile indices with one insertion cursor and two
/// independent consumption cursors, one for the rasterization phase and one
/// for the fragment phase, so each phase consumes every inserted tile exactly
/// once.
///
/// The backing store holds `tile_count + num_workers` slots: a drained fetch
/// still bumps its cursor, and up to one overrun per worker per phase must
/// stay within bounds. A tile is inserted at most once per draw iteration,
/// guaranteed by the tile's queued flag, so insertion order is the only
/// ordering among concurrent inserters and is irrelevant.
#[derive(Debug)]
pub(crate) struct RasterizerQueue {
    slots: Vec<AtomicU32>,
    insert_cursor: AtomicU32,
    raster_cursor: AtomicU32,
    fragment_cursor: AtomicU32,
}

impl RasterizerQueue {
    pub(crate) fn new(tile_count: usize, num_workers: usize) -> Self {
        Self {
            slots: (0..tile_count + num_workers)
                .map(|_| AtomicU32::new(INVALID_TILE))
                .collect(),
            insert_cursor: AtomicU32::new(0),
            raster_cursor: AtomicU32::new(0),
            fragment_cursor: AtomicU32::new(0),
        }
    }

    /// Appends a tile index. The release store publishes the slot to fetches
    /// that observe the bumped insertion cursor.
    pub(crate) fn insert(&self, tile: u32) {
        let pos = self.insert_cursor.fetch_add(1, Ordering::Relaxed) as usize;
        assert!(pos < self.slots.len(), "rasterizer queue overrun");
        self.slots[pos].store(tile, Ordering::Release);
    }

    /// Pops the next tile for rasterization, or [`INVALID_TILE`] when drained.
    pub(crate) fn fetch_raster(&self) -> u32 {
        self.fetch(&self.raster_cursor)
    }

    /// Pops the next tile for fragment shading, or [`INVALID_TILE`] when
    /// drained.
    pub(crate) fn fetch_fragment(&self) -> u32 {
        self.fetch(&self.fragment_cursor)
    }

    fn fetch(&self, cursor: &AtomicU32) -> u32 {
        let pos = cursor.fetch_add(1, Ordering::AcqRel) as usize;
        if pos >= self.insert_cursor.load(Ordering::Acquire) as usize {
            INVALID_TILE
        } else {
            self.slots[pos].load(Ordering::Acquire)
        }
    }

    /// Rewinds all cursors. Only called at iteration start, when no worker is
    /// inside the queue.
    pub(crate) fn reset(&self) {
        self.insert_cursor.store(0, Ordering::Relaxed);
        self.raster_cursor.store(0, Ordering::Relaxed);
        self.fragment_cursor.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_cursors_see_every_tile_once() {
        let queue = RasterizerQueue::new(4, 2);
        for tile in [3, 0, 2] {
            queue.insert(tile);
        }

        let drain = |fetch: &dyn Fn() -> u32| {
            let mut seen = Vec::new();
            loop {
                let tile = fetch();
                if tile == INVALID_TILE {
                    break;
                }
                seen.push(tile);
            }
            seen
        };

        assert_eq!(drain(&|| queue.fetch_raster()), [3, 0, 2]);
        assert_eq!(drain(&|| queue.fetch_fragment()), [3, 0, 2]);
        // Drained queues keep reporting empty.
        assert_eq!(queue.fetch_raster(), INVALID_TILE);
        assert_eq!(queue.fetch_fragment(), INVALID_TILE);
    }

    #[test]
    fn reset_rewinds_all_cursors() {
        let queue = RasterizerQueue::new(2, 1);
        queue.insert(1);
        assert_eq!(queue.fetch_raster(), 1);
        queue.reset();
        assert_eq!(queue.fetch_raster(), INVALID_TILE);
        queue.insert(0);
        assert_eq!(queue.fetch_raster(), 0);
        assert_eq!(queue.fetch_fragment(), 0);
    }

    #[test]
    fn empty_fetches_tolerate_cursor_overrun() {
        let queue = RasterizerQueue::new(1, 3);
        for _ in 0..3 {
            assert_eq!(queue.fetch_raster(), INVALID_TILE);
        }
        queue.reset();
        queue.insert(0);
        assert_eq!(queue.fetch_raster(), 0);
    }
}
