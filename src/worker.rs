// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The pipeline worker.
//!
//! Every worker is a long-lived thread running the full pipeline for its
//! slice of a draw iteration: vertex shading, trivial-reject clipping,
//! triangle setup, binning, rasterization and fragment shading. The engine
//! separates the phases with two global sync points (post-binning and
//! post-raster); a worker reaches them by handing its phase output back to
//! the engine and cannot continue until the engine has heard from every
//! worker and re-published the combined state for the next phase.

use crate::bin::TileBins;
use crate::config::RasterizerConfig;
use crate::coverage::{ArenaRow, CoverageKind, CoverageMask};
use crate::engine::{
    CoverageShared, DrawResources, DrawTask, FragmentTask, FrameShared, PipelineShared,
    RasterTask, WorkerResult, WorkerTask,
};
use crate::fine;
use crate::framebuffer::Framebuffer;
use crate::queue::INVALID_TILE;
use crate::setup::{self, Rect2D, SetupChunk};
use crate::shader::{FragmentOutput, InterpolatedAttributes, VertexAttributes};
use crate::vertex_cache::VertexCache;
use crate::PIXEL_BLOCK_SIZE;
use crossbeam_channel::{Receiver, Sender};
use fearless_simd::{dispatch, Simd};
use glam::{Vec3, Vec4};
use log::trace;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

/// Where a worker currently is in the draw pipeline.
///
/// Workers publish their own in-phase transitions; the engine is the sole
/// writer of the across-barrier transitions (post-binner → raster,
/// post-raster → fragment, bottom → idle).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum WorkerPhase {
    Idle = 0,
    DrawcallTop,
    Geometry,
    Binning,
    PostBinner,
    Raster,
    PostRaster,
    Fragment,
    DrawcallBottom,
    Terminated,
}

impl WorkerPhase {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::DrawcallTop,
            2 => Self::Geometry,
            3 => Self::Binning,
            4 => Self::PostBinner,
            5 => Self::Raster,
            6 => Self::PostRaster,
            7 => Self::Fragment,
            8 => Self::DrawcallBottom,
            _ => Self::Terminated,
        }
    }
}

/// Outcome of the hierarchical coverage test for one square region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Coverage {
    /// The region is entirely outside at least one edge.
    TrivialReject,
    /// The region is entirely inside all three edges.
    TrivialAccept,
    /// The region straddles an edge; descend a level.
    Overlap,
}

/// Corner setup for testing axis-aligned squares of side `size` against a
/// triangle, shared between the tile and block levels.
///
/// For each edge, the trivial-reject corner is the region corner with the
/// maximal signed distance from the edge, picked once from the signs of the
/// edge normal `(a, b)`; the trivial-accept corner is diagonally opposite.
/// `E` is evaluated once at the first region and stepped by
/// `(a·Δx + b·Δy)` for its neighbors.
pub(crate) struct CoverageTest {
    /// TR corner offset from the region origin, per edge.
    tr: [(f32, f32); 3],
    /// `E(TA corner) − E(TR corner)`, per edge.
    ta_step: [f32; 3],
}

impl CoverageTest {
    pub(crate) fn new(edges: &[Vec3; 3], size: f32) -> Self {
        let mut tr = [(0.0, 0.0); 3];
        let mut ta_step = [0.0; 3];
        for (k, e) in edges.iter().enumerate() {
            let cx = if e.x >= 0.0 { size } else { 0.0 };
            let cy = if e.y >= 0.0 { size } else { 0.0 };
            tr[k] = (cx, cy);
            ta_step[k] = e.x * (size - 2.0 * cx) + e.y * (size - 2.0 * cy);
        }
        Self { tr, ta_step }
    }

    /// Edge values at the TR corners of the region whose origin is
    /// `(origin_x, origin_y)`.
    pub(crate) fn base_values(&self, edges: &[Vec3; 3], origin_x: f32, origin_y: f32) -> [f32; 3] {
        std::array::from_fn(|k| {
            edges[k].x * (origin_x + self.tr[k].0) + edges[k].y * (origin_y + self.tr[k].1)
                + edges[k].z
        })
    }

    /// Classifies the region `(step_x, step_y)` pixels away from the region
    /// `base` was evaluated at.
    pub(crate) fn classify(
        &self,
        edges: &[Vec3; 3],
        base: &[f32; 3],
        step_x: f32,
        step_y: f32,
    ) -> Coverage {
        let tr: [f32; 3] =
            std::array::from_fn(|k| base[k] + edges[k].x * step_x + edges[k].y * step_y);
        if tr.iter().any(|v| *v < 0.0) {
            Coverage::TrivialReject
        } else if (0..3).all(|k| tr[k] + self.ta_step[k] >= 0.0) {
            Coverage::TrivialAccept
        } else {
            Coverage::Overlap
        }
    }
}

pub(crate) struct Worker {
    index: usize,
    config: RasterizerConfig,
    shared: Arc<PipelineShared>,
    tasks: Receiver<WorkerTask>,
    results: Sender<(usize, WorkerResult)>,
    vertex_cache: VertexCache,
    /// Per-iteration state carried across the three phase tasks.
    resources: Option<Arc<DrawResources>>,
    tiles: Option<Arc<crate::tile::TileGrid>>,
    queue: Option<Arc<crate::queue::RasterizerQueue>>,
    arenas: Option<ArenaRow>,
}

impl Worker {
    pub(crate) fn new(
        index: usize,
        config: RasterizerConfig,
        shared: Arc<PipelineShared>,
        tasks: Receiver<WorkerTask>,
        results: Sender<(usize, WorkerResult)>,
    ) -> Self {
        Self {
            index,
            config,
            shared,
            tasks,
            results,
            vertex_cache: VertexCache::new(),
            resources: None,
            tiles: None,
            queue: None,
            arenas: None,
        }
    }

    /// The worker loop. Returns when the engine drops the task sender.
    pub(crate) fn run(mut self) {
        while let Ok(task) = self.tasks.recv() {
            match task {
                WorkerTask::Draw(task) => self.geometry_phase(*task),
                WorkerTask::Raster(task) => self.raster_phase(task),
                WorkerTask::Fragment(task) => self.fragment_phase(task),
            }
        }
        self.set_phase(WorkerPhase::Terminated);
    }

    fn set_phase(&self, phase: WorkerPhase) {
        self.shared.phases[self.index].store(phase as u8, Ordering::Release);
    }

    fn phase(&self) -> WorkerPhase {
        WorkerPhase::from_u8(self.shared.phases[self.index].load(Ordering::Acquire))
    }

    /// Geometry processing for the worker's primitive slice: vertex shading,
    /// interpolation setup, clipping, triangle setup and binning.
    fn geometry_phase(&mut self, task: DrawTask) {
        self.set_phase(WorkerPhase::DrawcallTop);
        if task.clear_vertex_cache {
            self.vertex_cache.clear();
        }
        // The engine publishes the setup-complete flag only after every worker
        // has been handed its slice.
        while !self.shared.draw_setup_complete.load(Ordering::Acquire) {
            thread::yield_now();
        }
        self.set_phase(WorkerPhase::Geometry);
        trace!("worker {} geometry: prims {:?}", self.index, task.range);

        let DrawTask {
            range,
            iter_base,
            vertex_offset,
            resources,
            tiles,
            queue,
            mut chunk,
            mut bins,
            mut arenas,
            ..
        } = task;

        let slice_base = range.start - iter_base;
        let width = tiles.width();
        let height = tiles.height();
        let metadata = resources.metadata;

        for prim in range {
            let draw_idx = prim - iter_base;
            let local = (draw_idx - slice_base) as usize;

            let idx_base = (vertex_offset + 3 * prim) as usize;
            let v0_idx = resources.indices[idx_base];
            let v1_idx = resources.indices[idx_base + 1];
            let v2_idx = resources.indices[idx_base + 2];

            let (v0, a0) = self.shade_vertex(&resources, v0_idx);
            let (v1, a1) = self.shade_vertex(&resources, v1_idx);
            let (v2, a2) = self.shade_vertex(&resources, v2_idx);
            chunk.store_attribute_deltas(local, &metadata, &a0, &a1, &a2);

            if self.config.clipping_enabled && setup::trivially_rejected(v0, v1, v2) {
                continue;
            }

            let Some(edges) = setup::edge_equations(v0, v1, v2, width, height) else {
                // Back-facing or degenerate.
                continue;
            };
            chunk.set_edges(local, edges);
            chunk.set_z_delta(local, v0, v1, v2);

            self.set_phase(WorkerPhase::Binning);
            let bbox = setup::bounding_box(v0, v1, v2, width, height);
            if bbox.outside_screen(width, height) {
                continue;
            }
            let bbox = bbox.clamped_to_screen(width, height);
            chunk.set_bbox(local, bbox);

            self.bin_primitive(&tiles, &queue, &mut bins, &mut arenas, &edges, &bbox, draw_idx);
        }

        trace!("worker {} post-binning sync point", self.index);
        self.set_phase(WorkerPhase::PostBinner);
        self.resources = Some(resources);
        self.tiles = Some(tiles);
        self.queue = Some(queue);
        self.arenas = Some(arenas);
        self.results
            .send((self.index, WorkerResult::GeometryDone { chunk, bins }))
            .unwrap();
    }

    fn shade_vertex(
        &mut self,
        resources: &DrawResources,
        vertex_idx: u32,
    ) -> (Vec4, VertexAttributes) {
        if self.config.vertex_cache_enabled {
            if let Some((clip, attrs)) = self.vertex_cache.lookup(vertex_idx) {
                return (clip, *attrs);
            }
        }
        let mut attrs = VertexAttributes::default();
        let start = resources.stride * vertex_idx as usize;
        let vertex_in = &resources.vertices[start..start + resources.stride];
        let clip = resources.shader.vertex(vertex_in, &mut attrs);
        if self.config.vertex_cache_enabled {
            self.vertex_cache.insert(vertex_idx, clip, attrs);
        }
        (clip, attrs)
    }

    /// Walks the tiles intersecting the primitive's bounding box, trivially
    /// accepting whole tiles or binning the primitive for per-block
    /// rasterization.
    #[expect(clippy::too_many_arguments, reason = "hot per-primitive path, no state worth bundling")]
    fn bin_primitive(
        &self,
        tiles: &crate::tile::TileGrid,
        queue: &crate::queue::RasterizerQueue,
        bins: &mut TileBins,
        arenas: &mut ArenaRow,
        edges: &[Vec3; 3],
        bbox: &Rect2D,
        draw_idx: u32,
    ) {
        let tile_size = self.config.tile_size as f32;
        let (tx0, tx1, ty0, ty1) = tiles.tile_range(bbox);
        let test = CoverageTest::new(edges, tile_size);
        let (first_x, first_y) = tiles.origin(tiles.index(tx0, ty0));
        let base = test.base_values(edges, first_x, first_y);

        for ty in ty0..ty1 {
            for tx in tx0..tx1 {
                let step_x = (tx - tx0) as f32 * tile_size;
                let step_y = (ty - ty0) as f32 * tile_size;
                let tile = tiles.index(tx, ty);

                match test.classify(edges, &base, step_x, step_y) {
                    Coverage::TrivialReject => {}
                    Coverage::TrivialAccept => {
                        // The whole tile is inside the triangle; it skips
                        // block rasterization and goes straight to fragment
                        // shading.
                        trace!("tile {tile} trivially accepted by worker {}", self.index);
                        if tiles.claim(tile) {
                            queue.insert(tile);
                        }
                        arenas.refresh(tile);
                        arenas.append(
                            tile,
                            CoverageMask {
                                sample_x: (first_x + step_x) as u32,
                                sample_y: (first_y + step_y) as u32,
                                prim: draw_idx,
                                kind: CoverageKind::Tile,
                                quad_bits: 0,
                            },
                        );
                    }
                    Coverage::Overlap => {
                        trace!("tile {tile} binned by worker {}", self.index);
                        if bins.push(tile, draw_idx) && tiles.claim(tile) {
                            queue.insert(tile);
                        }
                    }
                }
            }
        }
    }

    /// Rasterization: pull tiles from the shared queue and turn binned
    /// primitives into block and quad coverage masks.
    fn raster_phase(&mut self, task: RasterTask) {
        debug_assert_eq!(self.phase(), WorkerPhase::Raster);
        trace!("worker {} rasterizing", self.index);

        let RasterTask { frame } = task;
        let mut arenas = self.arenas.take().unwrap();
        dispatch!(self.config.level, simd => self.rasterize_tiles(simd, &frame, &mut arenas));
        drop(frame);

        trace!("worker {} post-raster sync point", self.index);
        self.set_phase(WorkerPhase::PostRaster);
        self.results
            .send((self.index, WorkerResult::RasterDone { arenas }))
            .unwrap();
    }

    fn rasterize_tiles<S: Simd>(&self, simd: S, frame: &FrameShared, arenas: &mut ArenaRow) {
        let tiles = self.tiles.as_ref().unwrap();
        let queue = self.queue.as_ref().unwrap();
        let tile_size = self.config.tile_size as f32;

        loop {
            let tile = queue.fetch_raster();
            if tile == INVALID_TILE {
                break;
            }
            debug_assert!(tiles.is_queued(tile));

            let (tile_x, tile_y) = tiles.origin(tile);
            let tile_rect = Rect2D {
                min_x: tile_x,
                min_y: tile_y,
                max_x: tile_x + tile_size,
                max_y: tile_y + tile_size,
            };

            // Per-worker bins in worker order, primitives in insertion order,
            // which together preserve submission order for this tile.
            for worker_bins in &frame.bins {
                for &prim in worker_bins.primitives(tile) {
                    let (owner, local) = frame.locate(prim);
                    self.raster_primitive(
                        simd,
                        &frame.chunks[owner],
                        local,
                        prim,
                        tile,
                        &tile_rect,
                        tiles.height(),
                        arenas,
                    );
                    arenas.refresh(tile);
                }
            }
        }
    }

    /// Tests the blocks of one tile against one primitive, emitting BLOCK
    /// masks for trivially accepted blocks and QUAD masks where the primitive
    /// straddles an edge.
    #[expect(clippy::too_many_arguments, reason = "hot per-primitive path, no state worth bundling")]
    fn raster_primitive<S: Simd>(
        &self,
        simd: S,
        chunk: &SetupChunk,
        local: usize,
        prim: u32,
        tile: u32,
        tile_rect: &Rect2D,
        fb_height: u32,
        arenas: &mut ArenaRow,
    ) {
        let block = PIXEL_BLOCK_SIZE as f32;
        let e = chunk.edges(local);
        let edges = [e[0], e[1], e[2]];

        let bbox = chunk.bbox(local).intersect(tile_rect);
        let bx0 = ((bbox.min_x - tile_rect.min_x) / block).floor() as u32;
        let bx1 = ((bbox.max_x - tile_rect.min_x) / block).ceil() as u32;
        let by0 = ((bbox.min_y - tile_rect.min_y) / block).floor() as u32;
        let by1 = ((bbox.max_y - tile_rect.min_y) / block).ceil() as u32;

        let test = CoverageTest::new(&edges, block);
        let first_x = tile_rect.min_x + bx0 as f32 * block;
        let first_y = tile_rect.min_y + by0 as f32 * block;
        let base = test.base_values(&edges, first_x, first_y);

        for by in by0..by1 {
            for bx in bx0..bx1 {
                let step_x = (bx - bx0) as f32 * block;
                let step_y = (by - by0) as f32 * block;

                match test.classify(&edges, &base, step_x, step_y) {
                    Coverage::TrivialReject => {}
                    Coverage::TrivialAccept => {
                        arenas.append(
                            tile,
                            CoverageMask {
                                sample_x: (first_x + step_x) as u32,
                                sample_y: (first_y + step_y) as u32,
                                prim,
                                kind: CoverageKind::Block,
                                quad_bits: 0,
                            },
                        );
                    }
                    Coverage::Overlap => {
                        let block_x = (first_x + step_x) as u32;
                        let block_y = (first_y + step_y) as u32;
                        for py in 0..PIXEL_BLOCK_SIZE {
                            let y = block_y + py;
                            if y >= fb_height {
                                break;
                            }
                            for qx in 0..PIXEL_BLOCK_SIZE / 4 {
                                let x = block_x + qx * 4;
                                let bits = fine::quad_coverage(simd, &edges, x, y);
                                if bits != 0 {
                                    arenas.append(
                                        tile,
                                        CoverageMask {
                                            sample_x: x,
                                            sample_y: y,
                                            prim,
                                            kind: CoverageKind::Quad,
                                            quad_bits: bits,
                                        },
                                    );
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Fragment shading: pull tiles from the queue's fragment cursor and
    /// consume the tile's coverage masks in worker, then emission order.
    fn fragment_phase(&mut self, task: FragmentTask) {
        debug_assert_eq!(self.phase(), WorkerPhase::Fragment);
        trace!("worker {} fragment shading", self.index);

        let FragmentTask { coverage, framebuffer } = task;
        dispatch!(self.config.level, simd => self.shade_tiles(simd, &coverage, &framebuffer));

        // Release every shared handle before reporting completion: the engine
        // reclaims the iteration's buffers from sole ownership.
        drop(coverage);
        drop(framebuffer);
        self.resources = None;
        self.tiles = None;
        self.queue = None;

        trace!("worker {} drawcall ended", self.index);
        self.set_phase(WorkerPhase::DrawcallBottom);
        self.results
            .send((self.index, WorkerResult::FragmentDone))
            .unwrap();
    }

    fn shade_tiles<S: Simd>(&self, simd: S, coverage: &CoverageShared, fb: &Framebuffer) {
        let queue = self.queue.as_ref().unwrap();
        let resources = self.resources.as_ref().unwrap();
        let mut attrs = InterpolatedAttributes::default();
        let mut out = FragmentOutput::default();

        loop {
            let tile = queue.fetch_fragment();
            if tile == INVALID_TILE {
                break;
            }

            for row in &coverage.arenas {
                for mask in row.buffer(tile).iter() {
                    let (owner, local) = coverage.frame.locate(mask.prim);
                    let chunk = &coverage.frame.chunks[owner];
                    match mask.kind {
                        CoverageKind::Tile => self.shade_tile_region(
                            simd,
                            resources,
                            chunk,
                            local,
                            mask.sample_x,
                            mask.sample_y,
                            fb,
                            &mut attrs,
                            &mut out,
                        ),
                        CoverageKind::Block => self.shade_block(
                            simd,
                            resources,
                            chunk,
                            local,
                            mask.sample_x,
                            mask.sample_y,
                            fb,
                            &mut attrs,
                            &mut out,
                        ),
                        CoverageKind::Quad => self.shade_quad(
                            simd,
                            resources,
                            chunk,
                            local,
                            mask.sample_x,
                            mask.sample_y,
                            mask.quad_bits,
                            fb,
                            &mut attrs,
                            &mut out,
                        ),
                    }
                }
            }
        }
    }

    /// Expands a full-tile mask into block shades.
    #[expect(clippy::too_many_arguments, reason = "hot shading path, no state worth bundling")]
    fn shade_tile_region<S: Simd>(
        &self,
        simd: S,
        resources: &DrawResources,
        chunk: &SetupChunk,
        local: usize,
        tile_x: u32,
        tile_y: u32,
        fb: &Framebuffer,
        attrs: &mut InterpolatedAttributes,
        out: &mut FragmentOutput,
    ) {
        let blocks = self.config.tile_size / PIXEL_BLOCK_SIZE;
        for by in 0..blocks {
            let y = tile_y + by * PIXEL_BLOCK_SIZE;
            if y >= fb.height() {
                break;
            }
            for bx in 0..blocks {
                let x = tile_x + bx * PIXEL_BLOCK_SIZE;
                if x >= fb.width() {
                    break;
                }
                self.shade_block(simd, resources, chunk, local, x, y, fb, attrs, out);
            }
        }
    }

    #[expect(clippy::too_many_arguments, reason = "hot shading path, no state worth bundling")]
    fn shade_block<S: Simd>(
        &self,
        simd: S,
        resources: &DrawResources,
        chunk: &SetupChunk,
        local: usize,
        block_x: u32,
        block_y: u32,
        fb: &Framebuffer,
        attrs: &mut InterpolatedAttributes,
        out: &mut FragmentOutput,
    ) {
        for py in 0..PIXEL_BLOCK_SIZE {
            let y = block_y + py;
            if y >= fb.height() {
                break;
            }
            for qx in 0..PIXEL_BLOCK_SIZE / 4 {
                self.shade_quad(
                    simd,
                    resources,
                    chunk,
                    local,
                    block_x + qx * 4,
                    y,
                    0b1111,
                    fb,
                    attrs,
                    out,
                );
            }
        }
    }

    /// Depth-tests and shades one quad. The effective write mask is the depth
    /// result AND the coverage bits AND the framebuffer bounds.
    #[expect(clippy::too_many_arguments, reason = "hot shading path, no state worth bundling")]
    fn shade_quad<S: Simd>(
        &self,
        simd: S,
        resources: &DrawResources,
        chunk: &SetupChunk,
        local: usize,
        x: u32,
        y: u32,
        coverage_bits: u16,
        fb: &Framebuffer,
        attrs: &mut InterpolatedAttributes,
        out: &mut FragmentOutput,
    ) {
        let e = chunk.edges(local);
        let edges = [e[0], e[1], e[2]];

        let (current, in_bounds) = fb.depth_quad(x, y);
        if in_bounds == 0 {
            return;
        }

        let (f0, f1) = fine::basis_functions(simd, &edges, x, y);
        let z = fine::interpolate(simd, f0, f1, chunk.z_delta(local));
        let write = fine::depth_test_leq(simd, z, current) & coverage_bits & in_bounds;
        if write == 0 {
            return;
        }

        fine::interpolate_attributes(simd, f0, f1, chunk, local, &resources.metadata, attrs);
        resources.shader.fragment(attrs, out);
        fb.write_quad(x, y, write, z.into(), &out.colors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::edge_equations;
    use glam::Vec4;

    /// Covers the raster-space triangle (0,0), (64,0), (0,64) on a 64x64
    /// screen: the hypotenuse is the line `x + y = 64`.
    fn half_screen_edges() -> [Vec3; 3] {
        edge_equations(
            Vec4::new(-1.0, -1.0, 0.0, 1.0),
            Vec4::new(1.0, -1.0, 0.0, 1.0),
            Vec4::new(-1.0, 1.0, 0.0, 1.0),
            64,
            64,
        )
        .unwrap()
    }

    #[test]
    fn coverage_classifies_tiles_against_the_hypotenuse() {
        let edges = half_screen_edges();
        let test = CoverageTest::new(&edges, 16.0);
        let base = test.base_values(&edges, 0.0, 0.0);

        // The top-left 16px tile lies entirely inside the triangle.
        assert_eq!(test.classify(&edges, &base, 0.0, 0.0), Coverage::TrivialAccept);
        // The tile whose far corner crosses `x + y = 64` straddles it.
        assert_eq!(test.classify(&edges, &base, 48.0, 0.0), Coverage::Overlap);
        // A tile entirely beyond the hypotenuse rejects.
        assert_eq!(
            test.classify(&edges, &base, 48.0, 48.0),
            Coverage::TrivialReject
        );
    }

    #[test]
    fn coverage_classifies_blocks() {
        // A small triangle: raster (0,0), (16,0), (0,16).
        let edges = edge_equations(
            Vec4::new(-1.0, -1.0, 0.0, 1.0),
            Vec4::new(-0.5, -1.0, 0.0, 1.0),
            Vec4::new(-1.0, -0.5, 0.0, 1.0),
            64,
            64,
        )
        .unwrap();
        let test = CoverageTest::new(&edges, 8.0);
        let base = test.base_values(&edges, 0.0, 0.0);
        // The top-left block touches the hypotenuse only at its far corner.
        assert_eq!(test.classify(&edges, &base, 0.0, 0.0), Coverage::TrivialAccept);
        // The diagonal neighbor straddles the hypotenuse.
        assert_eq!(test.classify(&edges, &base, 8.0, 8.0), Coverage::Overlap);
        // Far away from the triangle everything rejects.
        assert_eq!(
            test.classify(&edges, &base, 40.0, 40.0),
            Coverage::TrivialReject
        );
    }

    #[test]
    fn stepping_matches_direct_evaluation() {
        let edges = half_screen_edges();
        let test = CoverageTest::new(&edges, 8.0);
        let base = test.base_values(&edges, 0.0, 0.0);
        let direct = test.base_values(&edges, 24.0, 16.0);
        for k in 0..3 {
            let stepped = base[k] + edges[k].x * 24.0 + edges[k].y * 16.0;
            assert!((stepped - direct[k]).abs() < 1e-3);
        }
    }
}
