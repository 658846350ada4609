// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render engine: resource binding, draw submission and the pipeline's
//! global sync points.
//!
//! The engine owns all shared state and a pool of long-lived workers. A draw
//! call is chopped into iterations of at most
//! [`RasterizerConfig::max_iter_size`] primitives, each partitioned evenly
//! across the workers. The engine's thread never does pipeline work itself:
//! it hands every worker its slice together with the buffers the worker will
//! write, waits for all workers to reach each sync point, republishes the
//! collected buffers read-only for the next phase, and reclaims them when the
//! iteration completes so the allocations are reused across draws.

use crate::bin::TileBins;
use crate::config::{RasterizerConfig, RasterizerError};
use crate::coverage::ArenaRow;
use crate::framebuffer::Framebuffer;
use crate::queue::RasterizerQueue;
use crate::setup::SetupChunk;
use crate::shader::{Shader, ShaderMetadata};
use crate::tile::TileGrid;
use crate::worker::{Worker, WorkerPhase};
use crate::MAX_VERTEX_ATTRIBUTES;
use crossbeam_channel::{Receiver, Sender};
use log::debug;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// State every worker can reach at any time: the per-worker phase atomics and
/// the draw-setup flag.
pub(crate) struct PipelineShared {
    /// One [`WorkerPhase`] per worker, as its `u8` discriminant.
    pub(crate) phases: Vec<AtomicU8>,
    /// Published by the engine once every worker has been handed its slice of
    /// the current iteration.
    pub(crate) draw_setup_complete: AtomicBool,
}

/// Everything a worker reads while processing one draw call.
pub(crate) struct DrawResources {
    pub(crate) shader: Arc<dyn Shader>,
    pub(crate) metadata: ShaderMetadata,
    pub(crate) vertices: Arc<[u8]>,
    pub(crate) stride: usize,
    pub(crate) indices: Arc<[u32]>,
}

/// The combined geometry output of all workers, published read-only after the
/// post-binning sync point.
pub(crate) struct FrameShared {
    /// Setup chunks in worker order; worker `w` covers draw-relative
    /// primitives `[w·prims_per_worker, …)`, the last worker absorbing the
    /// remainder.
    pub(crate) chunks: Vec<SetupChunk>,
    /// Bins in worker order.
    pub(crate) bins: Vec<TileBins>,
    prims_per_worker: u32,
    num_workers: usize,
}

impl FrameShared {
    /// Maps a draw-relative primitive index to `(worker, chunk-local index)`.
    pub(crate) fn locate(&self, draw_idx: u32) -> (usize, usize) {
        let worker = if self.prims_per_worker == 0 {
            self.num_workers - 1
        } else {
            ((draw_idx / self.prims_per_worker) as usize).min(self.num_workers - 1)
        };
        (worker, (draw_idx - worker as u32 * self.prims_per_worker) as usize)
    }
}

/// [`FrameShared`] plus the coverage arenas of all workers, published
/// read-only after the post-raster sync point.
pub(crate) struct CoverageShared {
    pub(crate) frame: FrameShared,
    /// Arena rows in worker order.
    pub(crate) arenas: Vec<ArenaRow>,
}

pub(crate) struct DrawTask {
    /// Global primitive range of this worker's slice.
    pub(crate) range: Range<u32>,
    /// First global primitive index of the current iteration.
    pub(crate) iter_base: u32,
    /// Offset into the index buffer.
    pub(crate) vertex_offset: u32,
    /// Set on the first iteration of a draw call.
    pub(crate) clear_vertex_cache: bool,
    pub(crate) resources: Arc<DrawResources>,
    pub(crate) tiles: Arc<TileGrid>,
    pub(crate) queue: Arc<RasterizerQueue>,
    pub(crate) chunk: SetupChunk,
    pub(crate) bins: TileBins,
    pub(crate) arenas: ArenaRow,
}

pub(crate) struct RasterTask {
    pub(crate) frame: Arc<FrameShared>,
}

pub(crate) struct FragmentTask {
    pub(crate) coverage: Arc<CoverageShared>,
    pub(crate) framebuffer: Arc<Framebuffer>,
}

pub(crate) enum WorkerTask {
    Draw(Box<DrawTask>),
    Raster(RasterTask),
    Fragment(FragmentTask),
}

pub(crate) enum WorkerResult {
    GeometryDone { chunk: SetupChunk, bins: TileBins },
    RasterDone { arenas: ArenaRow },
    FragmentDone,
}

/// The tile-based rasterizer.
///
/// See the [crate docs](crate) for an end-to-end example.
pub struct RenderEngine {
    config: RasterizerConfig,
    shared: Arc<PipelineShared>,
    task_senders: Vec<Sender<WorkerTask>>,
    results: Receiver<(usize, WorkerResult)>,
    handles: Vec<JoinHandle<()>>,

    framebuffer: Option<Arc<Framebuffer>>,
    tiles: Option<Arc<TileGrid>>,
    queue: Option<Arc<RasterizerQueue>>,

    // Pooled per-worker buffers, taken for the duration of an iteration and
    // reclaimed afterwards.
    chunks: Vec<SetupChunk>,
    bins: Vec<TileBins>,
    arenas: Vec<ArenaRow>,

    shader: Option<(Arc<dyn Shader>, ShaderMetadata)>,
    vertices: Option<(Arc<[u8]>, usize)>,
    indices: Option<Arc<[u32]>>,
}

impl RenderEngine {
    /// Creates the engine and spawns its worker pool.
    pub fn new(config: RasterizerConfig) -> Result<Self, RasterizerError> {
        config.validate()?;
        let num_threads = config.num_threads;

        let shared = Arc::new(PipelineShared {
            phases: (0..num_threads)
                .map(|_| AtomicU8::new(WorkerPhase::Idle as u8))
                .collect(),
            draw_setup_complete: AtomicBool::new(false),
        });

        let (result_sender, results) = crossbeam_channel::unbounded();
        let mut task_senders = Vec::with_capacity(num_threads);
        let mut handles = Vec::with_capacity(num_threads);
        for index in 0..num_threads {
            let (task_sender, task_receiver) = crossbeam_channel::unbounded();
            let worker = Worker::new(
                index,
                config,
                shared.clone(),
                task_receiver,
                result_sender.clone(),
            );
            let handle = std::thread::Builder::new()
                .name(format!("tilerast-worker-{index}"))
                .spawn(move || worker.run())
                .unwrap();
            task_senders.push(task_sender);
            handles.push(handle);
        }

        let slice_capacity = Self::slice_capacity(&config);
        Ok(Self {
            config,
            shared,
            task_senders,
            results,
            handles,
            framebuffer: None,
            tiles: None,
            queue: None,
            chunks: (0..num_threads).map(|_| SetupChunk::new(slice_capacity)).collect(),
            bins: Vec::new(),
            arenas: Vec::new(),
            shader: None,
            vertices: None,
            indices: None,
        })
    }

    /// Largest primitive slice any worker can be assigned in any iteration.
    ///
    /// The last worker of an `iter`-sized iteration absorbs the remainder and
    /// takes `iter/n + iter%n` primitives. That quantity is not monotonic in
    /// `iter`: across all iteration sizes up to `max_iter_size` it peaks
    /// either at `iter = max_iter_size` or at the largest iteration with
    /// `iter % n == n - 1`, so the reservation covers both.
    fn slice_capacity(config: &RasterizerConfig) -> usize {
        let n = config.num_threads as u32;
        let m = config.max_iter_size;
        let worst = if m < n {
            m
        } else {
            (m / n + m % n).max((m / n + n).saturating_sub(2))
        };
        worst as usize
    }

    /// Binds the render target, reallocating all size-dependent pipeline
    /// structures when the dimensions change.
    pub fn set_render_targets(&mut self, framebuffer: Framebuffer) {
        let dims_changed = self
            .framebuffer
            .as_ref()
            .is_none_or(|fb| fb.width() != framebuffer.width() || fb.height() != framebuffer.height());

        if dims_changed {
            let tiles = TileGrid::new(framebuffer.width(), framebuffer.height(), self.config.tile_size);
            let tile_count = tiles.tile_count();
            let slice_capacity = Self::slice_capacity(&self.config);
            self.bins = (0..self.config.num_threads)
                .map(|_| TileBins::new(tile_count, slice_capacity))
                .collect();
            self.arenas = (0..self.config.num_threads)
                .map(|_| ArenaRow::new(tile_count, self.config.tile_size))
                .collect();
            self.queue = Some(Arc::new(RasterizerQueue::new(
                tile_count,
                self.config.num_threads,
            )));
            self.tiles = Some(Arc::new(tiles));
        }
        self.framebuffer = Some(Arc::new(framebuffer));
    }

    /// The bound render target, if any.
    pub fn framebuffer(&self) -> Option<&Framebuffer> {
        self.framebuffer.as_deref()
    }

    /// Unbinds and returns the render target.
    pub fn take_framebuffer(&mut self) -> Option<Framebuffer> {
        self.framebuffer.take().map(|fb| {
            Arc::try_unwrap(fb).ok().expect("framebuffer still borrowed by a worker")
        })
    }

    /// Fills the bound render target.
    ///
    /// # Panics
    ///
    /// Panics if no render target is bound, or a plane to be cleared is
    /// absent.
    pub fn clear(&self, color: Option<[f32; 4]>, depth: Option<f32>) {
        let fb = self.framebuffer.as_ref().expect("no render target bound");
        if let Some(color) = color {
            fb.clear_color(color);
        }
        if let Some(depth) = depth {
            fb.clear_depth(depth);
        }
    }

    /// Binds the shader used by subsequent draws.
    ///
    /// # Panics
    ///
    /// Panics if the shader declares more attribute slots than
    /// [`MAX_VERTEX_ATTRIBUTES`].
    pub fn bind_shader(&mut self, shader: Arc<dyn Shader>) {
        let metadata = shader.metadata();
        assert!(
            metadata.num_vec4 <= MAX_VERTEX_ATTRIBUTES
                && metadata.num_vec3 <= MAX_VERTEX_ATTRIBUTES
                && metadata.num_vec2 <= MAX_VERTEX_ATTRIBUTES,
            "shader declares too many attribute slots"
        );
        self.shader = Some((shader, metadata));
    }

    /// Binds the vertex buffer: a flat byte array of `stride`-sized records.
    ///
    /// # Panics
    ///
    /// Panics if `stride` is zero.
    pub fn bind_vertex_buffer(&mut self, vertices: Arc<[u8]>, stride: usize) {
        assert!(stride > 0, "vertex stride must be nonzero");
        self.vertices = Some((vertices, stride));
    }

    /// Binds the index buffer, three `u32` entries per triangle.
    pub fn bind_index_buffer(&mut self, indices: Arc<[u32]>) {
        self.indices = Some(indices);
    }

    /// Draws `prim_count` indexed triangles, reading indices starting at
    /// `vertex_offset` entries into the index buffer. Blocks until every
    /// worker has finished the draw.
    ///
    /// # Panics
    ///
    /// Panics if a render target, shader, vertex buffer or index buffer is
    /// missing, or the index buffer is too short for the requested range.
    pub fn draw_indexed(&mut self, prim_count: u32, vertex_offset: u32) {
        let (shader, metadata) = self.shader.clone().expect("no shader bound");
        let (vertices, stride) = self.vertices.clone().expect("no vertex buffer bound");
        let indices = self.indices.clone().expect("no index buffer bound");
        assert!(
            (vertex_offset + 3 * prim_count) as usize <= indices.len(),
            "index buffer too short for draw"
        );
        let used = &indices[vertex_offset as usize..(vertex_offset + 3 * prim_count) as usize];
        if let Some(&max_idx) = used.iter().max() {
            assert!(
                (max_idx as usize + 1) * stride <= vertices.len(),
                "vertex index {max_idx} addresses past the vertex buffer"
            );
        }
        let framebuffer = self.framebuffer.clone().expect("no render target bound");
        let tiles = self.tiles.clone().expect("no render target bound");
        let queue = self.queue.clone().expect("no render target bound");

        let resources = Arc::new(DrawResources {
            shader,
            metadata,
            vertices,
            stride,
            indices,
        });

        let n = self.config.num_threads;
        let mut iter_base = 0;
        let mut remaining = prim_count;
        let mut first_iteration = true;

        while remaining > 0 {
            let iter_size = remaining.min(self.config.max_iter_size);
            let prims_per_worker = iter_size / n as u32;
            let remainder = iter_size % n as u32;
            debug!(
                "draw iteration: base {iter_base}, size {iter_size}, {prims_per_worker} prims/worker"
            );

            // Pre-iteration invalidations: every worker is idle here.
            tiles.reset_flags();
            queue.reset();
            self.shared.draw_setup_complete.store(false, Ordering::Relaxed);

            let mut start = iter_base;
            for worker in 0..n {
                debug_assert_eq!(self.phase(worker), WorkerPhase::Idle);
                let mut end = start + prims_per_worker;
                if worker == n - 1 {
                    end += remainder;
                }

                let chunk = std::mem::take(&mut self.chunks[worker]);
                let mut bins = std::mem::take(&mut self.bins[worker]);
                let mut arenas = std::mem::take(&mut self.arenas[worker]);
                bins.clear();
                arenas.reset();

                self.task_senders[worker]
                    .send(WorkerTask::Draw(Box::new(DrawTask {
                        range: start..end,
                        iter_base,
                        vertex_offset,
                        clear_vertex_cache: first_iteration,
                        resources: resources.clone(),
                        tiles: tiles.clone(),
                        queue: queue.clone(),
                        chunk,
                        bins,
                        arenas,
                    })))
                    .unwrap();
                start = end;
            }
            self.shared.draw_setup_complete.store(true, Ordering::Release);

            // Post-binning sync point: all workers must finish binning before
            // any rasterization starts, to preserve submission order.
            let (chunks, bins) = self.collect_geometry();
            self.advance_phases(WorkerPhase::PostBinner, WorkerPhase::Raster);
            let frame = Arc::new(FrameShared {
                chunks,
                bins,
                prims_per_worker,
                num_workers: n,
            });
            for sender in &self.task_senders {
                sender
                    .send(WorkerTask::Raster(RasterTask { frame: frame.clone() }))
                    .unwrap();
            }

            // Post-raster sync point: no worker may start fragment shading
            // while another is still emitting coverage masks.
            let arenas = self.collect_raster();
            self.advance_phases(WorkerPhase::PostRaster, WorkerPhase::Fragment);
            let frame = Arc::try_unwrap(frame)
                .ok()
                .expect("frame state still borrowed after post-raster sync");
            let coverage = Arc::new(CoverageShared { frame, arenas });
            for sender in &self.task_senders {
                sender
                    .send(WorkerTask::Fragment(FragmentTask {
                        coverage: coverage.clone(),
                        framebuffer: framebuffer.clone(),
                    }))
                    .unwrap();
            }

            // Completion barrier.
            self.collect_fragment();
            self.advance_phases(WorkerPhase::DrawcallBottom, WorkerPhase::Idle);

            // Reclaim the iteration's buffers for reuse.
            let coverage = Arc::try_unwrap(coverage)
                .ok()
                .expect("coverage state still borrowed after drawcall");
            self.chunks = coverage.frame.chunks;
            self.bins = coverage.frame.bins;
            self.arenas = coverage.arenas;

            iter_base += iter_size;
            remaining -= iter_size;
            first_iteration = false;
        }
    }

    fn phase(&self, worker: usize) -> WorkerPhase {
        WorkerPhase::from_u8(self.shared.phases[worker].load(Ordering::Acquire))
    }

    /// Advances every worker across a sync point. The channel rendezvous has
    /// already established that all workers sit at `from`; the engine is the
    /// sole writer of this transition.
    fn advance_phases(&self, from: WorkerPhase, to: WorkerPhase) {
        for phase in &self.shared.phases {
            let result = phase.compare_exchange(
                from as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
            debug_assert!(result.is_ok(), "worker not parked at sync point");
        }
    }

    fn collect_geometry(&mut self) -> (Vec<SetupChunk>, Vec<TileBins>) {
        let n = self.config.num_threads;
        let mut chunks: Vec<SetupChunk> = (0..n).map(|_| SetupChunk::default()).collect();
        let mut bins: Vec<TileBins> = (0..n).map(|_| TileBins::default()).collect();
        for _ in 0..n {
            let (worker, result) = self.results.recv().expect("pipeline worker disconnected");
            match result {
                WorkerResult::GeometryDone { chunk, bins: worker_bins } => {
                    chunks[worker] = chunk;
                    bins[worker] = worker_bins;
                }
                _ => unreachable!("unexpected result at post-binning sync"),
            }
        }
        (chunks, bins)
    }

    fn collect_raster(&mut self) -> Vec<ArenaRow> {
        let n = self.config.num_threads;
        let mut arenas: Vec<ArenaRow> = (0..n).map(|_| ArenaRow::default()).collect();
        for _ in 0..n {
            let (worker, result) = self.results.recv().expect("pipeline worker disconnected");
            match result {
                WorkerResult::RasterDone { arenas: worker_arenas } => {
                    arenas[worker] = worker_arenas;
                }
                _ => unreachable!("unexpected result at post-raster sync"),
            }
        }
        arenas
    }

    fn collect_fragment(&mut self) {
        for _ in 0..self.config.num_threads {
            let (_, result) = self.results.recv().expect("pipeline worker disconnected");
            match result {
                WorkerResult::FragmentDone => {}
                _ => unreachable!("unexpected result at drawcall completion"),
            }
        }
    }
}

impl Drop for RenderEngine {
    fn drop(&mut self) {
        // Dropping the senders ends every worker's task loop.
        self.task_senders.clear();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}
