// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small per-worker cache of post-vertex-shader results.

use crate::shader::VertexAttributes;
use glam::Vec4;

/// Cache capacity. Lookups are linear, so the cache is deliberately small.
const VERTEX_CACHE_SIZE: usize = 16;

#[derive(Clone, Copy, Debug)]
struct CacheEntry {
    vertex_idx: u32,
    clip_pos: Vec4,
    attributes: VertexAttributes,
}

/// An associative cache mapping vertex indices to vertex-shader outputs.
///
/// Entirely thread local. Once full, further inserts are silently dropped;
/// the miss path re-runs the vertex shader, which is always correct because
/// the shader is pure with respect to the vertex bytes.
#[derive(Debug, Default)]
pub(crate) struct VertexCache {
    entries: Vec<CacheEntry>,
}

impl VertexCache {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::with_capacity(VERTEX_CACHE_SIZE),
        }
    }

    /// Flushes the cache. Called before every draw call.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn lookup(&self, vertex_idx: u32) -> Option<(Vec4, &VertexAttributes)> {
        self.entries
            .iter()
            .find(|e| e.vertex_idx == vertex_idx)
            .map(|e| (e.clip_pos, &e.attributes))
    }

    pub(crate) fn insert(&mut self, vertex_idx: u32, clip_pos: Vec4, attributes: VertexAttributes) {
        if self.entries.len() < VERTEX_CACHE_SIZE {
            self.entries.push(CacheEntry {
                vertex_idx,
                clip_pos,
                attributes,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_returns_inserted_entry() {
        let mut cache = VertexCache::new();
        assert!(cache.lookup(7).is_none());

        let clip = Vec4::new(1.0, 2.0, 3.0, 4.0);
        cache.insert(7, clip, VertexAttributes::default());
        let (cached, _) = cache.lookup(7).unwrap();
        assert_eq!(cached, clip);
        assert!(cache.lookup(8).is_none());
    }

    #[test]
    fn inserts_beyond_capacity_are_dropped() {
        let mut cache = VertexCache::new();
        for idx in 0..VERTEX_CACHE_SIZE as u32 + 4 {
            cache.insert(idx, Vec4::splat(idx as f32), VertexAttributes::default());
        }

        assert!(cache.lookup(0).is_some());
        assert!(cache.lookup(VERTEX_CACHE_SIZE as u32 - 1).is_some());
        assert!(cache.lookup(VERTEX_CACHE_SIZE as u32).is_none());
    }

    #[test]
    fn clear_empties_the_cache() {
        let mut cache = VertexCache::new();
        cache.insert(3, Vec4::ONE, VertexAttributes::default());
        cache.clear();
        assert!(cache.lookup(3).is_none());
    }
}
