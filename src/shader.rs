// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The programmable shading interface.

use crate::MAX_VERTEX_ATTRIBUTES;
use glam::{Vec2, Vec3, Vec4};

/// Number of samples shaded per fragment shader invocation.
pub(crate) const QUAD_LANES: usize = 4;

/// Declares how many attribute slots of each arity a [`Shader`] actually
/// uses. Only declared slots participate in interpolation setup and
/// fragment-shader interpolation.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShaderMetadata {
    /// Active `Vec4` attribute slots.
    pub num_vec4: usize,
    /// Active `Vec3` attribute slots.
    pub num_vec3: usize,
    /// Active `Vec2` attribute slots.
    pub num_vec2: usize,
}

/// Per-vertex attribute record filled by the vertex shader.
#[derive(Clone, Copy, Debug, Default)]
pub struct VertexAttributes {
    /// `Vec4` attribute slots.
    pub vec4: [Vec4; MAX_VERTEX_ATTRIBUTES],
    /// `Vec3` attribute slots.
    pub vec3: [Vec3; MAX_VERTEX_ATTRIBUTES],
    /// `Vec2` attribute slots.
    pub vec2: [Vec2; MAX_VERTEX_ATTRIBUTES],
}

/// Perspective-correct attribute values for four contiguous samples in a row,
/// laid out as `[slot][component][lane]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct InterpolatedAttributes {
    /// Interpolated `Vec4` slots.
    pub vec4: [[[f32; QUAD_LANES]; 4]; MAX_VERTEX_ATTRIBUTES],
    /// Interpolated `Vec3` slots.
    pub vec3: [[[f32; QUAD_LANES]; 3]; MAX_VERTEX_ATTRIBUTES],
    /// Interpolated `Vec2` slots.
    pub vec2: [[[f32; QUAD_LANES]; 2]; MAX_VERTEX_ATTRIBUTES],
}

/// Fragment shader output: one RGBA color per sample of the quad.
///
/// Components are expected in `[0, 1]`; conversion to 8-bit truncates and
/// saturates.
#[derive(Clone, Copy, Debug, Default)]
pub struct FragmentOutput {
    /// RGBA colors for the four samples, `[lane][component]`.
    pub colors: [[f32; 4]; QUAD_LANES],
}

/// A linked pair of vertex and fragment programs.
///
/// Any uniform state ("constants") belongs to the implementing type itself;
/// the pipeline never inspects it.
///
/// # Purity
///
/// [`Shader::vertex`] must be a pure function of the vertex bytes and the
/// shader's own state: with the vertex cache enabled, the pipeline is free to
/// replay a cached result instead of re-invoking it.
pub trait Shader: Send + Sync {
    /// The attribute slots this shader reads and writes.
    fn metadata(&self) -> ShaderMetadata;

    /// Transforms one vertex.
    ///
    /// `vertex_in` is the raw vertex record (one stride's worth of the bound
    /// vertex buffer). Returns the clip-space position.
    fn vertex(&self, vertex_in: &[u8], attrs: &mut VertexAttributes) -> Vec4;

    /// Shades a quad of four samples.
    fn fragment(&self, attrs: &InterpolatedAttributes, out: &mut FragmentOutput);
}
