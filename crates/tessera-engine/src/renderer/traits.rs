//! Rendering backend contract.
//!
//! The batcher never talks to a GPU API directly. A backend turns these calls
//! into real commands (wgpu, Metal, Vulkan) or records them for inspection.
//! Calls arrive in submission order on a single command stream: every
//! instance-buffer write of a frame precedes the draws that read it.

use super::instance::SpriteInstance;
use crate::api::types::{BufferHandle, PipelineId, ResourceSetId, TextureId};

/// Render tier indicating GPU capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTier {
    /// HDR with Extended Dynamic Range
    HdrEdr,
    /// HDR within sRGB gamut
    HdrSrgb,
    /// Standard Dynamic Range
    Sdr,
    /// Software fallback (CPU rasterization or recording)
    Software,
}

/// Which phase of the frame a draw belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPhase {
    /// Opaque and transparent sprites below the post-process threshold.
    Main,
    /// Screen-space passes reading the already rendered main target.
    PostProcess,
}

/// Operations the batcher needs from a GPU backend.
///
/// # Example Implementation
///
/// ```ignore
/// struct WgpuBackend<'pass> {
///     device: wgpu::Device,
///     queue: wgpu::Queue,
///     pass: wgpu::RenderPass<'pass>,
///     // ...
/// }
///
/// impl RenderBackend for WgpuBackend<'_> {
///     fn backend(&self) -> &'static str { "wgpu" }
///     fn draw_instanced(&mut self, vertices: u32, instances: u32) {
///         self.pass.draw(0..vertices, 0..instances);
///     }
///     // ...
/// }
/// ```
pub trait RenderBackend {
    /// Backend identifier (e.g., "wgpu", "metal", "recording")
    fn backend(&self) -> &'static str;

    /// Current render tier based on hardware capabilities
    fn tier(&self) -> RenderTier {
        RenderTier::Software
    }

    /// Allocate an instance buffer holding `capacity` instances.
    fn create_instance_buffer(&mut self, capacity: usize) -> BufferHandle;

    /// Upload `instances` to the start of `buffer`.
    fn write_instance_buffer(&mut self, buffer: BufferHandle, instances: &[SpriteInstance]);

    fn destroy_buffer(&mut self, buffer: BufferHandle);

    /// Mark the start of a phase for one layer.
    fn begin_phase(&mut self, _phase: RenderPhase, _layer: u8) {}

    fn bind_pipeline(&mut self, pipeline: PipelineId);

    /// Bind the texture set (slot 0).
    fn bind_texture(&mut self, texture: TextureId);

    /// Bind an extra material resource set at `slot` (1 and up).
    fn bind_resource_set(&mut self, slot: u32, set: ResourceSetId);

    fn bind_instance_buffer(&mut self, buffer: BufferHandle);

    fn draw_instanced(&mut self, vertex_count: u32, instance_count: u32);
}

/// Per-frame draw statistics gathered by the batcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub pipeline_binds: u32,
    pub draw_calls: u32,
    pub instances: u32,
}

impl DrawStats {
    pub fn merge(&mut self, other: DrawStats) {
        self.pipeline_binds += other.pipeline_binds;
        self.draw_calls += other.draw_calls;
        self.instances += other.instances;
    }
}
