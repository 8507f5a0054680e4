//! Headless backend that records every call.
//!
//! Used by tests and tools that need to inspect what a frame would submit.

use std::collections::HashMap;

use super::instance::SpriteInstance;
use super::traits::{RenderBackend, RenderPhase};
use crate::api::types::{BufferHandle, PipelineId, ResourceSetId, TextureId};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    BeginPhase { phase: RenderPhase, layer: u8 },
    BindPipeline(PipelineId),
    BindTexture(TextureId),
    BindResourceSet { slot: u32, set: ResourceSetId },
    BindInstanceBuffer(BufferHandle),
    Draw { vertices: u32, instances: u32 },
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub commands: Vec<DrawCommand>,
    buffers: HashMap<BufferHandle, Vec<SpriteInstance>>,
    capacities: HashMap<BufferHandle, usize>,
    next_buffer: u32,
    pub writes: u32,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of a live buffer.
    pub fn buffer(&self, handle: BufferHandle) -> Option<&[SpriteInstance]> {
        self.buffers.get(&handle).map(|b| b.as_slice())
    }

    pub fn capacity(&self, handle: BufferHandle) -> Option<usize> {
        self.capacities.get(&handle).copied()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn draws(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Draw { vertices, instances } => Some((*vertices, *instances)),
            _ => None,
        })
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }
}

impl RenderBackend for RecordingBackend {
    fn backend(&self) -> &'static str {
        "recording"
    }

    fn create_instance_buffer(&mut self, capacity: usize) -> BufferHandle {
        self.next_buffer += 1;
        let handle = BufferHandle(self.next_buffer);
        self.buffers.insert(handle, Vec::with_capacity(capacity));
        self.capacities.insert(handle, capacity);
        handle
    }

    fn write_instance_buffer(&mut self, buffer: BufferHandle, instances: &[SpriteInstance]) {
        if let Some(contents) = self.buffers.get_mut(&buffer) {
            contents.clear();
            contents.extend_from_slice(instances);
            self.writes += 1;
        }
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer);
        self.capacities.remove(&buffer);
    }

    fn begin_phase(&mut self, phase: RenderPhase, layer: u8) {
        self.commands.push(DrawCommand::BeginPhase { phase, layer });
    }

    fn bind_pipeline(&mut self, pipeline: PipelineId) {
        self.commands.push(DrawCommand::BindPipeline(pipeline));
    }

    fn bind_texture(&mut self, texture: TextureId) {
        self.commands.push(DrawCommand::BindTexture(texture));
    }

    fn bind_resource_set(&mut self, slot: u32, set: ResourceSetId) {
        self.commands.push(DrawCommand::BindResourceSet { slot, set });
    }

    fn bind_instance_buffer(&mut self, buffer: BufferHandle) {
        self.commands.push(DrawCommand::BindInstanceBuffer(buffer));
    }

    fn draw_instanced(&mut self, vertex_count: u32, instance_count: u32) {
        self.commands.push(DrawCommand::Draw {
            vertices: vertex_count,
            instances: instance_count,
        });
    }
}
