use tangerine_assets::TextureData;
use tangerine_core::Viewport;

use super::{BufferId, ProgramId, TextureId};
use crate::{
    device::{
        ClearValues, DepthCompare, GraphicsDevice, IndexFormat, PrimitiveTopology, UniformValue,
        VertexFormat,
    },
    error::DeviceError,
    programs::{LinkedShaders, UniformLocation},
};

/// One call made against a [`RecordingDevice`].
#[derive(Clone, Debug, PartialEq)]
pub enum DeviceCall {
    CreateProgram { program: ProgramId },
    CreateVertexBuffer { buffer: BufferId, label: String, len: usize },
    CreateIndexBuffer { buffer: BufferId, label: String, len: usize },
    CreateTexture { texture: TextureId, width: u32, height: u32 },
    Clear(ClearValues),
    SetDepthTest(DepthCompare),
    UseProgram(ProgramId),
    SetUniform { name: String, value: UniformValue },
    BindTexture { unit: u32, texture: TextureId },
    BindVertexAttribute { slot: u32, buffer: BufferId, format: VertexFormat },
    BindIndexBuffer { buffer: BufferId, format: IndexFormat },
    DrawIndexed { topology: PrimitiveTopology, index_count: u32 },
}

impl DeviceCall {
    pub fn is_creation(&self) -> bool {
        matches!(
            self,
            Self::CreateProgram { .. }
                | Self::CreateVertexBuffer { .. }
                | Self::CreateIndexBuffer { .. }
                | Self::CreateTexture { .. }
        )
    }
}

/// Headless device that records every call in order.
#[derive(Debug)]
pub struct RecordingDevice {
    viewport: Viewport,
    calls: Vec<DeviceCall>,
    next_id: u32,
    program_failure: Option<String>,
}

impl RecordingDevice {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            calls: Vec::new(),
            next_id: 0,
            program_failure: None,
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Makes the next `create_program` fail the way a driver link would.
    pub fn fail_next_program(&mut self, message: impl Into<String>) {
        self.program_failure = Some(message.into());
    }

    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<DeviceCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn draw_calls(&self) -> impl Iterator<Item = u32> + '_ {
        self.calls.iter().filter_map(|call| match call {
            DeviceCall::DrawIndexed { index_count, .. } => Some(*index_count),
            _ => None,
        })
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl GraphicsDevice for RecordingDevice {
    type Program = ProgramId;
    type Buffer = BufferId;
    type Texture = TextureId;

    fn create_program(&mut self, _shaders: &LinkedShaders) -> Result<ProgramId, DeviceError> {
        if let Some(message) = self.program_failure.take() {
            return Err(DeviceError::Pipeline(message));
        }
        let program = ProgramId(self.next_id());
        self.calls.push(DeviceCall::CreateProgram { program });
        Ok(program)
    }

    fn create_vertex_buffer(&mut self, label: &str, data: &[f32]) -> BufferId {
        let buffer = BufferId(self.next_id());
        self.calls.push(DeviceCall::CreateVertexBuffer {
            buffer,
            label: label.to_owned(),
            len: data.len(),
        });
        buffer
    }

    fn create_index_buffer(&mut self, label: &str, data: &[u16]) -> BufferId {
        let buffer = BufferId(self.next_id());
        self.calls.push(DeviceCall::CreateIndexBuffer {
            buffer,
            label: label.to_owned(),
            len: data.len(),
        });
        buffer
    }

    fn create_texture(&mut self, data: &TextureData) -> TextureId {
        let texture = TextureId(self.next_id());
        self.calls.push(DeviceCall::CreateTexture {
            texture,
            width: data.width,
            height: data.height,
        });
        texture
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn clear(&mut self, values: ClearValues) {
        self.calls.push(DeviceCall::Clear(values));
    }

    fn set_depth_test(&mut self, compare: DepthCompare) {
        self.calls.push(DeviceCall::SetDepthTest(compare));
    }

    fn use_program(&mut self, program: ProgramId) {
        self.calls.push(DeviceCall::UseProgram(program));
    }

    fn set_uniform(&mut self, location: &UniformLocation, value: UniformValue) {
        self.calls.push(DeviceCall::SetUniform {
            name: location.name().to_owned(),
            value,
        });
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        self.calls.push(DeviceCall::BindTexture { unit, texture });
    }

    fn bind_vertex_attribute(&mut self, slot: u32, buffer: BufferId, format: VertexFormat) {
        self.calls
            .push(DeviceCall::BindVertexAttribute { slot, buffer, format });
    }

    fn bind_index_buffer(&mut self, buffer: BufferId, format: IndexFormat) {
        self.calls.push(DeviceCall::BindIndexBuffer { buffer, format });
    }

    fn draw_indexed(&mut self, topology: PrimitiveTopology, index_count: u32) {
        self.calls.push(DeviceCall::DrawIndexed {
            topology,
            index_count,
        });
    }
}
