//! Draws one textured, lit mesh.
//!
//! The render core only talks to a [`GraphicsDevice`]. [`WgpuDevice`] draws
//! into a window; [`RecordingDevice`] records calls for inspection.

pub mod backend;
pub mod device;
pub mod error;
pub mod mesh;
pub mod programs;
pub mod render;
pub mod resources;
mod texture;

pub use backend::{BufferId, DeviceCall, ProgramId, RecordingDevice, TextureId, WgpuDevice};
pub use device::{
    ClearValues, DepthCompare, GraphicsDevice, IndexFormat, PrimitiveTopology, UniformValue,
    VertexFormat,
};
pub use error::{DeviceError, StartupError};
pub use mesh::GpuMesh;
pub use programs::{
    LitTextureProgram, ProgramError, ShaderProgram, ShaderSources, ShaderStage, UniformLocation,
};
pub use render::{CLEAR_VALUES, FrameOutcome, FrameRenderer, RenderState};
pub use resources::{FrameResources, TextureStatus};
