use tangerine_assets::MeshError;
use thiserror::Error;

use crate::programs::{ProgramError, ShaderStage};

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("graphics context unavailable: {0}")]
    ContextUnavailable(String),
    #[error("render pipeline rejected: {0}")]
    Pipeline(String),
}

/// Everything that can stop the renderer from starting. None of these are retried.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("graphics context unavailable: {0}")]
    ContextUnavailable(String),
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },
    #[error("shader program failed to link: {0}")]
    Link(String),
    #[error("mesh source rejected: {0}")]
    Parse(#[from] MeshError),
}

impl From<ProgramError> for StartupError {
    fn from(error: ProgramError) -> Self {
        match error {
            ProgramError::Compile { stage, log } => Self::Compile { stage, log },
            ProgramError::Link(message) => Self::Link(message),
        }
    }
}

impl From<DeviceError> for StartupError {
    fn from(error: DeviceError) -> Self {
        match error {
            DeviceError::ContextUnavailable(message) => Self::ContextUnavailable(message),
            DeviceError::Pipeline(message) => Self::Link(message),
        }
    }
}
