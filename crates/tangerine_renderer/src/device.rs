use std::fmt::Debug;

use glam::{Mat3, Mat4, Vec3, Vec4};
use tangerine_assets::TextureData;
use tangerine_core::Viewport;

use crate::{
    error::DeviceError,
    programs::{LinkedShaders, UniformLocation, UniformType},
};

/// A value for one uniform location.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    /// Scalar integer. For texture locations this is the texture unit.
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl UniformValue {
    /// Whether this value can be written to a location of type `ty`.
    pub fn fits(&self, ty: UniformType) -> bool {
        matches!(
            (self, ty),
            (Self::Int(_), UniformType::Int | UniformType::Texture2d)
                | (Self::Float(_), UniformType::Float)
                | (Self::Vec3(_), UniformType::Vec3)
                | (Self::Vec4(_), UniformType::Vec4)
                | (Self::Mat3(_), UniformType::Mat3)
                | (Self::Mat4(_), UniformType::Mat4)
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
}

impl VertexFormat {
    pub const fn components(self) -> u32 {
        match self {
            Self::Float32 => 1,
            Self::Float32x2 => 2,
            Self::Float32x3 => 3,
            Self::Float32x4 => 4,
        }
    }

    /// Stride of a tightly packed buffer of this format.
    pub const fn byte_size(self) -> u64 {
        self.components() as u64 * 4
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    Uint16,
    Uint32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    TriangleList,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DepthCompare {
    #[default]
    Less,
    LessEqual,
    Always,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearValues {
    pub color: [f32; 4],
    pub depth: f32,
}

/// The primitives the render core is allowed to call.
///
/// Creation calls run once at startup. Every per-frame call is assumed to
/// succeed given correct setup, so none of them return errors; a backend
/// that hits a broken contract logs it and drops the call.
pub trait GraphicsDevice {
    type Program: Copy + Debug + PartialEq;
    type Buffer: Copy + Debug + PartialEq;
    type Texture: Copy + Debug + PartialEq;

    /// Builds the native program for shaders that already compiled and linked.
    fn create_program(&mut self, shaders: &LinkedShaders) -> Result<Self::Program, DeviceError>;

    fn create_vertex_buffer(&mut self, label: &str, data: &[f32]) -> Self::Buffer;

    fn create_index_buffer(&mut self, label: &str, data: &[u16]) -> Self::Buffer;

    fn create_texture(&mut self, data: &TextureData) -> Self::Texture;

    /// Current drawable size.
    fn viewport(&self) -> Viewport;

    fn clear(&mut self, values: ClearValues);

    fn set_depth_test(&mut self, compare: DepthCompare);

    fn use_program(&mut self, program: Self::Program);

    /// Uploads `value` for the active program.
    fn set_uniform(&mut self, location: &UniformLocation, value: UniformValue);

    fn bind_texture(&mut self, unit: u32, texture: Self::Texture);

    /// Binds a tightly packed (no stride, no offset) float buffer to an attribute slot.
    fn bind_vertex_attribute(&mut self, slot: u32, buffer: Self::Buffer, format: VertexFormat);

    fn bind_index_buffer(&mut self, buffer: Self::Buffer, format: IndexFormat);

    fn draw_indexed(&mut self, topology: PrimitiveTopology, index_count: u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_locations_accept_a_unit() {
        assert!(UniformValue::Int(0).fits(UniformType::Texture2d));
        assert!(!UniformValue::Vec3(Vec3::ZERO).fits(UniformType::Texture2d));
    }

    #[test]
    fn matrices_do_not_fit_vectors() {
        assert!(UniformValue::Mat3(Mat3::IDENTITY).fits(UniformType::Mat3));
        assert!(!UniformValue::Mat3(Mat3::IDENTITY).fits(UniformType::Mat4));
        assert!(!UniformValue::Vec4(Vec4::ONE).fits(UniformType::Vec3));
    }

    #[test]
    fn packed_strides() {
        assert_eq!(VertexFormat::Float32x3.byte_size(), 12);
        assert_eq!(VertexFormat::Float32x2.byte_size(), 8);
    }
}
