use tangerine_assets::Mesh;

use crate::{
    device::{GraphicsDevice, IndexFormat},
    programs::LitTextureProgram,
};

/// Device buffers for one mesh. Uploaded once, never modified.
#[derive(Debug)]
pub struct GpuMesh<D: GraphicsDevice> {
    pub positions: D::Buffer,
    pub normals: D::Buffer,
    pub texcoords: D::Buffer,
    pub tangents: D::Buffer,
    pub bitangents: D::Buffer,
    pub indices: D::Buffer,
    pub index_count: u32,
}

impl<D: GraphicsDevice> GpuMesh<D> {
    pub fn upload(device: &mut D, mesh: &Mesh) -> Self {
        let positions = device.create_vertex_buffer("positions", mesh.positions().as_flattened());
        let normals = device.create_vertex_buffer("normals", mesh.normals().as_flattened());
        let texcoords = device.create_vertex_buffer("texcoords", mesh.texcoords().as_flattened());
        let tangents = device.create_vertex_buffer("tangents", mesh.tangents().as_flattened());
        let bitangents =
            device.create_vertex_buffer("bitangents", mesh.bitangents().as_flattened());
        let indices = device.create_index_buffer("indices", mesh.indices());

        Self {
            positions,
            normals,
            texcoords,
            tangents,
            bitangents,
            indices,
            index_count: mesh.index_count() as u32,
        }
    }

    /// Binds every attribute buffer to its fixed slot, then the index buffer.
    pub fn bind(&self, device: &mut D) {
        let buffers = [
            self.positions,
            self.normals,
            self.texcoords,
            self.tangents,
            self.bitangents,
        ];
        for ((slot, format), buffer) in LitTextureProgram::SLOT_FORMATS.into_iter().zip(buffers) {
            device.bind_vertex_attribute(slot, buffer, format);
        }
        device.bind_index_buffer(self.indices, IndexFormat::Uint16);
    }
}
