use tangerine_assets::{
    AssetError, AssetEvent, AssetEvents, AssetServer, Handle, Mesh, MeshLoadOptions, TextureData,
    TextureSource,
};

use crate::{
    device::GraphicsDevice,
    error::StartupError,
    mesh::GpuMesh,
    programs::{AttributeLocations, ShaderProgram, ShaderSources, UniformLocations},
};

#[derive(Debug)]
enum TextureSlot<T> {
    Unrequested,
    Pending(Handle<TextureData>),
    Ready(T),
    Failed(AssetError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureStatus {
    Unrequested,
    Pending,
    Ready,
    Failed,
}

/// Everything created at startup that frames draw from.
#[derive(Debug)]
pub struct FrameResources<D: GraphicsDevice> {
    program: ShaderProgram<D>,
    attributes: AttributeLocations,
    uniforms: UniformLocations,
    mesh: GpuMesh<D>,
    texture: TextureSlot<D::Texture>,
}

impl<D: GraphicsDevice> FrameResources<D> {
    /// Builds the program first, so a shader failure leaves no buffers behind.
    pub fn new(
        device: &mut D,
        sources: ShaderSources<'_>,
        mesh: &Mesh,
    ) -> Result<Self, StartupError> {
        let program = ShaderProgram::build(device, sources)?;
        let attributes = AttributeLocations::resolve(&program);
        let uniforms = UniformLocations::resolve(&program);
        let mesh = GpuMesh::upload(device, mesh);

        log::info!("frame resources ready: {} indices", mesh.index_count);

        Ok(Self {
            program,
            attributes,
            uniforms,
            mesh,
            texture: TextureSlot::Unrequested,
        })
    }

    /// Parses `obj` and then builds as [`FrameResources::new`] does.
    pub fn from_obj(
        device: &mut D,
        sources: ShaderSources<'_>,
        obj: &str,
    ) -> Result<Self, StartupError> {
        let mesh = Mesh::from_obj(obj, MeshLoadOptions::default())?;
        Self::new(device, sources, &mesh)
    }

    pub fn program(&self) -> &ShaderProgram<D> {
        &self.program
    }

    pub fn attributes(&self) -> &AttributeLocations {
        &self.attributes
    }

    pub fn uniforms(&self) -> &UniformLocations {
        &self.uniforms
    }

    pub fn mesh(&self) -> &GpuMesh<D> {
        &self.mesh
    }

    /// The uploaded texture, once its load has finished.
    pub fn texture(&self) -> Option<D::Texture> {
        match self.texture {
            TextureSlot::Ready(texture) => Some(texture),
            _ => None,
        }
    }

    pub fn texture_status(&self) -> TextureStatus {
        match self.texture {
            TextureSlot::Unrequested => TextureStatus::Unrequested,
            TextureSlot::Pending(_) => TextureStatus::Pending,
            TextureSlot::Ready(_) => TextureStatus::Ready,
            TextureSlot::Failed(_) => TextureStatus::Failed,
        }
    }

    pub fn texture_error(&self) -> Option<&AssetError> {
        match &self.texture {
            TextureSlot::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Starts loading the texture in the background. A later request
    /// replaces an earlier one that has not finished.
    pub fn begin_texture_load(
        &mut self,
        server: &AssetServer,
        source: TextureSource,
    ) -> Handle<TextureData> {
        let handle = server.load_texture(source);
        self.set_pending_texture(handle);
        handle
    }

    /// Waits for `handle`, for loads the host started on its own.
    pub fn set_pending_texture(&mut self, handle: Handle<TextureData>) {
        self.texture = TextureSlot::Pending(handle);
    }

    /// Applies one finished load. Returns `true` when it made the texture ready.
    pub fn handle_event(&mut self, device: &mut D, event: AssetEvent) -> bool {
        let TextureSlot::Pending(expected) = self.texture else {
            log::debug!("ignoring asset event, no texture load is pending");
            return false;
        };
        if event.texture_handle() != expected {
            log::debug!("ignoring asset event for a superseded texture load");
            return false;
        }

        match event {
            AssetEvent::TextureLoaded { data, .. } => {
                let texture = device.create_texture(&data);
                log::info!("texture {} uploaded ({}x{})", data.name, data.width, data.height);
                self.texture = TextureSlot::Ready(texture);
                true
            }
            AssetEvent::TextureFailed { error, .. } => {
                log::error!("texture load failed, nothing will be drawn: {error}");
                self.texture = TextureSlot::Failed(error);
                false
            }
        }
    }

    /// Drains finished loads. When the pending texture becomes ready it is
    /// uploaded and `on_ready` runs once with the device and these resources.
    pub fn poll_texture<F>(
        &mut self,
        device: &mut D,
        events: &mut AssetEvents,
        on_ready: F,
    ) -> TextureStatus
    where
        F: FnOnce(&mut D, &Self),
    {
        let mut on_ready = Some(on_ready);
        for event in events.drain() {
            if self.handle_event(device, event) {
                if let Some(on_ready) = on_ready.take() {
                    on_ready(device, self);
                }
            }
        }
        self.texture_status()
    }
}
