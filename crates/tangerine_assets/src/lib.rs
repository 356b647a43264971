use thiserror::Error;

pub mod asset_events;
pub mod asset_server;
pub mod assets;
pub mod mesh;
pub mod tangents;
pub mod texture;

pub use asset_events::{AssetEvent, AssetEvents};
pub use asset_server::{AssetServer, TextureSource};
pub use assets::Handle;
pub use mesh::{Mesh, MeshError, MeshLoadOptions};
pub use texture::{TextureData, TextureFormat};

/// The sphere drawn by the demo, in OBJ text form.
pub const SPHERE_OBJ: &str = include_str!("../assets/sphere.obj");

/// Diffuse map wrapped around the sphere (PNG).
pub const ORANGE_TEXTURE: &[u8] = include_bytes!("../assets/orange.png");

#[derive(Debug, Clone, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
    #[error("failed to decode image {name}: {message}")]
    Decode { name: String, message: String },
    #[error("asset worker for {0} stopped before finishing")]
    WorkerLost(String),
}
