pub use tokio;

pub mod camera;
pub mod light;
pub mod scene;
pub mod settings;
pub mod transform;
pub mod viewport;

pub use camera::Camera;
pub use light::Light;
pub use scene::SceneSetup;
pub use settings::{SceneSettings, SettingsError};
pub use transform::TransformSet;
pub use viewport::Viewport;

/// Handle to the dedicated I/O runtime. Cheap to clone, usable from any thread.
#[derive(Clone)]
pub struct IoTaskPool(pub tokio::runtime::Handle);

impl IoTaskPool {
    /// Builds the multi-threaded runtime that backs asset loading.
    ///
    /// The runtime must outlive every `IoTaskPool` handed out from it, so the
    /// host keeps it alive for the whole process.
    pub fn build_runtime() -> std::io::Result<tokio::runtime::Runtime> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .worker_threads(2)
            .thread_name("tangerine-io")
            .build()
    }

    pub fn from_runtime(runtime: &tokio::runtime::Runtime) -> Self {
        Self(runtime.handle().clone())
    }
}
