use std::{error::Error, sync::Arc};

use tangerine_assets::{AssetEvents, AssetServer, ORANGE_TEXTURE, SPHERE_OBJ, TextureSource};
use tangerine_core::{IoTaskPool, SceneSettings, SceneSetup};
use tangerine_renderer::{
    FrameOutcome, FrameRenderer, FrameResources, LitTextureProgram, StartupError, TextureStatus,
    WgpuDevice,
};
use tangerine_window::{WindowConfig, WindowHost, run_window};
use winit::window::Window;

/// Optional overrides for camera, light and color, read from the working directory.
const SETTINGS_PATH: &str = "scene.json";

struct Running {
    device: WgpuDevice,
    resources: FrameResources<WgpuDevice>,
    renderer: FrameRenderer,
    // Kept alive so the load in flight can still report back.
    _assets: AssetServer,
    events: AssetEvents,
}

struct TangerineApp {
    io: IoTaskPool,
    settings: SceneSettings,
    running: Option<Running>,
}

impl TangerineApp {
    fn new(io: IoTaskPool, settings: SceneSettings) -> Self {
        Self {
            io,
            settings,
            running: None,
        }
    }
}

impl WindowHost for TangerineApp {
    fn init(&mut self, window: Arc<Window>) -> Result<(), Box<dyn Error>> {
        // 1. Context
        let mut device = WgpuDevice::new(window).map_err(StartupError::from)?;

        // 2. Program, then the mesh buffers
        let mut resources =
            FrameResources::from_obj(&mut device, LitTextureProgram::sources(), SPHERE_OBJ)?;

        // 3. Texture in the background. The first frame is drawn once it lands.
        let (assets, events) = AssetServer::new(self.io.clone());
        resources.begin_texture_load(
            &assets,
            TextureSource::Embedded {
                name: "orange.png",
                bytes: ORANGE_TEXTURE,
            },
        );

        self.running = Some(Running {
            device,
            resources,
            renderer: FrameRenderer::new(SceneSetup::new(&self.settings)),
            _assets: assets,
            events,
        });
        Ok(())
    }

    fn redraw(&mut self) {
        let Some(running) = &mut self.running else {
            return;
        };
        let outcome = running
            .renderer
            .render(&mut running.device, &running.resources);
        if let FrameOutcome::Drawn { .. } = outcome {
            running.device.present();
        }
    }

    fn resized(&mut self, width: u32, height: u32) {
        if let Some(running) = &mut self.running {
            running.device.resize(width, height);
        }
    }

    fn tick(&mut self) -> bool {
        let Some(Running {
            device,
            resources,
            renderer,
            events,
            ..
        }) = &mut self.running
        else {
            return false;
        };

        let status = resources.poll_texture(device, events, |device, resources| {
            renderer.render(device, resources);
            device.present();
        });
        status == TextureStatus::Pending
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let runtime = match IoTaskPool::build_runtime() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("failed to start the I/O runtime: {e}");
            std::process::exit(1);
        }
    };

    let settings = SceneSettings::load_or_default(SETTINGS_PATH).unwrap_or_else(|e| {
        log::warn!("ignoring {SETTINGS_PATH}: {e}");
        SceneSettings::default()
    });

    let app = TangerineApp::new(IoTaskPool::from_runtime(&runtime), settings);
    if let Err(e) = run_window(app, WindowConfig::default()) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
