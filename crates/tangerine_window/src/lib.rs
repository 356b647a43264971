use std::{
    error::Error,
    sync::Arc,
    time::{Duration, Instant},
};

use thiserror::Error;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    error::EventLoopError,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

pub use winit;

/// How long the loop may sleep while a host still has background work to poll.
const TICK: Duration = Duration::from_millis(16);

/// What the window loop calls back into.
pub trait WindowHost {
    /// The OS window exists. Returning an error stops the loop.
    fn init(&mut self, window: Arc<Window>) -> Result<(), Box<dyn Error>>;

    fn redraw(&mut self);

    fn resized(&mut self, width: u32, height: u32);

    /// Runs whenever the loop is about to sleep. Return `true` to be woken
    /// again shortly even if no OS event arrives.
    fn tick(&mut self) -> bool {
        false
    }
}

#[derive(Clone, Debug)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Tangerine".to_owned(),
            width: 1024,
            height: 768,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("event loop failed: {0}")]
    EventLoop(#[from] EventLoopError),
    #[error("startup failed, see the log for details")]
    Startup,
}

// Holds the host while waiting for the OS to hand us a window.
struct TangerineRunner<H> {
    host: H,
    config: WindowConfig,
    window: Option<Arc<Window>>,
    failed: bool,
}

impl<H: WindowHost> TangerineRunner<H> {
    fn new(host: H, config: WindowConfig) -> Self {
        Self {
            host,
            config,
            window: None,
            failed: false,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, message: String) {
        log::error!("{message}");
        self.failed = true;
        event_loop.exit();
    }
}

impl<H: WindowHost> ApplicationHandler for TangerineRunner<H> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(self.config.title.as_str())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, format!("could not create window: {e}")),
        };
        self.window = Some(window.clone());

        if let Err(e) = self.host.init(window) {
            self.fail(event_loop, format!("startup failed: {e}"));
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() || self.failed {
            return;
        }

        // No frame loop: sleep until the OS wakes us, unless the host is waiting on work.
        if self.host.tick() {
            event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + TICK));
        } else {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("close requested, stopping");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.host.resized(size.width, size.height);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => self.host.redraw(),
            _ => (),
        }
    }
}

/// Opens the window and runs the loop until it closes.
pub fn run_window<H: WindowHost>(host: H, config: WindowConfig) -> Result<(), RunError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut runner = TangerineRunner::new(host, config);
    event_loop.run_app(&mut runner)?;

    if runner.failed {
        return Err(RunError::Startup);
    }
    Ok(())
}
