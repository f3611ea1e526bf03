use anyhow::Context;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::ActiveEventLoop,
    keyboard::PhysicalKey,
    window::{Window, WindowAttributes, WindowId},
};

use crate::curve::hilbert::CurveState;
use crate::demo::config::{DemoConfig, WindowConfig};
use crate::demo::input::{apply_action, DepthAction, InputState};
use crate::render::engine::{GpuState, RenderEngine};

pub struct App {
    config: DemoConfig,
    input: InputState,
    curve: CurveState,
    engine: Option<RenderEngine>,
    startup_error: Option<anyhow::Error>,
}

impl App {
    pub fn new(config: DemoConfig) -> Self {
        let input = InputState::new(config.key_bindings.clone());
        let curve = CurveState::new(config.curve.max_depth);
        Self {
            config,
            input,
            curve,
            engine: None,
            startup_error: None,
        }
    }

    /// The error that stopped the window or GPU from coming up, if any.
    pub fn take_error(&mut self) -> Option<anyhow::Error> {
        self.startup_error.take()
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<RenderEngine> {
        let window = Arc::new(
            event_loop
                .create_window(window_attributes(&self.config.window))
                .context("failed to create window")?,
        );
        let gpu = GpuState::new(window)?;
        Ok(RenderEngine::new(gpu, &self.config))
    }

    fn log_controls(&self) {
        for &action in DepthAction::all() {
            if let Some(bind) = self.input.binding(action) {
                log::info!("{:?}: {}", bind.code, action.display_name());
            }
        }
        log::info!(
            "depth {} of at most {}",
            self.curve.depth(),
            self.curve.max_depth()
        );
    }
}

/// Width and height are logical pixels.
fn window_attributes(config: &WindowConfig) -> WindowAttributes {
    Window::default_attributes()
        .with_title(config.title.clone())
        .with_inner_size(LogicalSize::new(config.width, config.height))
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.engine.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(mut engine) => {
                engine.sync_vertices(&self.curve);
                self.engine = Some(engine);
                self.log_controls();
            }
            Err(e) => {
                log::error!("{e:#}");
                self.startup_error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(engine) = &mut self.engine {
                    engine.gpu.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    let action = self
                        .input
                        .on_key_event(code, event.state.is_pressed(), event.repeat);
                    if let Some(action) = action {
                        apply_action(&mut self.curve, action);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(engine) = &mut self.engine else {
                    return;
                };
                engine.sync_vertices(&self.curve);
                match engine.render() {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        engine.gpu.reconfigure();
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("GPU out of memory, exiting");
                        event_loop.exit();
                    }
                    Err(e) => log::error!("render error: {e:?}"),
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(engine) = &self.engine {
            engine.gpu.window.request_redraw();
        }
    }
}
