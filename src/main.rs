mod app;
mod curve;
mod demo;
mod render;

use anyhow::Context;
use app::App;
use demo::config::DemoConfig;
use winit::event_loop::EventLoop;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info,wgpu_core=warn,wgpu_hal=warn,naga=warn"),
    )
    .init();

    let config = DemoConfig::load();

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app).context("event loop error")?;

    if let Some(e) = app.take_error() {
        return Err(e);
    }
    log::info!("window closed, exiting");
    Ok(())
}
