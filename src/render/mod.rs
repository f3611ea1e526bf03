pub mod engine;
pub mod pipeline;
pub mod program;
pub mod vertex_array;

/// Device on whatever adapter the machine offers, without a surface. Falls
/// back to a software adapter when there is no hardware one. `None` (with a
/// note on stderr) when neither exists; GPU tests skip in that case.
#[cfg(test)]
pub(crate) fn headless_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = [false, true].into_iter().find_map(|force_fallback_adapter| {
        pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            force_fallback_adapter,
            ..Default::default()
        }))
        .ok()
    });
    let Some(adapter) = adapter else {
        eprintln!("skipping GPU test: no adapter available");
        return None;
    };
    match pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default())) {
        Ok(pair) => Some(pair),
        Err(e) => {
            eprintln!("skipping GPU test: {e}");
            None
        }
    }
}
