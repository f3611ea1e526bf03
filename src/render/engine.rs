use anyhow::Context;
use std::sync::Arc;
use winit::window::Window;

use crate::curve::hilbert::{vertex_count, CurveState};
use crate::curve::palette::{ColorBuffer, PaletteMode};
use crate::demo::config::DemoConfig;
use crate::render::pipeline::{CLEAR_COLOR, POSITION_ATTRIBUTE, POSITION_SLOT};
use crate::render::program::ShaderProgram;
use crate::render::vertex_array::VertexArray;

pub struct GpuState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub window: Arc<Window>,
}

impl GpuState {
    pub fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let info = adapter.get_info();
        log::info!("adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("hilbert device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            },
        ))
        .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no supported formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            window,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }
}

/// Owns the GPU state, the shader program and the vertex array holding the
/// current strip. Created once the window exists.
pub struct RenderEngine {
    pub gpu: GpuState,
    pub program: ShaderProgram,
    vertices: Option<VertexArray>,
    synced_revision: Option<u64>,
    palette: PaletteMode,
    seed: Option<u64>,
}

impl RenderEngine {
    pub fn new(gpu: GpuState, config: &DemoConfig) -> Self {
        let program = ShaderProgram::new(
            &gpu.device,
            gpu.config.format,
            &config.shaders.vertex,
            &config.shaders.fragment,
        );
        Self {
            gpu,
            program,
            vertices: None,
            synced_revision: None,
            palette: config.curve.palette,
            seed: config.curve.seed,
        }
    }

    /// Make the vertex array match `curve`. A new vertex count means a new
    /// array (with a color buffer of matching length); same count with newer
    /// points means an in-place position upload.
    pub fn sync_vertices(&mut self, curve: &CurveState) {
        if self.synced_revision == Some(curve.revision()) {
            return;
        }
        self.vertices = build_vertices(
            &self.gpu.device,
            &self.gpu.queue,
            curve,
            self.vertices.take(),
            self.palette,
            self.seed,
        );
        self.synced_revision = Some(curve.revision());
    }

    pub fn render(&self) -> Result<(), wgpu::SurfaceError> {
        let output = self.gpu.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.gpu.device.create_command_encoder(
            &wgpu::CommandEncoderDescriptor {
                label: Some("render encoder"),
            },
        );
        encode_line_strip(&mut encoder, &view, &self.program, self.vertices.as_ref());

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn build_vertices(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    curve: &CurveState,
    previous: Option<VertexArray>,
    palette: PaletteMode,
    seed: Option<u64>,
) -> Option<VertexArray> {
    let Ok(count) = u32::try_from(vertex_count(curve.depth())) else {
        log::error!("depth {} has too many vertices to draw", curve.depth());
        return None;
    };
    let positions: &[f32] = bytemuck::cast_slice(curve.points());

    let array = match previous {
        Some(mut array) if array.count() == count => {
            array.update(POSITION_ATTRIBUTE, positions);
            array
        }
        _ => {
            let colors = ColorBuffer::generate(palette, count as usize, seed);
            let mut array = VertexArray::new(device, queue, count, &colors);
            array.add(POSITION_ATTRIBUTE, POSITION_SLOT, positions);
            array
        }
    };
    Some(array)
}

/// Clear `target`, then draw `vertices` as one line strip with the program's
/// pipeline. Without a linked program or any vertices only the clear happens.
pub fn encode_line_strip(
    encoder: &mut wgpu::CommandEncoder,
    target: &wgpu::TextureView,
    program: &ShaderProgram,
    vertices: Option<&VertexArray>,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("curve pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });

    if let (Some(pipeline), Some(array)) = (program.pipeline(), vertices) {
        pass.set_pipeline(pipeline);
        array.bind(&mut pass);
        pass.draw(0..array.count(), 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::hilbert::DEPTH_CEILING;
    use crate::render::headless_device;
    use crate::render::pipeline::vertex_layouts;
    use std::path::Path;

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    fn target(device: &wgpu::Device) -> wgpu::TextureView {
        device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("offscreen target"),
                size: wgpu::Extent3d {
                    width: 64,
                    height: 64,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn program(device: &wgpu::Device, fragment: &str) -> ShaderProgram {
        let data = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
        ShaderProgram::new(device, FORMAT, &data.join("vertex.wgsl"), &data.join(fragment))
    }

    #[test]
    fn test_depth_ceiling_fits_default_buffer_limit() {
        let color_bytes = |depth| vertex_count(depth) as u64 * vertex_layouts()[1].array_stride;
        let limit = wgpu::Limits::default().max_buffer_size;
        assert!(color_bytes(DEPTH_CEILING) <= limit);
        assert!(color_bytes(DEPTH_CEILING + 1) > limit);
        assert!(u32::try_from(vertex_count(DEPTH_CEILING)).is_ok());
    }

    #[test]
    fn test_build_vertices_tracks_depth() {
        let Some((device, queue)) = headless_device() else {
            return;
        };
        let mut curve = CurveState::default();
        let array = build_vertices(&device, &queue, &curve, None, PaletteMode::Cycle, None)
            .expect("array");
        assert_eq!(array.count(), 4);

        curve.increase();
        let array = build_vertices(&device, &queue, &curve, Some(array), PaletteMode::Cycle, None)
            .expect("array");
        assert_eq!(array.count(), 16);
        assert_eq!(array.buffer_size(POSITION_ATTRIBUTE), Some(16 * 8));
        assert_eq!(array.buffer_size("color"), Some(16 * 16));

        curve.increase();
        curve.decrease();
        let array =
            build_vertices(&device, &queue, &curve, Some(array), PaletteMode::Random, Some(1))
                .expect("array");
        assert_eq!(array.count(), 16);
    }

    #[test]
    fn test_draw_encodes_without_validation_errors() {
        let Some((device, queue)) = headless_device() else {
            return;
        };
        let program = program(&device, "fragment.wgsl");
        assert!(program.is_linked());

        let mut curve = CurveState::default();
        curve.increase();
        curve.increase();
        let array = build_vertices(&device, &queue, &curve, None, PaletteMode::Cycle, None)
            .expect("array");
        let view = target(&device);

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
        encode_line_strip(&mut encoder, &view, &program, Some(&array));
        queue.submit(std::iter::once(encoder.finish()));
        assert!(pollster::block_on(device.pop_error_scope()).is_none());
    }

    #[test]
    fn test_inert_program_still_clears() {
        let Some((device, queue)) = headless_device() else {
            return;
        };
        let program = program(&device, "missing.wgsl");
        assert!(!program.is_linked());

        let curve = CurveState::default();
        let array = build_vertices(&device, &queue, &curve, None, PaletteMode::Cycle, None)
            .expect("array");
        let view = target(&device);

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
        encode_line_strip(&mut encoder, &view, &program, Some(&array));
        queue.submit(std::iter::once(encoder.finish()));
        assert!(pollster::block_on(device.pop_error_scope()).is_none());
    }
}
