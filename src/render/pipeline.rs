//! Fixed vertex layout and the line-strip pipeline built on it.
//!
//! Each attribute lives in its own vertex buffer; the buffer slot and the
//! shader location are the same number.

pub const POSITION_ATTRIBUTE: &str = "position";
pub const COLOR_ATTRIBUTE: &str = "color";

pub const POSITION_SLOT: u32 = 0;
/// Reserved for the per-vertex color buffer.
pub const COLOR_SLOT: u32 = 1;

/// Background the curve is drawn over.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.2,
    g: 0.2,
    b: 0.2,
    a: 1.0,
};

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
    offset: 0,
    shader_location: POSITION_SLOT,
    format: wgpu::VertexFormat::Float32x2,
}];

const COLOR_ATTRIBUTES: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
    offset: 0,
    shader_location: COLOR_SLOT,
    format: wgpu::VertexFormat::Float32x4,
}];

/// Buffer layouts indexed by slot: `vec2<f32>` position, `vec4<f32>` color.
pub fn vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 2] {
    [
        wgpu::VertexBufferLayout {
            array_stride: (2 * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &POSITION_ATTRIBUTES,
        },
        wgpu::VertexBufferLayout {
            array_stride: (4 * std::mem::size_of::<f32>()) as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &COLOR_ATTRIBUTES,
        },
    ]
}

/// Link a vertex and fragment module into a line-strip pipeline.
pub fn create_line_strip_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    vertex: (&wgpu::ShaderModule, &str),
    fragment: (&wgpu::ShaderModule, &str),
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("curve pipeline layout"),
        bind_group_layouts: &[],
        push_constant_ranges: &[],
    });

    let buffers = vertex_layouts();

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("curve pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: vertex.0,
            entry_point: Some(vertex.1),
            buffers: &buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment.0,
            entry_point: Some(fragment.1),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::LineStrip,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts_match_slots() {
        let layouts = vertex_layouts();
        assert_eq!(layouts[POSITION_SLOT as usize].attributes[0].shader_location, POSITION_SLOT);
        assert_eq!(layouts[POSITION_SLOT as usize].array_stride, 8);
        assert_eq!(layouts[COLOR_SLOT as usize].attributes[0].shader_location, COLOR_SLOT);
        assert_eq!(layouts[COLOR_SLOT as usize].array_stride, 16);
    }
}
