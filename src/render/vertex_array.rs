use std::collections::BTreeMap;

use wgpu::util::DeviceExt;

use super::pipeline::{COLOR_ATTRIBUTE, COLOR_SLOT};
use crate::curve::palette::ColorBuffer;

const BUFFER_USAGE: wgpu::BufferUsages = wgpu::BufferUsages::VERTEX
    .union(wgpu::BufferUsages::COPY_DST)
    .union(wgpu::BufferUsages::COPY_SRC);

struct Attribute {
    buffer: wgpu::Buffer,
    slot: u32,
    components: u32,
}

/// Named per-vertex attribute buffers plus the vertex count they describe.
///
/// Slot 1 always carries the color buffer. Buffers are destroyed when the
/// array is dropped; `clone` makes fresh buffers and copies on the GPU, so
/// two arrays never share storage.
pub struct VertexArray {
    device: wgpu::Device,
    queue: wgpu::Queue,
    attributes: BTreeMap<String, Attribute>,
    count: u32,
}

impl VertexArray {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, count: u32, colors: &ColorBuffer) -> Self {
        if colors.len() != count as usize {
            log::warn!("color buffer has {} entries for {count} vertices", colors.len());
        }
        let mut array = Self {
            device: device.clone(),
            queue: queue.clone(),
            attributes: BTreeMap::new(),
            count,
        };
        array.insert(COLOR_ATTRIBUTE, COLOR_SLOT, colors.as_floats());
        array
    }

    /// Upload `data` as a new buffer bound to `slot`. Components per vertex
    /// are `data.len() / count`. Re-adding a name replaces its buffer.
    pub fn add(&mut self, name: &str, slot: u32, data: &[f32]) {
        if slot == COLOR_SLOT && name != COLOR_ATTRIBUTE {
            log::warn!("slot {COLOR_SLOT} is reserved for colors; not adding '{name}'");
            return;
        }
        self.insert(name, slot, data);
    }

    /// Re-upload `data` into the buffer registered as `name`.
    pub fn update(&mut self, name: &str, data: &[f32]) {
        let components = self.components_for(data);
        let Some(attr) = self.attributes.get_mut(name) else {
            log::warn!("no vertex buffer named '{name}' to update");
            return;
        };

        let bytes: &[u8] = bytemuck::cast_slice(data);
        if bytes.len() as u64 == attr.buffer.size() {
            self.queue.write_buffer(&attr.buffer, 0, bytes);
        } else {
            let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(name),
                contents: bytes,
                usage: BUFFER_USAGE,
            });
            std::mem::replace(&mut attr.buffer, buffer).destroy();
        }
        attr.components = components;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Bind every attribute buffer to its slot.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        for attr in self.attributes.values() {
            pass.set_vertex_buffer(attr.slot, attr.buffer.slice(..));
        }
    }

    #[cfg(test)]
    pub fn components(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).map(|a| a.components)
    }

    #[cfg(test)]
    pub fn slot(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).map(|a| a.slot)
    }

    #[cfg(test)]
    pub fn buffer_size(&self, name: &str) -> Option<u64> {
        self.attributes.get(name).map(|a| a.buffer.size())
    }

    fn insert(&mut self, name: &str, slot: u32, data: &[f32]) {
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(name),
            contents: bytemuck::cast_slice(data),
            usage: BUFFER_USAGE,
        });
        let attr = Attribute {
            buffer,
            slot,
            components: self.components_for(data),
        };
        if let Some(old) = self.attributes.insert(name.to_string(), attr) {
            old.buffer.destroy();
        }
    }

    fn components_for(&self, data: &[f32]) -> u32 {
        data.len() as u32 / self.count.max(1)
    }
}

impl Clone for VertexArray {
    fn clone(&self) -> Self {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("vertex array copy"),
            });

        let attributes = self
            .attributes
            .iter()
            .map(|(name, attr)| {
                let size = attr.buffer.size();
                let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(name),
                    size,
                    usage: BUFFER_USAGE,
                    mapped_at_creation: false,
                });
                encoder.copy_buffer_to_buffer(&attr.buffer, 0, &buffer, 0, size);
                let copy = Attribute {
                    buffer,
                    slot: attr.slot,
                    components: attr.components,
                };
                (name.clone(), copy)
            })
            .collect();

        self.queue.submit(std::iter::once(encoder.finish()));

        Self {
            device: self.device.clone(),
            queue: self.queue.clone(),
            attributes,
            count: self.count,
        }
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        for attr in self.attributes.values() {
            attr.buffer.destroy();
        }
    }
}
