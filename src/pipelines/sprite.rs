//! Camera-facing textured quads of a fixed world size.
//!
//! The quad corners are generated in the vertex shader from the vertex index;
//! only the per-instance center and size come from a buffer. Every sprite has
//! its own texture, so sprites are drawn one instance at a time.

use crate::{
    data_structures::model::Vertex,
    pipelines::basic::{DepthMode, mk_render_pipeline},
    resources::texture::diffuse_layout,
};

pub const VERTICES_PER_SPRITE: u32 = 6;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteInstanceRaw {
    pub center: [f32; 3],
    pub size: [f32; 2],
}

impl Vertex for SpriteInstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<SpriteInstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

pub fn mk_sprite_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Sprite Pipeline Layout"),
        bind_group_layouts: &[&diffuse_layout(device), camera_bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Sprite Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("sprite.wgsl").into()),
    };
    // Label canvases are uploaded with straight alpha
    mk_render_pipeline(
        device,
        "Sprite Pipeline",
        &layout,
        color_format,
        Some(wgpu::BlendState::ALPHA_BLENDING),
        Some(DepthMode::ReadOnly),
        None,
        &[SpriteInstanceRaw::desc()],
        shader,
    )
}

const _: () = assert!(std::mem::size_of::<SpriteInstanceRaw>() == 20);
