//! GPU resources of one scene session.

use wgpu::util::DeviceExt;

use crate::{
    camera::CameraUniform,
    data_structures::{
        model::{DrawModel, Model},
        texture::{Texture, create_default_sampler},
    },
    pipelines::{
        basic::mk_model_pipeline,
        light::LightResources,
        sprite::{SpriteInstanceRaw, VERTICES_PER_SPRITE, mk_sprite_pipeline},
    },
    resources::texture::diffuse_layout,
    scene::session::SceneSession,
};

struct LabelSprite {
    #[allow(unused)]
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

struct ModelResources {
    model: Model,
    instance_buffer: wgpu::Buffer,
}

/// Pipelines, uniforms and uploaded assets. Dropping it releases them.
pub struct SceneRenderer {
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    light: LightResources,
    model_pipeline: wgpu::RenderPipeline,
    sprite_pipeline: wgpu::RenderPipeline,
    texture_layout: wgpu::BindGroupLayout,
    model: Option<ModelResources>,
    labels: Vec<LabelSprite>,
    label_instances: Option<wgpu::Buffer>,
    sprite_size: [f32; 2],
}

impl std::fmt::Debug for SceneRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneRenderer")
            .field("model", &self.model.as_ref().map(|m| m.model.meshes.len()))
            .field("labels", &self.labels.len())
            .finish()
    }
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        session: &SceneSession,
        sprite_size: [f32; 2],
    ) -> Self {
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[session.camera_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("camera_bind_group_layout"),
            });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let light = LightResources::new(device, session.light_uniform());
        let model_pipeline = mk_model_pipeline(
            device,
            color_format,
            &camera_bind_group_layout,
            &light.bind_group_layout,
        );
        let sprite_pipeline = mk_sprite_pipeline(device, color_format, &camera_bind_group_layout);

        Self {
            camera_buffer,
            camera_bind_group,
            light,
            model_pipeline,
            sprite_pipeline,
            texture_layout: diffuse_layout(device),
            model: None,
            labels: Vec::new(),
            label_instances: None,
            sprite_size,
        }
    }

    pub fn set_model(&mut self, device: &wgpu::Device, model: Model, session: &SceneSession) {
        let raw = session
            .group()
            .model_transform()
            .unwrap_or_default()
            .to_raw();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model Instance Buffer"),
            contents: bytemuck::cast_slice(&[raw]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        self.model = Some(ModelResources {
            model,
            instance_buffer,
        });
    }

    /// Upload one canvas per label, in label order.
    pub fn set_labels(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        canvases: &[image::RgbaImage],
        session: &SceneSession,
    ) {
        self.labels = canvases
            .iter()
            .enumerate()
            .map(|(i, canvas)| {
                let label = format!("label {i}");
                let texture = Texture::from_rgba(device, queue, canvas, Some(&label));
                let sampler = texture
                    .sampler
                    .clone()
                    .unwrap_or_else(|| create_default_sampler(device));
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: &self.texture_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&texture.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&sampler),
                        },
                    ],
                    label: Some(&label),
                });
                LabelSprite {
                    texture,
                    bind_group,
                }
            })
            .collect();

        self.label_instances = if self.labels.is_empty() {
            None
        } else {
            Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Label Instance Buffer"),
                contents: bytemuck::cast_slice(&self.sprite_instances(session)),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            }))
        };
    }

    fn sprite_instances(&self, session: &SceneSession) -> Vec<SpriteInstanceRaw> {
        session
            .group()
            .label_centers()
            .into_iter()
            .map(|center| SpriteInstanceRaw {
                center: center.into(),
                size: self.sprite_size,
            })
            .collect()
    }

    /// Upload this frame's camera and transforms.
    pub fn update(&self, queue: &wgpu::Queue, session: &SceneSession) {
        let camera: CameraUniform = session.camera_uniform();
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[camera]));

        if let (Some(model), Some(transform)) = (&self.model, session.group().model_transform()) {
            queue.write_buffer(
                &model.instance_buffer,
                0,
                bytemuck::cast_slice(&[transform.to_raw()]),
            );
        }
        if let Some(buffer) = &self.label_instances {
            let instances = self.sprite_instances(session);
            if instances.len() == self.labels.len() {
                queue.write_buffer(buffer, 0, bytemuck::cast_slice(&instances));
            }
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if let Some(model) = &self.model {
            pass.set_pipeline(&self.model_pipeline);
            pass.set_vertex_buffer(1, model.instance_buffer.slice(..));
            pass.draw_model_instanced(
                &model.model,
                0..1,
                &self.camera_bind_group,
                &self.light.bind_group,
            );
        }

        if let Some(instances) = &self.label_instances {
            pass.set_pipeline(&self.sprite_pipeline);
            pass.set_bind_group(1, &self.camera_bind_group, &[]);
            pass.set_vertex_buffer(0, instances.slice(..));
            for (i, label) in self.labels.iter().enumerate() {
                let i = i as u32;
                pass.set_bind_group(0, &label.bind_group, &[]);
                pass.draw(0..VERTICES_PER_SPRITE, i..i + 1);
            }
        }
    }
}
