//! 软粒子绘制
//!
//! 每个粒子实例化为一个朝向相机的四边形，边长等于点精灵的像素尺寸。
//! 混合为加法混合，深度测试和深度写入均关闭，遮挡完全由软边淡出处理。

use wgpu::util::DeviceExt;

use crate::core::error::RenderResult;
use crate::render::camera::Camera;
use crate::render::depth_capture::{DepthCapture, DEPTH_FORMAT};
use crate::render::particles::field::{ParticleField, ParticleInstance};
use crate::render::particles::material::{SoftParticleMaterial, SoftParticleUniforms};
use crate::render::particles::shader::soft_particle_program;
use crate::render::target::TargetSize;

/// 每个四边形的顶点数
const QUAD_VERTICES: u32 = 6;

/// 软粒子渲染器
pub struct ParticleRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    /// 绑定组引用的深度捕获版本
    bound_generation: u64,
    uniform_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    instance_count: u32,
    sprite_view: wgpu::TextureView,
    sprite_sampler: wgpu::Sampler,
    _sprite_texture: wgpu::Texture,
    material: SoftParticleMaterial,
    last_uniforms: Option<SoftParticleUniforms>,
}

impl ParticleRenderer {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        field: &ParticleField,
        material: SoftParticleMaterial,
        per_particle_tint: bool,
        sprite: (wgpu::Texture, wgpu::TextureView),
        depth: &DepthCapture,
    ) -> RenderResult<Self> {
        let program = soft_particle_program()?;
        let shader = program.create_module(device);
        let label = program.pipeline_label();

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Soft Particle Bind Group Layout"),
            entries: &[
                // Uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // 精灵纹理
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // 采样器
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // 场景深度，逐像素读取
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Soft Particle Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let additive = wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[ParticleInstance::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState {
                        color: additive,
                        alpha: additive,
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Soft Particle Uniform Buffer"),
            size: std::mem::size_of::<SoftParticleUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let instances = field.instances(per_particle_tint);
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Instance Buffer"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let sprite_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Particle Sprite Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let (sprite_texture, sprite_view) = sprite;
        let bind_group = create_bind_group(
            device,
            &bind_group_layout,
            &uniform_buffer,
            &sprite_view,
            &sprite_sampler,
            depth.depth_view(),
        );

        tracing::info!(
            target: "particles",
            "Soft particle pipeline ready: {} ({} particles)",
            label,
            instances.len()
        );

        Ok(Self {
            pipeline,
            bind_group_layout,
            bind_group,
            bound_generation: depth.generation(),
            uniform_buffer,
            instance_buffer,
            instance_count: instances.len() as u32,
            sprite_view,
            sprite_sampler,
            _sprite_texture: sprite_texture,
            material,
            last_uniforms: None,
        })
    }

    /// 最近一次写入的 uniform
    pub fn last_uniforms(&self) -> Option<&SoftParticleUniforms> {
        self.last_uniforms.as_ref()
    }

    /// 写入本帧 uniform
    ///
    /// 深度捕获重新分配过时重建绑定组，保证采样的是当前的深度纹理。
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        camera: &Camera,
        field: &ParticleField,
        depth: &DepthCapture,
        viewport: TargetSize,
    ) {
        if depth.generation() != self.bound_generation {
            self.bind_group = create_bind_group(
                device,
                &self.bind_group_layout,
                &self.uniform_buffer,
                &self.sprite_view,
                &self.sprite_sampler,
                depth.depth_view(),
            );
            self.bound_generation = depth.generation();
            tracing::debug!(
                target: "particles",
                "Rebound depth texture (generation {})",
                self.bound_generation
            );
        }

        if !depth.is_captured() {
            tracing::warn!(target: "particles", "Scene depth not captured this frame, fading disabled");
        }

        let uniforms =
            self.material
                .uniforms(camera, field.model_matrix(), viewport, depth.is_captured());
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        self.last_uniforms = Some(uniforms);
    }

    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        if self.instance_count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
        pass.draw(0..QUAD_VERTICES, 0..self.instance_count);
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniform_buffer: &wgpu::Buffer,
    sprite_view: &wgpu::TextureView,
    sprite_sampler: &wgpu::Sampler,
    depth_view: &wgpu::TextureView,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Soft Particle Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(sprite_view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sprite_sampler),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(depth_view),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::config::CameraConfig;
    use crate::render::depth_capture::CAPTURE_COLOR_FORMAT;
    use crate::render::particles::material::FLAG_DEPTH_AVAILABLE;
    use crate::render::particles::sprite::{procedural_puff, upload_sprite};
    use crate::render::scene::{demo_scene, OpaqueScene};
    use crate::render::test_support::headless_device;

    const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    fn depth_flag(renderer: &ParticleRenderer) -> bool {
        renderer
            .last_uniforms()
            .map(|u| u.has_flag(FLAG_DEPTH_AVAILABLE))
            .unwrap_or(false)
    }

    #[test]
    fn test_prepare_follows_depth_capture() {
        let Some((device, queue)) = headless_device() else {
            eprintln!("no GPU adapter available, skipping");
            return;
        };

        let mut depth = DepthCapture::new(&device, 320, 240);
        let field = ParticleField::generate(8, Vec3::ZERO, Vec3::splat(4.0), Some(7));
        let sprite = upload_sprite(&device, &queue, &procedural_puff(16));
        let mut renderer = ParticleRenderer::new(
            &device,
            COLOR_FORMAT,
            &field,
            SoftParticleMaterial::default(),
            false,
            sprite,
            &depth,
        )
        .unwrap();
        assert_eq!(renderer.bound_generation, depth.generation());
        assert!(renderer.last_uniforms().is_none());

        let mut camera = Camera::from_config(&CameraConfig::default(), depth.size().aspect());

        // 重新分配后旧视图失效，prepare 必须换绑新的深度纹理
        assert!(depth.resize(&device, 640, 480));
        camera.set_viewport(640, 480);
        renderer.prepare(&device, &queue, &camera, &field, &depth, depth.size());
        assert_eq!(renderer.bound_generation, depth.generation());
        assert_eq!(renderer.bound_generation, 1);
        assert!(!depth_flag(&renderer));

        let scene = OpaqueScene::new(&device, &demo_scene(), COLOR_FORMAT, CAPTURE_COLOR_FORMAT);
        scene.update(&queue, &camera);
        depth.begin_frame();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Test Depth Encoder"),
        });
        depth.render_depth(&mut encoder, &scene);
        queue.submit(Some(encoder.finish()));

        renderer.prepare(&device, &queue, &camera, &field, &depth, depth.size());
        assert!(depth_flag(&renderer));
        assert_eq!(renderer.bound_generation, 1);

        // 下一帧尚未捕获
        depth.begin_frame();
        renderer.prepare(&device, &queue, &camera, &field, &depth, depth.size());
        assert!(!depth_flag(&renderer));

        // 相同尺寸不触发换绑
        assert!(!depth.resize(&device, 640, 480));
        renderer.prepare(&device, &queue, &camera, &field, &depth, depth.size());
        assert_eq!(renderer.bound_generation, 1);
    }
}
