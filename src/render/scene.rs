//! 不透明场景
//!
//! 深度捕获和场景通道绘制的是同一组网格；两个管线只在颜色目标格式上不同。

use glam::{Mat4, Quat, Vec3};
use wgpu::util::DeviceExt;

use crate::config::graphics::rgb_from_hex;
use crate::impl_default;
use crate::render::camera::Camera;
use crate::render::depth_capture::DEPTH_FORMAT;
use crate::render::mesh::{GpuMesh, MeshData, Vertex3D};

/// 动态偏移的对齐步长
pub const MODEL_UNIFORM_STRIDE: u64 = 256;

const SCENE_SHADER: &str = r#"
struct SceneUniforms {
    view_proj: mat4x4<f32>,
    light_dir: vec4<f32>,
    // x: 环境光强度, y: 方向光强度
    light: vec4<f32>,
};
@group(0) @binding(0) var<uniform> scene: SceneUniforms;

struct ModelUniform {
    model: mat4x4<f32>,
    color: vec4<f32>,
};
@group(1) @binding(0) var<uniform> mesh_data: ModelUniform;

struct VertexInput {
    @location(0) pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) normal: vec3<f32>,
};

@vertex
fn vs_main(model: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.normal = (mesh_data.model * vec4<f32>(model.normal, 0.0)).xyz;
    out.clip_position = scene.view_proj * mesh_data.model * vec4<f32>(model.pos, 1.0);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.normal);
    let diffuse = max(dot(n, normalize(scene.light_dir.xyz)), 0.0) * scene.light.y;
    let color = mesh_data.color.rgb * (scene.light.x + diffuse);
    return vec4<f32>(color, 1.0);
}
"#;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneUniforms {
    view_proj: [[f32; 4]; 4],
    light_dir: [f32; 4],
    light: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct ModelUniform {
    model: [[f32; 4]; 4],
    color: [f32; 4],
    _pad1: [f32; 32],
    _pad2: [f32; 12],
}

/// 场景光照
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneLighting {
    pub ambient: f32,
    pub directional: f32,
    /// 方向光位置（光线从该点照向原点）
    pub direction: Vec3,
}

impl_default!(SceneLighting {
    ambient: 0.3,
    directional: 0.8,
    direction: Vec3::new(12.0, 50.0, 15.0),
});

/// 场景中的一个网格实例
#[derive(Debug, Clone)]
pub struct MeshInstance {
    pub name: &'static str,
    pub data: MeshData,
    pub transform: Mat4,
    pub color: [f32; 3],
}

impl MeshInstance {
    pub fn new(name: &'static str, data: MeshData, transform: Mat4, color: u32) -> Self {
        Self {
            name,
            data,
            transform,
            color: rgb_from_hex(color),
        }
    }
}

/// 演示场景：地面、立方体和三面墙
pub fn demo_scene() -> Vec<MeshInstance> {
    let side_wall_rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
    vec![
        MeshInstance::new("floor", MeshData::plane(30.0, 400.0), Mat4::IDENTITY, 0x105020),
        MeshInstance::new(
            "cube",
            MeshData::cuboid(2.0, 2.0, 2.0),
            Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)),
            0x404040,
        ),
        MeshInstance::new(
            "back_wall",
            MeshData::cuboid(20.0, 7.0, 1.0),
            Mat4::from_translation(Vec3::new(0.0, 3.5, -150.0)),
            0x404040,
        ),
        MeshInstance::new(
            "left_wall",
            MeshData::cuboid(300.0, 7.0, 1.0),
            Mat4::from_rotation_translation(side_wall_rotation, Vec3::new(-10.0, 3.5, 0.0)),
            0x404040,
        ),
        MeshInstance::new(
            "right_wall",
            MeshData::cuboid(300.0, 7.0, 1.0),
            Mat4::from_rotation_translation(side_wall_rotation, Vec3::new(10.0, 3.5, 0.0)),
            0x404040,
        ),
    ]
}

/// GPU 端不透明场景
pub struct OpaqueScene {
    meshes: Vec<GpuMesh>,
    lighting: SceneLighting,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    model_bind_group: wgpu::BindGroup,
    _model_buffer: wgpu::Buffer,
    color_pipeline: wgpu::RenderPipeline,
    depth_pipeline: wgpu::RenderPipeline,
}

impl OpaqueScene {
    /// 上传网格并创建两个管线
    ///
    /// `color_format` 为场景通道的颜色格式，`capture_format` 为深度捕获的颜色附件格式。
    pub fn new(
        device: &wgpu::Device,
        instances: &[MeshInstance],
        color_format: wgpu::TextureFormat,
        capture_format: wgpu::TextureFormat,
    ) -> Self {
        let meshes: Vec<GpuMesh> = instances
            .iter()
            .map(|instance| GpuMesh::from_data(device, &instance.data))
            .collect();

        let mut model_bytes = vec![0u8; MODEL_UNIFORM_STRIDE as usize * instances.len().max(1)];
        for (i, instance) in instances.iter().enumerate() {
            let uniform = ModelUniform {
                model: instance.transform.to_cols_array_2d(),
                color: [instance.color[0], instance.color[1], instance.color[2], 1.0],
                _pad1: [0.0; 32],
                _pad2: [0.0; 12],
            };
            let offset = i * MODEL_UNIFORM_STRIDE as usize;
            model_bytes[offset..offset + MODEL_UNIFORM_STRIDE as usize]
                .copy_from_slice(bytemuck::bytes_of(&uniform));
        }

        let model_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model Uniform Buffer"),
            contents: &model_bytes,
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Uniform Buffer"),
            size: std::mem::size_of::<SceneUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let scene_bind_group_layout =
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
                label: Some("Scene Uniform Bind Group Layout"),
            });

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &scene_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
            label: Some("Scene Uniform Bind Group"),
        });

        let model_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(MODEL_UNIFORM_STRIDE),
                    },
                    count: None,
                }],
                label: Some("Model Bind Group Layout"),
            });

        let model_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &model_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &model_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(MODEL_UNIFORM_STRIDE),
                }),
            }],
            label: Some("Model Bind Group"),
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Opaque Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(std::borrow::Cow::Borrowed(SCENE_SHADER)),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Opaque Scene Pipeline Layout"),
            bind_group_layouts: &[&scene_bind_group_layout, &model_bind_group_layout],
            push_constant_ranges: &[],
        });

        let color_pipeline = create_mesh_pipeline(
            device,
            &pipeline_layout,
            &shader,
            color_format,
            "Opaque Scene Pipeline",
        );
        let depth_pipeline = create_mesh_pipeline(
            device,
            &pipeline_layout,
            &shader,
            capture_format,
            "Depth Capture Pipeline",
        );

        tracing::debug!(target: "render", "Uploaded {} opaque meshes", meshes.len());

        Self {
            meshes,
            lighting: SceneLighting::default(),
            scene_buffer,
            scene_bind_group,
            model_bind_group,
            _model_buffer: model_buffer,
            color_pipeline,
            depth_pipeline,
        }
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// 写入本帧的相机矩阵
    pub fn update(&self, queue: &wgpu::Queue, camera: &Camera) {
        let light_dir = self.lighting.direction.normalize_or_zero();
        let uniforms = SceneUniforms {
            view_proj: camera.view_projection().to_cols_array_2d(),
            light_dir: light_dir.extend(0.0).to_array(),
            light: [self.lighting.ambient, self.lighting.directional, 0.0, 0.0],
        };
        queue.write_buffer(&self.scene_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// 使用场景通道管线绘制
    pub fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        self.draw_with(pass, &self.color_pipeline);
    }

    /// 使用深度捕获管线绘制
    pub fn draw_depth<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        self.draw_with(pass, &self.depth_pipeline);
    }

    fn draw_with<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, pipeline: &'a wgpu::RenderPipeline) {
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.scene_bind_group, &[]);
        for (i, mesh) in self.meshes.iter().enumerate() {
            let offset = (i as u64 * MODEL_UNIFORM_STRIDE) as u32;
            pass.set_bind_group(1, &self.model_bind_group, &[offset]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

fn create_mesh_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            buffers: &[Vertex3D::desc()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}
