//! 抗锯齿后处理模块
//!
//! FXAA (Fast Approximate Anti-Aliasing) 作为合成管线的终端通道，
//! 直接写入交换链。关闭抗锯齿时同一通道退化为直通拷贝，
//! 因此终端通道始终存在。
//!
//! # 示例
//!
//! ```ignore
//! let mut fxaa = FxaaPass::new(&device, surface_format);
//! fxaa.set_quality(FxaaQuality::High);
//! fxaa.render(&device, &queue, &mut encoder, &scene_view, &surface_view, width, height);
//! ```

use crate::config::{AntiAliasing, QualityLevel};

/// FXAA 质量等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FxaaQuality {
    /// 低质量（最快）
    Low,
    /// 中等质量
    #[default]
    Medium,
    /// 高质量（最佳效果）
    High,
    /// 极致质量（用于截图）
    Ultra,
}

impl FxaaQuality {
    /// 获取边缘检测阈值
    pub fn edge_threshold(&self) -> f32 {
        match self {
            FxaaQuality::Low => 0.250,
            FxaaQuality::Medium => 0.166,
            FxaaQuality::High => 0.125,
            FxaaQuality::Ultra => 0.063,
        }
    }

    /// 获取最小边缘阈值
    pub fn edge_threshold_min(&self) -> f32 {
        match self {
            FxaaQuality::Low => 0.0833,
            FxaaQuality::Medium => 0.0625,
            FxaaQuality::High => 0.0312,
            FxaaQuality::Ultra => 0.0156,
        }
    }

    /// 子像素混合强度
    pub fn subpix_quality(&self) -> f32 {
        match self {
            FxaaQuality::Low => 0.50,
            FxaaQuality::Medium => 0.75,
            FxaaQuality::High => 0.75,
            FxaaQuality::Ultra => 1.00,
        }
    }
}

impl From<QualityLevel> for FxaaQuality {
    fn from(level: QualityLevel) -> Self {
        match level {
            QualityLevel::Low => FxaaQuality::Low,
            QualityLevel::Medium => FxaaQuality::Medium,
            QualityLevel::High => FxaaQuality::High,
            QualityLevel::Ultra => FxaaQuality::Ultra,
        }
    }
}

/// FXAA Uniform 数据
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FxaaUniforms {
    /// 屏幕尺寸 (width, height)
    pub screen_size: [f32; 2],
    /// 像素大小 (1/width, 1/height)
    pub pixel_size: [f32; 2],
    /// 边缘检测阈值
    pub edge_threshold: f32,
    /// 最小边缘阈值
    pub edge_threshold_min: f32,
    /// 子像素质量
    pub subpix_quality: f32,
    /// 1.0 执行 FXAA，0.0 直通
    pub enabled: f32,
}

impl FxaaUniforms {
    pub fn new(quality: FxaaQuality, enabled: bool, width: u32, height: u32) -> Self {
        let width = width.max(1) as f32;
        let height = height.max(1) as f32;
        Self {
            screen_size: [width, height],
            pixel_size: [1.0 / width, 1.0 / height],
            edge_threshold: quality.edge_threshold(),
            edge_threshold_min: quality.edge_threshold_min(),
            subpix_quality: quality.subpix_quality(),
            enabled: if enabled { 1.0 } else { 0.0 },
        }
    }
}

const FXAA_SHADER: &str = r#"
struct FxaaUniforms {
    screen_size: vec2<f32>,
    pixel_size: vec2<f32>,
    edge_threshold: f32,
    edge_threshold_min: f32,
    subpix_quality: f32,
    enabled: f32,
};

@group(0) @binding(0) var input_texture: texture_2d<f32>;
@group(0) @binding(1) var input_sampler: sampler;
@group(0) @binding(2) var<uniform> fxaa: FxaaUniforms;

const FXAA_SPAN_MAX: f32 = 8.0;
const FXAA_REDUCE_MIN: f32 = 0.0078125;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

// 全屏三角形
@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    let x = f32((vertex_index << 1u) & 2u);
    let y = f32(vertex_index & 2u);
    var out: VertexOutput;
    out.position = vec4<f32>(x * 2.0 - 1.0, 1.0 - y * 2.0, 0.0, 1.0);
    out.uv = vec2<f32>(x, y);
    return out;
}

// 采样 sRGB 纹理得到线性值，边缘阈值按感知亮度设定，先近似编码回 gamma 空间
fn luma(c: vec3<f32>) -> f32 {
    return dot(sqrt(max(c, vec3<f32>(0.0))), vec3<f32>(0.299, 0.587, 0.114));
}

fn fetch(uv: vec2<f32>) -> vec3<f32> {
    return textureSampleLevel(input_texture, input_sampler, uv, 0.0).rgb;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let center = textureSampleLevel(input_texture, input_sampler, in.uv, 0.0);
    if (fxaa.enabled < 0.5) {
        return center;
    }

    let px = fxaa.pixel_size;
    let luma_nw = luma(fetch(in.uv + vec2<f32>(-1.0, -1.0) * px));
    let luma_ne = luma(fetch(in.uv + vec2<f32>(1.0, -1.0) * px));
    let luma_sw = luma(fetch(in.uv + vec2<f32>(-1.0, 1.0) * px));
    let luma_se = luma(fetch(in.uv + vec2<f32>(1.0, 1.0) * px));
    let luma_m = luma(center.rgb);

    let luma_min = min(luma_m, min(min(luma_nw, luma_ne), min(luma_sw, luma_se)));
    let luma_max = max(luma_m, max(max(luma_nw, luma_ne), max(luma_sw, luma_se)));
    if (luma_max - luma_min < max(fxaa.edge_threshold_min, luma_max * fxaa.edge_threshold)) {
        return center;
    }

    var dir = vec2<f32>(
        -((luma_nw + luma_ne) - (luma_sw + luma_se)),
        (luma_nw + luma_sw) - (luma_ne + luma_se),
    );
    let dir_reduce = max(
        (luma_nw + luma_ne + luma_sw + luma_se) * 0.25 * (fxaa.subpix_quality * 0.125),
        FXAA_REDUCE_MIN,
    );
    let rcp_dir_min = 1.0 / (min(abs(dir.x), abs(dir.y)) + dir_reduce);
    dir = clamp(dir * rcp_dir_min, vec2<f32>(-FXAA_SPAN_MAX), vec2<f32>(FXAA_SPAN_MAX)) * px;

    let rgb_a = 0.5 * (
        fetch(in.uv + dir * (1.0 / 3.0 - 0.5)) +
        fetch(in.uv + dir * (2.0 / 3.0 - 0.5)));
    let rgb_b = rgb_a * 0.5 + 0.25 * (
        fetch(in.uv + dir * -0.5) +
        fetch(in.uv + dir * 0.5));

    let luma_b = luma(rgb_b);
    if (luma_b < luma_min || luma_b > luma_max) {
        return vec4<f32>(rgb_a, center.a);
    }
    return vec4<f32>(rgb_b, center.a);
}
"#;

/// FXAA 渲染通道
pub struct FxaaPass {
    /// 渲染管线
    pipeline: wgpu::RenderPipeline,
    /// 绑定组布局
    bind_group_layout: wgpu::BindGroupLayout,
    /// Uniform 缓冲区
    uniform_buffer: wgpu::Buffer,
    /// 采样器
    sampler: wgpu::Sampler,
    /// 当前质量
    quality: FxaaQuality,
    /// 关闭时直通
    enabled: bool,
}

impl FxaaPass {
    /// 创建 FXAA 渲染通道
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat) -> Self {
        // 创建着色器
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("FXAA Shader"),
            source: wgpu::ShaderSource::Wgsl(FXAA_SHADER.into()),
        });

        // 创建绑定组布局
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("FXAA Bind Group Layout"),
            entries: &[
                // 输入纹理
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
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
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // Uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        // 创建管线布局
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("FXAA Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // 创建渲染管线
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("FXAA Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: output_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        // 创建 Uniform 缓冲区
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("FXAA Uniform Buffer"),
            size: std::mem::size_of::<FxaaUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // 创建采样器
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("FXAA Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            pipeline,
            bind_group_layout,
            uniform_buffer,
            sampler,
            quality: FxaaQuality::default(),
            enabled: true,
        }
    }

    /// 设置 FXAA 质量
    pub fn set_quality(&mut self, quality: FxaaQuality) {
        self.quality = quality;
    }

    /// 获取当前质量
    pub fn quality(&self) -> FxaaQuality {
        self.quality
    }

    /// 按配置启用或改为直通
    pub fn set_mode(&mut self, mode: AntiAliasing) {
        self.enabled = mode == AntiAliasing::FXAA;
    }

    /// 执行 FXAA 渲染
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        input_view: &wgpu::TextureView,
        output_view: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) {
        // 更新 Uniforms
        let uniforms = FxaaUniforms::new(self.quality, self.enabled, width, height);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        // 输入纹理随尺寸变化重建，绑定组每帧创建
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("FXAA Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        });

        // 渲染
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("FXAA Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &bind_group, &[]);
        render_pass.draw(0..3, 0..1); // 全屏三角形
    }
}
