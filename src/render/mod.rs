//! 渲染模块
//!
//! 每帧两个有因果顺序的阶段：
//! 1. [`depth_capture`] 只绘制不透明几何体，得到场景深度纹理
//! 2. [`composite`] 绘制完整场景（不透明几何体 + 读取深度的软粒子），再做抗锯齿输出
//!
//! 深度相关的数值计算集中在 [`depth`]，与着色器中的对应片段保持一致。

pub mod camera;
pub mod composite;
pub mod depth;
pub mod depth_capture;
pub mod gpu;
pub mod mesh;
pub mod particles;
pub mod postprocess;
pub mod scene;
pub mod shader_builder;
pub mod target;

pub use camera::{Camera, Projection};
pub use composite::{CompositePipeline, CompositePlan, PassDescriptor, PassKind};
pub use depth::{DepthRange, FadeParams};
pub use depth_capture::DepthCapture;
pub use gpu::{FrameAcquire, GpuContext};
pub use mesh::{GpuMesh, MeshData, Vertex3D};
pub use scene::{demo_scene, MeshInstance, OpaqueScene, SceneLighting};
pub use shader_builder::{ShaderChunk, ShaderProgram, ShaderProgramBuilder};
pub use target::{OffscreenTarget, TargetSize};

#[cfg(test)]
pub(crate) mod test_support {
    /// 无窗口的测试设备，没有可用适配器时返回 `None`
    pub fn headless_device() -> Option<(wgpu::Device, wgpu::Queue)> {
        let instance = wgpu::Instance::default();
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))?;
        pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Headless Test Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
            },
            None,
        ))
        .ok()
    }
}
