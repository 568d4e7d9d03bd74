//! 合成管线
//!
//! 有序的通道列表：场景通道把不透明几何体和软粒子绘制到中间颜色缓冲，
//! 抗锯齿通道读取该缓冲并写入交换链。终端通道有且只有一个，并且必须位于最后。

use crate::config::GraphicsConfig;
use crate::core::error::{RenderError, RenderResult};
use crate::render::depth_capture::create_depth_texture;
use crate::render::particles::ParticleRenderer;
use crate::render::postprocess::{FxaaPass, FxaaQuality};
use crate::render::scene::OpaqueScene;
use crate::render::target::{OffscreenTarget, TargetSize};

/// 通道类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// 完整场景（不透明几何体 + 软粒子）
    Scene,
    /// 全屏抗锯齿
    Antialias,
}

impl PassKind {
    /// 是否为屏幕空间效果（需要前面已有颜色缓冲）
    pub fn is_image_space(&self) -> bool {
        matches!(self, PassKind::Antialias)
    }
}

/// 通道描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassDescriptor {
    pub kind: PassKind,
    /// 是否写入可见帧缓冲
    pub terminal: bool,
}

impl PassDescriptor {
    pub fn new(kind: PassKind) -> Self {
        Self {
            kind,
            terminal: false,
        }
    }

    pub fn terminal(kind: PassKind) -> Self {
        Self {
            kind,
            terminal: true,
        }
    }
}

/// 经过验证的通道顺序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositePlan {
    passes: Vec<PassDescriptor>,
}

impl CompositePlan {
    /// `[Scene, Antialias(终端)]`
    pub fn standard() -> Self {
        Self {
            passes: vec![
                PassDescriptor::new(PassKind::Scene),
                PassDescriptor::terminal(PassKind::Antialias),
            ],
        }
    }

    /// 验证通道顺序
    pub fn new(passes: Vec<PassDescriptor>) -> RenderResult<Self> {
        let Some(first) = passes.first() else {
            return Err(RenderError::PipelineOrder("no passes".to_string()));
        };
        if first.kind != PassKind::Scene {
            return Err(RenderError::PipelineOrder(format!(
                "first pass must render the scene, found {:?}",
                first.kind
            )));
        }

        let terminal_count = passes.iter().filter(|p| p.terminal).count();
        if terminal_count != 1 {
            return Err(RenderError::PipelineOrder(format!(
                "expected exactly one terminal pass, found {terminal_count}"
            )));
        }
        if passes.last().is_some_and(|p| !p.terminal) {
            return Err(RenderError::PipelineOrder(
                "terminal pass must be last".to_string(),
            ));
        }
        if passes.iter().skip(1).any(|p| !p.kind.is_image_space()) {
            return Err(RenderError::PipelineOrder(
                "scene pass must run exactly once, before image-space passes".to_string(),
            ));
        }
        if passes.iter().any(|p| p.terminal && !p.kind.is_image_space()) {
            return Err(RenderError::PipelineOrder(
                "terminal pass must be an image-space pass".to_string(),
            ));
        }

        Ok(Self { passes })
    }

    pub fn passes(&self) -> &[PassDescriptor] {
        &self.passes
    }
}

/// 合成管线
pub struct CompositePipeline {
    plan: CompositePlan,
    scene_color: OffscreenTarget,
    /// 场景通道自己的深度缓冲，与深度捕获的纹理分开
    scene_depth: (wgpu::Texture, wgpu::TextureView),
    clear_color: wgpu::Color,
    fxaa: FxaaPass,
}

impl CompositePipeline {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: TargetSize,
        graphics: &GraphicsConfig,
    ) -> Self {
        let scene_color = OffscreenTarget::new(
            device,
            "Composite Scene Color",
            size.width,
            size.height,
            format,
        );
        let scene_depth = create_depth_texture(device, "Composite Scene Depth", scene_color.size);

        let mut fxaa = FxaaPass::new(device, format);
        fxaa.set_quality(FxaaQuality::from(graphics.fxaa_quality));
        fxaa.set_mode(graphics.anti_aliasing);

        let [r, g, b] = graphics.background_rgb();
        Self {
            plan: CompositePlan::standard(),
            scene_color,
            scene_depth,
            clear_color: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: 1.0,
            },
            fxaa,
        }
    }

    pub fn size(&self) -> TargetSize {
        self.scene_color.size
    }

    /// 调整中间缓冲尺寸，返回是否重新分配
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        if !self.scene_color.resize(device, width, height) {
            return false;
        }
        self.scene_depth =
            create_depth_texture(device, "Composite Scene Depth", self.scene_color.size);
        true
    }

    /// 依次执行所有通道，终端通道写入 `output`
    pub fn run(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        scene: &OpaqueScene,
        particles: &ParticleRenderer,
        output: &wgpu::TextureView,
    ) {
        for pass in self.plan.passes() {
            match pass.kind {
                PassKind::Scene => self.scene_pass(encoder, scene, particles),
                PassKind::Antialias => {
                    let size = self.scene_color.size;
                    self.fxaa.render(
                        device,
                        queue,
                        encoder,
                        &self.scene_color.view,
                        output,
                        size.width,
                        size.height,
                    );
                }
            }
        }
    }

    fn scene_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        scene: &OpaqueScene,
        particles: &ParticleRenderer,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.scene_color.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.scene_depth.1,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        // 不透明物体先画，粒子加法混合叠加在上面
        scene.draw(&mut pass);
        particles.draw(&mut pass);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_plan_is_valid() {
        let plan = CompositePlan::standard();
        assert_eq!(CompositePlan::new(plan.passes().to_vec()), Ok(plan.clone()));
        assert!(plan.passes().last().unwrap().terminal);
    }

    #[test]
    fn test_antialias_before_scene_rejected() {
        let result = CompositePlan::new(vec![
            PassDescriptor::new(PassKind::Antialias),
            PassDescriptor::terminal(PassKind::Scene),
        ]);
        assert!(matches!(result, Err(RenderError::PipelineOrder(_))));
    }

    #[test]
    fn test_pass_after_terminal_rejected() {
        let result = CompositePlan::new(vec![
            PassDescriptor::new(PassKind::Scene),
            PassDescriptor::terminal(PassKind::Antialias),
            PassDescriptor::new(PassKind::Antialias),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_multiple_terminals_rejected() {
        let result = CompositePlan::new(vec![
            PassDescriptor::new(PassKind::Scene),
            PassDescriptor::terminal(PassKind::Antialias),
            PassDescriptor::terminal(PassKind::Antialias),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_terminal_rejected() {
        let result = CompositePlan::new(vec![
            PassDescriptor::new(PassKind::Scene),
            PassDescriptor::new(PassKind::Antialias),
        ]);
        assert!(result.is_err());
        assert!(CompositePlan::new(Vec::new()).is_err());
    }

    #[test]
    fn test_scene_only_plan_rejected() {
        let result = CompositePlan::new(vec![PassDescriptor::terminal(PassKind::Scene)]);
        assert!(result.is_err());
    }
}
