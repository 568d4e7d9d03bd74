//! 场景深度捕获
//!
//! 每帧在粒子之前把不透明几何体绘制到离屏目标，深度附件随后作为纹理
//! 供软粒子片段采样。目标尺寸必须与视口一致，否则按屏幕坐标采样会错位。

use wgpu::{Device, Texture, TextureView};

use crate::render::scene::OpaqueScene;
use crate::render::target::{OffscreenTarget, TargetSize};

/// 深度附件格式
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// 颜色附件格式（内容不使用）
pub const CAPTURE_COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// 创建可作为纹理读取的深度附件
pub fn create_depth_texture(device: &Device, label: &str, size: TargetSize) -> (Texture, TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: size.extent(),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// 深度捕获目标
pub struct DepthCapture {
    color: OffscreenTarget,
    depth_texture: Texture,
    depth_view: TextureView,
    /// 每次重新分配加一，持有旧视图的绑定组据此重建
    generation: u64,
    /// 本帧是否已经写入深度
    captured: bool,
}

impl DepthCapture {
    pub fn new(device: &Device, width: u32, height: u32) -> Self {
        let color = OffscreenTarget::new(
            device,
            "Depth Capture Color",
            width,
            height,
            CAPTURE_COLOR_FORMAT,
        );
        let (depth_texture, depth_view) =
            create_depth_texture(device, "Depth Capture Depth", color.size);

        Self {
            color,
            depth_texture,
            depth_view,
            generation: 0,
            captured: false,
        }
    }

    pub fn size(&self) -> TargetSize {
        self.color.size
    }

    pub fn depth_texture(&self) -> &Texture {
        &self.depth_texture
    }

    pub fn depth_view(&self) -> &TextureView {
        &self.depth_view
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// 本帧的深度是否可用
    pub fn is_captured(&self) -> bool {
        self.captured
    }

    /// 新的一帧开始，上一帧的深度不再视为有效
    pub fn begin_frame(&mut self) {
        self.captured = false;
    }

    /// 调整尺寸，返回是否重新分配
    ///
    /// 相同尺寸重复调用不会产生任何变化。
    pub fn resize(&mut self, device: &Device, width: u32, height: u32) -> bool {
        if !self.color.resize(device, width, height) {
            return false;
        }
        let (texture, view) = create_depth_texture(device, "Depth Capture Depth", self.color.size);
        self.depth_texture = texture;
        self.depth_view = view;
        self.generation += 1;
        self.captured = false;
        tracing::debug!(
            target: "render",
            "Depth capture resized to {}x{} (generation {})",
            self.color.size.width,
            self.color.size.height,
            self.generation
        );
        true
    }

    /// 绘制不透明几何体的深度
    pub fn render_depth(&mut self, encoder: &mut wgpu::CommandEncoder, scene: &OpaqueScene) {
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Depth Capture Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Discard,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            scene.draw_depth(&mut pass);
        }
        self.captured = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::test_support::headless_device;

    #[test]
    fn test_resize_is_idempotent() {
        let Some((device, _queue)) = headless_device() else {
            eprintln!("no GPU adapter available, skipping");
            return;
        };

        let mut capture = DepthCapture::new(&device, 320, 240);
        assert_eq!(capture.size(), TargetSize::new(320, 240));
        assert_eq!(capture.generation(), 0);

        assert!(capture.resize(&device, 640, 480));
        let generation = capture.generation();
        assert!(!capture.resize(&device, 640, 480));
        assert_eq!(capture.generation(), generation);
        assert_eq!(capture.size(), TargetSize::new(640, 480));

        let extent = capture.depth_texture().size();
        assert_eq!((extent.width, extent.height), (640, 480));
    }

    #[test]
    fn test_resize_invalidates_capture() {
        let Some((device, _queue)) = headless_device() else {
            return;
        };
        let mut capture = DepthCapture::new(&device, 64, 64);
        capture.captured = true;
        capture.resize(&device, 128, 64);
        assert!(!capture.is_captured());
    }
}
