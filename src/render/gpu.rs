//! GPU 设备与表面上下文

use std::sync::Arc;

use winit::window::Window;

use crate::core::error::{RenderError, RenderResult};
use crate::render::target::TargetSize;

/// 表面帧获取结果
pub enum FrameAcquire {
    /// 可以绘制
    Ready(wgpu::SurfaceTexture),
    /// 本帧跳过（表面已重新配置或超时）
    Skip,
}

/// 设备、队列与交换链
pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: TargetSize,
}

impl GpuContext {
    pub async fn new(window: Arc<Window>, vsync: bool) -> RenderResult<Self> {
        let inner = window.inner_size();
        let size = TargetSize::new(inner.width, inner.height);

        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::SurfaceCreation(e.to_string()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        let info = adapter.get_info();
        tracing::info!(target: "render", "Using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    label: Some("Soft Particles Device"),
                },
                None,
            )
            .await
            .map_err(|e| RenderError::DeviceRequest(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| {
                RenderError::SurfaceCreation("surface reports no supported formats".to_string())
            })?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let present_mode = if vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        tracing::debug!(target: "render", "Surface configured {:?} {}x{}", format, size.width, size.height);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
        })
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// 调整交换链尺寸，零尺寸或尺寸不变时返回 false
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 || !self.size.update(width, height) {
            return false;
        }
        self.config.width = self.size.width;
        self.config.height = self.size.height;
        self.surface.configure(&self.device, &self.config);
        true
    }

    /// 获取下一帧
    ///
    /// 表面丢失或过期时重新配置并跳过本帧；超时直接跳过；
    /// 其余错误视为致命错误。
    pub fn acquire_frame(&self) -> RenderResult<FrameAcquire> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(FrameAcquire::Ready(frame)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::warn!(target: "render", "Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                Ok(FrameAcquire::Skip)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!(target: "render", "Surface acquire timed out, skipping frame");
                Ok(FrameAcquire::Skip)
            }
            Err(e) => Err(RenderError::Surface(e.to_string())),
        }
    }
}
