use std::sync::Arc;

use winit::dpi::PhysicalSize;
use winit::event_loop::EventLoop;
use winit::window::{Window as WinitWindowRaw, WindowBuilder, WindowId};

use crate::config::GraphicsConfig;
use crate::core::error::{EngineError, EngineResult};

#[derive(Clone)]
pub struct WinitWindow {
    window: Arc<WinitWindowRaw>,
}

impl WinitWindow {
    pub fn new(event_loop: &EventLoop<()>, graphics: &GraphicsConfig) -> EngineResult<Self> {
        let window = WindowBuilder::new()
            .with_title(graphics.title.as_str())
            .with_inner_size(PhysicalSize::new(
                graphics.resolution.width,
                graphics.resolution.height,
            ))
            .build(event_loop)
            .map_err(|e| EngineError::Window(e.to_string()))?;
        Ok(Self {
            window: Arc::new(window),
        })
    }

    /// 表面创建需要 `'static` 的窗口句柄
    pub fn arc(&self) -> Arc<WinitWindowRaw> {
        Arc::clone(&self.window)
    }

    pub fn id(&self) -> WindowId {
        self.window.id()
    }
}

impl crate::platform::Window for WinitWindow {
    fn size(&self) -> (u32, u32) {
        let s = self.window.inner_size();
        (s.width, s.height)
    }
    fn scale_factor(&self) -> f64 {
        self.window.scale_factor()
    }
    fn request_redraw(&self) {
        self.window.request_redraw();
    }
}
