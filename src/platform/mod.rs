//! 平台抽象层
//!
//! 渲染核心只需要视口尺寸和重绘请求，窗口创建细节留在具体实现中。

pub mod winit;

pub use self::winit::WinitWindow;

/// 平台窗口抽象
pub trait Window: Send + Sync {
    /// 物理像素尺寸
    fn size(&self) -> (u32, u32);
    fn scale_factor(&self) -> f64;
    /// 请求下一次重绘
    fn request_redraw(&self);
}
