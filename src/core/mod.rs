//! 核心模块
//!
//! 包含引擎的核心功能：
//! - `engine` - 主引擎入口、渲染上下文和事件循环
//! - `frame` - 帧驱动器与动画时钟
//! - `error` - 错误类型定义

pub mod engine;
pub mod error;
pub mod frame;
#[macro_use]
pub mod macros;

// 重新导出错误类型
pub use error::{
    AssetError, AssetResult, EngineError, EngineResult, RenderError, RenderResult,
};

// 重新导出主要类型
pub use engine::{Engine, RenderContext};
pub use frame::{FrameClock, FrameDriver, FrameOutcome, FrameStages};
