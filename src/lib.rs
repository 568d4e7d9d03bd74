//! # Soft Particles
//!
//! 基于 wgpu 的软粒子烟雾渲染。
//!
//! ## Features
//!
//! - **Depth Capture**: 每帧先绘制不透明几何体的深度，供粒子片段采样
//! - **Soft Particles**: 线性化深度比较 + 缓入缓出淡出，粒子接近墙面时柔和消失
//! - **Composite**: 场景通道 → FXAA 终端通道的有序合成管线
//! - **Config**: TOML/JSON 配置、环境变量覆盖与启动时验证
//!
//! ## Modules
//!
//! - [`core`]: 引擎入口、帧驱动器、错误类型
//! - [`config`]: 配置系统
//! - [`platform`]: 窗口抽象
//! - [`render`]: 深度捕获、软粒子、合成管线

/// Core engine functionality including the main loop and frame driver
pub mod core;
/// Configuration system
pub mod config;
/// Platform abstraction layer
pub mod platform;
/// Rendering: depth capture, soft particles and composite passes
pub mod render;

pub use crate::core::{Engine, EngineError, EngineResult};
pub use crate::config::EngineConfig;
