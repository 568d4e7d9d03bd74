//! 后处理模块
//!
//! 目前只有合成管线的终端通道：FXAA 抗锯齿（可切换为直通）。

pub mod antialiasing;

pub use antialiasing::{FxaaPass, FxaaQuality, FxaaUniforms};
