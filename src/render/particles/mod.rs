//! 软粒子模块
//!
//! ## 架构设计
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Soft Particles                        │
//! ├──────────────────────────────────────────────────────────┤
//! │  1. ParticleField                                         │
//! │     - 启动时在盒内随机生成位置（可选每粒子颜色）            │
//! │     - 运行时只推进整体旋转角                               │
//! │                                                           │
//! │  2. Vertex                                                │
//! │     - 投影粒子中心，按透视衰减计算像素尺寸                  │
//! │     - 展开为朝向相机的四边形                               │
//! │                                                           │
//! │  3. Fragment                                              │
//! │     - 按屏幕坐标读取本帧捕获的场景深度                      │
//! │     - 两个深度线性化后比较，缓入缓出淡出                    │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod field;
pub mod material;
pub mod renderer;
pub mod shader;
pub mod sprite;

pub use field::{ParticleField, ParticleInstance};
pub use material::{ParticleFragment, SoftParticleMaterial, SoftParticleUniforms};
pub use renderer::ParticleRenderer;
