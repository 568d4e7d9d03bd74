use super::{ConfigError, ConfigResult};
use crate::impl_default;
use serde::{Deserialize, Serialize};

/// 每帧固定旋转增量（弧度）
pub const FIXED_ROTATION_STEP: f32 = 0.002;

/// 默认尺寸衰减比例
pub const DEFAULT_POINT_SCALE: f32 = 329.0;

/// 粒子系统配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// 粒子数量
    pub count: u32,
    /// 分布盒中心
    pub origin: [f32; 3],
    /// 分布盒全尺寸 (x, y, z)
    pub spread: [f32; 3],
    /// 随机种子，缺省时每次启动随机
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// 点大小（像素）
    pub size: f32,
    /// 不透明度
    pub opacity: f32,
    /// 基础颜色
    pub diffuse: [f32; 3],
    /// 是否启用透视尺寸衰减
    pub size_attenuation: bool,
    /// 是否上传每粒子颜色
    pub per_particle_tint: bool,
    /// 软边过渡余量（归一化深度）
    pub fade_margin: f32,
    /// 软边过渡陡度
    pub fade_steepness: f32,
    /// 精灵纹理路径
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprite_path: Option<String>,
    /// 尺寸衰减比例
    pub point_scale: PointScale,
    /// 整体旋转方式
    pub rotation: RotationMode,
}

impl_default!(ParticleConfig {
    count: 20,
    origin: [0.0, 1.0, 0.0],
    spread: [18.0, 4.0, 18.0],
    seed: None,
    size: 25.0,
    opacity: 0.10,
    diffuse: [1.0, 1.0, 1.0],
    size_attenuation: true,
    point_scale: PointScale::default(),
    per_particle_tint: false,
    fade_margin: 0.015,
    fade_steepness: 120.0,
    sprite_path: None,
    rotation: RotationMode::default(),
});

impl ParticleConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.count == 0 {
            return Err(ConfigError::ValidationError(
                "Particle count must be at least 1".to_string(),
            ));
        }
        if self.spread.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "Particle spread {:?} must be finite and non-negative",
                self.spread
            )));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(ConfigError::ValidationError(format!(
                "Particle opacity {} is outside [0, 1]",
                self.opacity
            )));
        }
        if self.size <= 0.0 {
            return Err(ConfigError::ValidationError(
                "Particle size must be positive".to_string(),
            ));
        }
        if matches!(self.point_scale, PointScale::Fixed(s) if s <= 0.0) {
            return Err(ConfigError::ValidationError(
                "Point scale must be positive".to_string(),
            ));
        }
        if self.fade_steepness <= 0.0 || self.fade_margin < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "Fade margin {} / steepness {} out of range",
                self.fade_margin, self.fade_steepness
            )));
        }
        Ok(())
    }
}

/// 透视尺寸衰减的比例来源
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointScale {
    /// 固定值，与窗口尺寸无关
    Fixed(f32),
    /// 视口高度的一半，粒子随窗口高度缩放
    HalfViewportHeight,
}

impl Default for PointScale {
    fn default() -> Self {
        Self::Fixed(DEFAULT_POINT_SCALE)
    }
}

impl PointScale {
    pub fn resolve(&self, viewport_height: u32) -> f32 {
        match *self {
            Self::Fixed(scale) => scale,
            Self::HalfViewportHeight => viewport_height as f32 * 0.5,
        }
    }
}

/// 粒子场整体旋转的推进方式
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RotationMode {
    /// 每帧固定增量，与帧间隔无关（转速随刷新率变化）
    FixedPerFrame { radians: f32 },
    /// 按帧间隔缩放的角速度
    DeltaScaled { radians_per_second: f32 },
}

impl Default for RotationMode {
    fn default() -> Self {
        // 60Hz 下与固定增量的转速一致
        Self::DeltaScaled {
            radians_per_second: FIXED_ROTATION_STEP * 60.0,
        }
    }
}

impl RotationMode {
    /// 每帧固定增量 0.002 弧度
    pub fn fixed_step() -> Self {
        Self::FixedPerFrame {
            radians: FIXED_ROTATION_STEP,
        }
    }

    /// 本帧的旋转增量
    pub fn increment(&self, delta_seconds: f32) -> f32 {
        match *self {
            Self::FixedPerFrame { radians } => radians,
            Self::DeltaScaled { radians_per_second } => radians_per_second * delta_seconds.max(0.0),
        }
    }
}
