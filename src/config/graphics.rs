use super::{ConfigError, ConfigResult};
use crate::impl_default;
use serde::{Deserialize, Serialize};

/// 图形配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    /// 窗口标题
    pub title: String,

    /// 垂直同步
    pub vsync: bool,

    /// 背景色 (0xRRGGBB)
    pub background: u32,

    /// 抗锯齿
    pub anti_aliasing: AntiAliasing,

    /// FXAA 质量
    pub fxaa_quality: QualityLevel,

    /// 初始分辨率
    pub resolution: Resolution,
}

impl_default!(GraphicsConfig {
    title: "Soft Particles".to_string(),
    vsync: true,
    background: 0x101020,
    anti_aliasing: AntiAliasing::FXAA,
    fxaa_quality: QualityLevel::Medium,
    resolution: Resolution::default(),
});

impl GraphicsConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(ConfigError::ValidationError(
                "Invalid resolution".to_string(),
            ));
        }
        if self.background > 0xFF_FF_FF {
            return Err(ConfigError::ValidationError(format!(
                "Background colour {:#x} is not a 24-bit RGB value",
                self.background
            )));
        }
        Ok(())
    }

    /// 背景色的线性 RGB 分量 (0.0 - 1.0)
    pub fn background_rgb(&self) -> [f32; 3] {
        rgb_from_hex(self.background)
    }
}

/// 将 0xRRGGBB 拆分为线性空间的 RGB 分量
///
/// 十六进制颜色按 sRGB 编码书写，而表面和中间缓冲都是 `*Srgb` 格式，
/// 写入时硬件会再编码一次，所以这里先解码回线性值。
pub fn rgb_from_hex(hex: u32) -> [f32; 3] {
    [
        srgb_to_linear(((hex >> 16) & 0xFF) as f32 / 255.0),
        srgb_to_linear(((hex >> 8) & 0xFF) as f32 / 255.0),
        srgb_to_linear((hex & 0xFF) as f32 / 255.0),
    ]
}

/// sRGB 传递函数的逆
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// 分辨率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// 宽度（像素）
    pub width: u32,
    /// 高度（像素）
    pub height: u32,
}

impl_default!(Resolution {
    width: 1280,
    height: 720,
});

/// 抗锯齿方式
///
/// 合成管线的终端通道始终存在；`None` 时该通道只做直通拷贝。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AntiAliasing {
    /// 无抗锯齿
    None,
    /// FXAA
    FXAA,
}

/// 质量等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QualityLevel {
    /// 低
    Low,
    /// 中
    Medium,
    /// 高
    High,
    /// 超高
    Ultra,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_rgb_is_linear() {
        let rgb = rgb_from_hex(0x101020);
        assert!((rgb[0] - 0.0052).abs() < 1e-4, "red {}", rgb[0]);
        assert!((rgb[1] - 0.0052).abs() < 1e-4, "green {}", rgb[1]);
        assert!((rgb[2] - 0.0144).abs() < 1e-4, "blue {}", rgb[2]);
        assert_eq!(GraphicsConfig::default().background_rgb(), rgb);
    }

    #[test]
    fn test_srgb_to_linear_endpoints() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
        // 线性段
        assert!((srgb_to_linear(0.04) - 0.04 / 12.92).abs() < 1e-7);
        // 中灰 0x404040
        assert!((srgb_to_linear(64.0 / 255.0) - 0.0513).abs() < 1e-3);
    }

    #[test]
    fn test_invalid_resolution() {
        let mut config = GraphicsConfig::default();
        config.resolution.height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_background() {
        let config = GraphicsConfig {
            background: 0x1_000_000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
