use super::{ConfigError, ConfigResult};
use crate::impl_default;
use serde::{Deserialize, Serialize};

/// 相机配置
///
/// 深度捕获与粒子深度线性化共用同一组近/远平面。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// 垂直视场角（度）
    pub fov_degrees: f32,
    /// 近平面距离
    pub near: f32,
    /// 远平面距离
    pub far: f32,
    /// 相机位置
    pub position: [f32; 3],
    /// 观察目标
    pub target: [f32; 3],
    /// 投影方式
    pub projection: ProjectionKind,
}

impl_default!(CameraConfig {
    fov_degrees: 60.0,
    near: 0.1,
    far: 500.0,
    position: [0.0, 5.5, 10.0],
    target: [0.0, 0.0, 0.0],
    projection: ProjectionKind::Perspective,
});

impl CameraConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.near > 0.0 && self.far > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "Camera planes must be positive (near = {}, far = {})",
                self.near, self.far
            )));
        }
        if self.near >= self.far {
            return Err(ConfigError::ValidationError(format!(
                "Camera near plane {} must be closer than far plane {}",
                self.near, self.far
            )));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ConfigError::ValidationError(format!(
                "Field of view {} is outside (0, 180)",
                self.fov_degrees
            )));
        }
        if let ProjectionKind::Orthographic { height } = self.projection {
            if height <= 0.0 {
                return Err(ConfigError::ValidationError(
                    "Orthographic view height must be positive".to_string(),
                ));
            }
        }
        if self.position == self.target {
            return Err(ConfigError::ValidationError(
                "Camera position and target coincide".to_string(),
            ));
        }
        Ok(())
    }
}

/// 投影方式
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectionKind {
    /// 透视投影
    Perspective,
    /// 正交投影，`height` 为可见区域的世界高度
    Orthographic { height: f32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_camera_is_valid() {
        assert!(CameraConfig::default().validate().is_ok());
    }

    #[test]
    fn test_near_must_be_less_than_far() {
        let config = CameraConfig {
            near: 10.0,
            far: 5.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CameraConfig {
            near: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_orthographic_height() {
        let config = CameraConfig {
            projection: ProjectionKind::Orthographic { height: 0.0 },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
