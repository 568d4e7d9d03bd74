/// 统一配置系统
///
/// 提供TOML/JSON配置文件、环境变量覆盖和启动时验证
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod camera;
pub mod graphics;
pub mod particles;

pub use camera::{CameraConfig, ProjectionKind};
pub use graphics::{AntiAliasing, GraphicsConfig, QualityLevel, Resolution};
pub use particles::{ParticleConfig, PointScale, RotationMode};

use crate::impl_default;

/// 引擎配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "SOFT_PARTICLES_";

/// 引擎主配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 图形配置
    #[serde(default)]
    pub graphics: GraphicsConfig,

    /// 相机配置
    #[serde(default)]
    pub camera: CameraConfig,

    /// 粒子配置
    #[serde(default)]
    pub particles: ParticleConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 保存为JSON文件
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| env::var(key).ok());
    }

    /// 使用给定的查找函数覆盖配置
    ///
    /// 键名为 `ENV_PREFIX` 加上大写字段名，无法解析的值会被忽略。
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(width) = get("WIDTH").and_then(|v| v.parse().ok()) {
            self.graphics.resolution.width = width;
        }
        if let Some(height) = get("HEIGHT").and_then(|v| v.parse().ok()) {
            self.graphics.resolution.height = height;
        }
        if let Some(vsync) = get("VSYNC").and_then(|v| v.parse().ok()) {
            self.graphics.vsync = vsync;
        }
        if let Some(count) = get("PARTICLE_COUNT").and_then(|v| v.parse().ok()) {
            self.particles.count = count;
        }
        if let Some(seed) = get("SEED").and_then(|v| v.parse().ok()) {
            self.particles.seed = Some(seed);
        }
        if let Some(mode) = get("ROTATION_MODE") {
            match mode.to_ascii_lowercase().as_str() {
                "fixed" => self.particles.rotation = RotationMode::fixed_step(),
                "delta" => self.particles.rotation = RotationMode::default(),
                other => {
                    tracing::warn!(target: "config", "Unknown rotation mode override: {}", other)
                }
            }
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        self.graphics.validate()?;
        self.camera.validate()?;
        self.particles.validate()?;
        Ok(())
    }

    /// 自动查找并加载配置文件
    ///
    /// 按以下顺序查找：
    /// 1. ./soft_particles.toml
    /// 2. ./soft_particles.json
    /// 3. ~/.config/soft_particles/config.toml
    /// 4. 使用默认配置
    ///
    /// 找到但验证失败的文件会被跳过。
    pub fn load_or_default() -> Self {
        let mut candidates: Vec<PathBuf> = vec![
            PathBuf::from("soft_particles.toml"),
            PathBuf::from("soft_particles.json"),
        ];
        if let Some(home) = env::var_os("HOME") {
            candidates.push(
                PathBuf::from(home)
                    .join(".config")
                    .join("soft_particles")
                    .join("config.toml"),
            );
        }

        for path in candidates {
            if !path.exists() {
                continue;
            }
            let loaded = if path.extension().is_some_and(|ext| ext == "json") {
                Self::from_json_file(&path)
            } else {
                Self::from_toml_file(&path)
            };
            match loaded.and_then(|config| config.validate().map(|_| config)) {
                Ok(config) => {
                    tracing::info!(target: "config", "Loaded config from {:?}", path);
                    return config;
                }
                Err(e) => {
                    tracing::warn!(target: "config", "Ignoring config {:?}: {}", path, e);
                }
            }
        }

        tracing::info!(target: "config", "Using default configuration");
        Self::default()
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志过滤表达式（`RUST_LOG` 未设置时生效）
    pub level: String,
}

impl_default!(LoggingConfig {
    level: "info".to_string(),
});
