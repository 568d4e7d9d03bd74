//! 统一错误处理模块
//!
//! 按子系统划分错误类型：
//!
//! - **渲染错误** (`RenderError`): 设备、表面、着色器组合与通道顺序
//! - **资源错误** (`AssetError`): 精灵纹理加载与解码
//! - **配置错误** (`crate::config::ConfigError`): 配置文件读取与验证
//!
//! `EngineError` 汇总以上所有错误，作为 `Engine::run` 的返回类型。
//! 帧内的可恢复问题（表面丢失、超时、深度纹理未就绪）不会以错误形式上抛，
//! 而是降级为跳过当前帧或完全不透明的粒子。

use crate::config::ConfigError;
use thiserror::Error;

/// 引擎核心错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Window creation failed: {0}")]
    Window(String),

    #[error("Event loop error: {0}")]
    EventLoop(String),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// 渲染系统错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Failed to create surface: {0}")]
    SurfaceCreation(String),

    #[error("Failed to request adapter: no compatible GPU found")]
    NoAdapter,

    #[error("Failed to request device: {0}")]
    DeviceRequest(String),

    #[error("Failed to compose shader: {0}")]
    ShaderComposition(String),

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("Invalid composite pass order: {0}")]
    PipelineOrder(String),

    #[error("Invalid render state: {0}")]
    InvalidState(String),
}

/// 资源管理错误
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Asset not found: {path}")]
    NotFound { path: String },

    #[error("Failed to load asset: {path}, reason: {reason}")]
    LoadFailed { path: String, reason: String },
}

/// 引擎结果类型别名
pub type EngineResult<T> = Result<T, EngineError>;
pub type RenderResult<T> = Result<T, RenderError>;
pub type AssetResult<T> = Result<T, AssetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let asset_err = AssetError::NotFound {
            path: "img/smokeBig_64.png".to_string(),
        };
        let engine_err: EngineError = asset_err.into();
        assert!(matches!(engine_err, EngineError::Asset(_)));

        let render_err: EngineError = RenderError::NoAdapter.into();
        assert!(matches!(render_err, EngineError::Render(RenderError::NoAdapter)));
    }

    #[test]
    fn test_error_display() {
        let err = RenderError::NoAdapter;
        assert_eq!(
            err.to_string(),
            "Failed to request adapter: no compatible GPU found"
        );

        let err = RenderError::PipelineOrder("pass after terminal".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid composite pass order: pass after terminal"
        );
    }
}
