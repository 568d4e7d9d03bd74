//! 着色器程序组合
//!
//! 以具名片段拼接 WGSL 源码。每个片段只声明自己的函数，
//! 由构建器负责排序检查、重名检查和缓存键计算。
//!
//! ```
//! use soft_particles::render::shader_builder::{ShaderChunk, ShaderProgramBuilder};
//!
//! let program = ShaderProgramBuilder::new("example")
//!     .chunk(ShaderChunk::new("math", "fn twice(x: f32) -> f32 { return x * 2.0; }"))
//!     .require(&["math"])
//!     .build()
//!     .unwrap();
//! assert!(program.source.contains("fn twice"));
//! assert_eq!(program.cache_key.len(), 64);
//! ```

use std::borrow::Cow;

use sha2::{Digest, Sha256};

use crate::core::error::{RenderError, RenderResult};

/// 具名 WGSL 片段
#[derive(Debug, Clone)]
pub struct ShaderChunk {
    pub name: &'static str,
    pub source: Cow<'static, str>,
}

impl ShaderChunk {
    pub fn new(name: &'static str, source: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name,
            source: source.into(),
        }
    }
}

/// 组合完成的着色器程序
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    pub label: String,
    pub source: String,
    /// 源码的 SHA-256（十六进制）
    pub cache_key: String,
    pub chunk_names: Vec<&'static str>,
}

impl ShaderProgram {
    /// 管线标签，带缓存键前缀便于在调试工具里区分版本
    pub fn pipeline_label(&self) -> String {
        format!("{} [{}]", self.label, &self.cache_key[..12])
    }

    pub fn create_module(&self, device: &wgpu::Device) -> wgpu::ShaderModule {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&self.label),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(self.source.as_str())),
        })
    }
}

/// 着色器程序构建器
#[derive(Debug, Default)]
pub struct ShaderProgramBuilder {
    label: String,
    chunks: Vec<ShaderChunk>,
    required: Vec<&'static str>,
}

impl ShaderProgramBuilder {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// 追加片段，拼接顺序与调用顺序一致
    pub fn chunk(mut self, chunk: ShaderChunk) -> Self {
        self.chunks.push(chunk);
        self
    }

    /// 声明必须出现的片段
    pub fn require(mut self, names: &[&'static str]) -> Self {
        self.required.extend_from_slice(names);
        self
    }

    pub fn build(self) -> RenderResult<ShaderProgram> {
        let mut chunk_names: Vec<&'static str> = Vec::with_capacity(self.chunks.len());
        for chunk in &self.chunks {
            if chunk_names.contains(&chunk.name) {
                return Err(RenderError::ShaderComposition(format!(
                    "duplicate chunk '{}' in '{}'",
                    chunk.name, self.label
                )));
            }
            if chunk.source.trim().is_empty() {
                return Err(RenderError::ShaderComposition(format!(
                    "chunk '{}' in '{}' is empty",
                    chunk.name, self.label
                )));
            }
            chunk_names.push(chunk.name);
        }

        if let Some(missing) = self.required.iter().find(|name| !chunk_names.contains(*name)) {
            return Err(RenderError::ShaderComposition(format!(
                "required chunk '{}' missing from '{}'",
                missing, self.label
            )));
        }

        let mut source = String::new();
        for chunk in &self.chunks {
            source.push_str("// ---- ");
            source.push_str(chunk.name);
            source.push_str(" ----\n");
            source.push_str(chunk.source.trim_end());
            source.push_str("\n\n");
        }

        let cache_key = hash_source(&source);
        tracing::debug!(
            target: "render",
            "Composed shader '{}' from {:?} ({})",
            self.label,
            chunk_names,
            &cache_key[..12]
        );

        Ok(ShaderProgram {
            label: self.label,
            source,
            cache_key,
            chunk_names,
        })
    }
}

fn hash_source(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hex::encode(hasher.finalize())
}
