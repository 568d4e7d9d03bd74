//! 粒子场
//!
//! 粒子位置在创建时一次性生成，之后只有整体绕 Y 轴的旋转角会变化。

use glam::{Mat4, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ParticleConfig;

/// 上传到 GPU 的每粒子实例数据
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    /// 归一化颜色；全零表示使用材质的漫反射色
    pub color: [f32; 3],
}

impl ParticleInstance {
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ParticleInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// 固定数量的粒子集合
#[derive(Debug, Clone)]
pub struct ParticleField {
    positions: Vec<Vec3>,
    /// 每通道 [0, 255]
    colors: Vec<[f32; 3]>,
    origin: Vec3,
    spread: Vec3,
    rotation: f32,
}

impl ParticleField {
    /// 在以 `origin` 为中心、全尺寸为 `spread` 的盒内均匀采样
    ///
    /// 没有种子时使用系统熵。
    pub fn generate(count: usize, origin: Vec3, spread: Vec3, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::generate_with(count, origin, spread, &mut rng)
    }

    pub fn generate_with<R: Rng>(
        count: usize,
        origin: Vec3,
        spread: Vec3,
        rng: &mut R,
    ) -> Self {
        let mut positions = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);
        for _ in 0..count {
            let sample = Vec3::new(rng.gen::<f32>(), rng.gen::<f32>(), rng.gen::<f32>());
            positions.push(sample * spread - spread * 0.5 + origin);
            colors.push([
                rng.gen::<f32>() * 255.0,
                rng.gen::<f32>() * 255.0,
                rng.gen::<f32>() * 255.0,
            ]);
        }

        tracing::debug!(
            target: "particles",
            "Generated {} particles around {:?} (spread {:?})",
            count,
            origin,
            spread
        );

        Self {
            positions,
            colors,
            origin,
            spread,
            rotation: 0.0,
        }
    }

    pub fn from_config(config: &ParticleConfig) -> Self {
        Self::generate(
            config.count as usize,
            Vec3::from_array(config.origin),
            Vec3::from_array(config.spread),
            config.seed,
        )
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn spread(&self) -> Vec3 {
        self.spread
    }

    /// 采样盒的最小/最大角点
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let half = self.spread * 0.5;
        (self.origin - half, self.origin + half)
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// 推进整体旋转角，结果保持在 [0, 2π)
    pub fn advance_rotation(&mut self, radians: f32) {
        self.rotation = (self.rotation + radians).rem_euclid(std::f32::consts::TAU);
    }

    /// 当前旋转对应的模型矩阵
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_y(self.rotation)
    }

    /// 生成实例数据
    ///
    /// `tint` 关闭时颜色全部为零，着色器退回到漫反射色。
    pub fn instances(&self, tint: bool) -> Vec<ParticleInstance> {
        self.positions
            .iter()
            .zip(&self.colors)
            .map(|(position, color)| ParticleInstance {
                position: position.to_array(),
                color: if tint {
                    [color[0] / 255.0, color[1] / 255.0, color[2] / 255.0]
                } else {
                    [0.0; 3]
                },
            })
            .collect()
    }
}
