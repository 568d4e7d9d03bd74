//! 深度重建与软粒子淡出的数值函数
//!
//! 这些函数与 `particles::shader` 中的 WGSL 片段一一对应，
//! 在 CPU 上可以脱离着色器单独测试。
//!
//! 深度约定与 wgpu 一致：深度缓冲值 0 对应近平面，1 对应远平面；
//! 视图空间 Z 为负值（相机朝 -Z 观察）。

use crate::impl_default;

/// 默认软边余量（归一化深度范围的比例）
pub const FADE_MARGIN: f32 = 0.015;
/// 默认软边陡度
pub const FADE_STEEPNESS: f32 = 120.0;

/// 将透视深度缓冲值还原为视图空间 Z
pub fn perspective_depth_to_view_z(depth: f32, near: f32, far: f32) -> f32 {
    (near * far) / ((far - near) * depth - far)
}

/// 视图空间 Z 转换为透视深度缓冲值
pub fn view_z_to_perspective_depth(view_z: f32, near: f32, far: f32) -> f32 {
    ((near + view_z) * far) / ((far - near) * view_z)
}

/// 视图空间 Z 线性映射到 [0, 1]
pub fn view_z_to_orthographic_depth(view_z: f32, near: f32, far: f32) -> f32 {
    (view_z + near) / (near - far)
}

/// 深度线性化参数
///
/// 深度捕获和粒子片段必须使用同一份参数，否则比较没有意义。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthRange {
    pub near: f32,
    pub far: f32,
    /// 深度缓冲是否来自透视投影
    pub perspective: bool,
}

impl DepthRange {
    pub fn new(near: f32, far: f32, perspective: bool) -> Self {
        Self {
            near,
            far,
            perspective,
        }
    }

    /// 深度缓冲值 → 线性深度 [0, 1]
    ///
    /// 正交投影的深度缓冲本身已经是线性的。
    pub fn linearize(&self, depth: f32) -> f32 {
        if self.perspective {
            let view_z = perspective_depth_to_view_z(depth, self.near, self.far);
            view_z_to_orthographic_depth(view_z, self.near, self.far)
        } else {
            depth
        }
    }
}

/// 软边淡出参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeParams {
    /// 允许粒子穿过实体表面的余量
    pub margin: f32,
    /// 过渡陡度，过渡带宽度为 1 / steepness
    pub steepness: f32,
}

impl_default!(FadeParams {
    margin: FADE_MARGIN,
    steepness: FADE_STEEPNESS,
});

impl FadeParams {
    /// 根据粒子与实体的线性深度计算淡出系数
    ///
    /// 返回值位于 [0, 1]：0 表示完全被遮挡，1 表示完全可见。
    /// 中间区域使用二次缓入缓出曲线。
    pub fn fade_edge(&self, particle_depth: f32, solid_depth: f32) -> f32 {
        let a = (solid_depth + self.margin - particle_depth) * self.steepness;
        if a.is_nan() {
            return 1.0;
        }
        if a <= 0.0 {
            return 0.0;
        }
        if a >= 1.0 {
            return 1.0;
        }
        ease_in_out_quad(a)
    }
}

/// 使用默认参数的淡出系数
pub fn fade_edge(particle_depth: f32, solid_depth: f32) -> f32 {
    FadeParams::default().fade_edge(particle_depth, solid_depth)
}

/// 二次缓入缓出，输入输出均在 [0, 1]
pub fn ease_in_out_quad(a: f32) -> f32 {
    if a < 0.5 {
        2.0 * a * a
    } else {
        1.0 - 2.0 * (a - 1.0) * (a - 1.0)
    }
}

/// 点精灵的光栅化尺寸（像素）
///
/// 透视投影且启用尺寸衰减时按 `scale / -view_z` 缩放；
/// 位于相机后方的点尺寸为 0。
pub fn point_size(size: f32, scale: f32, view_z: f32, perspective: bool, attenuation: bool) -> f32 {
    if !(perspective && attenuation) {
        return size;
    }
    if view_z >= 0.0 {
        return 0.0;
    }
    size * (scale / -view_z)
}
