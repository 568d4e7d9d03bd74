//! 软粒子材质与 uniform 布局

use glam::Mat4;

use crate::config::{ParticleConfig, PointScale};
use crate::impl_default;
use crate::render::camera::Camera;
use crate::render::depth::{self, DepthRange, FadeParams};
use crate::render::target::TargetSize;

/// 透视尺寸衰减
pub const FLAG_SIZE_ATTENUATION: u32 = 1 << 0;
/// 本帧深度纹理可用
pub const FLAG_DEPTH_AVAILABLE: u32 = 1 << 1;
/// 投影为透视投影
pub const FLAG_PERSPECTIVE: u32 = 1 << 2;
/// 使用精灵纹理
pub const FLAG_USE_MAP: u32 = 1 << 3;

/// 软粒子 uniform，与 WGSL 中的 `SoftParticleUniforms` 逐字段对应
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SoftParticleUniforms {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub diffuse: [f32; 4],
    pub screen_size: [f32; 2],
    pub camera_near: f32,
    pub camera_far: f32,
    pub size: f32,
    pub scale: f32,
    pub opacity: f32,
    pub fade_margin: f32,
    pub fade_steepness: f32,
    pub flags: u32,
    pub _pad: [u32; 2],
}

impl SoftParticleUniforms {
    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }
}

/// 软粒子材质参数
#[derive(Debug, Clone, PartialEq)]
pub struct SoftParticleMaterial {
    pub diffuse: [f32; 3],
    pub size: f32,
    pub opacity: f32,
    pub size_attenuation: bool,
    /// 尺寸衰减比例
    pub scale: PointScale,
    pub fade: FadeParams,
    pub use_map: bool,
}

impl_default!(SoftParticleMaterial {
    diffuse: [1.0, 1.0, 1.0],
    size: 25.0,
    opacity: 0.10,
    size_attenuation: true,
    scale: PointScale::default(),
    fade: FadeParams::default(),
    use_map: true,
});

/// 单个片段的着色输入
#[derive(Debug, Clone, Copy)]
pub struct ParticleFragment {
    /// 粒子颜色，全零时使用漫反射色
    pub tint: [f32; 3],
    /// 精灵纹理采样结果
    pub texel: [f32; 4],
    /// 粒子片段自身的深度缓冲值
    pub particle_depth: f32,
    /// 同一像素上不透明表面的深度缓冲值，`None` 表示深度纹理不可用
    pub solid_depth: Option<f32>,
    pub range: DepthRange,
}

impl SoftParticleMaterial {
    pub fn from_config(config: &ParticleConfig) -> Self {
        Self {
            diffuse: config.diffuse,
            size: config.size,
            opacity: config.opacity,
            size_attenuation: config.size_attenuation,
            scale: config.point_scale,
            fade: FadeParams {
                margin: config.fade_margin,
                steepness: config.fade_steepness,
            },
            use_map: true,
        }
    }

    /// 实际使用的尺寸衰减比例
    pub fn scale_for(&self, viewport: TargetSize) -> f32 {
        self.scale.resolve(viewport.height)
    }

    /// 组装本帧的 uniform
    pub fn uniforms(
        &self,
        camera: &Camera,
        model: Mat4,
        viewport: TargetSize,
        depth_available: bool,
    ) -> SoftParticleUniforms {
        let mut flags = 0;
        if self.size_attenuation {
            flags |= FLAG_SIZE_ATTENUATION;
        }
        if depth_available {
            flags |= FLAG_DEPTH_AVAILABLE;
        }
        if camera.is_perspective() {
            flags |= FLAG_PERSPECTIVE;
        }
        if self.use_map {
            flags |= FLAG_USE_MAP;
        }

        SoftParticleUniforms {
            view: camera.view_matrix().to_cols_array_2d(),
            projection: camera.projection_matrix().to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            diffuse: [self.diffuse[0], self.diffuse[1], self.diffuse[2], 1.0],
            screen_size: viewport.as_vec2(),
            camera_near: camera.near(),
            camera_far: camera.far(),
            size: self.size,
            scale: self.scale_for(viewport),
            opacity: self.opacity,
            fade_margin: self.fade.margin,
            fade_steepness: self.fade.steepness,
            flags,
            _pad: [0; 2],
        }
    }

    /// 粒子在给定视图空间深度下的像素尺寸
    pub fn point_size(&self, camera: &Camera, view_z: f32, viewport: TargetSize) -> f32 {
        depth::point_size(
            self.size,
            self.scale_for(viewport),
            view_z,
            camera.is_perspective(),
            self.size_attenuation,
        )
    }

    /// 片段着色的 CPU 版本，返回 RGBA
    pub fn shade(&self, fragment: &ParticleFragment) -> [f32; 4] {
        let tint = if fragment.tint == [0.0; 3] {
            self.diffuse
        } else {
            fragment.tint
        };
        let mut color = [tint[0], tint[1], tint[2], self.opacity];
        if self.use_map {
            for (channel, texel) in color.iter_mut().zip(fragment.texel) {
                *channel *= texel;
            }
        }

        let alpha_scale = match fragment.solid_depth {
            Some(solid) => self.fade.fade_edge(
                fragment.range.linearize(fragment.particle_depth),
                fragment.range.linearize(solid),
            ),
            None => 1.0,
        };
        color[3] *= alpha_scale;
        color
    }
}
