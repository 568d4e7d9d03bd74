//! 相机与投影
//!
//! 深度捕获、场景绘制和软粒子线性化读取的是同一个 `Camera`，
//! 近/远平面因此始终一致。

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::config::{CameraConfig, ProjectionKind};
use crate::render::depth::DepthRange;

/// 投影参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// 透视投影，垂直视场角（弧度）
    Perspective { fov_y: f32 },
    /// 正交投影，可见区域的世界高度
    Orthographic { height: f32 },
}

/// 判断投影矩阵是否为透视投影
///
/// 透视矩阵第三列的 w 分量为 -1，正交矩阵为 0。
pub fn is_perspective_projection(projection: &Mat4) -> bool {
    projection.z_axis.w == -1.0
}

/// 场景相机
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    projection: Projection,
    aspect: f32,
    near: f32,
    far: f32,
    projection_matrix: Mat4,
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3, projection: Projection, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position,
            target,
            up: Vec3::Y,
            projection,
            aspect,
            near,
            far,
            projection_matrix: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    /// 从配置创建
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        let projection = match config.projection {
            ProjectionKind::Perspective => Projection::Perspective {
                fov_y: config.fov_degrees.to_radians(),
            },
            ProjectionKind::Orthographic { height } => Projection::Orthographic { height },
        };
        Self::new(
            Vec3::from_array(config.position),
            Vec3::from_array(config.target),
            projection,
            aspect,
            config.near,
            config.far,
        )
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// 按视口尺寸更新宽高比和投影矩阵
    ///
    /// 零尺寸会被忽略。返回宽高比是否发生变化。
    pub fn set_viewport(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        let aspect = width as f32 / height as f32;
        if aspect == self.aspect {
            return false;
        }
        self.aspect = aspect;
        self.update_projection_matrix();
        true
    }

    /// 重新计算投影矩阵
    pub fn update_projection_matrix(&mut self) {
        self.projection_matrix = match self.projection {
            Projection::Perspective { fov_y } => {
                Mat4::perspective_rh(fov_y, self.aspect, self.near, self.far)
            }
            Projection::Orthographic { height } => {
                let half_h = height * 0.5;
                let half_w = half_h * self.aspect;
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, self.near, self.far)
            }
        };
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix()
    }

    pub fn is_perspective(&self) -> bool {
        is_perspective_projection(&self.projection_matrix)
    }

    /// 与本相机匹配的深度线性化参数
    pub fn depth_range(&self) -> DepthRange {
        DepthRange::new(self.near, self.far, self.is_perspective())
    }

    /// 世界坐标点的视图空间 Z（相机前方为负）
    pub fn view_z(&self, world: Vec3) -> f32 {
        self.view_matrix().transform_point3(world).z
    }

    /// 世界坐标点写入深度缓冲的值
    pub fn project_depth(&self, world: Vec3) -> f32 {
        let clip = self.view_projection() * world.extend(1.0);
        clip.z / clip.w
    }

    /// 世界坐标点投影到像素坐标（左上角为原点）
    ///
    /// 位于相机后方的点返回 `None`。
    pub fn project_to_screen(&self, world: Vec3, viewport: Vec2) -> Option<Vec2> {
        let clip: Vec4 = self.view_projection() * world.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            (ndc.x * 0.5 + 0.5) * viewport.x,
            (0.5 - ndc.y * 0.5) * viewport.y,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_camera() -> Camera {
        Camera::from_config(&CameraConfig::default(), 16.0 / 9.0)
    }

    #[test]
    fn test_perspective_flag() {
        let camera = default_camera();
        assert!(camera.is_perspective());
        assert!(camera.depth_range().perspective);

        let ortho = Camera::from_config(
            &CameraConfig {
                projection: ProjectionKind::Orthographic { height: 10.0 },
                ..Default::default()
            },
            1.0,
        );
        assert!(!ortho.is_perspective());
    }

    #[test]
    fn test_set_viewport() {
        let mut camera = default_camera();
        assert!(camera.set_viewport(800, 800));
        assert_eq!(camera.aspect(), 1.0);
        let first = camera.projection_matrix();

        // 相同尺寸不产生变化
        assert!(!camera.set_viewport(800, 800));
        assert_eq!(camera.projection_matrix(), first);

        // 最小化窗口
        assert!(!camera.set_viewport(0, 600));
        assert_eq!(camera.aspect(), 1.0);
    }

    #[test]
    fn test_project_depth_range() {
        let camera = Camera::new(
            Vec3::ZERO,
            Vec3::NEG_Z,
            Projection::Perspective { fov_y: 1.0 },
            1.0,
            0.1,
            500.0,
        );
        let near = camera.project_depth(Vec3::new(0.0, 0.0, -0.1));
        let far = camera.project_depth(Vec3::new(0.0, 0.0, -500.0));
        assert!(near.abs() < 1e-4);
        assert!((far - 1.0).abs() < 1e-4);
        assert!((camera.view_z(Vec3::new(0.0, 0.0, -42.0)) + 42.0).abs() < 1e-4);
    }

    #[test]
    fn test_project_to_screen_centre() {
        let camera = Camera::new(
            Vec3::ZERO,
            Vec3::NEG_Z,
            Projection::Perspective { fov_y: 1.0 },
            2.0,
            0.1,
            100.0,
        );
        let viewport = Vec2::new(200.0, 100.0);
        let centre = camera
            .project_to_screen(Vec3::new(0.0, 0.0, -10.0), viewport)
            .unwrap();
        assert!((centre - Vec2::new(100.0, 50.0)).length() < 1e-3);
        assert!(camera
            .project_to_screen(Vec3::new(0.0, 0.0, 10.0), viewport)
            .is_none());
    }
}
