//! 帧驱动
//!
//! 每帧固定顺序：推进时钟 → 深度预通道 → 推进粒子旋转 → 合成（场景 + 抗锯齿）→ 请求下一帧。
//! 具体的 GPU 工作由 [`FrameStages`] 的实现完成，驱动器只负责顺序、暂停和尺寸同步。

use std::time::{Duration, Instant};

use crate::config::RotationMode;
use crate::core::error::RenderResult;

/// 单帧最大时间步长，窗口拖动或断点恢复后避免旋转突跳
pub const MAX_FRAME_DELTA: Duration = Duration::from_millis(100);

/// 动画时钟
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last: Option<Instant>,
    frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以当前时间推进
    pub fn tick(&mut self) -> f32 {
        self.tick_with(Instant::now())
    }

    /// 以给定时间推进，返回本帧时间步长（秒）
    ///
    /// 第一帧的步长为 0。
    pub fn tick_with(&mut self, now: Instant) -> f32 {
        let delta = match self.last {
            Some(last) => now.saturating_duration_since(last).min(MAX_FRAME_DELTA),
            None => Duration::ZERO,
        };
        self.last = Some(now);
        self.frames += 1;
        delta.as_secs_f32()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// 一帧的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// 已呈现
    Presented,
    /// 表面暂不可用，本帧跳过
    Skipped,
    /// 视口为零尺寸，未执行任何通道
    Paused,
}

/// 帧内各阶段
pub trait FrameStages {
    /// 只绘制不透明几何体的深度
    fn render_depth(&mut self) -> RenderResult<()>;

    /// 推进粒子场整体旋转
    fn advance_rotation(&mut self, radians: f32);

    /// 场景颜色通道 + 抗锯齿，写入可见帧缓冲
    fn composite(&mut self) -> RenderResult<FrameOutcome>;

    /// 安排下一帧
    fn request_next_frame(&mut self);

    /// 同步调整相机、表面和深度捕获尺寸
    fn resize(&mut self, width: u32, height: u32);
}

/// 帧驱动器
#[derive(Debug, Clone)]
pub struct FrameDriver {
    clock: FrameClock,
    rotation: RotationMode,
    paused: bool,
}

impl FrameDriver {
    pub fn new(rotation: RotationMode) -> Self {
        Self {
            clock: FrameClock::new(),
            rotation,
            paused: false,
        }
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn rotation(&self) -> RotationMode {
        self.rotation
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn run_frame<S: FrameStages>(&mut self, stages: &mut S) -> RenderResult<FrameOutcome> {
        self.run_frame_at(stages, Instant::now())
    }

    /// 执行一帧
    ///
    /// 暂停时不推进时钟也不请求下一帧，等待非零尺寸的 resize 恢复。
    pub fn run_frame_at<S: FrameStages>(
        &mut self,
        stages: &mut S,
        now: Instant,
    ) -> RenderResult<FrameOutcome> {
        if self.paused {
            return Ok(FrameOutcome::Paused);
        }

        let delta = self.clock.tick_with(now);
        tracing::trace!(target: "engine", "frame {} delta {:.4}s", self.clock.frames(), delta);

        stages.render_depth()?;
        stages.advance_rotation(self.rotation.increment(delta));
        let outcome = stages.composite()?;
        stages.request_next_frame();
        Ok(outcome)
    }

    /// 转发尺寸变化
    ///
    /// 零尺寸（窗口最小化）进入暂停，不改动任何目标。恢复时请求一帧。
    pub fn resize<S: FrameStages>(&mut self, stages: &mut S, width: u32, height: u32) {
        if width == 0 || height == 0 {
            if !self.paused {
                tracing::debug!(target: "engine", "Viewport collapsed to {}x{}, pausing", width, height);
            }
            self.paused = true;
            return;
        }

        stages.resize(width, height);
        if self.paused {
            self.paused = false;
            // 重置时钟，避免暂停期间的时长计入旋转
            self.clock.last = None;
            stages.request_next_frame();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::RenderError;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Depth,
        Rotate(f32),
        Composite,
        Next,
        Resize(u32, u32),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        fail_depth: bool,
    }

    impl FrameStages for Recorder {
        fn render_depth(&mut self) -> RenderResult<()> {
            if self.fail_depth {
                return Err(RenderError::InvalidState("no device".to_string()));
            }
            self.calls.push(Call::Depth);
            Ok(())
        }

        fn advance_rotation(&mut self, radians: f32) {
            self.calls.push(Call::Rotate(radians));
        }

        fn composite(&mut self) -> RenderResult<FrameOutcome> {
            self.calls.push(Call::Composite);
            Ok(FrameOutcome::Presented)
        }

        fn request_next_frame(&mut self) {
            self.calls.push(Call::Next);
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.calls.push(Call::Resize(width, height));
        }
    }

    #[test]
    fn test_frame_order() {
        let mut driver = FrameDriver::new(RotationMode::fixed_step());
        let mut stages = Recorder::default();

        let outcome = driver.run_frame(&mut stages).unwrap();
        assert_eq!(outcome, FrameOutcome::Presented);
        assert_eq!(
            stages.calls,
            vec![Call::Depth, Call::Rotate(0.002), Call::Composite, Call::Next]
        );
    }

    #[test]
    fn test_delta_scaled_rotation() {
        let mut driver = FrameDriver::new(RotationMode::DeltaScaled {
            radians_per_second: 1.0,
        });
        let mut stages = Recorder::default();
        let start = Instant::now();

        driver.run_frame_at(&mut stages, start).unwrap();
        driver
            .run_frame_at(&mut stages, start + Duration::from_millis(50))
            .unwrap();

        let rotations: Vec<f32> = stages
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Rotate(r) => Some(*r),
                _ => None,
            })
            .collect();
        assert_eq!(rotations.len(), 2);
        assert_eq!(rotations[0], 0.0);
        assert!((rotations[1] - 0.05).abs() < 1e-4);
    }

    #[test]
    fn test_clock_clamps_long_frames() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        assert_eq!(clock.tick_with(start), 0.0);
        let delta = clock.tick_with(start + Duration::from_secs(3));
        assert!((delta - MAX_FRAME_DELTA.as_secs_f32()).abs() < 1e-6);
        assert_eq!(clock.frames(), 2);
    }

    #[test]
    fn test_zero_resize_pauses() {
        let mut driver = FrameDriver::new(RotationMode::default());
        let mut stages = Recorder::default();

        driver.resize(&mut stages, 0, 600);
        assert!(driver.is_paused());
        assert_eq!(driver.run_frame(&mut stages).unwrap(), FrameOutcome::Paused);
        assert!(stages.calls.is_empty());

        driver.resize(&mut stages, 800, 600);
        assert!(!driver.is_paused());
        assert_eq!(stages.calls, vec![Call::Resize(800, 600), Call::Next]);
    }

    #[test]
    fn test_depth_failure_stops_frame() {
        let mut driver = FrameDriver::new(RotationMode::default());
        let mut stages = Recorder {
            fail_depth: true,
            ..Default::default()
        };

        assert!(driver.run_frame(&mut stages).is_err());
        assert!(stages.calls.is_empty());
    }
}
