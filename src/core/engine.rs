//! 引擎主入口
//!
//! 定义Engine结构、渲染上下文和主运行循环

use std::path::Path;

use winit::event::{Event, WindowEvent};
use winit::event_loop::EventLoop;

use crate::config::EngineConfig;
use crate::platform::winit::WinitWindow;
use crate::platform::Window;
use crate::render::camera::Camera;
use crate::render::composite::CompositePipeline;
use crate::render::depth_capture::{DepthCapture, CAPTURE_COLOR_FORMAT};
use crate::render::gpu::{FrameAcquire, GpuContext};
use crate::render::particles::sprite::{load_sprite_or_procedural, upload_sprite};
use crate::render::particles::{ParticleField, ParticleRenderer, SoftParticleMaterial};
use crate::render::scene::{demo_scene, OpaqueScene};

use super::error::{EngineError, EngineResult, RenderError, RenderResult};
use super::frame::{FrameDriver, FrameOutcome, FrameStages};

/// 引擎主结构
///
/// `Engine` 负责：
/// - 加载配置、初始化日志
/// - 创建窗口和渲染上下文
/// - 驱动事件循环，直到窗口关闭或出现致命错误
///
/// # 示例
///
/// ```no_run
/// use soft_particles::core::Engine;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     Engine::run()?;
///     Ok(())
/// }
/// ```
pub struct Engine;

impl Engine {
    /// 使用自动查找的配置运行
    pub fn run() -> EngineResult<()> {
        let config = Self::load_config()?;
        Self::run_with_config(config)
    }

    /// 使用给定配置运行
    pub fn run_with_config(config: EngineConfig) -> EngineResult<()> {
        Self::initialize_logging(&config.logging.level);
        config.validate()?;

        let event_loop = EventLoop::new()
            .map_err(|e| EngineError::EventLoop(format!("Failed to create event loop: {}", e)))?;
        let window = WinitWindow::new(&event_loop, &config.graphics)?;

        let mut context = pollster::block_on(RenderContext::new(window, &config))?;
        let mut driver = FrameDriver::new(config.particles.rotation);

        Self::run_event_loop(event_loop, &mut context, &mut driver)?;

        tracing::info!(target: "engine", "Engine shutting down");
        Ok(())
    }

    /// 加载配置：配置文件 → 环境变量覆盖 → 验证
    pub fn load_config() -> EngineResult<EngineConfig> {
        let mut config = EngineConfig::load_or_default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 初始化日志系统
    ///
    /// `RUST_LOG` 优先，未设置时使用配置中的过滤表达式。重复调用无副作用。
    pub fn initialize_logging(level: &str) {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
        tracing::info!(target: "engine", "Engine starting");
    }

    fn run_event_loop(
        event_loop: EventLoop<()>,
        context: &mut RenderContext,
        driver: &mut FrameDriver,
    ) -> EngineResult<()> {
        let mut fatal: Option<EngineError> = None;
        context.window.request_redraw();

        let result = event_loop.run(|event, elwt| {
            let Event::WindowEvent { event, window_id } = event else {
                return;
            };
            if window_id != context.window.id() {
                return;
            }

            match event {
                WindowEvent::CloseRequested => {
                    tracing::info!(target: "engine", "Close requested");
                    elwt.exit();
                }
                WindowEvent::Resized(size) => {
                    driver.resize(&mut *context, size.width, size.height);
                }
                WindowEvent::RedrawRequested => match driver.run_frame(&mut *context) {
                    Ok(FrameOutcome::Skipped) => {
                        tracing::debug!(target: "engine", "Frame skipped");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!(target: "engine", "Fatal render error: {}", e);
                        fatal = Some(e.into());
                        elwt.exit();
                    }
                },
                _ => {}
            }
        });

        result.map_err(|e| EngineError::EventLoop(format!("Event loop error: {}", e)))?;
        match fatal {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// 渲染上下文
///
/// 持有一帧所需的全部长期资源，由 [`FrameDriver`] 按固定顺序驱动。
pub struct RenderContext {
    window: WinitWindow,
    gpu: GpuContext,
    camera: Camera,
    field: ParticleField,
    depth: DepthCapture,
    scene: OpaqueScene,
    particles: ParticleRenderer,
    composite: CompositePipeline,
    /// 深度预通道已录制、尚未提交的命令
    pending: Option<wgpu::CommandEncoder>,
}

impl RenderContext {
    pub async fn new(window: WinitWindow, config: &EngineConfig) -> EngineResult<Self> {
        let gpu = GpuContext::new(window.arc(), config.graphics.vsync).await?;
        let size = gpu.size;
        tracing::debug!(
            target: "engine",
            "Window {:?} at scale factor {}",
            window.size(),
            window.scale_factor()
        );

        let camera = Camera::from_config(&config.camera, size.aspect());
        let field = ParticleField::from_config(&config.particles);
        let depth = DepthCapture::new(&gpu.device, size.width, size.height);
        let scene = OpaqueScene::new(&gpu.device, &demo_scene(), gpu.format(), CAPTURE_COLOR_FORMAT);

        let sprite_path = config.particles.sprite_path.as_deref().map(Path::new);
        let sprite = load_sprite_or_procedural(sprite_path);
        let sprite = upload_sprite(&gpu.device, &gpu.queue, &sprite);

        let particles = ParticleRenderer::new(
            &gpu.device,
            gpu.format(),
            &field,
            SoftParticleMaterial::from_config(&config.particles),
            config.particles.per_particle_tint,
            sprite,
            &depth,
        )?;
        let composite = CompositePipeline::new(&gpu.device, gpu.format(), size, &config.graphics);

        tracing::info!(
            target: "engine",
            "Render context ready: {} meshes, {} particles, {}x{}",
            scene.mesh_count(),
            field.len(),
            size.width,
            size.height
        );

        Ok(Self {
            window,
            gpu,
            camera,
            field,
            depth,
            scene,
            particles,
            composite,
            pending: None,
        })
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }
}

impl FrameStages for RenderContext {
    fn render_depth(&mut self) -> RenderResult<()> {
        self.depth.begin_frame();
        self.scene.update(&self.gpu.queue, &self.camera);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        self.depth.render_depth(&mut encoder, &self.scene);
        self.pending = Some(encoder);
        Ok(())
    }

    fn advance_rotation(&mut self, radians: f32) {
        self.field.advance_rotation(radians);
    }

    fn composite(&mut self) -> RenderResult<FrameOutcome> {
        let mut encoder = self.pending.take().ok_or_else(|| {
            RenderError::InvalidState("composite requested before depth capture".to_string())
        })?;

        let frame = match self.gpu.acquire_frame()? {
            FrameAcquire::Ready(frame) => frame,
            FrameAcquire::Skip => {
                self.gpu.queue.submit(Some(encoder.finish()));
                return Ok(FrameOutcome::Skipped);
            }
        };

        self.particles.prepare(
            &self.gpu.device,
            &self.gpu.queue,
            &self.camera,
            &self.field,
            &self.depth,
            self.gpu.size,
        );

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.composite.run(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &self.scene,
            &self.particles,
            &view,
        );

        self.gpu.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(FrameOutcome::Presented)
    }

    fn request_next_frame(&mut self) {
        self.window.request_redraw();
    }

    fn resize(&mut self, width: u32, height: u32) {
        let surface_changed = self.gpu.resize(width, height);
        let targets_changed = resize_viewport_targets(
            &self.gpu.device,
            &mut self.camera,
            &mut self.depth,
            &mut self.composite,
            width,
            height,
        );

        if surface_changed || targets_changed {
            tracing::debug!(target: "engine", "Resized to {}x{}", width, height);
        }
    }
}

/// 相机、深度捕获和中间缓冲在下一帧之前一起更新
fn resize_viewport_targets(
    device: &wgpu::Device,
    camera: &mut Camera,
    depth: &mut DepthCapture,
    composite: &mut CompositePipeline,
    width: u32,
    height: u32,
) -> bool {
    let camera_changed = camera.set_viewport(width, height);
    let depth_changed = depth.resize(device, width, height);
    let composite_changed = composite.resize(device, width, height);
    camera_changed || depth_changed || composite_changed
}
