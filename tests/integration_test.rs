use glam::{Vec2, Vec3};
use soft_particles::config::{EngineConfig, PointScale, RotationMode};
use soft_particles::core::{FrameDriver, FrameOutcome, FrameStages, RenderResult};
use soft_particles::render::particles::{ParticleField, ParticleFragment, SoftParticleMaterial};
use soft_particles::render::{Camera, Projection, TargetSize};

fn straight_camera() -> Camera {
    Camera::new(
        Vec3::ZERO,
        Vec3::new(0.0, 0.0, -1.0),
        Projection::Perspective {
            fov_y: 60f32.to_radians(),
        },
        16.0 / 9.0,
        0.1,
        500.0,
    )
}

/// 粒子与墙面在同一像素上时的着色结果
fn shade_against_wall(camera: &Camera, particle: Vec3, wall: Vec3) -> [f32; 4] {
    let material = SoftParticleMaterial::default();
    material.shade(&ParticleFragment {
        tint: [0.0; 3],
        texel: [1.0; 4],
        particle_depth: camera.project_depth(particle),
        solid_depth: Some(camera.project_depth(wall)),
        range: camera.depth_range(),
    })
}

#[test]
fn test_particle_behind_wall_partially_fades() {
    let camera = straight_camera();
    let wall = Vec3::new(0.0, 0.0, -40.0);
    let particle = Vec3::new(0.0, 0.0, -45.0);

    let viewport = Vec2::new(1280.0, 720.0);
    let a = camera.project_to_screen(wall, viewport).unwrap();
    let b = camera.project_to_screen(particle, viewport).unwrap();
    assert!((a - b).length() < 1e-3);

    let color = shade_against_wall(&camera, particle, wall);
    let opacity = SoftParticleMaterial::default().opacity;
    assert!(color[3] > 0.0, "alpha {} should be above zero", color[3]);
    assert!(color[3] < opacity, "alpha {} should be below {}", color[3], opacity);
}

#[test]
fn test_particle_in_front_of_wall_keeps_full_alpha() {
    let camera = straight_camera();
    let wall = Vec3::new(0.0, 0.0, -40.0);
    let particle = Vec3::new(0.0, 0.0, -35.0);

    let color = shade_against_wall(&camera, particle, wall);
    assert_eq!(color[3], SoftParticleMaterial::default().opacity);
}

#[test]
fn test_particle_far_behind_wall_vanishes() {
    let camera = straight_camera();
    let color = shade_against_wall(
        &camera,
        Vec3::new(0.0, 0.0, -80.0),
        Vec3::new(0.0, 0.0, -40.0),
    );
    assert_eq!(color[3], 0.0);
}

#[test]
fn test_missing_depth_keeps_particles_visible() {
    let camera = straight_camera();
    let material = SoftParticleMaterial::default();
    let color = material.shade(&ParticleFragment {
        tint: [0.0; 3],
        texel: [1.0; 4],
        particle_depth: camera.project_depth(Vec3::new(0.0, 0.0, -80.0)),
        solid_depth: None,
        range: camera.depth_range(),
    });
    assert_eq!(color[3], material.opacity);
}

#[test]
fn test_field_bounds_scenario() {
    let field = ParticleField::generate(
        20,
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(18.0, 4.0, 18.0),
        None,
    );
    assert_eq!(field.len(), 20);
    let (min, max) = field.bounds();
    assert_eq!(min, Vec3::new(-9.0, -1.0, -9.0));
    assert_eq!(max, Vec3::new(9.0, 3.0, 9.0));
    for p in field.positions() {
        assert!(p.cmpge(min).all() && p.cmple(max).all(), "{p} outside bounds");
        assert!((-9.0..=9.0).contains(&p.x), "x out of range: {}", p.x);
        assert!((-1.0..=3.0).contains(&p.y), "y out of range: {}", p.y);
        assert!((-9.0..=9.0).contains(&p.z), "z out of range: {}", p.z);
    }
}

#[test]
fn test_default_config_builds_demo_field() {
    let config = EngineConfig::default();
    let field = ParticleField::from_config(&config.particles);
    assert_eq!(field.len(), config.particles.count as usize);
}

#[test]
fn test_default_point_size_ignores_window_height() {
    let camera = straight_camera();
    let material = SoftParticleMaterial::default();
    let view_z = camera.view_z(Vec3::new(0.0, 0.0, -10.0));

    let small = material.point_size(&camera, view_z, TargetSize::new(640, 360));
    let large = material.point_size(&camera, view_z, TargetSize::new(2560, 1440));
    assert_eq!(small, large);
    // 25 * 329 / 10
    assert!((small - 822.5).abs() < 1e-2, "size {small}");
}

#[test]
fn test_point_size_shrinks_with_distance() {
    let camera = straight_camera();
    let material = SoftParticleMaterial::default();
    let viewport = TargetSize::new(1280, 720);

    let near = material.point_size(&camera, camera.view_z(Vec3::new(0.0, 0.0, -5.0)), viewport);
    let far = material.point_size(&camera, camera.view_z(Vec3::new(0.0, 0.0, -50.0)), viewport);
    assert!(near > far);

    let ortho = Camera::new(
        Vec3::ZERO,
        Vec3::new(0.0, 0.0, -1.0),
        Projection::Orthographic { height: 20.0 },
        16.0 / 9.0,
        0.1,
        500.0,
    );
    let a = material.point_size(&ortho, ortho.view_z(Vec3::new(0.0, 0.0, -5.0)), viewport);
    let b = material.point_size(&ortho, ortho.view_z(Vec3::new(0.0, 0.0, -50.0)), viewport);
    assert_eq!(a, b);
    assert_eq!(a, material.size);
}

#[test]
fn test_resize_is_idempotent() {
    let mut camera = straight_camera();
    let mut size = TargetSize::new(1280, 720);

    assert!(camera.set_viewport(800, 600));
    assert!(size.update(800, 600));
    let aspect = camera.aspect();
    let projection = camera.projection_matrix();

    assert!(!camera.set_viewport(800, 600));
    assert!(!size.update(800, 600));
    assert_eq!(camera.aspect(), aspect);
    assert_eq!(camera.projection_matrix(), projection);
    assert_eq!(size, TargetSize::new(800, 600));
}

#[test]
fn test_config_toml_round_trip() -> anyhow::Result<()> {
    let mut config = EngineConfig::default();
    config.particles.rotation = RotationMode::fixed_step();
    config.particles.sprite_path = Some("img/smokeBig_64.png".to_string());
    config.particles.point_scale = PointScale::HalfViewportHeight;

    let text = toml::to_string_pretty(&config)?;
    let parsed = EngineConfig::from_toml_str(&text)?;
    assert_eq!(parsed.particles.rotation, RotationMode::fixed_step());
    assert_eq!(parsed.particles.sprite_path.as_deref(), Some("img/smokeBig_64.png"));
    assert_eq!(parsed.particles.point_scale, PointScale::HalfViewportHeight);
    parsed.validate()?;
    Ok(())
}

#[derive(Default)]
struct Trace {
    steps: Vec<&'static str>,
}

impl FrameStages for Trace {
    fn render_depth(&mut self) -> RenderResult<()> {
        self.steps.push("depth");
        Ok(())
    }

    fn advance_rotation(&mut self, _radians: f32) {
        self.steps.push("rotate");
    }

    fn composite(&mut self) -> RenderResult<FrameOutcome> {
        self.steps.push("composite");
        Ok(FrameOutcome::Presented)
    }

    fn request_next_frame(&mut self) {
        self.steps.push("next");
    }

    fn resize(&mut self, _width: u32, _height: u32) {
        self.steps.push("resize");
    }
}

#[test]
fn test_depth_capture_precedes_composite_every_frame() {
    let mut driver = FrameDriver::new(RotationMode::default());
    let mut trace = Trace::default();

    for _ in 0..3 {
        driver.run_frame(&mut trace).unwrap();
    }
    driver.resize(&mut trace, 640, 480);
    driver.run_frame(&mut trace).unwrap();

    assert_eq!(
        trace.steps,
        vec![
            "depth", "rotate", "composite", "next", //
            "depth", "rotate", "composite", "next", //
            "depth", "rotate", "composite", "next", //
            "resize", //
            "depth", "rotate", "composite", "next",
        ]
    );
}
