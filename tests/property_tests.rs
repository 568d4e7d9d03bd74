use proptest::prelude::*;
use soft_particles::render::depth::{
    ease_in_out_quad, fade_edge, point_size, view_z_to_perspective_depth, DepthRange,
};

proptest! {
    #[test]
    fn fade_stays_in_unit_range(particle in -2.0f32..2.0, solid in -2.0f32..2.0) {
        let f = fade_edge(particle, solid);
        prop_assert!((0.0..=1.0).contains(&f));
    }

    #[test]
    fn fade_is_monotonic_in_separation(solid in 0.0f32..1.0, gap in -0.1f32..0.1, step in 0.0f32..0.05) {
        // 粒子离实体越远（更靠前），淡出系数不减
        let closer = fade_edge(solid - gap, solid);
        let further = fade_edge(solid - gap - step, solid);
        prop_assert!(further + 1e-6 >= closer);
    }

    #[test]
    fn ease_is_continuous(a in 0.0f32..1.0) {
        let eps = 1e-3;
        let b = (a + eps).min(1.0);
        prop_assert!((ease_in_out_quad(b) - ease_in_out_quad(a)).abs() <= 2.0 * eps * 1.01);
    }

    #[test]
    fn linearization_increases_with_distance(near in 0.05f32..1.0, span in 10.0f32..500.0, t in 0.0f32..0.98) {
        let far = near + span;
        let range = DepthRange::new(near, far, true);
        let d1 = near + t * span;
        let d2 = d1 + 0.01 * span;
        let l1 = range.linearize(view_z_to_perspective_depth(-d1, near, far));
        let l2 = range.linearize(view_z_to_perspective_depth(-d2, near, far));
        prop_assert!(l2 + 1e-4 >= l1);
    }

    #[test]
    fn attenuated_size_shrinks_with_depth(size in 1.0f32..64.0, z1 in 0.5f32..100.0, dz in 0.5f32..100.0) {
        let scale = 360.0;
        let closer = point_size(size, scale, -z1, true, true);
        let further = point_size(size, scale, -(z1 + dz), true, true);
        prop_assert!(closer > further);
    }

    #[test]
    fn orthographic_size_is_constant(size in 1.0f32..64.0, z in 0.1f32..500.0) {
        prop_assert_eq!(point_size(size, 360.0, -z, false, true), size);
    }
}

#[test]
fn linearization_endpoints() {
    let (near, far) = (0.1, 500.0);
    let range = DepthRange::new(near, far, true);
    assert!(range.linearize(view_z_to_perspective_depth(-near, near, far)).abs() < 1e-3);
    assert!((range.linearize(view_z_to_perspective_depth(-far, near, far)) - 1.0).abs() < 1e-3);
}
