// Host-side tests for the inner shape field: layout, orbit and recycling.

use rand::prelude::*;
use std::f32::consts::TAU;
use tunnel_core::*;

fn small_params() -> ParameterSet {
    ParameterSet {
        shapes_per_ring: 4,
        depth_segments: 5,
        inner_radius: 3.0,
        inner_depth_spacing: 2.0,
        spiral_rotation_per_segment: 0.25,
        ..ParameterSet::default()
    }
}

fn make_field(params: &ParameterSet, seed: u64) -> ShapeField {
    ShapeField::build(params, StdRng::seed_from_u64(seed))
}

#[test]
fn build_lays_out_slices_and_slots() {
    let params = small_params();
    let field = make_field(&params, 1);
    assert_eq!(field.len(), 20);
    assert_eq!(field.depth_segments(), 5);
    assert_eq!(field.shapes_per_ring(), 4);
    assert_eq!(field.track_length(), 10.0);
    assert_eq!(field.kind(), ShapeKind::Cube);

    for (n, s) in field.shapes().iter().enumerate() {
        assert_eq!(s.slot, n);
        assert_eq!(s.depth_slice, n / 4);
        assert_eq!(s.ring_slot, n % 4);
        assert_eq!(s.depth, -(s.depth_slice as f64) * 2.0);
        assert!((s.base_angle - s.ring_slot as f32 / 4.0 * TAU).abs() < 1e-6);
        assert!((s.spiral_offset - s.depth_slice as f32 * 0.25).abs() < 1e-6);
        assert!((0.0..TAU).contains(&s.phase));
        assert!((s.position.length() - 3.0).abs() < 1e-4);
    }
}

#[test]
fn creation_speed_grows_with_depth_within_jitter_bounds() {
    let params = ParameterSet {
        angular_speed_scale: 2.0,
        ..small_params()
    };
    let field = make_field(&params, 2);
    for s in field.shapes() {
        let lo = creation_speed(s.depth_slice, 5, SPEED_JITTER_MIN, 2.0);
        let hi = creation_speed(s.depth_slice, 5, SPEED_JITTER_MAX, 2.0);
        assert!(s.angular_speed >= lo - 1e-6 && s.angular_speed < hi, "speed {}", s.angular_speed);
    }
    // front slice, no jitter
    assert!((creation_speed(0, 50, 1.0, 1.0) - SPEED_BASE).abs() < 1e-6);
    assert!((creation_speed(25, 50, 1.0, 1.0) - (SPEED_BASE + 0.5 * SPEED_DEPTH_SPAN)).abs() < 1e-6);
}

#[test]
fn zero_speed_scale_freezes_orbits_until_recycled() {
    let params = ParameterSet {
        angular_speed_scale: 0.0,
        ..small_params()
    };
    let mut field = make_field(&params, 3);
    let before: Vec<_> = field.shapes().iter().map(|s| s.position).collect();
    for t in 1..20 {
        field.tick(100.0, t as f64 / 60.0);
    }
    for (s, p) in field.shapes().iter().zip(before) {
        assert!((s.position - p).length() < 1e-4);
    }
}

#[test]
fn orbit_positions_stay_on_the_radius() {
    let params = small_params();
    let mut field = make_field(&params, 4);
    let mut camera = 5.0f64;
    for t in 0..600 {
        camera -= 0.1;
        field.tick(camera, t as f64 / 60.0);
        for s in field.shapes() {
            assert!((s.position.length() - 3.0).abs() < 1e-3);
            assert!(s.position.is_finite());
        }
    }
}

#[test]
fn orbit_angle_is_reduced_into_one_turn() {
    let field = make_field(&small_params(), 5);
    let s = &field.shapes()[7];
    for t in [0.0, 1.0, 1e3, 1e7] {
        let a = s.orbit_angle(t);
        assert!((0.0..=TAU).contains(&a), "angle {a} at t={t}");
    }
}

#[test]
fn self_rotation_advances_by_slot_rate() {
    let params = small_params();
    let mut field = make_field(&params, 6);
    let before: Vec<_> = field.shapes().iter().map(|s| s.self_rotation).collect();
    field.tick(100.0, 0.0);
    for (s, b) in field.shapes().iter().zip(before) {
        let d = s.self_rotation - b;
        let want = self_rotation_rate(s.slot);
        assert!((d - want).length() < 1e-5);
    }
    assert_eq!(self_rotation_rate(0), glam::Vec2::splat(0.01));
    assert!((self_rotation_rate(5) - glam::Vec2::new(0.014, 0.012)).length() < 1e-6);
}

#[test]
fn recycled_shape_moves_one_field_length_and_rerolls_motion() {
    let params = small_params();
    let mut field = make_field(&params, 7);
    let camera = -30.0;
    let threshold = camera + SHAPE_RECYCLE_MARGIN;

    // keep every other shape well inside the field
    for s in field.shapes_mut() {
        s.depth = threshold - 1.0;
    }
    field.shapes_mut()[3].depth = threshold + 0.5;
    let (phase_before, speed_before) = {
        let s = &field.shapes()[3];
        (s.phase, s.angular_speed)
    };

    let recycled = field.tick(camera, 0.5);
    assert_eq!(recycled, 1);
    assert_eq!(field.recycled_total(), 1);

    let s = &field.shapes()[3];
    assert!((s.depth - (threshold + 0.5 - 10.0)).abs() < 1e-4);
    assert!((0.0..TAU).contains(&s.phase));
    assert!((RECYCLE_SPEED_MIN..RECYCLE_SPEED_MAX).contains(&s.angular_speed));
    assert_ne!(s.phase, phase_before);
    assert_ne!(s.angular_speed, speed_before);
    // static layout survives the recycle
    assert_eq!(s.depth_slice, 0);
    assert_eq!(s.ring_slot, 3);
}

#[test]
fn recycles_rerandomise_within_ranges_over_a_long_run() {
    let params = small_params();
    let mut field = make_field(&params, 8);
    let mut camera = 5.0f64;
    let mut speeds = Vec::new();
    for t in 0..3000 {
        camera -= 0.05;
        field.tick(camera, t as f64 / 60.0);
        for s in field.shapes() {
            assert!(s.depth <= camera + SHAPE_RECYCLE_MARGIN);
            assert!((0.0..TAU).contains(&s.phase));
        }
    }
    assert!(field.recycled_total() > 0);
    for s in field.shapes() {
        speeds.push(s.angular_speed);
        assert!(s.angular_speed >= 0.0 && s.angular_speed < 3.0);
    }
    // draws are not all identical
    speeds.dedup();
    assert!(speeds.len() > 1);
}

#[test]
fn same_seed_builds_identical_fields() {
    let params = small_params();
    let a = make_field(&params, 42);
    let b = make_field(&params, 42);
    assert_eq!(a.shapes(), b.shapes());
    let c = make_field(&params, 43);
    assert_ne!(a.shapes(), c.shapes());
}

#[test]
fn shape_colors_are_finite_and_saturated() {
    let field = make_field(&ParameterSet::default(), 9);
    assert_eq!(field.len(), 600);
    for s in field.shapes() {
        let c = s.color;
        assert!(c.is_finite());
        let max = c.r.max(c.g).max(c.b);
        assert!((max - SHAPE_VALUE).abs() < 1e-4);
    }
}
