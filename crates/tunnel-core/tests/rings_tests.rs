// Host-side tests for the outer ring track: wraparound, tiling and color progress.

use tunnel_core::*;

fn ring_params(count: u32, spacing: f32) -> ParameterSet {
    ParameterSet {
        ring_count: count,
        ring_spacing: spacing,
        ..ParameterSet::default()
    }
}

/// Ring depths folded into `[0, total)`, sorted, with values within rounding
/// distance of `total` folded back to zero.
fn folded_depths(track: &RingTrack) -> Vec<f64> {
    let total = track.track_length();
    let mut v: Vec<f64> = track
        .rings()
        .iter()
        .map(|r| {
            let m = r.depth.rem_euclid(total);
            if (total - m).abs() < 1e-3 {
                0.0
            } else {
                m
            }
        })
        .collect();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap());
    v
}

fn expected_slots(count: u32, spacing: f32) -> Vec<f64> {
    let spacing = spacing as f64;
    let total = count as f64 * spacing;
    let mut v: Vec<f64> = (0..count)
        .map(|i| {
            let m = (-(i as f64) * spacing).rem_euclid(total);
            if (total - m).abs() < 1e-3 {
                0.0
            } else {
                m
            }
        })
        .collect();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap());
    v
}

fn assert_tiles(track: &RingTrack, count: u32, spacing: f32) {
    let got = folded_depths(track);
    let want = expected_slots(count, spacing);
    assert_eq!(got.len(), want.len());
    for (g, w) in got.iter().zip(want.iter()) {
        assert!((g - w).abs() < 1e-3, "ring tiling broken: got {got:?}, want {want:?}");
    }
}

#[test]
fn build_lays_rings_out_one_spacing_apart() {
    let track = RingTrack::build(&ring_params(5, 2.5));
    let depths: Vec<f64> = track.rings().iter().map(|r| r.depth).collect();
    assert_eq!(depths, vec![0.0, -2.5, -5.0, -7.5, -10.0]);
    for (i, r) in track.rings().iter().enumerate() {
        assert_eq!(r.index, i);
        assert_eq!(r.rotation, 0.0);
    }
    assert_eq!(track.track_length(), 12.5);
}

#[test]
fn scenario_four_rings_camera_jump_wraps_each_once() {
    let params = ParameterSet {
        ring_rotation_speed: 0.0,
        ..ring_params(4, 2.0)
    };
    let mut track = RingTrack::build(&params);
    let depths: Vec<f64> = track.rings().iter().map(|r| r.depth).collect();
    assert_eq!(depths, vec![0.0, -2.0, -4.0, -6.0]);

    let wraps = track.tick(-10.0, &params);
    assert_eq!(wraps, 4);
    let depths: Vec<f64> = track.rings().iter().map(|r| r.depth).collect();
    assert_eq!(depths, vec![-8.0, -10.0, -12.0, -14.0]);

    // nothing is beyond camera + spacing any more
    let wraps = track.tick(-10.0, &params);
    assert_eq!(wraps, 0);
    let again: Vec<f64> = track.rings().iter().map(|r| r.depth).collect();
    assert_eq!(again, depths);
}

#[test]
fn ring_just_past_threshold_moves_back_exactly_one_track_length() {
    let params = ParameterSet {
        ring_rotation_speed: 0.0,
        ..ring_params(6, 1.5)
    };
    let mut track = RingTrack::build(&params);
    let camera = -20.0;
    let eps = 0.01;
    let start = camera + 1.5 + eps;
    track.rings_mut()[2].depth = start;

    track.tick(camera, &params);
    let after = track.rings()[2].depth;
    assert!((start - after - track.track_length()).abs() < 1e-4, "moved {}", start - after);
    assert_eq!(track.rings()[2].rotation, 0.0);
}

#[test]
fn ring_exactly_at_threshold_does_not_wrap() {
    let params = ring_params(4, 2.0);
    let mut track = RingTrack::build(&params);
    track.rings_mut()[0].depth = -8.0;
    track.tick(-10.0, &params);
    assert_eq!(track.rings()[0].depth, -8.0);
}

#[test]
fn rings_tile_the_track_for_every_tick() {
    for (count, spacing, speed) in [(4u32, 2.0f32, 0.05f64), (1, 3.0, 0.7), (7, 1.5, 0.33), (50, 2.0, 1.0)] {
        let params = ring_params(count, spacing);
        let mut track = RingTrack::build(&params);
        let mut camera = 5.0f64;
        assert_tiles(&track, count, spacing);
        for _ in 0..2000 {
            camera -= speed;
            track.tick(camera, &params);
            assert_tiles(&track, count, spacing);
            for r in track.rings() {
                assert!(r.depth <= camera + spacing as f64, "ring left behind the camera");
            }
        }
    }
}

#[test]
fn large_camera_jump_catches_up_without_breaking_tiling() {
    let params = ring_params(10, 2.0);
    let mut track = RingTrack::build(&params);
    track.tick(-1000.0, &params);
    assert_tiles(&track, 10, 2.0);
    for r in track.rings() {
        assert!(r.depth <= -998.0 && r.depth > -1018.0, "depth {}", r.depth);
    }
}

#[test]
fn rotation_accumulates_each_tick() {
    let params = ParameterSet {
        ring_rotation_speed: 0.25,
        ..ring_params(3, 2.0)
    };
    let mut track = RingTrack::build(&params);
    for _ in 0..4 {
        track.tick(5.0, &params);
    }
    for r in track.rings() {
        assert!((r.rotation - 1.0).abs() < 1e-6);
    }
}

#[test]
fn progress_is_zero_at_camera_and_within_unit_interval() {
    assert_eq!(ring_progress(-3.0, -3.0, 50, 2.0), 0.0);
    for i in 0..500 {
        let depth = -(i as f64) * 0.37;
        let p = ring_progress(depth, -7.5, 50, 2.0);
        assert!((0.0..1.0).contains(&p), "progress {p} out of range");
    }
    // tiny negative offset must not round up to 1.0
    let p = ring_progress(-1e-8, 0.0, 4, 2.0);
    assert!((0.0..1.0).contains(&p));
}

#[test]
fn progress_is_zero_for_degenerate_tracks() {
    assert_eq!(ring_progress(-3.0, 0.0, 1, 2.0), 0.0);
    assert_eq!(ring_progress(-3.0, 0.0, 0, 2.0), 0.0);
    assert_eq!(ring_progress(-3.0, 0.0, 10, 0.0), 0.0);
    assert_eq!(ring_progress(-3.0, 0.0, 10, f32::NAN), 0.0);
}

#[test]
fn single_ring_stays_on_first_color() {
    let params = ParameterSet {
        color1: Color::new(1.0, 0.0, 0.0),
        color2: Color::new(0.0, 0.0, 1.0),
        ..ring_params(1, 2.0)
    };
    let mut track = RingTrack::build(&params);
    let mut camera = 5.0;
    for _ in 0..300 {
        camera -= 0.3;
        track.tick(camera, &params);
        let c = track.rings()[0].color;
        assert_eq!(c, params.color1);
        assert!(c.is_finite());
    }
}

#[test]
fn ring_color_follows_depth_progress() {
    let params = ParameterSet {
        ring_rotation_speed: 0.0,
        color1: Color::new(0.0, 0.0, 0.0),
        color2: Color::new(1.0, 1.0, 1.0),
        ..ring_params(4, 2.0)
    };
    let mut track = RingTrack::build(&params);
    // camera at 0: rings at 0, -2, -4, -6 -> progress 0, 0.75, 0.5, 0.25
    track.tick(0.0, &params);
    let reds: Vec<f32> = track.rings().iter().map(|r| r.color.r).collect();
    let want = [0.0, 0.75, 0.5, 0.25];
    for (g, w) in reds.iter().zip(want) {
        assert!((g - w).abs() < 1e-5, "got {reds:?}");
    }
}

#[test]
fn far_down_the_tunnel_rings_still_wrap_by_exact_track_lengths() {
    let params = ParameterSet {
        ring_rotation_speed: 0.0,
        ..ring_params(50, 2.0)
    };
    let mut track = RingTrack::build(&params);
    let mut camera = -5_000_000.0f64;
    track.tick(camera, &params);
    assert_tiles(&track, 50, 2.0);
    for _ in 0..1000 {
        camera -= 0.05;
        track.tick(camera, &params);
        assert_tiles(&track, 50, 2.0);
        for r in track.rings() {
            assert!(r.depth <= camera + 2.0 && r.depth > camera - 100.0);
        }
    }
}
