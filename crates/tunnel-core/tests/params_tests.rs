// Host-side tests for parameter snapshots, colors and the tweak panel model.

use tunnel_core::*;

#[test]
fn hex_colors_parse_with_or_without_hash() {
    let c: Color = "#ff8000".parse().unwrap();
    assert_eq!(c, Color::new(1.0, 128.0 / 255.0, 0.0));
    assert_eq!(Color::from_hex("00ffe1").unwrap().to_hex(), "#00ffe1");
    assert_eq!(Color::from_hex("  #0B0014 ").unwrap().to_hex(), "#0b0014");
    assert_eq!(Color::WHITE.to_string(), "#ffffff");
}

#[test]
fn bad_hex_colors_are_rejected() {
    assert!(matches!(Color::from_hex("#fff"), Err(ColorParseError::BadLength(_))));
    assert!(matches!(Color::from_hex("#ff00ff00"), Err(ColorParseError::BadLength(_))));
    assert!(matches!(Color::from_hex("#gg0000"), Err(ColorParseError::BadDigit(_))));
    assert!(matches!(Color::from_hex("+12345"), Err(ColorParseError::BadDigit(_))));
}

#[test]
fn lerp_clamps_and_handles_nan() {
    let a = Color::BLACK;
    let b = Color::WHITE;
    assert_eq!(a.lerp(b, 0.25), Color::new(0.25, 0.25, 0.25));
    assert_eq!(a.lerp(b, -1.0), a);
    assert_eq!(a.lerp(b, 2.0), b);
    assert_eq!(a.lerp(b, f32::NAN), a);
}

#[test]
fn hsv_primaries() {
    let red = Color::from_hsv(0.0, 1.0, 1.0);
    assert!((red.r - 1.0).abs() < 1e-6 && red.g.abs() < 1e-6 && red.b.abs() < 1e-6);
    let green = Color::from_hsv(1.0 / 3.0, 1.0, 1.0);
    assert!((green.g - 1.0).abs() < 1e-5 && green.r.abs() < 1e-5);
    let grey = Color::from_hsv(0.7, 0.0, 0.5);
    assert_eq!(grey, Color::new(0.5, 0.5, 0.5));
}

#[test]
fn shape_kind_parses_names_and_aliases() {
    assert_eq!("cube".parse::<ShapeKind>().unwrap(), ShapeKind::Cube);
    assert_eq!("Box".parse::<ShapeKind>().unwrap(), ShapeKind::Cube);
    assert_eq!(" sphere ".parse::<ShapeKind>().unwrap(), ShapeKind::Sphere);
    assert_eq!("TETRA".parse::<ShapeKind>().unwrap(), ShapeKind::Tetrahedron);
    let err = "torus".parse::<ShapeKind>().unwrap_err();
    assert_eq!(err, UnknownShapeKind("torus".to_string()));
    assert_eq!(ShapeKind::Tetrahedron.to_string(), "tetrahedron");
    assert_eq!(ShapeKind::Tetrahedron.next(), ShapeKind::Cube);
}

#[test]
fn defaults_describe_the_stock_tunnel() {
    let p = ParameterSet::default();
    assert_eq!(p.ring_count, 50);
    assert_eq!(p.ring_spacing, 2.0);
    assert_eq!(p.ring_track_length(), 100.0);
    assert_eq!(p.shape_instance_count(), 600);
    assert_eq!(p.shape_track_length(), 75.0);
    assert_eq!(p.color1.to_hex(), "#ff00ff");
    assert_eq!(p.color2.to_hex(), "#00ffe1");
    assert!(!p.glow.enabled);
    assert_eq!(p.sanitized(), p);
}

#[test]
fn sanitize_restores_non_finite_colors() {
    let p = ParameterSet {
        color2: Color::new(f32::NAN, 0.0, 0.0),
        ..ParameterSet::default()
    };
    let s = p.sanitized();
    assert_eq!(s.color2, ParameterSet::default().color2);
}

#[test]
fn rebuild_scope_classifies_changes() {
    let base = ParameterSet::default();
    let same = base.rebuild_scope(&base.clone());
    assert!(same.is_empty());

    let spacing = ParameterSet {
        ring_spacing: 3.0,
        ..base.clone()
    };
    assert_eq!(base.rebuild_scope(&spacing), RebuildScope { rings: true, shapes: false });

    for next in [
        ParameterSet { shapes_per_ring: 8, ..base.clone() },
        ParameterSet { depth_segments: 20, ..base.clone() },
        ParameterSet { inner_radius: 4.0, ..base.clone() },
        ParameterSet { inner_depth_spacing: 1.0, ..base.clone() },
        ParameterSet { spiral_rotation_per_segment: 0.5, ..base.clone() },
        ParameterSet { angular_speed_scale: 2.0, ..base.clone() },
        ParameterSet { shape_kind: ShapeKind::Tetrahedron, ..base.clone() },
    ] {
        assert_eq!(base.rebuild_scope(&next), RebuildScope { rings: false, shapes: true });
    }

    let both = ParameterSet {
        ring_count: 10,
        depth_segments: 10,
        ..base.clone()
    };
    assert_eq!(base.rebuild_scope(&both), RebuildScope::ALL);

    let continuous = ParameterSet {
        background: Color::BLACK,
        ring_shininess: 10.0,
        fog_near: 2.0,
        ..base.clone()
    };
    assert!(base.rebuild_scope(&continuous).is_empty());
}

#[test]
fn structural_params_agree_with_rebuild_scope() {
    let base = ParameterSet::default();
    for param in Param::ALL {
        let edit = nudge(param, &base, 1);
        let next = edit.apply(&base).unwrap();
        let scope = base.rebuild_scope(&next);
        if param.is_structural() {
            assert!(!scope.is_empty(), "{param:?} should rebuild");
        } else {
            assert!(scope.is_empty(), "{param:?} should not rebuild");
        }
    }
}

#[test]
fn nudging_numbers_steps_and_clamps() {
    let p = ParameterSet::default();
    let edit = nudge(Param::RingCount, &p, 1);
    assert_eq!(edit.value, ParamValue::Number(51.0));
    assert_eq!(edit.apply(&p).unwrap().ring_count, 51);

    let edit = nudge(Param::RingCount, &p, 1000);
    assert_eq!(edit.value, ParamValue::Number(200.0));

    let edit = nudge(Param::RingSpacing, &p, -3);
    match edit.value {
        ParamValue::Number(v) => assert!((v - 1.7).abs() < 1e-5),
        other => panic!("unexpected {other:?}"),
    }

    let edit = nudge(Param::CameraSpeed, &p, -100);
    assert_eq!(edit.value, ParamValue::Number(0.0));
}

#[test]
fn nudging_colors_shapes_and_flags() {
    let p = ParameterSet::default();
    // #ff00ff is the first palette entry
    let edit = nudge(Param::Color1, &p, 1);
    assert_eq!(edit.value, ParamValue::Color(Color::from_hex(PALETTE[1]).unwrap()));
    let edit = nudge(Param::Color1, &p, -1);
    assert_eq!(edit.value, ParamValue::Color(Color::from_hex(PALETTE[9]).unwrap()));

    let odd = ParameterSet {
        color1: Color::new(0.1, 0.2, 0.3),
        ..p.clone()
    };
    let edit = nudge(Param::Color1, &odd, 1);
    assert_eq!(edit.value, ParamValue::Color(Color::from_hex(PALETTE[0]).unwrap()));

    assert_eq!(nudge(Param::Shape, &p, 1).value, ParamValue::Shape(ShapeKind::Sphere));
    assert_eq!(nudge(Param::Shape, &p, -1).value, ParamValue::Shape(ShapeKind::Tetrahedron));
    assert_eq!(nudge(Param::Wireframe, &p, 1).value, ParamValue::Flag(true));
    assert_eq!(nudge(Param::Wireframe, &p, 2).value, ParamValue::Flag(false));
}

#[test]
fn toggle_only_applies_to_flags() {
    let p = ParameterSet::default();
    let edit = toggle(Param::GlowEnabled, &p).unwrap();
    assert!(edit.apply(&p).unwrap().glow.enabled);
    assert!(toggle(Param::RingCount, &p).is_none());
}

#[test]
fn mismatched_edit_is_rejected() {
    let p = ParameterSet::default();
    let edit = ParamEdit::new(Param::RingCount, ParamValue::Flag(true));
    assert_eq!(
        edit.apply(&p),
        Err(EditError::WrongKind {
            param: Param::RingCount,
            value: ParamValue::Flag(true),
        })
    );
    let edit = ParamEdit::new(Param::Color1, ParamValue::Number(1.0));
    assert!(edit.apply(&p).is_err());
}

#[test]
fn count_edits_round_and_floor_at_zero() {
    let p = ParameterSet::default();
    let next = ParamEdit::new(Param::DepthSegments, ParamValue::Number(12.6))
        .apply(&p)
        .unwrap();
    assert_eq!(next.depth_segments, 13);
    let next = ParamEdit::new(Param::ShapesPerRing, ParamValue::Number(-4.0))
        .apply(&p)
        .unwrap();
    assert_eq!(next.shapes_per_ring, 0);
    // the engine clamps it back up
    assert_eq!(next.sanitized().shapes_per_ring, 1);
}

#[test]
fn panel_selection_wraps_and_describes() {
    let mut panel = TweakPanel::new();
    let p = ParameterSet::default();
    assert_eq!(panel.selected(), Param::Color1);
    assert_eq!(panel.describe(&p), "Color 1: #ff00ff");
    assert_eq!(panel.select_prev(), Param::FogFar);
    assert_eq!(panel.select_next(), Param::Color1);

    panel.select(Param::RingCount);
    assert_eq!(panel.describe(&p), "Ring Count: 50.000");
    let edit = panel.nudge(&p, -1);
    assert_eq!(edit.param, Param::RingCount);
    assert_eq!(edit.value, ParamValue::Number(49.0));

    for _ in 0..Param::ALL.len() {
        panel.select_next();
    }
    assert_eq!(panel.selected(), Param::RingCount);
}

#[test]
fn panel_edits_drive_the_engine() {
    let mut engine = TunnelEngine::new(ParameterSet::default(), 11);
    let mut panel = TweakPanel::new();
    panel.select(Param::DepthSegments);
    let edit = panel.nudge(engine.params(), -10);
    let next = edit.apply(engine.params()).unwrap();
    let scope = engine.apply_params(next);
    assert!(scope.shapes && !scope.rings);
    assert_eq!(engine.shapes().len(), 40 * 12);
}
