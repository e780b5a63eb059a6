use super::*;
use crate::spring::SpringResponse;

const MS: u64 = 1_000_000;

#[test]
fn lerp_interpolates_geometry() {
    let start = Point::new(0.0, 10.0);
    let end = Point::new(10.0, 20.0);
    assert_eq!(start.lerp(&end, 0.5), Point::new(5.0, 15.0));

    let scale = ScaleFactor::IDENTITY.lerp(&ScaleFactor::new(2.0, 3.0), 0.5);
    assert_eq!(scale, ScaleFactor::new(1.5, 2.0));
}

#[test]
fn easing_endpoints_are_exact() {
    for easing in [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::FastOutSlowIn,
        Easing::LinearOutSlowIn,
        Easing::FastOutLinearIn,
    ] {
        assert_eq!(easing.transform(0.0), 0.0, "{easing:?}");
        assert_eq!(easing.transform(1.0), 1.0, "{easing:?}");
    }
}

#[test]
fn easing_curves_are_monotonic() {
    for easing in [Easing::EaseInOut, Easing::FastOutSlowIn, Easing::FastOutLinearIn] {
        let mut previous = 0.0;
        for step in 1..=100 {
            let value = easing.transform(step as f32 / 100.0);
            assert!(value + 1e-4 >= previous, "{easing:?} dipped at {step}");
            previous = value;
        }
    }
}

#[test]
fn fast_out_slow_in_leads_linear() {
    assert!(Easing::FastOutSlowIn.transform(0.5) > 0.5);
    assert!(Easing::FastOutLinearIn.transform(0.5) < 0.5);
}

#[test]
fn tween_respects_delay_and_duration() {
    let spec = AnimationType::Tween(AnimationSpec::linear(100).with_delay(50));
    assert_eq!(spec.sample(20 * MS).fraction, 0.0);
    let mid = spec.sample(100 * MS);
    assert!(!mid.finished);
    assert!((mid.fraction - 0.5).abs() < 1e-4);
    let end = spec.sample(150 * MS);
    assert!(end.finished);
    assert_eq!(end.fraction, 1.0);
}

#[test]
fn zero_length_tween_finishes_immediately() {
    let spec = AnimationType::Tween(AnimationSpec::linear(0));
    assert!(spec.sample(0).finished || spec.sample(1).finished);
}

#[test]
fn default_spring_settles_without_overshoot() {
    let spring = AnimationType::default();
    let mut elapsed = 0;
    let mut last = 0.0;
    loop {
        let sample = spring.sample(elapsed);
        assert!(sample.fraction <= 1.0 + 1e-6);
        assert!(sample.fraction + 1e-6 >= last);
        last = sample.fraction;
        if sample.finished {
            break;
        }
        elapsed += 16 * MS;
        assert!(elapsed < 2_000 * MS, "spring never settled");
    }
    assert_eq!(last, 1.0);
}

#[test]
fn bouncy_spring_overshoots() {
    let spring = AnimationType::Spring(SpringSpec::bouncy());
    let peak = (0..100)
        .map(|frame| spring.sample(frame * 8 * MS).fraction)
        .fold(0.0f32, f32::max);
    assert!(peak > 1.0);
}

#[test]
fn spring_response_starts_at_initial_state() {
    for spec in [SpringSpec::default(), SpringSpec::bouncy(), SpringSpec {
        damping_ratio: 2.0,
        ..SpringSpec::default()
    }] {
        let (x, v) = SpringResponse::with_initial(&spec, -1.0, 3.0).at(0.0);
        assert!((x + 1.0).abs() < 1e-9, "{spec:?}");
        assert!((v - 3.0).abs() < 1e-9, "{spec:?}");
    }
}

#[test]
fn overdamped_spring_approaches_rest() {
    let spec = SpringSpec {
        damping_ratio: 3.0,
        ..SpringSpec::default()
    };
    let (x, _) = SpringResponse::new(&spec).at(5.0);
    assert!(x.abs() < 1e-3);
}

#[test]
fn animation_type_round_trips_through_json() {
    let spec = AnimationType::Tween(AnimationSpec::default());
    let json = serde_json::to_string(&spec).unwrap();
    assert!(json.contains("\"kind\":\"tween\""));
    let decoded: AnimationType = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, spec);
}
