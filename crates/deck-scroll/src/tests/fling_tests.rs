use super::*;

fn layout() -> CardLayout {
    CardLayout::single_column(5, 400.0, 0.0)
}

#[test]
fn zero_velocity_picks_nearest_boundary() {
    assert_eq!(fling_target_index(&layout(), 150.0, 0.0), Some(0));
    assert_eq!(fling_target_index(&layout(), 200.0, 0.0), Some(1));
    assert_eq!(fling_target_index(&layout(), 650.0, 0.0), Some(2));
}

#[test]
fn estimate_uses_signed_square_of_velocity() {
    // 1000 px/s travels 250 px before resting
    assert_eq!(fling_target_index(&layout(), 0.0, 1000.0), Some(1));
    assert_eq!(fling_target_index(&layout(), 0.0, 800.0), Some(0));
    assert_eq!(fling_target_index(&layout(), 800.0, -1000.0), Some(1));
}

#[test]
fn large_velocity_stops_at_last_card() {
    assert_eq!(fling_target_index(&layout(), 0.0, 1.0e6), Some(4));
    assert_eq!(fling_target_index(&layout(), 1600.0, -1.0e6), Some(0));
}

#[test]
fn no_cards_no_target() {
    let empty = CardLayout::single_column(0, 400.0, 0.0);
    assert_eq!(fling_target_index(&empty, 0.0, 100.0), None);
    assert!(FlingPlan::new(&empty, 0.0, 100.0).is_none());
}

#[test]
fn fast_fling_decelerates_to_rest_at_target() {
    let plan = FlingPlan::towards(0.0, 400.0, 4000.0);
    assert!((plan.duration_seconds - 0.2).abs() < 1e-6);
    assert!((plan.acceleration + 20_000.0).abs() < 1e-2);
    let end_velocity = plan.velocity + plan.acceleration * plan.duration_seconds;
    assert!(end_velocity.abs() < 1e-2);
    let just_before = plan.offset_at(plan.duration_seconds - 1e-4);
    assert!((just_before - 400.0).abs() < 0.1);
}

#[test]
fn slow_fling_falls_back_to_quarter_second() {
    let plan = FlingPlan::towards(0.0, 400.0, 500.0);
    assert_eq!(plan.duration_seconds, SLOW_FLING_DURATION_SECONDS);
    assert!((plan.velocity - 3200.0).abs() < 1e-3);
    assert!((plan.acceleration + 12_800.0).abs() < 1e-2);
}

#[test]
fn zero_and_reversed_velocity_fall_back() {
    for velocity in [0.0, 300.0] {
        let plan = FlingPlan::towards(100.0, 0.0, velocity);
        assert_eq!(plan.duration_seconds, SLOW_FLING_DURATION_SECONDS);
        assert!(plan.velocity < 0.0);
        assert!(plan.offset_at(0.1).is_finite());
    }
}

#[test]
fn motion_snaps_exactly_to_target() {
    let plan = FlingPlan::towards(13.7, 400.0, 2000.0);
    assert_eq!(plan.offset_at(plan.duration_seconds), 400.0);
    assert_eq!(plan.offset_at(10.0), 400.0);
    assert_eq!(plan.offset_at(0.0), 13.7);
}

#[test]
fn offsets_stay_between_start_and_target() {
    for velocity in [0.0, 50.0, 900.0, 6000.0, -800.0] {
        let plan = FlingPlan::towards(50.0, 400.0, velocity);
        let mut t = 0.0;
        while t < plan.duration_seconds {
            let offset = plan.offset_at(t);
            assert!((50.0 - 1e-3..=400.0 + 1e-3).contains(&offset), "{velocity}: {offset}");
            t += 0.005;
        }
    }
}
