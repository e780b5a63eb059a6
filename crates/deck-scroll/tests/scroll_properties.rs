use std::sync::Arc;

use deck_core::{DefaultScheduler, Runtime};
use deck_scroll::{CardLayout, ScrollEngine};
use proptest::prelude::*;

const FRAME: u64 = 16_000_000;

fn layouts() -> impl Strategy<Value = CardLayout> {
    prop_oneof![
        (1usize..8, 200.0f32..1200.0).prop_map(|(cards, width)| CardLayout::single_column(cards, width, 0.0)),
        (1usize..12, 300.0f32..1600.0, 1usize..4, 0.0f32..24.0, 0.0f32..24.0).prop_map(
            |(cards, width, columns, spacing, padding)| {
                CardLayout::multi_column(cards, width, columns, spacing, padding)
            }
        ),
    ]
}

proptest! {
    #[test]
    fn offset_stays_in_range_for_any_deltas(
        layout in layouts(),
        deltas in prop::collection::vec(-5_000.0f32..5_000.0, 0..40),
    ) {
        let runtime = Runtime::new(Arc::new(DefaultScheduler));
        let engine = ScrollEngine::new(runtime.handle(), layout);
        for delta in deltas {
            engine.dispatch_raw_delta(delta);
            let offset = engine.scroll_offset();
            prop_assert!(offset >= 0.0 && offset <= engine.max_scroll_offset());
        }
    }

    #[test]
    fn completed_flings_rest_on_card_boundaries(
        layout in layouts(),
        start in 0.0f32..1.0,
        velocity in prop_oneof![Just(0.0f32), -400.0f32..400.0, -20_000.0f32..20_000.0],
    ) {
        let runtime = Runtime::new(Arc::new(DefaultScheduler));
        let engine = ScrollEngine::new(runtime.handle(), layout);
        engine.dispatch_raw_delta(start * layout.max_scroll_offset());
        engine.fling(velocity).unwrap();

        let mut now = 0;
        let mut frames = 0;
        while engine.is_scroll_in_progress() {
            now += FRAME;
            runtime.run_frame(now);
            frames += 1;
            prop_assert!(frames < 100);
            let offset = engine.scroll_offset();
            prop_assert!(offset >= 0.0 && offset <= layout.max_scroll_offset());
        }
        prop_assert!(layout.boundaries().contains(&engine.scroll_offset()));
    }
}
