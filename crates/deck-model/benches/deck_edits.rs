use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use deck_model::{Column, Deck, DeckNode, PageStack, Row, StackId};

const CARD_COUNT_SAMPLES: &[usize] = &[4, 16, 64, 256];

/// Alternates plain card slots with two-card columns.
fn deck_with(cards: usize) -> Deck<u64> {
    let mut slots = Vec::new();
    let mut next = 0u64;
    while (next as usize) < cards {
        if next % 3 == 1 && (next as usize) + 1 < cards {
            slots.push(DeckNode::Column(Column::new(vec![
                DeckNode::Card(next),
                DeckNode::Card(next + 1),
            ])));
            next += 2;
        } else {
            slots.push(DeckNode::Card(next));
            next += 1;
        }
    }
    Deck::new(Row::new(slots))
}

fn bench_card_edits(c: &mut Criterion) {
    let mut group = c.benchmark_group("deck_card_edits");
    for &cards in CARD_COUNT_SAMPLES {
        let deck = deck_with(cards);
        group.bench_with_input(BenchmarkId::new("inserted_card", cards), &deck, |b, deck| {
            b.iter(|| black_box(deck.inserted_card(deck.slot_count() / 2, u64::MAX)));
        });
        group.bench_with_input(BenchmarkId::new("removed_card", cards), &deck, |b, deck| {
            b.iter(|| black_box(deck.removed_card(deck.card_count() / 2)));
        });
        group.bench_with_input(BenchmarkId::new("replaced_card", cards), &deck, |b, deck| {
            b.iter(|| black_box(deck.replaced_card(deck.card_count() - 1, 0)));
        });
    }
    group.finish();
}

fn bench_card_lookup(c: &mut Criterion) {
    let deck = deck_with(256);
    c.bench_function("deck_path_of_card", |b| {
        b.iter(|| black_box(deck.path_of_card(black_box(200))));
    });
}

fn bench_page_stack_push(c: &mut Criterion) {
    c.bench_function("page_stack_push_pop", |b| {
        b.iter(|| {
            let mut stack = PageStack::new(StackId::new(0), 0u32);
            for page in 1..64 {
                stack = stack.added(page);
            }
            while let Some(tail) = stack.tail_or_none() {
                stack = tail;
            }
            black_box(stack)
        });
    });
}

criterion_group!(
    deck_edits,
    bench_card_edits,
    bench_card_lookup,
    bench_page_stack_push
);
criterion_main!(deck_edits);
