//! Property-based tests for availability resolution using proptest.
//!
//! These hold for any busy set, window and padding, not just the worked
//! scenarios in `resolver_tests.rs`.

use agenda_engine::resolver::{merge_busy_blocks, resolve, Window};
use agenda_engine::Interval;
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap()
}

/// Busy interval inside a two-day span, 5 to 240 minutes long.
fn arb_busy() -> impl Strategy<Value = Interval> {
    (0i64..2 * 24 * 60, 5i64..=240).prop_map(|(offset, len)| {
        let start = base() + Duration::minutes(offset);
        Interval::new(start, start + Duration::minutes(len)).unwrap()
    })
}

fn arb_busy_set() -> impl Strategy<Value = Vec<Interval>> {
    prop::collection::vec(arb_busy(), 0..30)
}

fn arb_window() -> impl Strategy<Value = Window> {
    (0i64..24 * 60, 0i64..=24 * 60).prop_map(|(offset, len)| {
        let start = base() + Duration::minutes(offset);
        Window::new(start, start + Duration::minutes(len))
    })
}

fn arb_padding() -> impl Strategy<Value = Duration> {
    (0i64..=60).prop_map(Duration::minutes)
}

fn arb_sizes() -> impl Strategy<Value = Vec<Duration>> {
    prop::collection::vec((5i64..=180).prop_map(Duration::minutes), 1..4)
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: Every slot lies inside the window and has a requested size
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn slots_are_contained_and_sized(
        busy in arb_busy_set(),
        window in arb_window(),
        before in arb_padding(),
        after in arb_padding(),
        sizes in arb_sizes(),
    ) {
        let slots = resolve(busy, window, before, after, &sizes).unwrap();
        for slot in &slots {
            prop_assert!(window.start <= slot.start && slot.end <= window.end);
            prop_assert!(sizes.contains(&slot.duration()));
        }
    }
}

// ---------------------------------------------------------------------------
// Property 2: No slot overlaps a padded busy block
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn slots_avoid_padded_busy_time(
        busy in arb_busy_set(),
        window in arb_window(),
        before in arb_padding(),
        after in arb_padding(),
        sizes in arb_sizes(),
    ) {
        let blocks = merge_busy_blocks(busy.clone(), &window, before, after);
        let slots = resolve(busy, window, before, after, &sizes).unwrap();
        for slot in &slots {
            for block in &blocks {
                prop_assert!(
                    !slot.as_interval().overlaps(block),
                    "slot {:?} overlaps busy block {:?}", slot, block
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 3: Merged blocks are sorted, disjoint and non-touching
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn merged_blocks_are_disjoint(
        busy in arb_busy_set(),
        window in arb_window(),
        before in arb_padding(),
        after in arb_padding(),
    ) {
        let blocks = merge_busy_blocks(busy, &window, before, after);
        for pair in blocks.windows(2) {
            prop_assert!(pair[0].end < pair[1].start);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 4: Output is sorted, duplicate-free, and independent of input order
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn output_is_canonical(
        busy in arb_busy_set(),
        window in arb_window(),
        before in arb_padding(),
        after in arb_padding(),
        sizes in arb_sizes(),
    ) {
        let slots = resolve(busy.clone(), window, before, after, &sizes).unwrap();
        for pair in slots.windows(2) {
            prop_assert!((pair[0].start, pair[0].end) < (pair[1].start, pair[1].end));
        }

        let mut reversed = busy;
        reversed.reverse();
        prop_assert_eq!(slots, resolve(reversed, window, before, after, &sizes).unwrap());
    }
}

// ---------------------------------------------------------------------------
// Property 5: Adding busy time never adds free time
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn more_busy_time_never_means_more_free_time(
        busy in arb_busy_set(),
        extra in arb_busy(),
        window in arb_window(),
        size in (5i64..=60).prop_map(Duration::minutes),
    ) {
        let zero = Duration::zero();
        let covered = |blocks: &[Interval]| -> Duration { blocks.iter().map(Interval::duration).sum() };

        let before_blocks = merge_busy_blocks(busy.clone(), &window, zero, zero);
        let mut more = busy;
        more.push(extra);
        let after_blocks = merge_busy_blocks(more.clone(), &window, zero, zero);
        prop_assert!(covered(&after_blocks) >= covered(&before_blocks));

        // Every slot offered after the addition was already free before it.
        for slot in &resolve(more, window, zero, zero, &[size]).unwrap() {
            prop_assert!(before_blocks.iter().all(|b| !slot.as_interval().overlaps(b)));
        }
    }
}

// ---------------------------------------------------------------------------
// Property 6: Wider padding never increases the total free time offered
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn wider_padding_never_offers_more(
        busy in arb_busy_set(),
        window in arb_window(),
        before in arb_padding(),
        after in arb_padding(),
        widen_before in arb_padding(),
        widen_after in arb_padding(),
        sizes in arb_sizes(),
    ) {
        let total = |slots: &[agenda_engine::FreeSlot]| -> Duration {
            slots.iter().map(|s| s.duration()).sum()
        };

        let narrow = resolve(busy.clone(), window, before, after, &sizes).unwrap();
        let wide = resolve(
            busy,
            window,
            before + widen_before,
            after + widen_after,
            &sizes,
        )
        .unwrap();

        prop_assert!(total(&wide) <= total(&narrow));
    }
}
