//! Resolve bookable free slots from a set of busy intervals.
//!
//! Pads every busy interval, clips to the window, merges overlapping or touching
//! busy periods, then takes the gaps between merged blocks. Each gap offers one
//! slot per requested size, anchored at the gap's start.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AgendaError, Result};
use crate::interval::{pad, Interval};

/// The `[not_before, not_after]` range a resolution is bounded by.
///
/// Unlike [`Interval`], a window may be degenerate (`start == end`); the
/// resolver treats that as "nothing to offer" rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// True for degenerate and inverted windows.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn duration(&self) -> Duration {
        if self.is_empty() {
            Duration::zero()
        } else {
            self.end - self.start
        }
    }
}

/// A bookable slot offered to an invite viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FreeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FreeSlot {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    pub fn as_interval(&self) -> Interval {
        Interval {
            start: self.start,
            end: self.end,
        }
    }
}

/// Reject inputs the resolver cannot give a meaningful answer for.
///
/// # Errors
/// `AgendaError::Validation` for an empty `slot_sizes`, any size `<= 0`,
/// negative padding, or `window.start > window.end`.
pub fn validate(
    window: &Window,
    padding_before: Duration,
    padding_after: Duration,
    slot_sizes: &[Duration],
) -> Result<()> {
    if slot_sizes.is_empty() {
        return Err(AgendaError::Validation(
            "at least one slot size is required".to_string(),
        ));
    }
    if let Some(bad) = slot_sizes.iter().find(|s| **s <= Duration::zero()) {
        return Err(AgendaError::Validation(format!(
            "slot sizes must be positive, got {}s",
            bad.num_seconds()
        )));
    }
    if padding_before < Duration::zero() || padding_after < Duration::zero() {
        return Err(AgendaError::Validation(
            "padding must not be negative".to_string(),
        ));
    }
    if window.start > window.end {
        return Err(AgendaError::Validation(format!(
            "window start {} is after window end {}",
            window.start.to_rfc3339(),
            window.end.to_rfc3339()
        )));
    }
    Ok(())
}

/// Pad, clip and merge busy intervals into maximal non-overlapping blocks.
///
/// Blocks whose padded range misses the window entirely are dropped. Touching
/// blocks (`next.start == current.end`) are merged.
pub fn merge_busy_blocks(
    busy: impl IntoIterator<Item = Interval>,
    window: &Window,
    padding_before: Duration,
    padding_after: Duration,
) -> Vec<Interval> {
    if window.is_empty() {
        return Vec::new();
    }

    let mut clipped: Vec<Interval> = busy
        .into_iter()
        .filter_map(|b| pad(&b, padding_before, padding_after).clip(window.start, window.end))
        .collect();

    clipped.sort();

    let mut merged: Vec<Interval> = Vec::with_capacity(clipped.len());
    for next in clipped {
        if let Some(last) = merged.last_mut() {
            if next.start <= last.end {
                last.end = last.end.max(next.end);
                continue;
            }
        }
        merged.push(next);
    }

    merged
}

/// The complement of `merged` inside `window`: lead gap, inner gaps, trail gap.
///
/// `merged` must be sorted and non-overlapping, as produced by
/// [`merge_busy_blocks`].
pub fn free_regions(merged: &[Interval], window: &Window) -> Vec<Interval> {
    if window.is_empty() {
        return Vec::new();
    }

    let mut regions = Vec::with_capacity(merged.len() + 1);
    let mut cursor = window.start;

    for block in merged {
        if cursor < block.start {
            regions.push(Interval {
                start: cursor,
                end: block.start,
            });
        }
        cursor = cursor.max(block.end);
    }

    if cursor < window.end {
        regions.push(Interval {
            start: cursor,
            end: window.end,
        });
    }

    regions
}

/// Compute the free slots to expose for a window.
///
/// For every free region and every size in `slot_sizes`, emits one slot of that
/// size at the region's start when it fits. Regions are not packed: a 5h region
/// with `slot_sizes = [1h]` yields a single 1h slot. Output is sorted by
/// `(start, size)` and deduplicated.
///
/// # Errors
/// Returns `AgendaError::Validation` from [`validate`] before any computation.
pub fn resolve(
    busy: impl IntoIterator<Item = Interval>,
    window: Window,
    padding_before: Duration,
    padding_after: Duration,
    slot_sizes: &[Duration],
) -> Result<Vec<FreeSlot>> {
    validate(&window, padding_before, padding_after, slot_sizes)?;

    if window.is_empty() {
        return Ok(Vec::new());
    }

    let merged = merge_busy_blocks(busy, &window, padding_before, padding_after);
    let regions = free_regions(&merged, &window);

    let mut slots: Vec<FreeSlot> = regions
        .iter()
        .flat_map(|region| {
            slot_sizes
                .iter()
                .filter(move |size| region.duration() >= **size)
                .map(move |size| FreeSlot {
                    start: region.start,
                    end: region.start + *size,
                })
        })
        .collect();

    slots.sort();
    slots.dedup();

    tracing::debug!(
        busy_blocks = merged.len(),
        regions = regions.len(),
        slots = slots.len(),
        "resolved availability"
    );

    Ok(slots)
}
