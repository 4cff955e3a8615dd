//! Merge busy intervals from several agenda sources into one timeline.

use std::collections::HashSet;

use crate::error::{AgendaError, Result};
use crate::interval::{BusyInterval, Interval, SourceId, UserId};
use crate::store::AgendaStore;

/// A user's busy intervals across a set of sources, sorted by `(start, end)`
/// and free of duplicate ids. Iterate it as often as needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusyTimeline {
    intervals: Vec<BusyInterval>,
}

impl BusyTimeline {
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BusyInterval> {
        self.intervals.iter()
    }

    /// The bare time ranges, for feeding the resolver.
    pub fn intervals(&self) -> impl Iterator<Item = Interval> + '_ {
        self.intervals.iter().map(BusyInterval::interval)
    }

    pub fn into_vec(self) -> Vec<BusyInterval> {
        self.intervals
    }
}

impl<'a> IntoIterator for &'a BusyTimeline {
    type Item = &'a BusyInterval;
    type IntoIter = std::slice::Iter<'a, BusyInterval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}

/// Collect the busy intervals of `user_id` from `source_ids`.
///
/// Every source id is checked first. A source owned by someone else is an
/// error, never silently dropped.
///
/// # Errors
/// `NotFound` for an unknown source, `Unauthorized` for a foreign one, and
/// whatever the store reports while loading.
pub fn aggregate<S>(store: &S, user_id: UserId, source_ids: &[SourceId]) -> Result<BusyTimeline>
where
    S: AgendaStore + ?Sized,
{
    let mut seen_sources = HashSet::with_capacity(source_ids.len());
    let mut unique_sources = Vec::with_capacity(source_ids.len());
    for id in source_ids {
        if seen_sources.insert(*id) {
            unique_sources.push(*id);
        }
    }

    for source_id in &unique_sources {
        let source = store
            .load_source(*source_id)?
            .ok_or_else(|| AgendaError::not_found("source", source_id))?;
        if source.owner_user_id != user_id {
            tracing::warn!(
                user = %user_id,
                source = %source_id,
                "refusing to aggregate a source owned by another user"
            );
            return Err(AgendaError::Unauthorized(format!(
                "source {source_id} does not belong to user {user_id}"
            )));
        }
    }

    if unique_sources.is_empty() {
        return Ok(BusyTimeline::default());
    }

    let loaded = store.load_busy_intervals(user_id, &unique_sources)?;

    let mut seen_ids = HashSet::with_capacity(loaded.len());
    let mut intervals: Vec<BusyInterval> = loaded
        .into_iter()
        .filter(|i| i.owner_user_id == user_id && seen_sources.contains(&i.source_id))
        .filter(|i| seen_ids.insert(i.id))
        .collect();
    intervals.sort_by_key(|i| (i.start, i.end, i.id));

    tracing::debug!(
        user = %user_id,
        sources = unique_sources.len(),
        intervals = intervals.len(),
        "aggregated busy timeline"
    );

    Ok(BusyTimeline { intervals })
}
