//! Half-open busy intervals and the primitive queries on them.
//!
//! Intervals are `[start, end)`: touching endpoints do NOT overlap, so a meeting
//! ending at 10:00 and one starting at 10:00 are back-to-back, not conflicting.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AgendaError, Result};

pub type UserId = Uuid;
pub type SourceId = Uuid;
pub type IntervalId = Uuid;

/// A non-empty time range. Ordered by `(start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    /// # Errors
    /// Returns `AgendaError::Validation` unless `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(AgendaError::Validation(format!(
                "interval start {} must be before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        overlaps(self, other)
    }

    pub fn contains(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Intersection with `[window_start, window_end)`, or `None` when disjoint.
    pub fn clip(&self, window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> Option<Interval> {
        if self.start < window_end && window_start < self.end {
            Some(Interval {
                start: self.start.max(window_start),
                end: self.end.min(window_end),
            })
        } else {
            None
        }
    }
}

/// `a.start < b.end && b.start < a.end`.
pub fn overlaps(a: &Interval, b: &Interval) -> bool {
    a.start < b.end && b.start < a.end
}

/// Grow an interval by `before` at the front and `after` at the back.
///
/// Saturates at the representable range instead of wrapping. Negative padding
/// is treated as zero; callers reject it before it gets here.
pub fn pad(interval: &Interval, before: Duration, after: Duration) -> Interval {
    let before = before.max(Duration::zero());
    let after = after.max(Duration::zero());
    Interval {
        start: interval
            .start
            .checked_sub_signed(before)
            .unwrap_or(DateTime::<Utc>::MIN_UTC),
        end: interval
            .end
            .checked_add_signed(after)
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
    }
}

/// A busy period ingested from an agenda source.
///
/// `description` is the raw event text and never leaves the engine through an
/// invite view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub id: IntervalId,
    pub owner_user_id: UserId,
    pub source_id: SourceId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
}

impl BusyInterval {
    /// # Errors
    /// Returns `AgendaError::Validation` unless `start < end`.
    pub fn new(
        id: IntervalId,
        owner_user_id: UserId,
        source_id: SourceId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        description: impl Into<String>,
    ) -> Result<Self> {
        Interval::new(start, end)?;
        Ok(Self {
            id,
            owner_user_id,
            source_id,
            start,
            end,
            description: description.into(),
        })
    }

    pub fn interval(&self) -> Interval {
        Interval {
            start: self.start,
            end: self.end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    fn iv(sh: u32, sm: u32, eh: u32, em: u32) -> Interval {
        Interval::new(at(sh, sm), at(eh, em)).unwrap()
    }

    #[test]
    fn touching_endpoints_do_not_overlap() {
        assert!(!overlaps(&iv(9, 0, 10, 0), &iv(10, 0, 11, 0)));
        assert!(!overlaps(&iv(10, 0, 11, 0), &iv(9, 0, 10, 0)));
    }

    #[test]
    fn partial_and_nested_overlap() {
        assert!(overlaps(&iv(9, 0, 10, 30), &iv(10, 0, 11, 0)));
        assert!(overlaps(&iv(9, 0, 17, 0), &iv(12, 0, 13, 0)));
        assert!(iv(12, 0, 13, 0).overlaps(&iv(9, 0, 17, 0)));
    }

    #[test]
    fn empty_interval_is_rejected() {
        assert!(Interval::new(at(9, 0), at(9, 0)).is_err());
        assert!(Interval::new(at(10, 0), at(9, 0)).is_err());
    }

    #[test]
    fn pad_extends_both_sides() {
        let padded = pad(&iv(10, 0, 11, 0), Duration::minutes(15), Duration::minutes(30));
        assert_eq!(padded, iv(9, 45, 11, 30));
    }

    #[test]
    fn pad_saturates_instead_of_wrapping() {
        let edge = Interval {
            start: DateTime::<Utc>::MIN_UTC + Duration::minutes(5),
            end: DateTime::<Utc>::MAX_UTC - Duration::minutes(5),
        };
        let padded = pad(&edge, Duration::hours(1), Duration::hours(1));
        assert_eq!(padded.start, DateTime::<Utc>::MIN_UTC);
        assert_eq!(padded.end, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn ordering_is_start_then_end() {
        let mut v = vec![iv(10, 0, 12, 0), iv(9, 0, 11, 0), iv(10, 0, 11, 0)];
        v.sort();
        assert_eq!(v, vec![iv(9, 0, 11, 0), iv(10, 0, 11, 0), iv(10, 0, 12, 0)]);
    }

    #[test]
    fn clip_discards_disjoint() {
        assert_eq!(iv(8, 0, 9, 0).clip(at(9, 0), at(17, 0)), None);
        assert_eq!(
            iv(8, 0, 10, 0).clip(at(9, 0), at(17, 0)),
            Some(iv(9, 0, 10, 0))
        );
    }
}
