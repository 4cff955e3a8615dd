//! Procedural agendas: recurring busy blocks described by an RFC 5545 RRULE.
//!
//! Wraps the `rrule` crate (v0.13) and `chrono-tz` so that "every weekday lunch,
//! 12:00 Europe/Paris" lands on the right UTC instants across DST changes. An
//! invite can link procedural agendas alongside its agenda sources; their
//! occurrences count as busy time.

use chrono::{DateTime, Datelike, Duration, NaiveDateTime, TimeZone, Utc};
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AgendaError, Result};
use crate::interval::{Interval, UserId};
use crate::resolver::Window;

pub type ProceduralAgendaId = Uuid;

/// Upper bound on raw occurrences produced per agenda and window.
pub const MAX_OCCURRENCES: u16 = 4096;

const LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProceduralAgenda {
    pub id: ProceduralAgendaId,
    pub owner_user_id: UserId,
    /// RRULE body, e.g. `FREQ=WEEKLY;BYDAY=MO,WE,FR`.
    pub rule: String,
    /// Local wall-clock start of the first occurrence, e.g. `2026-03-02T12:00:00`.
    pub dtstart: String,
    /// IANA timezone the wall-clock times are expressed in.
    pub timezone: String,
    pub duration_minutes: u32,
    /// Local datetimes (same format as `dtstart`) to skip.
    #[serde(default)]
    pub exdates: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl ProceduralAgenda {
    /// Check the rule, start, timezone and duration without expanding.
    ///
    /// # Errors
    /// `InvalidRule` for an empty or unparseable rule or start,
    /// `InvalidTimezone` for an unknown zone, `Validation` for a zero duration.
    pub fn validate(&self) -> Result<()> {
        self.parse().map(|_| ())
    }

    fn parse(&self) -> Result<RRuleSet> {
        if self.rule.trim().is_empty() {
            return Err(AgendaError::InvalidRule("empty RRULE string".to_string()));
        }
        if self.duration_minutes == 0 {
            return Err(AgendaError::Validation(
                "procedural agenda duration must be positive".to_string(),
            ));
        }
        let tz: chrono_tz::Tz = self
            .timezone
            .parse()
            .map_err(|_| AgendaError::InvalidTimezone(self.timezone.clone()))?;
        for exdate in &self.exdates {
            NaiveDateTime::parse_from_str(exdate, LOCAL_FORMAT)
                .map_err(|e| AgendaError::InvalidRule(format!("bad exdate '{exdate}': {e}")))?;
        }

        self.first_start(tz)?;
        self.rule_text(None)
            .parse()
            .map_err(|e| AgendaError::InvalidRule(format!("{e}")))
    }

    /// UTC instant of `dtstart`. A wall-clock time skipped by a DST change
    /// resolves one hour later.
    fn first_start(&self, tz: chrono_tz::Tz) -> Result<DateTime<Utc>> {
        let naive = NaiveDateTime::parse_from_str(&self.dtstart, LOCAL_FORMAT)
            .map_err(|e| AgendaError::InvalidRule(format!("bad dtstart '{}': {e}", self.dtstart)))?;
        tz.from_local_datetime(&naive)
            .earliest()
            .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
            .map(|start| start.with_timezone(&Utc))
            .ok_or_else(|| {
                AgendaError::InvalidRule(format!(
                    "dtstart '{}' does not exist in {}",
                    self.dtstart, self.timezone
                ))
            })
    }

    /// Build the iCalendar text block, optionally bounding it with UNTIL.
    fn rule_text(&self, until: Option<DateTime<Utc>>) -> String {
        let dtstart_ical = self.dtstart.replace(['-', ':'], "");
        let mut rule = self.rule.trim().to_string();

        // RFC 5545 forbids COUNT and UNTIL together; only bound open-ended rules.
        let upper = rule.to_uppercase();
        if let Some(until) = until {
            if !upper.contains("UNTIL=") && !upper.contains("COUNT=") && until.year() <= 9999 {
                // With a TZID on DTSTART, rrule only accepts UNTIL in UTC.
                rule = format!("{rule};UNTIL={}", until.format("%Y%m%dT%H%M%SZ"));
            }
        }

        let mut text = format!(
            "DTSTART;TZID={}:{}\nRRULE:{}",
            self.timezone, dtstart_ical, rule
        );

        if !self.exdates.is_empty() {
            let exdate_icals: Vec<String> = self
                .exdates
                .iter()
                .map(|d| d.replace(['-', ':'], ""))
                .collect();
            text.push_str(&format!(
                "\nEXDATE;TZID={}:{}",
                self.timezone,
                exdate_icals.join(",")
            ));
        }

        text
    }
}

/// Expand a procedural agenda into the busy intervals overlapping `window`.
///
/// # Errors
/// Same as [`ProceduralAgenda::validate`].
pub fn expand_occurrences(agenda: &ProceduralAgenda, window: &Window) -> Result<Vec<Interval>> {
    agenda.validate()?;
    if window.is_empty() {
        return Ok(Vec::new());
    }

    let tz: chrono_tz::Tz = agenda
        .timezone
        .parse()
        .map_err(|_| AgendaError::InvalidTimezone(agenda.timezone.clone()))?;
    let duration = Duration::minutes(i64::from(agenda.duration_minutes));

    // Nothing to expand before the first occurrence, and rrule rejects UNTIL < DTSTART.
    if window.end <= agenda.first_start(tz)? {
        return Ok(Vec::new());
    }

    let rrule_set: RRuleSet = agenda
        .rule_text(Some(window.end))
        .parse()
        .map_err(|e| AgendaError::InvalidRule(format!("{e}")))?;

    // Skip occurrences that end before the window opens.
    let earliest = window
        .start
        .checked_sub_signed(duration + Duration::seconds(1))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let result = rrule_set
        .after(earliest.with_timezone(&rrule::Tz::UTC))
        .all(MAX_OCCURRENCES);

    if result.limited {
        tracing::warn!(
            agenda = %agenda.id,
            limit = MAX_OCCURRENCES,
            "procedural agenda expansion hit the occurrence limit"
        );
    }

    let occurrences: Vec<Interval> = result
        .dates
        .into_iter()
        .map(|dt| {
            let start = dt.with_timezone(&Utc);
            Interval {
                start,
                end: start + duration,
            }
        })
        .filter(|occ| occ.start < window.end && window.start < occ.end)
        .collect();

    Ok(occurrences)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agenda(rule: &str, tz: &str) -> ProceduralAgenda {
        ProceduralAgenda {
            id: Uuid::nil(),
            owner_user_id: Uuid::nil(),
            rule: rule.to_string(),
            dtstart: "2026-03-02T12:00:00".to_string(),
            timezone: tz.to_string(),
            duration_minutes: 60,
            exdates: Vec::new(),
            description: String::new(),
        }
    }

    #[test]
    fn empty_rule_rejected() {
        assert!(matches!(
            agenda("", "UTC").validate(),
            Err(AgendaError::InvalidRule(_))
        ));
    }

    #[test]
    fn unknown_timezone_rejected() {
        assert!(matches!(
            agenda("FREQ=DAILY", "Mars/Olympus_Mons").validate(),
            Err(AgendaError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn zero_duration_rejected() {
        let mut a = agenda("FREQ=DAILY", "UTC");
        a.duration_minutes = 0;
        assert!(matches!(a.validate(), Err(AgendaError::Validation(_))));
    }

    #[test]
    fn until_not_injected_when_count_present() {
        let a = agenda("FREQ=DAILY;COUNT=3", "UTC");
        let text = a.rule_text(Some(Utc::now()));
        assert!(!text.contains("UNTIL="));
    }

    #[test]
    fn until_is_written_in_utc_for_zoned_rules() {
        let a = agenda("FREQ=DAILY", "Europe/Paris");
        let until = Utc.with_ymd_and_hms(2026, 3, 9, 17, 0, 0).unwrap();
        let text = a.rule_text(Some(until));
        assert!(text.contains("DTSTART;TZID=Europe/Paris:20260302T120000"));
        assert!(text.contains("UNTIL=20260309T170000Z"));
    }
}
