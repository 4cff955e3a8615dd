//! Human-readable duration strings (`"30m"`, `"1h30m"`, `"1.5h"`, `"250ms"`).
//!
//! The accepted grammar is a sequence of `<number><unit>` pairs with an optional
//! leading sign, units `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`. A bare `0` is also
//! accepted. Formatting produces the canonical form, e.g. `1h0m0s`, `30m0s`.
//! This lives at the boundary only: the resolver works on `chrono::Duration`.

use chrono::Duration;

use crate::error::{AgendaError, Result};

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;

fn invalid(input: &str) -> AgendaError {
    AgendaError::Validation(format!("invalid duration {input:?}"))
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(NANOS_PER_MINUTE),
        "h" => Some(NANOS_PER_HOUR),
        _ => None,
    }
}

/// Parse a duration string.
///
/// # Errors
/// `AgendaError::Validation` for empty input, a missing or unknown unit, or a
/// value that does not fit in a `chrono::Duration`.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let s = input.trim();
    let (negative, mut rest) = match s.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    if rest == "0" {
        return Ok(Duration::zero());
    }
    if rest.is_empty() {
        return Err(invalid(input));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let whole_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let whole_digits = &rest[..whole_len];
        rest = &rest[whole_len..];

        let mut frac_digits = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_len = after_dot
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_dot.len());
            frac_digits = &after_dot[..frac_len];
            rest = &after_dot[frac_len..];
        }
        if whole_digits.is_empty() && frac_digits.is_empty() {
            return Err(invalid(input));
        }

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = unit_nanos(&rest[..unit_len]).ok_or_else(|| invalid(input))?;
        rest = &rest[unit_len..];

        let whole: u128 = if whole_digits.is_empty() {
            0
        } else {
            whole_digits.parse().map_err(|_| invalid(input))?
        };
        let mut value = whole.checked_mul(unit).ok_or_else(|| invalid(input))?;

        if !frac_digits.is_empty() {
            // Digits beyond nanosecond precision cannot change the result.
            let kept = &frac_digits[..frac_digits.len().min(18)];
            let frac: u128 = kept.parse().map_err(|_| invalid(input))?;
            let scale = 10u128.pow(kept.len() as u32);
            value = value
                .checked_add(frac * unit / scale)
                .ok_or_else(|| invalid(input))?;
        }

        total = total.checked_add(value).ok_or_else(|| invalid(input))?;
    }

    let nanos = i64::try_from(total).map_err(|_| invalid(input))?;
    Ok(if negative {
        Duration::nanoseconds(-nanos)
    } else {
        Duration::nanoseconds(nanos)
    })
}

/// `value / unit` with the remainder as a trimmed decimal fraction.
fn with_fraction(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let rem = value % unit;
    if rem == 0 {
        return whole.to_string();
    }
    let width = unit.ilog10() as usize;
    let frac = format!("{rem:0width$}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Canonical string form of a duration.
pub fn format_duration(d: Duration) -> String {
    let nanos = match d.num_nanoseconds() {
        Some(n) => i128::from(n),
        // Beyond ~292 years: fall back to microsecond precision.
        None => i128::from(d.num_microseconds().unwrap_or(i64::MAX)) * 1_000,
    };
    if nanos == 0 {
        return "0s".to_string();
    }

    let sign = if nanos < 0 { "-" } else { "" };
    let u = nanos.unsigned_abs();

    let body = if u < NANOS_PER_MICRO {
        format!("{u}ns")
    } else if u < NANOS_PER_MILLI {
        format!("{}µs", with_fraction(u, NANOS_PER_MICRO))
    } else if u < NANOS_PER_SECOND {
        format!("{}ms", with_fraction(u, NANOS_PER_MILLI))
    } else {
        let hours = u / NANOS_PER_HOUR;
        let minutes = (u % NANOS_PER_HOUR) / NANOS_PER_MINUTE;
        let seconds = with_fraction(u % NANOS_PER_MINUTE, NANOS_PER_SECOND);
        if hours > 0 {
            format!("{hours}h{minutes}m{seconds}s")
        } else if minutes > 0 {
            format!("{minutes}m{seconds}s")
        } else {
            format!("{seconds}s")
        }
    };

    format!("{sign}{body}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_forms() {
        assert_eq!(parse_duration("30m").unwrap(), Duration::minutes(30));
        assert_eq!(parse_duration("1h").unwrap(), Duration::hours(1));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::minutes(90));
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::minutes(90));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::milliseconds(250));
        assert_eq!(parse_duration("0").unwrap(), Duration::zero());
        assert_eq!(parse_duration(" 45s ").unwrap(), Duration::seconds(45));
        assert_eq!(parse_duration("-15m").unwrap(), Duration::minutes(-15));
        assert_eq!(parse_duration(".5s").unwrap(), Duration::milliseconds(500));
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "h", "10", "10x", "1h30", "--1h", "1..5h", "one hour", "."] {
            assert!(parse_duration(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn rejects_overflow() {
        assert!(parse_duration("99999999999999999999h").is_err());
    }

    #[test]
    fn formats_canonically() {
        assert_eq!(format_duration(Duration::zero()), "0s");
        assert_eq!(format_duration(Duration::hours(1)), "1h0m0s");
        assert_eq!(format_duration(Duration::minutes(30)), "30m0s");
        assert_eq!(format_duration(Duration::seconds(90)), "1m30s");
        assert_eq!(format_duration(Duration::milliseconds(1500)), "1.5s");
        assert_eq!(format_duration(Duration::milliseconds(250)), "250ms");
        assert_eq!(format_duration(Duration::microseconds(1500)), "1.5ms");
        assert_eq!(format_duration(Duration::minutes(-15)), "-15m0s");
    }

    #[test]
    fn formatted_output_parses_back() {
        for d in [
            Duration::minutes(45),
            Duration::minutes(135),
            Duration::seconds(3661),
            Duration::nanoseconds(7),
        ] {
            assert_eq!(parse_duration(&format_duration(d)).unwrap(), d);
        }
    }
}
