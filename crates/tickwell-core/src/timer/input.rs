//! Parsing of user-entered durations and target times.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::error::ValidationError;

/// Quick-pick durations offered by the add form: (label, seconds).
pub const PRESETS: [(&str, u64); 6] = [
    ("5m", 5 * 60),
    ("15m", 15 * 60),
    ("25m", 25 * 60),
    ("45m", 45 * 60),
    ("1h", 60 * 60),
    ("2h", 2 * 60 * 60),
];

/// Parse a duration into whole seconds.
///
/// Accepts unit strings (`1h30m`, `90s`, `2h`), clock strings (`25:00`,
/// `1:05:00`) and bare numbers, which count minutes.
pub fn parse_duration(input: &str) -> Result<u64, ValidationError> {
    let s = input.trim().to_ascii_lowercase();
    let invalid = || ValidationError::InvalidDuration(input.to_string());
    if s.is_empty() {
        return Err(invalid());
    }

    let secs = if s.chars().all(|c| c.is_ascii_digit()) {
        s.parse::<u64>().map_err(|_| invalid())?.checked_mul(60).ok_or_else(invalid)?
    } else if s.contains(':') {
        let parts = s
            .split(':')
            .map(|p| p.parse::<u64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        let total = match parts.as_slice() {
            [m, sec] if *sec < 60 => m.checked_mul(60).and_then(|v| v.checked_add(*sec)),
            [h, m, sec] if *m < 60 && *sec < 60 => h
                .checked_mul(3600)
                .and_then(|v| v.checked_add(m * 60 + sec)),
            _ => return Err(invalid()),
        };
        total.ok_or_else(invalid)?
    } else {
        let mut total: u64 = 0;
        let mut digits = String::new();
        for c in s.chars() {
            if c.is_ascii_digit() {
                digits.push(c);
                continue;
            }
            let unit = match c {
                'h' => 3600,
                'm' => 60,
                's' => 1,
                _ => return Err(invalid()),
            };
            let n: u64 = digits.parse().map_err(|_| invalid())?;
            total = n
                .checked_mul(unit)
                .and_then(|v| total.checked_add(v))
                .ok_or_else(invalid)?;
            digits.clear();
        }
        if !digits.is_empty() {
            return Err(invalid());
        }
        total
    };

    if secs == 0 {
        return Err(ValidationError::NonPositiveDuration);
    }
    Ok(secs)
}

/// Parse an absolute target time into epoch milliseconds.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]` and `HH:MM[:SS]` (today). The
/// latter two are read in the time zone of `now`. Whether the target is in
/// the future is checked by the engine, not here.
pub fn parse_target<Tz: TimeZone>(input: &str, now: &DateTime<Tz>) -> Result<u64, ValidationError> {
    let s = input.trim();
    let invalid = || ValidationError::InvalidTime(input.to_string());

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return to_epoch_ms(dt.timestamp_millis()).ok_or_else(invalid);
    }

    let naive = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            ["%H:%M:%S", "%H:%M"]
                .iter()
                .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
                .map(|time| today(now).and_time(time))
        })
        .ok_or_else(invalid)?;

    let local = now
        .timezone()
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(invalid)?;
    to_epoch_ms(local.timestamp_millis()).ok_or_else(invalid)
}

fn today<Tz: TimeZone>(now: &DateTime<Tz>) -> NaiveDate {
    now.date_naive()
}

fn to_epoch_ms(ms: i64) -> Option<u64> {
    u64::try_from(ms).ok()
}
