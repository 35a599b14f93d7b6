//! Export bundle for import/export functionality.
//!
//! A bundle carries the whole timer collection and white noise registry as
//! one JSON document. Imported data never resumes anything: timers arrive
//! stopped and tracks arrive silent.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::audio::WhiteNoise;
use crate::error::{CoreError, ValidationError};
use crate::timer::Timer;

/// Current export format version.
pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub timers: Vec<Timer>,
    pub white_noises: Vec<WhiteNoise>,
    /// RFC 3339 timestamp of the export. Absent in some hand-written files.
    #[serde(default)]
    pub export_date: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl ExportBundle {
    pub fn new(timers: Vec<Timer>, white_noises: Vec<WhiteNoise>, at: DateTime<Utc>) -> Self {
        Self {
            timers,
            white_noises,
            export_date: Some(at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            version: Some(EXPORT_VERSION.to_string()),
        }
    }

    /// Serialize the bundle to a pretty JSON string.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse and validate an import document.
    ///
    /// `timers` and `whiteNoises` must both be present and be arrays. On
    /// success every timer is stopped and every track inactive.
    ///
    /// # Errors
    /// [`ValidationError::InvalidImport`] for malformed or incomplete files.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let invalid = |msg: String| CoreError::from(ValidationError::InvalidImport(msg));

        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| invalid(format!("not valid JSON: {e}")))?;
        for field in ["timers", "whiteNoises"] {
            match value.get(field) {
                Some(v) if v.is_array() => {}
                Some(_) => return Err(invalid(format!("'{field}' must be an array"))),
                None => return Err(invalid(format!("missing '{field}'"))),
            }
        }

        let mut bundle: ExportBundle =
            serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
        for timer in &mut bundle.timers {
            timer.normalize();
        }
        for track in &mut bundle.white_noises {
            track.is_active = false;
        }
        Ok(bundle)
    }

    /// Parsed export timestamp, if present and well-formed.
    pub fn exported_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.export_date.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// `timer_config_YYYY-MM-DD.json`
pub fn default_file_name(date: NaiveDate) -> String {
    format!("timer_config_{}.json", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::default_tracks;
    use crate::timer::NewTimer;
    use chrono::TimeZone;

    fn sample() -> ExportBundle {
        let mut timer = Timer::new(NewTimer::countdown("Tea", 300), 1_000).unwrap();
        timer.is_running = true;
        let mut tracks = default_tracks();
        tracks[0].is_active = true;
        ExportBundle::new(
            vec![timer],
            tracks,
            Utc.with_ymd_and_hms(2026, 10, 16, 8, 30, 0).unwrap(),
        )
    }

    #[test]
    fn export_uses_camel_case_document() {
        let json = sample().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], "1.0");
        assert_eq!(value["exportDate"], "2026-10-16T08:30:00.000Z");
        assert!(value["whiteNoises"].is_array());
        assert_eq!(value["timers"][0]["remainingTime"], 300);
    }

    #[test]
    fn import_stops_everything() {
        let json = sample().to_json().unwrap();
        let bundle = ExportBundle::from_json(&json).unwrap();
        assert!(bundle.timers.iter().all(|t| !t.is_running));
        assert!(bundle.white_noises.iter().all(|n| !n.is_active));
        assert_eq!(
            bundle.exported_at(),
            Some(Utc.with_ymd_and_hms(2026, 10, 16, 8, 30, 0).unwrap())
        );
    }

    #[test]
    fn import_requires_both_arrays() {
        let cases = [
            r#"{"whiteNoises": []}"#,
            r#"{"timers": []}"#,
            r#"{"timers": {}, "whiteNoises": []}"#,
            r#"{"timers": [], "whiteNoises": "rain"}"#,
            "not json",
        ];
        for case in cases {
            assert!(
                matches!(
                    ExportBundle::from_json(case),
                    Err(CoreError::Validation(ValidationError::InvalidImport(_)))
                ),
                "accepted: {case}"
            );
        }
    }

    #[test]
    fn import_accepts_minimal_document() {
        let bundle = ExportBundle::from_json(r#"{"timers": [], "whiteNoises": []}"#).unwrap();
        assert!(bundle.timers.is_empty());
        assert!(bundle.exported_at().is_none());
    }

    #[test]
    fn file_name_uses_date() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(default_file_name(date), "timer_config_2026-10-16.json");
    }
}
