//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use lodra_core::PhoneNumber;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a timestamp as `dd.mm.yyyy HH:MM` (UTC).
///
/// Usage in templates: `{{ order.created_at|datetime }}`
#[askama::filter_fn]
pub fn datetime(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_datetime(&value.to_string()))
}

/// Values that are not timestamps are returned unchanged.
fn format_datetime(raw: &str) -> String {
    let parsed = chrono::DateTime::parse_from_rfc3339(raw)
        .map(|d| d.naive_utc())
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw.trim_end_matches(" UTC"), "%Y-%m-%d %H:%M:%S%.f")
        });
    parsed.map_or_else(|_| raw.to_string(), |d| d.format("%d.%m.%Y %H:%M").to_string())
}

/// Formats a stored phone number for display (`069 123 4567`).
#[askama::filter_fn]
pub fn phone(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = value.to_string();
    Ok(PhoneNumber::parse(&raw).map_or(raw, |p| p.national()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn test_format_datetime() {
        let at = Utc.with_ymd_and_hms(2026, 3, 8, 14, 5, 0).unwrap();
        assert_eq!(format_datetime(&at.to_string()), "08.03.2026 14:05");
        assert_eq!(format_datetime("2026-03-08T14:05:00+01:00"), "08.03.2026 13:05");
        assert_eq!(format_datetime("dje"), "dje");
    }
}
