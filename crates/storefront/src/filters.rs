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

/// Returns the content hash for main.css.
///
/// The hash is computed at build time from the CSS file content.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Formats a stored phone number for display (`069 123 4567`).
///
/// Values that do not parse are shown unchanged.
///
/// Usage in templates: `{{ address.phone|phone }}`
#[askama::filter_fn]
pub fn phone(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = value.to_string();
    Ok(PhoneNumber::parse(&raw).map_or(raw, |p| p.national()))
}

/// Formats a timestamp as `dd.mm.yyyy`.
///
/// Usage in templates: `{{ order.created_at|date }}`
#[askama::filter_fn]
pub fn date(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = value.to_string();
    let day = raw
        .get(..10)
        .and_then(|prefix| chrono::NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok());
    Ok(day.map_or(raw, |d| d.format("%d.%m.%Y").to_string()))
}
