//! Custom Askama template filters.
//!
//! Templates that use these must have `use crate::filters;` in scope.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use okinawa_rentals_core::shape;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Whole yen with a currency sign: `{{ listing.price|yen }}` renders `¥150,000`.
///
/// Non-numeric input renders unchanged.
#[askama::filter_fn]
pub fn yen(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = value.to_string();
    Ok(raw
        .trim()
        .parse::<u64>()
        .map_or(raw.clone(), shape::format_yen))
}

/// Whole dollars: `{{ listing.price_usd|usd }}`. Empty input renders `$0`.
#[askama::filter_fn]
pub fn usd(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(shape::format_usd(value.to_string().trim().parse::<u64>().ok()))
}

/// RFC 3339 timestamp or bare date as `Mar 5, 2025`; anything else renders empty.
#[askama::filter_fn]
pub fn date(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = value.to_string();
    Ok(shape::format_date(Some(raw.as_str())))
}
