//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats an amount as rupees with thousands separators.
///
/// Usage in templates: `{{ product.price|rupees }}`
#[askama::filter_fn]
pub fn rupees(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    // f64 Display round-trips exactly.
    let amount = value.to_string().parse::<f64>().unwrap_or(0.0);
    Ok(crate::inventory::format_price(amount))
}

/// Resolves a stored image link to a URL an `<img>` can load, using the
/// placeholder for blank values.
///
/// Usage in templates: `{{ product.image|drive_image }}`
#[askama::filter_fn]
pub fn drive_image(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(trident_core::display_image(&value.to_string()))
}
