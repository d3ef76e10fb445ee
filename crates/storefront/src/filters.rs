//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Currency symbol shown before every amount.
const CURRENCY_SYMBOL: &str = "R$";

/// Formats an amount the way the menu prints it: `R$ 12,50`.
///
/// Takes anything whose display is a dot-decimal number, which includes
/// `Price`.
///
/// Usage in templates: `{{ item.price|money }}`
#[askama::filter_fn]
pub fn money(amount: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_money(&amount.to_string()))
}

fn format_money(amount: &str) -> String {
    format!("{CURRENCY_SYMBOL} {}", amount.replacen('.', ",", 1))
}

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}
